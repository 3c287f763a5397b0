//! Integration tests for the full shadow pass against the headless backend
