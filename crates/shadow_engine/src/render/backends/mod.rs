//! Backend implementations
//!
//! Real graphics backends live in the host renderer. The crate ships a
//! headless backend that records commands, used by the demo application
//! and the test suite.

pub mod headless;
