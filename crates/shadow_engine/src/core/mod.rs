//! # Core Module
//!
//! Shared configuration types used by the render module and host
//! applications.

pub mod config;

// Re-export commonly used config types
pub use config::{
    ShadowConfig,
    FrustumConfig,
    PublishNames,
    Config,
    ConfigError,
};
