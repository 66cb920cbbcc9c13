//! Application-level utilities for the Sealnote CLI.
//!
//! This module provides:
//! - Application context for unified CLI + config handling
//! - Path resolution for config, key and notes directories
//! - Password handling with retry logic

mod context;
mod password;
mod resolver;

// Re-export public API
pub use context::AppContext;
pub use password::{read_new_password, unlock_with_retry};
pub use resolver::{key_dir_for, resolve_config_path};
