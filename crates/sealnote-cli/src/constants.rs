//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2+: Application-specific errors
pub mod exit_codes {
    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 2;

    /// Resource not found (config, notes directory, note).
    pub const NOT_FOUND: i32 = 3;

    /// Authentication failed (wrong password, too many attempts).
    pub const AUTH_FAILED: i32 = 4;
}

/// Environment variable supplying the password non-interactively.
pub const PASSWORD_ENV: &str = "SEALNOTE_PASSWORD";

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "SEALNOTE_CONFIG";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "SEALNOTE_LOG";

/// Password prompts before giving up.
pub const MAX_PASSWORD_ATTEMPTS: usize = 3;
