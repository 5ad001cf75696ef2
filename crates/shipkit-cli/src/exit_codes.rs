//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Input error - malformed URI, license or configuration
pub const INPUT_ERROR: i32 = 2;

/// Template error - config defaults failed to render
pub const TEMPLATE_ERROR: i32 = 3;

/// Access error - the license was rejected
pub const ACCESS_DENIED: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Upstream error - the distribution service or a registry failed
pub const UPSTREAM_ERROR: i32 = 6;

/// Timeout - a deadline expired before the operation finished
pub const TIMEOUT: i32 = 7;

/// Negative answer from a yes/no command (`can-pull`)
pub const NO: i32 = 10;
