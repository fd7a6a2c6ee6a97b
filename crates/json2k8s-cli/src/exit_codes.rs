//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - a descriptor failed schema validation
pub const VALIDATION_ERROR: i32 = 2;

/// Build error - missing image, duplicate replica group, missing secret or
/// secret source failure
pub const BUILD_ERROR: i32 = 3;

/// IO error - output could not be written
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or missing input paths (sysexits.h)
pub const USAGE_ERROR: i32 = 64;
