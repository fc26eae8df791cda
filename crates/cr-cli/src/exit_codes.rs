//! Process exit codes

/// Success - operation completed without errors
pub const SUCCESS: u8 = 0;

/// General error - unspecified failure, including git failures
pub const ERROR: u8 = 1;

/// Input error - missing or invalid options, no packages, bad template
pub const INPUT_ERROR: u8 = 2;

/// Metadata error - a package is not a valid chart, or the index is unreadable
pub const METADATA_ERROR: u8 = 3;

/// Network error - GitHub API, upload or download failure
pub const NETWORK_ERROR: u8 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: u8 = 5;
