//! Subcommand implementations

pub mod index;
pub mod package;
pub mod upload;
