//! CLI error type with exit code handling

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

use cr_core::CoreError;
use cr_forge::ForgeError;
use cr_releaser::{ErrorKind, ReleaserError};

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Missing or invalid options
    #[error("{message}")]
    #[diagnostic(code(cr::input))]
    Input {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Invalid config file {path}: {message}")]
    #[diagnostic(code(cr::config), help("config files use kebab-case option names, e.g. `git-repo: charts`"))]
    Config { path: String, message: String },

    /// A package or index could not be read as chart data
    #[error("{message}")]
    #[diagnostic(code(cr::metadata))]
    Metadata { message: String },

    #[error("{message}")]
    #[diagnostic(code(cr::network))]
    Network { message: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(cr::io))]
    Io { message: String },

    #[error("{message}")]
    #[diagnostic(code(cr::error))]
    Other { message: String },
}

impl CliError {
    /// Exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Input { .. } | CliError::Config { .. } => exit_codes::INPUT_ERROR,
            CliError::Metadata { .. } => exit_codes::METADATA_ERROR,
            CliError::Network { .. } => exit_codes::NETWORK_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: None,
        }
    }

    pub fn input_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn config(path: &Path, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.display().to_string(),
            message: message.into(),
        }
    }
}

impl From<ReleaserError> for CliError {
    fn from(err: ReleaserError) -> Self {
        let message = error_chain(&err);
        match err.kind() {
            ErrorKind::Input => CliError::Input {
                message,
                help: None,
            },
            ErrorKind::Metadata => CliError::Metadata { message },
            ErrorKind::Network => CliError::Network { message },
            ErrorKind::Io => CliError::Io { message },
            ErrorKind::VersionControl => CliError::Other { message },
        }
    }
}

impl From<ForgeError> for CliError {
    fn from(err: ForgeError) -> Self {
        ReleaserError::Forge(err).into()
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::Io(_) => CliError::Io { message },
            CoreError::InvalidChart { .. }
            | CoreError::MissingChartYaml { .. }
            | CoreError::InvalidMetadata { .. }
            | CoreError::InvalidVersion(_)
            | CoreError::YamlParse(_) => CliError::Metadata { message },
            _ => CliError::Other { message },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Message of an error followed by its sources
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message = format!("{}: {}", message, text);
        }
        source = cause.source();
    }
    message
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
