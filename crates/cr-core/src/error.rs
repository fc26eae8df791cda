//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{path} is not a helm chart package: {message}")]
    InvalidChart { path: String, message: String },

    #[error("Chart.yaml not found in {path}")]
    MissingChartYaml { path: String },

    #[error("Invalid chart metadata: {message}")]
    InvalidMetadata { message: String },

    #[error("Chart {name} {version} is already present in the index")]
    DuplicateEntry { name: String, version: String },

    #[error("Invalid index file {path}: {message}")]
    InvalidIndex { path: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Invalid version: {0}")]
    InvalidVersion(#[from] semver::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
