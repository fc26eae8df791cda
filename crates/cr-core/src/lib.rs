//! Chart releaser core - chart packages and repository index files
//!
//! This crate provides the types shared by the release and index phases:
//! - `LoadedChart`: metadata and embedded files read from a `.tgz` chart package
//! - `IndexFile`: the Helm-compatible `index.yaml` catalog
//! - `digest_file`: SHA-256 digests of chart archives

pub mod archive;
pub mod chart;
pub mod digest;
pub mod error;
pub mod index;

pub use archive::{create_archive, read_chart_entries};
pub use chart::{ChartDependency, ChartFile, ChartMetadata, LoadedChart, Maintainer, archive_name};
pub use digest::{compute_digest, digest_file};
pub use error::{CoreError, Result};
pub use index::{ChartVersion, IndexFile};
