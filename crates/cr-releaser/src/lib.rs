//! Chart releaser: publish chart packages as GitHub releases and maintain the
//! chart repository index built from those releases
//!
//! The [`Releaser`] drives both phases through the [`cr_forge::Forge`] and
//! [`cr_forge::Git`] traits:
//! - upload: every `*.tgz` in the package directory becomes a release
//! - index: every release asset missing from `index.yaml` is downloaded,
//!   inspected and added, then the index is optionally pushed or proposed in
//!   a pull request

pub mod branch;
pub mod download;
pub mod error;
pub mod naming;
pub mod options;
pub mod releaser;

pub use branch::BranchNamer;
pub use download::Downloader;
pub use error::{ErrorKind, ReleaserError, Result};
pub use naming::{ReleaseNameTemplate, split_package_name_and_version};
pub use options::Options;
pub use releaser::{IndexOutcome, PULL_REQUEST_TITLE, Releaser};
