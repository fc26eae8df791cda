//! Forge and version-control plumbing for chart-releaser
//!
//! This crate provides:
//! - The [`Forge`] trait and its GitHub REST implementation
//! - The [`Git`] trait and a driver for the `git` command line
//! - A fixed-delay [`RetryPolicy`] used for asset uploads

pub mod error;
pub mod forge;
pub mod git;
pub mod github;
pub mod release;
pub mod retry;

pub use error::{ForgeError, Result};
pub use forge::Forge;
pub use git::{Git, GitCli, push_url_with_token};
pub use github::{DEFAULT_BASE_URL, DEFAULT_UPLOAD_URL, GitHubClient};
pub use release::{Asset, Release};
pub use retry::RetryPolicy;
