//! Forge capability: the release and pull-request operations the releaser
//! needs from a hosted git service

use async_trait::async_trait;

use crate::error::Result;
use crate::release::Release;

#[async_trait]
pub trait Forge: Send + Sync {
    /// Create a release and upload all of its assets
    async fn create_release(&self, release: &Release) -> Result<()>;

    /// Look up a release by tag, `None` when it does not exist
    async fn get_release(&self, tag: &str) -> Result<Option<Release>>;

    /// Every release of the repository, across all pages
    async fn get_releases(&self) -> Result<Vec<Release>>;

    /// Open a pull request and return its URL
    ///
    /// The first line of `message` is the title, the trimmed remainder the body.
    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        message: &str,
        head: &str,
        base: &str,
    ) -> Result<String>;
}
