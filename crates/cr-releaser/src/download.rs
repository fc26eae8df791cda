//! Chart package downloads with a by-name local cache

use std::io::Write;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{ReleaserError, Result};

/// Mode of a downloaded package, readable by later pipeline steps
#[cfg(unix)]
const PACKAGE_FILE_MODE: u32 = 0o644;

/// Downloads release assets into a cache directory
///
/// A file already present under the asset's name is reused without any
/// request or checksum verification.
pub struct Downloader {
    client: reqwest::Client,
    cache_dir: PathBuf,
}

impl Downloader {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self::with_client(reqwest::Client::new(), cache_dir)
    }

    pub fn with_client(client: reqwest::Client, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Fetch `url` into the cache and return the local path
    pub async fn fetch(&self, url: &str) -> Result<PathBuf> {
        let invalid = |message: &str| ReleaserError::InvalidUrl {
            url: url.to_string(),
            message: message.to_string(),
        };

        let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("only http and https downloads are supported"));
        }
        let file_name = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| invalid("no file name in URL path"))?
            .to_string();

        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| ReleaserError::io(&self.cache_dir, e))?;

        let target = self.cache_dir.join(&file_name);
        if target.exists() {
            tracing::info!(path = %target.display(), "File already exists");
            return Ok(target);
        }

        let download_error = |message: String| ReleaserError::Download {
            url: url.to_string(),
            message,
        };

        tracing::debug!(%url, "downloading");
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| download_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_error(format!("error response: {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| download_error(e.to_string()))?;

        // Only complete downloads land under the cached name
        let mut tmp = tempfile::NamedTempFile::new_in(&self.cache_dir)
            .map_err(|e| ReleaserError::io(&self.cache_dir, e))?;
        tmp.write_all(&body)
            .map_err(|e| ReleaserError::io(tmp.path(), e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(PACKAGE_FILE_MODE))
                .map_err(|e| ReleaserError::io(tmp.path(), e))?;
        }
        tmp.persist(&target)
            .map_err(|e| ReleaserError::io(&target, e.error))?;

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ASSET: &str = "/owner/repo/releases/download/test-chart-0.1.0/test-chart-0.1.0.tgz";

    #[tokio::test]
    async fn test_fetch_then_reuse_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ASSET))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let cache = temp.path().join("packages");
        let downloader = Downloader::new(&cache);
        let url = format!("{}{}", server.uri(), ASSET);

        let first = downloader.fetch(&url).await.unwrap();
        assert_eq!(first, cache.join("test-chart-0.1.0.tgz"));
        assert_eq!(std::fs::read(&first).unwrap(), b"archive");

        let second = downloader.fetch(&url).await.unwrap();
        assert_eq!(first, second);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_downloaded_package_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(ASSET))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive".to_vec()))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let downloader = Downloader::new(temp.path());
        let file = downloader
            .fetch(&format!("{}{}", server.uri(), ASSET))
            .await
            .unwrap();

        let mode = std::fs::metadata(&file).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[tokio::test]
    async fn test_existing_file_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("test-chart-0.1.0.tgz"), b"cached").unwrap();

        let downloader = Downloader::new(temp.path());
        let path = downloader
            .fetch(&format!("{}{}", server.uri(), ASSET))
            .await
            .unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"cached");
    }

    #[tokio::test]
    async fn test_error_status_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let downloader = Downloader::new(temp.path());
        let err = downloader
            .fetch(&format!("{}{}", server.uri(), ASSET))
            .await
            .unwrap_err();

        assert!(matches!(err, ReleaserError::Download { .. }));
        assert!(err.to_string().contains("404"));
        assert!(!temp.path().join("test-chart-0.1.0.tgz").exists());
    }

    #[tokio::test]
    async fn test_invalid_urls() {
        let temp = TempDir::new().unwrap();
        let downloader = Downloader::new(temp.path());

        for url in ["not a url", "ftp://example.com/a.tgz", "https://example.com/"] {
            let err = downloader.fetch(url).await.unwrap_err();
            assert!(matches!(err, ReleaserError::InvalidUrl { .. }), "{url}");
        }
    }
}
