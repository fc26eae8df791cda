//! GitHub REST client for releases and pull requests

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

use crate::error::{ForgeError, Result};
use crate::forge::Forge;
use crate::release::{Asset, Release};
use crate::retry::RetryPolicy;

/// Public GitHub API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.github.com/";

/// Public GitHub asset upload endpoint
pub const DEFAULT_UPLOAD_URL: &str = "https://uploads.github.com/";

const PER_PAGE: &str = "100";

/// GitHub client bound to one repository
pub struct GitHubClient {
    owner: String,
    repo: String,
    client: reqwest::Client,
    base_url: Url,
    upload_url: Url,
    retry: RetryPolicy,
}

impl GitHubClient {
    /// Create a client for `owner/repo`
    ///
    /// An empty token sends unauthenticated requests. Both endpoints must be
    /// absolute URLs; a trailing slash is added when missing.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: &str,
        base_url: &str,
        upload_url: &str,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static("2022-11-28"));

        if !token.is_empty() {
            let mut auth = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                ForgeError::AuthFailed {
                    message: "token contains characters not allowed in a header".to_string(),
                }
            })?;
            auth.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, auth);
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("chart-releaser/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| ForgeError::NetworkError {
                message: e.to_string(),
            })?;

        Ok(Self {
            owner: owner.into(),
            repo: repo.into(),
            client,
            base_url: parse_endpoint(base_url)?,
            upload_url: parse_endpoint(upload_url)?,
            retry: RetryPolicy::default(),
        })
    }

    /// Override the asset upload retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    fn repo_endpoint(&self, base: &Url, extra: &[&str]) -> Url {
        let mut segments = vec!["repos", self.owner.as_str(), self.repo.as_str()];
        segments.extend_from_slice(extra);
        endpoint(base, &segments)
    }

    /// Upload one file to a release, retrying per the configured policy
    async fn upload_release_asset(&self, release_id: u64, path: &Path) -> Result<()> {
        let path = std::path::absolute(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| ForgeError::UploadFailed {
                path: path.display().to_string(),
                message: "path has no file name".to_string(),
            })?;

        let id = release_id.to_string();
        let mut url = self.repo_endpoint(&self.upload_url, &["releases", &id, "assets"]);
        url.query_pairs_mut().append_pair("name", &name);

        tracing::info!(asset = %name, "uploading release asset");

        let client = &self.client;
        let url = &url;
        let file = path.as_path();
        self.retry
            .run(|| async move {
                let data = tokio::fs::read(file).await?;
                let response = client
                    .post(url.clone())
                    .header(header::CONTENT_TYPE, "application/octet-stream")
                    .body(data)
                    .send()
                    .await?;
                check(response).await.map(|_| ())
            })
            .await
            .map_err(|e| ForgeError::UploadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl Forge for GitHubClient {
    async fn create_release(&self, release: &Release) -> Result<()> {
        let request = CreateReleaseRequest {
            tag_name: &release.name,
            name: &release.name,
            body: &release.description,
            target_commitish: (!release.commit.is_empty()).then_some(release.commit.as_str()),
            generate_release_notes: release.generate_release_notes,
            make_latest: if release.make_latest { "true" } else { "false" },
        };

        tracing::debug!(release = %release.name, "creating release");
        let response = self
            .client
            .post(self.repo_endpoint(&self.base_url, &["releases"]))
            .json(&request)
            .send()
            .await?;
        let created: GhRelease = check(response).await?.json().await?;

        for asset in &release.assets {
            self.upload_release_asset(created.id, asset.path()).await?;
        }

        Ok(())
    }

    async fn get_release(&self, tag: &str) -> Result<Option<Release>> {
        let url = self.repo_endpoint(&self.base_url, &["releases", "tags", tag]);
        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let release: GhRelease = check(response).await?.json().await?;
        Ok(Some(release.into()))
    }

    async fn get_releases(&self) -> Result<Vec<Release>> {
        let mut first = self.repo_endpoint(&self.base_url, &["releases"]);
        first.query_pairs_mut().append_pair("per_page", PER_PAGE);

        let mut releases = Vec::new();
        let mut next = Some(first);

        while let Some(url) = next {
            tracing::debug!(%url, "listing releases");
            let response = check(self.client.get(url).send().await?).await?;
            next = next_page_link(response.headers());
            let page: Vec<GhRelease> = response.json().await?;
            releases.extend(page.into_iter().map(Release::from));
        }

        Ok(releases)
    }

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        message: &str,
        head: &str,
        base: &str,
    ) -> Result<String> {
        let (title, body) = match message.split_once('\n') {
            Some((title, rest)) => (title, Some(rest.trim())),
            None => (message, None),
        };

        let request = NewPullRequest {
            title,
            head,
            base,
            body,
        };

        let url = endpoint(&self.base_url, &["repos", owner, repo, "pulls"]);
        let response = self.client.post(url).json(&request).send().await?;
        let pr: GhPullRequest = check(response).await?.json().await?;
        Ok(pr.html_url)
    }
}

/// Parse and normalize an API endpoint
fn parse_endpoint(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|e| ForgeError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(ForgeError::InvalidUrl {
            url: raw.to_string(),
            reason: "not a base URL".to_string(),
        });
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Append percent-encoded path segments to a base URL
fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Extract the `rel="next"` target of a `Link` header
fn next_page_link(headers: &HeaderMap) -> Option<Url> {
    let link = headers.get(header::LINK)?.to_str().ok()?;

    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        let is_next = params.split(';').any(|p| p.trim() == "rel=\"next\"");
        if !is_next {
            return None;
        }
        let target = target.trim().trim_start_matches('<').trim_end_matches('>');
        Url::parse(target).ok()
    })
}

/// Turn a non-success response into an error
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|e| e.message)
        .unwrap_or(body);

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ForgeError::AuthFailed {
            message: format!("{} ({})", message, url),
        },
        _ => ForgeError::HttpError {
            status: status.as_u16(),
            message: format!("{}: {}", url, message),
        },
    })
}

// ============ Wire types ============

#[derive(Debug, Serialize)]
struct CreateReleaseRequest<'a> {
    tag_name: &'a str,
    name: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_commitish: Option<&'a str>,
    generate_release_notes: bool,
    make_latest: &'static str,
}

#[derive(Debug, Serialize)]
struct NewPullRequest<'a> {
    title: &'a str,
    head: &'a str,
    base: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GhRelease {
    id: u64,
    tag_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    target_commitish: Option<String>,
    #[serde(default)]
    assets: Vec<GhAsset>,
}

#[derive(Debug, Deserialize)]
struct GhAsset {
    name: String,
    browser_download_url: String,
}

#[derive(Debug, Deserialize)]
struct GhPullRequest {
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl From<GhRelease> for Release {
    fn from(r: GhRelease) -> Self {
        Release {
            name: r.name.filter(|n| !n.is_empty()).unwrap_or(r.tag_name),
            description: r.body.unwrap_or_default(),
            assets: r
                .assets
                .into_iter()
                .map(|a| Asset::remote(a.name, a.browser_download_url))
                .collect(),
            commit: r.target_commitish.unwrap_or_default(),
            ..Default::default()
        }
    }
}
