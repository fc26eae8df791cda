//! Version control through the `git` command line

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use url::Url;

use crate::error::{ForgeError, Result};

/// Username GitHub expects alongside an installation or personal token
const TOKEN_USER: &str = "x-access-token";

/// Version-control operations used to publish the catalog
#[async_trait]
pub trait Git: Send + Sync {
    /// Check `committish` out into a new detached worktree and return its path
    async fn add_worktree(&self, dir: &Path, committish: &str) -> Result<PathBuf>;

    /// Remove a worktree created by [`Git::add_worktree`]
    async fn remove_worktree(&self, dir: &Path, path: &Path) -> Result<()>;

    async fn add(&self, dir: &Path, paths: &[&Path]) -> Result<()>;

    async fn commit(&self, dir: &Path, message: &str) -> Result<()>;

    /// Run `git push` with the given arguments
    async fn push(&self, dir: &Path, args: &[&str]) -> Result<()>;

    /// Push URL of `remote` with `token` embedded as credentials
    async fn push_url(&self, remote: &str, token: &str) -> Result<String>;
}

/// [`Git`] backed by the `git` executable
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
    repo_dir: PathBuf,
    worktree_root: Option<PathBuf>,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new(".")
    }
}

impl GitCli {
    /// Driver for the repository at `repo_dir`
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from("git"),
            repo_dir: repo_dir.into(),
            worktree_root: None,
        }
    }

    /// Use a different git executable
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Create worktrees under `root` instead of the system temp directory
    pub fn with_worktree_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.worktree_root = Some(root.into());
        self
    }

    /// Run git in `dir` and return its trimmed stdout
    ///
    /// Only the subcommand is reported on failure, the arguments may carry
    /// credentials.
    async fn run(&self, dir: &Path, args: &[&str]) -> Result<String> {
        let command = format!("git {}", args.first().copied().unwrap_or_default());
        tracing::debug!(%command, dir = %dir.display(), "running git");

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ForgeError::GitFailed {
                command: command.clone(),
                stderr: format!("failed to spawn {}: {}", self.program.display(), e),
            })?;

        if !output.status.success() {
            return Err(ForgeError::GitFailed {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl Git for GitCli {
    async fn add_worktree(&self, dir: &Path, committish: &str) -> Result<PathBuf> {
        // Dropped, and so deleted, unless git accepts it as a worktree
        let mut builder = tempfile::Builder::new();
        builder.prefix("chart-releaser-");
        let worktree = match &self.worktree_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };

        let path = worktree.path().to_string_lossy();
        self.run(dir, &["worktree", "add", "--detach", &path, committish])
            .await?;
        Ok(worktree.keep())
    }

    async fn remove_worktree(&self, dir: &Path, path: &Path) -> Result<()> {
        let path = path.to_string_lossy();
        self.run(dir, &["worktree", "remove", "--force", &path])
            .await
            .map(|_| ())
    }

    async fn add(&self, dir: &Path, paths: &[&Path]) -> Result<()> {
        let paths: Vec<_> = paths.iter().map(|p| p.to_string_lossy()).collect();
        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(|p| &**p));
        self.run(dir, &args).await.map(|_| ())
    }

    async fn commit(&self, dir: &Path, message: &str) -> Result<()> {
        self.run(dir, &["commit", "--message", message])
            .await
            .map(|_| ())
    }

    async fn push(&self, dir: &Path, args: &[&str]) -> Result<()> {
        let mut full = vec!["push"];
        full.extend_from_slice(args);
        self.run(dir, &full).await.map(|_| ())
    }

    async fn push_url(&self, remote: &str, token: &str) -> Result<String> {
        let url = self
            .run(&self.repo_dir, &["remote", "get-url", "--push", remote])
            .await?;
        push_url_with_token(&url, token)
    }
}

/// Rewrite a remote URL into an HTTPS URL authenticated with `token`
///
/// Accepts `https://`, `http://`, `ssh://` and scp-like `git@host:path`
/// remotes. SSH remotes are mapped to HTTPS on the same host.
pub fn push_url_with_token(remote_url: &str, token: &str) -> Result<String> {
    let remote_url = remote_url.trim();
    let invalid = |reason: &str| ForgeError::InvalidRemote {
        url: remote_url.to_string(),
        reason: reason.to_string(),
    };

    let mut url = match Url::parse(remote_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        Ok(url) if url.scheme() == "ssh" => {
            let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
            Url::parse(&format!("https://{}{}", host, url.path()))
                .map_err(|e| invalid(&e.to_string()))?
        }
        Ok(url) => return Err(invalid(&format!("unsupported scheme '{}'", url.scheme()))),
        Err(_) => {
            let (user_host, path) = remote_url
                .split_once(':')
                .ok_or_else(|| invalid("not a URL or scp-like address"))?;
            let host = user_host.rsplit('@').next().unwrap_or(user_host);
            if host.is_empty() || host.contains('/') || path.is_empty() {
                return Err(invalid("not a URL or scp-like address"));
            }
            Url::parse(&format!("https://{}/{}", host, path.trim_start_matches('/')))
                .map_err(|e| invalid(&e.to_string()))?
        }
    };

    if token.is_empty() {
        return Err(ForgeError::AuthFailed {
            message: "a token is required to push".to_string(),
        });
    }

    url.set_username(TOKEN_USER)
        .and_then(|_| url.set_password(Some(token)))
        .map_err(|_| invalid("cannot carry credentials"))?;

    Ok(url.to_string())
}
