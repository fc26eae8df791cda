//! In-memory forge and git doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use cr_forge::{Asset, Forge, ForgeError, Git, Release};
use cr_releaser::Options;

/// Counts of forge calls for assertions
#[derive(Debug, Default, Clone)]
pub struct ForgeCounts {
    pub creates: usize,
    pub gets: usize,
    pub lists: usize,
    pub pull_requests: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub owner: String,
    pub repo: String,
    pub message: String,
    pub head: String,
    pub base: String,
}

#[derive(Default)]
struct ForgeState {
    releases: Vec<Release>,
    created: Vec<Release>,
    pull_requests: Vec<PullRequest>,
    counts: ForgeCounts,
}

/// Forge storing releases in memory
#[derive(Default)]
pub struct FakeForge {
    state: Mutex<ForgeState>,
    failing_creates: HashSet<String>,
    failing_lookups: bool,
}

impl FakeForge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_releases(releases: Vec<Release>) -> Self {
        let forge = Self::new();
        forge.state.lock().unwrap().releases = releases;
        forge
    }

    /// Make `create_release` fail for this release name
    pub fn failing_create(mut self, name: &str) -> Self {
        self.failing_creates.insert(name.to_string());
        self
    }

    /// Make every `get_release` fail
    pub fn failing_lookups(mut self) -> Self {
        self.failing_lookups = true;
        self
    }

    pub fn counts(&self) -> ForgeCounts {
        self.state.lock().unwrap().counts.clone()
    }

    pub fn created(&self) -> Vec<Release> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn pull_requests(&self) -> Vec<PullRequest> {
        self.state.lock().unwrap().pull_requests.clone()
    }
}

#[async_trait]
impl Forge for FakeForge {
    async fn create_release(&self, release: &Release) -> cr_forge::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.counts.creates += 1;
        if self.failing_creates.contains(&release.name) {
            return Err(ForgeError::UploadFailed {
                path: release.name.clone(),
                message: "boom".to_string(),
            });
        }
        state.created.push(release.clone());
        state.releases.push(release.clone());
        Ok(())
    }

    async fn get_release(&self, tag: &str) -> cr_forge::Result<Option<Release>> {
        let mut state = self.state.lock().unwrap();
        state.counts.gets += 1;
        if self.failing_lookups {
            return Err(ForgeError::NetworkError {
                message: "connection reset".to_string(),
            });
        }
        Ok(state.releases.iter().find(|r| r.name == tag).cloned())
    }

    async fn get_releases(&self) -> cr_forge::Result<Vec<Release>> {
        let mut state = self.state.lock().unwrap();
        state.counts.lists += 1;
        Ok(state.releases.clone())
    }

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        message: &str,
        head: &str,
        base: &str,
    ) -> cr_forge::Result<String> {
        let mut state = self.state.lock().unwrap();
        state.counts.pull_requests += 1;
        state.pull_requests.push(PullRequest {
            owner: owner.to_string(),
            repo: repo.to_string(),
            message: message.to_string(),
            head: head.to_string(),
            base: base.to_string(),
        });
        Ok(format!(
            "https://github.com/{}/{}/pull/{}",
            owner,
            repo,
            state.pull_requests.len()
        ))
    }
}

/// Git double recording every call
///
/// Worktrees are plain directories under `root`, optionally seeded with a
/// published index.
pub struct FakeGit {
    root: PathBuf,
    seed_index: Option<(String, String)>,
    calls: Mutex<Vec<String>>,
    worktrees: Mutex<usize>,
}

impl FakeGit {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            seed_index: None,
            calls: Mutex::new(Vec::new()),
            worktrees: Mutex::new(0),
        }
    }

    /// Place `content` at `path` in every new worktree
    pub fn with_published_index(mut self, path: &str, content: &str) -> Self {
        self.seed_index = Some((path.to_string(), content.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Git for FakeGit {
    async fn add_worktree(&self, _dir: &Path, committish: &str) -> cr_forge::Result<PathBuf> {
        let n = {
            let mut count = self.worktrees.lock().unwrap();
            *count += 1;
            *count
        };
        let worktree = self.root.join(format!("worktree-{}", n));
        std::fs::create_dir_all(&worktree)?;
        if let Some((path, content)) = &self.seed_index {
            std::fs::write(worktree.join(path), content)?;
        }
        self.record(format!("add_worktree {}", committish));
        Ok(worktree)
    }

    async fn remove_worktree(&self, _dir: &Path, path: &Path) -> cr_forge::Result<()> {
        std::fs::remove_dir_all(path)?;
        self.record("remove_worktree".to_string());
        Ok(())
    }

    async fn add(&self, dir: &Path, paths: &[&Path]) -> cr_forge::Result<()> {
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.strip_prefix(dir).unwrap_or(p).display().to_string())
            .collect();
        self.record(format!("add {}", names.join(" ")));
        Ok(())
    }

    async fn commit(&self, _dir: &Path, message: &str) -> cr_forge::Result<()> {
        self.record(format!("commit {}", message));
        Ok(())
    }

    async fn push(&self, _dir: &Path, args: &[&str]) -> cr_forge::Result<()> {
        self.record(format!("push {}", args.join(" ")));
        Ok(())
    }

    async fn push_url(&self, remote: &str, token: &str) -> cr_forge::Result<String> {
        self.record(format!("push_url {}", remote));
        cr_forge::push_url_with_token("https://github.com/owner/charts.git", token)
    }
}

/// Package a chart into `dest` and return the archive path
pub fn package_chart(dest: &Path, name: &str, version: &str, files: &[(&str, &str)]) -> PathBuf {
    let src = tempfile::TempDir::new().unwrap();
    let chart_yaml = format!(
        "apiVersion: v2\nname: {}\nversion: {}\ndescription: A Helm chart for Kubernetes\n",
        name, version
    );
    std::fs::write(src.path().join("Chart.yaml"), chart_yaml).unwrap();
    std::fs::write(src.path().join("values.yaml"), "replicaCount: 1\n").unwrap();
    for (file, content) in files {
        let path = src.path().join(file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
    cr_core::create_archive(src.path(), dest).unwrap()
}

/// A release as the forge reports it back
pub fn remote_release(name: &str, base_url: &str, assets: &[&str]) -> Release {
    Release {
        name: name.to_string(),
        assets: assets
            .iter()
            .map(|a| Asset::remote(*a, format!("{}/{}/{}", base_url, name, a)))
            .collect(),
        ..Default::default()
    }
}

pub const DOWNLOAD_BASE: &str = "https://github.com/owner/charts/releases/download";

/// Options rooted in a scratch directory
pub fn options(root: &Path) -> Options {
    Options {
        owner: "owner".to_string(),
        git_repo: "charts".to_string(),
        token: "s3cret".to_string(),
        package_path: root.join("packages"),
        index_path: root.join(".cr-index").join("index.yaml"),
        ..Default::default()
    }
}
