//! Release publishing and index reconciliation

use chrono::Utc;
use std::path::{Path, PathBuf};
use url::Url;

use cr_core::{CoreError, IndexFile, LoadedChart, digest_file};
use cr_forge::{Asset, Forge, Git, Release};

use crate::branch::BranchNamer;
use crate::download::Downloader;
use crate::error::{ReleaserError, Result};
use crate::naming::{ReleaseNameTemplate, split_package_name_and_version};
use crate::options::Options;

const CHART_EXTENSION: &str = "tgz";

/// Title of index update pull requests
pub const PULL_REQUEST_TITLE: &str = "Update index.yaml";

/// What an index update did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexOutcome {
    /// No release carried a chart missing from the index
    Unchanged,
    /// The index file was rewritten locally
    Written,
    /// The index was committed and pushed to the pages branch
    Pushed { branch: String },
    /// The index was pushed to a new branch and a pull request opened
    PullRequest { branch: String, url: String },
}

impl IndexOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, IndexOutcome::Unchanged)
    }
}

/// Publishes chart packages as forge releases and keeps the index in sync
pub struct Releaser<F, G> {
    options: Options,
    forge: F,
    git: G,
    downloader: Downloader,
    branches: BranchNamer,
    repo_dir: PathBuf,
}

impl<F: Forge, G: Git> Releaser<F, G> {
    pub fn new(options: Options, forge: F, git: G) -> Self {
        let downloader = Downloader::new(&options.package_path);
        Self {
            options,
            forge,
            git,
            downloader,
            branches: BranchNamer::default(),
            repo_dir: PathBuf::from("."),
        }
    }

    /// Use a specific branch namer (fixed seeds in tests)
    pub fn with_branch_namer(mut self, branches: BranchNamer) -> Self {
        self.branches = branches;
        self
    }

    pub fn with_downloader(mut self, downloader: Downloader) -> Self {
        self.downloader = downloader;
        self
    }

    /// Repository that index worktrees are created from
    pub fn with_repo_dir(mut self, repo_dir: impl Into<PathBuf>) -> Self {
        self.repo_dir = repo_dir.into();
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn forge(&self) -> &F {
        &self.forge
    }

    pub fn git(&self) -> &G {
        &self.git
    }

    // ============ Upload ============

    /// Create a release for every chart package in the package directory
    ///
    /// Packages are processed in path order and the first failure aborts the
    /// run. Releases created before the failure are kept.
    pub async fn create_releases(&self) -> Result<()> {
        let packages = self.list_packages()?;
        if packages.is_empty() {
            return Err(ReleaserError::NoCharts {
                path: self.options.package_path.clone(),
            });
        }

        let template = ReleaseNameTemplate::parse(&self.options.release_name_template)?;

        for package in packages {
            let chart = LoadedChart::load_archive(&package).map_err(|source| {
                ReleaserError::Chart {
                    path: package.clone(),
                    source,
                }
            })?;

            let release = Release {
                name: template.render(&chart.metadata)?,
                description: self.release_notes(&chart),
                assets: release_assets(&package),
                commit: self.options.commit.clone(),
                generate_release_notes: self.options.generate_release_notes,
                make_latest: self.options.make_release_latest,
            };

            if self.options.skip_existing && self.release_exists(&release.name).await {
                tracing::info!(release = %release.name, "Release already exists, skipping");
                continue;
            }

            tracing::info!(release = %release.name, assets = release.assets.len(), "Creating release");
            self.forge
                .create_release(&release)
                .await
                .map_err(|source| ReleaserError::Release {
                    name: release.name.clone(),
                    source,
                })?;
        }

        Ok(())
    }

    /// `*.tgz` files directly under the package directory, sorted
    fn list_packages(&self) -> Result<Vec<PathBuf>> {
        let dir = &self.options.package_path;
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ReleaserError::io(dir, e)),
        };

        let mut packages = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ReleaserError::io(dir, e))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == CHART_EXTENSION) {
                packages.push(path);
            }
        }
        packages.sort();
        Ok(packages)
    }

    /// Release notes from the configured chart file, else the chart description
    fn release_notes(&self, chart: &LoadedChart) -> String {
        let notes_file = &self.options.release_notes_file;
        if !notes_file.is_empty() {
            if let Some(file) = chart.file(notes_file) {
                return String::from_utf8_lossy(&file.data).into_owned();
            }
            tracing::warn!(
                chart = %chart.metadata.name,
                "The release note file {:?} is not present in the chart package",
                notes_file
            );
        }
        chart.metadata.description().to_string()
    }

    /// Lookup failures count as "does not exist"
    async fn release_exists(&self, name: &str) -> bool {
        match self.forge.get_release(name).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                tracing::debug!(release = %name, error = %e, "release lookup failed");
                false
            }
        }
    }

    // ============ Index ============

    /// Bring the index up to date with the forge's releases
    ///
    /// Returns whether the index changed.
    pub async fn update_index_file(&mut self) -> Result<bool> {
        self.update_index().await.map(|outcome| outcome.changed())
    }

    /// Like [`Releaser::update_index_file`], reporting how the index was published
    pub async fn update_index(&mut self) -> Result<IndexOutcome> {
        let releases = self.forge.get_releases().await?;
        for release in &releases {
            tracing::info!(release = %release.name, "Found release");
        }

        if !self.options.publishes_index() {
            let index = self.load_local_index()?;
            let changed = self.reconcile(index, &releases).await?;
            return Ok(if changed {
                IndexOutcome::Written
            } else {
                IndexOutcome::Unchanged
            });
        }

        let committish = format!("{}/{}", self.options.remote, self.options.pages_branch);
        let worktree = self.git.add_worktree(&self.repo_dir, &committish).await?;

        let result = self.update_in_worktree(&worktree, &releases).await;

        if let Err(e) = self.git.remove_worktree(&self.repo_dir, &worktree).await {
            tracing::warn!(worktree = %worktree.display(), error = %e, "failed to remove worktree");
        }

        result
    }

    fn load_local_index(&self) -> Result<IndexFile> {
        let path = &self.options.index_path;
        if path.exists() {
            IndexFile::load(path).map_err(|source| ReleaserError::Index {
                path: path.clone(),
                source,
            })
        } else {
            Ok(IndexFile::new())
        }
    }

    async fn update_in_worktree(
        &mut self,
        worktree: &Path,
        releases: &[Release],
    ) -> Result<IndexOutcome> {
        let published = worktree.join(&self.options.pages_index_path);
        let index = if published.exists() {
            IndexFile::load(&published).map_err(|source| ReleaserError::Index {
                path: published.clone(),
                source,
            })?
        } else {
            IndexFile::new()
        };

        if !self.reconcile(index, releases).await? {
            return Ok(IndexOutcome::Unchanged);
        }

        self.publish_index(worktree, &published).await
    }

    /// Add every missing chart to `index` and write it when anything changed
    async fn reconcile(&self, mut index: IndexFile, releases: &[Release]) -> Result<bool> {
        let mut changed = false;

        for release in releases {
            for asset in &release.assets {
                let Some(url) = asset.url.as_deref() else {
                    continue;
                };
                let Some(file_name) = asset_file_name(asset) else {
                    continue;
                };
                // Anything else attached to the release is not ours
                let Some(stem) = file_name
                    .strip_suffix(CHART_EXTENSION)
                    .and_then(|s| s.strip_suffix('.'))
                else {
                    continue;
                };

                let (name, version) = split_package_name_and_version(stem);
                tracing::info!("Found {}-{}.{}", name, version, CHART_EXTENSION);

                if index.has(name, version) {
                    continue;
                }

                if self.add_to_index(&mut index, url).await? {
                    changed = true;
                }
                break;
            }
        }

        let index_path = &self.options.index_path;
        if !changed {
            tracing::info!(path = %index_path.display(), "Index did not change");
            return Ok(false);
        }

        if let Some(parent) = index_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ReleaserError::io(parent, e))?;
        }

        tracing::info!(path = %index_path.display(), "Updating index");
        index.sort_entries();
        index.generated = Utc::now();
        index
            .write_file(index_path)
            .map_err(|source| ReleaserError::Index {
                path: index_path.clone(),
                source,
            })?;

        Ok(true)
    }

    /// Download, inspect and index one chart package
    ///
    /// Returns false when the chart inside the archive is already indexed
    /// under a different file name.
    async fn add_to_index(&self, index: &mut IndexFile, url: &str) -> Result<bool> {
        let archive = self.downloader.fetch(url).await?;
        let chart_error = |source: CoreError| match source {
            CoreError::Io(e) => ReleaserError::io(&archive, e),
            source => ReleaserError::Chart {
                path: archive.clone(),
                source,
            },
        };

        tracing::info!(path = %archive.display(), "Extracting chart metadata");
        let chart = LoadedChart::load_archive(&archive).map_err(chart_error)?;

        tracing::info!(path = %archive.display(), "Calculating hash");
        let digest = digest_file(&archive).map_err(chart_error)?;

        // The index re-appends the file name to the base URL
        let base_url = url.rsplit_once('/').map(|(base, _)| base).unwrap_or_default();
        let file_name = chart.file_name();

        match index.add(chart.metadata, &file_name, base_url, &digest) {
            Ok(()) => Ok(true),
            Err(CoreError::DuplicateEntry { name, version }) => {
                tracing::warn!(%name, %version, %url, "chart already indexed, ignoring asset");
                Ok(false)
            }
            Err(source) => Err(chart_error(source)),
        }
    }

    /// Commit the written index into the worktree and push it
    async fn publish_index(&mut self, worktree: &Path, published: &Path) -> Result<IndexOutcome> {
        let options = &self.options;

        if let Some(parent) = published.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ReleaserError::io(parent, e))?;
        }
        std::fs::copy(&options.index_path, published)
            .map_err(|e| ReleaserError::io(published, e))?;

        self.git.add(worktree, &[published]).await?;
        self.git
            .commit(worktree, &format!("Update {}", options.pages_index_path))
            .await?;

        let push_url = self.git.push_url(&options.remote, &options.token).await?;

        if options.push {
            let branch = options.pages_branch.clone();
            tracing::info!(%branch, "Pushing to branch");
            self.push_head(worktree, &push_url, &branch).await?;
            return Ok(IndexOutcome::Pushed { branch });
        }

        let branch = self.branches.next_name();
        tracing::info!(%branch, "Pushing to branch");
        self.push_head(worktree, &push_url, &branch).await?;

        let options = &self.options;
        tracing::info!(base = %options.pages_branch, "Creating pull request");
        let url = self
            .forge
            .create_pull_request(
                &options.owner,
                &options.git_repo,
                PULL_REQUEST_TITLE,
                &branch,
                &options.pages_branch,
            )
            .await?;
        tracing::info!(%url, "Pull request created");

        Ok(IndexOutcome::PullRequest { branch, url })
    }

    async fn push_head(&self, worktree: &Path, push_url: &str, branch: &str) -> Result<()> {
        let refspec = format!("HEAD:refs/heads/{}", branch);
        self.git.push(worktree, &[push_url, refspec.as_str()]).await?;
        Ok(())
    }
}

/// Archive plus its provenance file when one sits next to it
fn release_assets(package: &Path) -> Vec<Asset> {
    let mut assets = vec![Asset::local(package)];

    let mut prov = package.as_os_str().to_owned();
    prov.push(".prov");
    let prov = PathBuf::from(prov);
    if prov.exists() {
        assets.push(Asset::local(prov));
    }

    assets
}

/// File name of a remote asset, taken from its download URL when possible
fn asset_file_name(asset: &Asset) -> Option<String> {
    asset
        .url
        .as_deref()
        .and_then(|u| Url::parse(u).ok())
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut s| s.next_back())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .or_else(|| asset.file_name().map(str::to_string))
}
