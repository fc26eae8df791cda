//! Releaser options

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_PACKAGE_PATH: &str = ".cr-release-packages";
pub const DEFAULT_INDEX_PATH: &str = ".cr-index/index.yaml";
pub const DEFAULT_RELEASE_NAME_TEMPLATE: &str = "{{ .Name }}-{{ .Version }}";
pub const DEFAULT_PAGES_BRANCH: &str = "gh-pages";
pub const DEFAULT_PAGES_INDEX_PATH: &str = "index.yaml";
pub const DEFAULT_REMOTE: &str = "origin";

/// Settings shared by the upload and index phases
///
/// Deserializes from a YAML options file with kebab-case keys; missing keys
/// take their defaults.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Options {
    /// Repository owner
    pub owner: String,

    /// Repository name
    pub git_repo: String,

    /// Directory holding chart packages to upload, and the download cache
    pub package_path: PathBuf,

    pub token: String,

    /// Forge API base URL
    pub git_base_url: String,

    /// Forge asset upload URL
    pub git_upload_url: String,

    /// Commit-ish release tags are created from
    pub commit: String,

    /// Skip packages whose release already exists
    pub skip_existing: bool,

    /// Release name template, rendered against chart metadata
    pub release_name_template: String,

    /// Chart file whose content becomes the release notes
    pub release_notes_file: String,

    pub generate_release_notes: bool,

    pub make_release_latest: bool,

    /// Local index file
    pub index_path: PathBuf,

    /// Branch holding the published index
    pub pages_branch: String,

    /// Index file path inside the pages branch
    pub pages_index_path: String,

    /// Git remote to push to
    pub remote: String,

    /// Push the updated index to the pages branch
    pub push: bool,

    /// Open a pull request with the updated index
    pub pr: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            owner: String::new(),
            git_repo: String::new(),
            package_path: PathBuf::from(DEFAULT_PACKAGE_PATH),
            token: String::new(),
            git_base_url: cr_forge::DEFAULT_BASE_URL.to_string(),
            git_upload_url: cr_forge::DEFAULT_UPLOAD_URL.to_string(),
            commit: String::new(),
            skip_existing: false,
            release_name_template: DEFAULT_RELEASE_NAME_TEMPLATE.to_string(),
            release_notes_file: String::new(),
            generate_release_notes: false,
            make_release_latest: true,
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            pages_branch: DEFAULT_PAGES_BRANCH.to_string(),
            pages_index_path: DEFAULT_PAGES_INDEX_PATH.to_string(),
            remote: DEFAULT_REMOTE.to_string(),
            push: false,
            pr: false,
        }
    }
}

impl Options {
    /// Whether the index is published through git after it changes
    pub fn publishes_index(&self) -> bool {
        self.push || self.pr
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("owner", &self.owner)
            .field("git_repo", &self.git_repo)
            .field("package_path", &self.package_path)
            .field("token", &if self.token.is_empty() { "" } else { "***" })
            .field("git_base_url", &self.git_base_url)
            .field("git_upload_url", &self.git_upload_url)
            .field("commit", &self.commit)
            .field("skip_existing", &self.skip_existing)
            .field("release_name_template", &self.release_name_template)
            .field("release_notes_file", &self.release_notes_file)
            .field("generate_release_notes", &self.generate_release_notes)
            .field("make_release_latest", &self.make_release_latest)
            .field("index_path", &self.index_path)
            .field("pages_branch", &self.pages_branch)
            .field("pages_index_path", &self.pages_index_path)
            .field("remote", &self.remote)
            .field("push", &self.push)
            .field("pr", &self.pr)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.package_path, PathBuf::from(".cr-release-packages"));
        assert_eq!(options.release_name_template, "{{ .Name }}-{{ .Version }}");
        assert!(options.make_release_latest);
        assert!(!options.publishes_index());
    }

    #[test]
    fn test_from_yaml_fills_defaults() {
        let yaml = "owner: acme\ngit-repo: charts\nskip-existing: true\npages-branch: pages\n";
        let options: Options = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(options.owner, "acme");
        assert_eq!(options.git_repo, "charts");
        assert!(options.skip_existing);
        assert_eq!(options.pages_branch, "pages");
        assert_eq!(options.remote, "origin");
        assert_eq!(options.index_path, PathBuf::from(".cr-index/index.yaml"));
    }

    #[test]
    fn test_debug_hides_token() {
        let options = Options {
            token: "ghp_secret".to_string(),
            ..Default::default()
        };
        let debug = format!("{:?}", options);
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("***"));
    }
}
