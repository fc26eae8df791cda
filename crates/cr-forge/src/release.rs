//! Release descriptors exchanged with the forge

use std::path::{Path, PathBuf};

/// A forge release
///
/// Built locally before publishing, or read back from the forge. Releases read
/// back carry only a name and their assets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Release {
    /// Release name, also used as the tag
    pub name: String,

    /// Release notes body
    pub description: String,

    /// Files attached to the release
    pub assets: Vec<Asset>,

    /// Commit-ish the tag is created from (empty for the default branch)
    pub commit: String,

    /// Let the forge generate the release notes
    pub generate_release_notes: bool,

    /// Mark the release as the repository's latest
    pub make_latest: bool,
}

/// A file attached to a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Local path when uploading, asset name when read back
    pub path: PathBuf,

    /// Download URL, only known for assets read back from the forge
    pub url: Option<String>,
}

impl Asset {
    /// Asset for a local file
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            url: None,
        }
    }

    /// Asset as reported by the forge
    pub fn remote(name: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            path: name.into(),
            url: Some(url.into()),
        }
    }

    /// File name of the asset
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_file_name() {
        let asset = Asset::local("/tmp/packages/nginx-1.0.0.tgz");
        assert_eq!(asset.file_name(), Some("nginx-1.0.0.tgz"));
        assert!(asset.url.is_none());

        let remote = Asset::remote("nginx-1.0.0.tgz", "https://example.com/nginx-1.0.0.tgz");
        assert_eq!(remote.file_name(), Some("nginx-1.0.0.tgz"));
        assert_eq!(remote.url.as_deref(), Some("https://example.com/nginx-1.0.0.tgz"));
    }
}
