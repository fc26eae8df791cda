//! Chart repository index (`index.yaml`)
//!
//! Helm-compatible index format. Entries are keyed by chart name and hold one
//! record per published version; `(name, version)` is unique within an index.

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use crate::chart::ChartMetadata;
use crate::error::{CoreError, Result};

/// Mode of a written index file
#[cfg(unix)]
pub const INDEX_FILE_MODE: u32 = 0o644;

/// Repository index file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFile {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Chart versions by chart name
    #[serde(default)]
    pub entries: BTreeMap<String, Vec<ChartVersion>>,

    /// When this index was last written
    #[serde(default = "Utc::now")]
    pub generated: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    /// Repository server details, e.g. `contextPath`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub server_info: BTreeMap<String, serde_yaml::Value>,

    /// Keys this crate does not model, kept so rewrites are lossless
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn default_api_version() -> String {
    "v1".to_string()
}

impl Default for IndexFile {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            entries: BTreeMap::new(),
            generated: Utc::now(),
            annotations: BTreeMap::new(),
            server_info: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }
}

impl IndexFile {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an index from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load an index from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| CoreError::InvalidIndex {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Whether the index holds this exact chart version
    pub fn has(&self, name: &str, version: &str) -> bool {
        self.get(name, version).is_some()
    }

    /// Look up a chart version
    pub fn get(&self, name: &str, version: &str) -> Option<&ChartVersion> {
        self.entries
            .get(name)?
            .iter()
            .find(|v| v.metadata.version == version)
    }

    /// Number of chart versions across all charts
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a chart version
    ///
    /// The download URL is `base_url/filename`; an empty `base_url` stores the
    /// bare filename. Metadata is validated and an already indexed
    /// `(name, version)` is rejected.
    pub fn add(
        &mut self,
        metadata: ChartMetadata,
        filename: &str,
        base_url: &str,
        digest: &str,
    ) -> Result<()> {
        metadata.validate()?;

        if self.has(&metadata.name, &metadata.version) {
            return Err(CoreError::DuplicateEntry {
                name: metadata.name,
                version: metadata.version,
            });
        }

        let url = if base_url.is_empty() {
            filename.to_string()
        } else {
            format!("{}/{}", base_url.trim_end_matches('/'), filename)
        };

        self.entries
            .entry(metadata.name.clone())
            .or_default()
            .push(ChartVersion {
                metadata,
                urls: vec![url],
                created: Utc::now(),
                digest: digest.to_string(),
                removed: false,
            });

        Ok(())
    }

    /// Sort every chart's versions, newest first
    ///
    /// SemVer versions come first in descending order; anything that does not
    /// parse follows, ordered by its raw string.
    pub fn sort_entries(&mut self) {
        for versions in self.entries.values_mut() {
            versions.sort_by(|a, b| compare_versions_desc(&a.metadata.version, &b.metadata.version));
        }
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write the index to `path`
    ///
    /// Content goes to a temporary file in the same directory which is then
    /// renamed over the target, so readers never observe a partial index.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml()?;
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(yaml.as_bytes())?;
        tmp.flush()?;
        // Temp files are created owner-only; the index is served to others
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(INDEX_FILE_MODE))?;
        }
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn compare_versions_desc(a: &str, b: &str) -> Ordering {
    match (Version::parse(a), Version::parse(b)) {
        (Ok(va), Ok(vb)) => vb.cmp(&va),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// One published chart version in the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartVersion {
    #[serde(flatten)]
    pub metadata: ChartMetadata,

    /// Download URLs for the chart archive
    #[serde(default)]
    pub urls: Vec<String>,

    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,

    /// Hex SHA-256 of the chart archive
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub digest: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub removed: bool,
}

impl ChartVersion {
    /// Primary download URL
    pub fn download_url(&self) -> Option<&str> {
        self.urls.first().map(String::as_str)
    }
}
