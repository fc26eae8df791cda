//! Chart metadata and loaded chart packages

use serde::{Deserialize, Serialize};
use semver::Version;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::archive;
use crate::error::{CoreError, Result};

/// Contents of a chart's `Chart.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    /// Chart API version (v1 or v2)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,

    /// Chart name (required)
    pub name: String,

    /// Chart version (required, SemVer)
    pub version: String,

    /// Application version
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub app_version: Option<String>,

    /// Kubernetes version constraint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Chart type (application or library)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<ChartDependency>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub maintainers: Vec<Maintainer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    /// Condition path enabling the chart (apiVersion v1 charts)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Comma-separated tags grouping the chart (apiVersion v1 charts)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,

    /// Keys this crate does not model, kept so rewrites are lossless
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl ChartMetadata {
    /// Parse `Chart.yaml` content and validate it
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let metadata: Self = serde_yaml::from_str(yaml)?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// Check the fields every published chart must carry
    pub fn validate(&self) -> Result<()> {
        if self.api_version.is_empty() {
            return Err(CoreError::InvalidMetadata {
                message: "apiVersion is required".to_string(),
            });
        }
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidMetadata {
                message: "name is required".to_string(),
            });
        }
        if self.name.contains('/') || self.name.contains('\\') {
            return Err(CoreError::InvalidMetadata {
                message: format!("chart name {:?} must not contain path separators", self.name),
            });
        }
        if self.version.is_empty() {
            return Err(CoreError::InvalidMetadata {
                message: "version is required".to_string(),
            });
        }
        Version::parse(&self.version).map_err(|e| CoreError::InvalidMetadata {
            message: format!("version {:?} is not valid SemVer: {}", self.version, e),
        })?;
        Ok(())
    }

    /// Parse the version as SemVer
    pub fn parsed_version(&self) -> Option<Version> {
        Version::parse(&self.version).ok()
    }

    /// Description, or an empty string
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

/// Accept unquoted YAML scalars (`appVersion: 7`) as strings
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_yaml::Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string, found {:?}",
            other
        ))),
    }
}

/// Maintainer information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maintainer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Dependency declared in `Chart.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDependency {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(rename = "import-values", default, skip_serializing_if = "Vec::is_empty")]
    pub import_values: Vec<serde_yaml::Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// A file carried inside a chart package that is not part of the chart
/// definition itself (README, NOTES, CHANGELOG, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartFile {
    /// Path relative to the chart root
    pub name: String,
    pub data: Vec<u8>,
}

/// A chart package read from a `.tgz` archive
#[derive(Debug, Clone)]
pub struct LoadedChart {
    /// Archive the chart was read from
    pub path: PathBuf,

    pub metadata: ChartMetadata,

    /// Non-definition files, sorted by name
    pub files: Vec<ChartFile>,
}

impl LoadedChart {
    /// Load chart metadata and embedded files from a chart archive
    pub fn load_archive(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let invalid = |message: String| CoreError::InvalidChart {
            path: path.display().to_string(),
            message,
        };

        let entries = archive::read_chart_entries(path).map_err(|e| match e {
            CoreError::InvalidChart { .. } => e,
            other => invalid(other.to_string()),
        })?;

        let mut chart_yaml = None;
        let mut files = Vec::new();

        for (name, data) in entries {
            if name == "Chart.yaml" {
                chart_yaml = Some(data);
            } else if is_misc_file(&name) {
                files.push(ChartFile { name, data });
            }
        }

        let chart_yaml = chart_yaml.ok_or_else(|| CoreError::MissingChartYaml {
            path: path.display().to_string(),
        })?;
        let text = String::from_utf8(chart_yaml)
            .map_err(|e| invalid(format!("Chart.yaml is not valid UTF-8: {}", e)))?;
        let metadata = ChartMetadata::from_yaml(&text).map_err(|e| invalid(e.to_string()))?;

        files.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Self {
            path: path.to_path_buf(),
            metadata,
            files,
        })
    }

    /// Find an embedded file by its exact chart-relative name
    pub fn file(&self, name: &str) -> Option<&ChartFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Archive file name (e.g. `nginx-1.0.0.tgz`)
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Whether a chart-relative path is a plain file rather than part of the
/// chart definition (metadata, values, templates, subcharts)
fn is_misc_file(name: &str) -> bool {
    const DEFINITION_FILES: &[&str] = &[
        "values.yaml",
        "values.schema.json",
        "Chart.lock",
        "requirements.yaml",
        "requirements.lock",
    ];

    !(DEFINITION_FILES.contains(&name)
        || name.starts_with("templates/")
        || name.starts_with("charts/"))
}

/// Default archive filename for a chart (`<name>-<version>.tgz`)
#[must_use]
pub fn archive_name(metadata: &ChartMetadata) -> String {
    format!("{}-{}.tgz", metadata.name, metadata.version)
}
