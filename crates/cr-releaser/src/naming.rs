//! Release names and package file names

use minijinja::{Environment, UndefinedBehavior, Value, context};
use regex::Regex;
use std::sync::LazyLock;

use cr_core::ChartMetadata;

use crate::error::{ReleaserError, Result};

/// A `{{ ... }}` tag
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{.*?\}\}").expect("valid regex"));

/// A Go-template field reference (`.Name`) inside a tag
static FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[\s(|,{-])\.([A-Za-z_])").expect("valid regex"));

/// Release name template rendered against chart metadata
///
/// Accepts both the Go-template spelling (`{{ .Name }}-{{ .Version }}`) and
/// plain Jinja (`{{ Name }}-{{ Version }}`). Fields follow the capitalized
/// `Chart.yaml` field names: `Name`, `Version`, `AppVersion`, `Description`,
/// `APIVersion`, `KubeVersion`, `Type`, `Home`, `Icon`, `Keywords`,
/// `Sources`, `Deprecated`, `Annotations`.
pub struct ReleaseNameTemplate {
    raw: String,
    env: Environment<'static>,
}

const TEMPLATE_NAME: &str = "release-name";

impl ReleaseNameTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_template_owned(TEMPLATE_NAME, normalize(template))
            .map_err(|e| invalid_template(template, &e))?;

        Ok(Self {
            raw: template.to_string(),
            env,
        })
    }

    /// Render the release name for a chart
    pub fn render(&self, metadata: &ChartMetadata) -> Result<String> {
        let name = self
            .env
            .get_template(TEMPLATE_NAME)
            .and_then(|tmpl| tmpl.render(template_context(metadata)))
            .map_err(|e| invalid_template(&self.raw, &e))?;

        if name.trim().is_empty() {
            return Err(ReleaserError::InvalidTemplate {
                template: self.raw.clone(),
                message: format!("renders an empty name for chart {}", metadata.name),
            });
        }

        Ok(name)
    }
}

fn invalid_template(template: &str, error: &minijinja::Error) -> ReleaserError {
    ReleaserError::InvalidTemplate {
        template: template.to_string(),
        message: error.to_string(),
    }
}

/// Strip the leading dot of Go-style field references inside tags
fn normalize(template: &str) -> String {
    TAG.replace_all(template, |caps: &regex::Captures<'_>| {
        FIELD.replace_all(&caps[0], "${1}${2}").into_owned()
    })
    .into_owned()
}

fn template_context(md: &ChartMetadata) -> Value {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();

    context! {
        Name => &md.name,
        Version => &md.version,
        AppVersion => opt(&md.app_version),
        Description => md.description(),
        APIVersion => &md.api_version,
        KubeVersion => opt(&md.kube_version),
        Type => opt(&md.r#type),
        Home => opt(&md.home),
        Icon => opt(&md.icon),
        Keywords => &md.keywords,
        Sources => &md.sources,
        Deprecated => md.deprecated,
        Annotations => &md.annotations,
    }
}

/// Split a package file stem (`nginx-ingress-1.2.3`) into name and version
///
/// The split happens at the last hyphen, so versions with hyphenated
/// pre-release identifiers are misattributed (`app-1.0.0-rc1` yields
/// `app-1.0.0` / `rc1`).
///
/// # Panics
///
/// Panics when the stem contains no hyphen. Chart packages are always named
/// `<name>-<version>.tgz`.
pub fn split_package_name_and_version(stem: &str) -> (&str, &str) {
    match stem.rfind('-') {
        Some(idx) => (&stem[..idx], &stem[idx + 1..]),
        None => panic!("package name {stem:?} has no name-version separator"),
    }
}
