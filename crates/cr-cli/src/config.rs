//! Options file loading
//!
//! Options come from, in decreasing priority: command-line flags, `CR_*`
//! environment variables (both handled by clap), an options file, defaults.

use std::path::{Path, PathBuf};

use cr_releaser::Options;

use crate::error::{CliError, Result};

/// Options file looked up in the working directory
pub const LOCAL_CONFIG: &str = "cr.yaml";

/// Load options from `explicit`, or from the first options file found
///
/// An explicitly given file must exist. Without one, `cr.yaml` in the working
/// directory and then `<config dir>/cr/config.yaml` are tried; when neither
/// exists the defaults are returned.
pub fn load(explicit: Option<&Path>) -> Result<Options> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match discover() {
            Some(path) => path,
            None => return Ok(Options::default()),
        },
    };

    tracing::debug!(path = %path.display(), "loading options file");
    load_from(&path)
}

pub fn load_from(path: &Path) -> Result<Options> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::config(path, e.to_string()))?;
    if content.trim().is_empty() {
        return Ok(Options::default());
    }
    serde_yaml::from_str(&content).map_err(|e| CliError::config(path, e.to_string()))
}

fn discover() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG);
    if local.is_file() {
        return Some(local);
    }

    let user = dirs::config_dir()?.join("cr").join("config.yaml");
    user.is_file().then_some(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cr.yaml");
        std::fs::write(
            &path,
            "owner: acme\ngit-repo: charts\nrelease-name-template: \"v{{ .Version }}\"\nmake-release-latest: false\n",
        )
        .unwrap();

        let options = load(Some(&path)).unwrap();
        assert_eq!(options.owner, "acme");
        assert_eq!(options.git_repo, "charts");
        assert_eq!(options.release_name_template, "v{{ .Version }}");
        assert!(!options.make_release_latest);
        assert_eq!(options.pages_branch, "gh-pages");
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cr.yaml");
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(load_from(&path).unwrap(), Options::default());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = load(Some(Path::new("/nonexistent/cr.yaml"))).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cr.yaml");
        std::fs::write(&path, "skip-existing: [not, a, bool]\n").unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(err.to_string().contains("cr.yaml"));
    }
}
