//! Chart archive reading and packaging
//!
//! Chart packages are gzipped tarballs whose entries all live under a single
//! top-level directory named after the chart (`nginx/Chart.yaml`,
//! `nginx/templates/...`).

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, Builder, Header};
use walkdir::WalkDir;

use crate::chart::{ChartMetadata, archive_name};
use crate::error::{CoreError, Result};

/// Read every regular file of a chart archive in a single pass
///
/// Returns `(chart-relative path, contents)` pairs with the top-level chart
/// directory stripped.
pub fn read_chart_entries(archive_path: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    let file = File::open(archive_path)?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);
    let mut contents = Vec::new();
    let mut root: Option<String> = None;

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let raw = entry.path()?.to_string_lossy().replace('\\', "/");
        let raw = raw.trim_start_matches("./");
        let Some((top, rel)) = raw.split_once('/') else {
            return Err(CoreError::InvalidChart {
                path: archive_path.display().to_string(),
                message: format!("{} is outside the chart directory", raw),
            });
        };

        match &root {
            Some(r) if r != top => {
                return Err(CoreError::InvalidChart {
                    path: archive_path.display().to_string(),
                    message: format!("multiple top-level directories ({} and {})", r, top),
                });
            }
            Some(_) => {}
            None => root = Some(top.to_string()),
        }

        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        contents.push((rel.to_string(), data));
    }

    Ok(contents)
}

/// Package a chart directory into `<dest_dir>/<name>-<version>.tgz`
///
/// The directory must contain a valid `Chart.yaml`. Hidden files and
/// directories are left out. Entries are written in sorted order with a zero
/// mtime so that the same input always yields the same bytes.
pub fn create_archive(chart_dir: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let chart_yaml = chart_dir.join("Chart.yaml");
    if !chart_yaml.exists() {
        return Err(CoreError::MissingChartYaml {
            path: chart_dir.display().to_string(),
        });
    }
    let metadata = ChartMetadata::from_yaml(&std::fs::read_to_string(&chart_yaml)?)?;

    let files = collect_files(chart_dir)?;

    std::fs::create_dir_all(dest_dir)?;
    let output = dest_dir.join(archive_name(&metadata));

    let file = File::create(&output)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = Builder::new(encoder);

    for rel in &files {
        let content = std::fs::read(chart_dir.join(rel))?;
        let archive_path = format!("{}/{}", metadata.name, rel);
        add_bytes_to_archive(&mut builder, &archive_path, &content)?;
    }

    let encoder = builder.into_inner()?;
    encoder.finish()?;

    tracing::debug!(chart = %metadata.name, path = %output.display(), "packaged chart");
    Ok(output)
}

/// Chart-relative paths of every file under `root`, skipping hidden entries
fn collect_files(root: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = entry.map_err(|e| CoreError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let parts: Vec<_> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().to_string()),
                _ => None,
            })
            .collect();
        files.push(parts.join("/"));
    }

    files.sort();
    Ok(files)
}

/// Add bytes to a tar archive with a given path
fn add_bytes_to_archive<W: Write>(
    builder: &mut Builder<W>,
    archive_path: &str,
    content: &[u8],
) -> Result<()> {
    let mut header = Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_cksum();

    builder.append_data(&mut header, archive_path, content)?;

    Ok(())
}
