//! Package command - create chart archives ready for upload

use console::style;
use std::path::{Path, PathBuf};

use cr_core::{LoadedChart, create_archive, digest_file};

use crate::error::Result;

pub fn run(charts: &[PathBuf], package_path: &Path) -> Result<()> {
    for chart_dir in charts {
        let archive = create_archive(chart_dir, package_path)?;
        let chart = LoadedChart::load_archive(&archive)?;
        let digest = digest_file(&archive)?;

        println!(
            "{} {} v{}",
            style("Packaged").cyan().bold(),
            chart.metadata.name,
            chart.metadata.version
        );
        println!("  {} {}", style("Created").green().bold(), archive.display());
        println!("  {} sha256:{}", style("Digest").dim(), &digest[..16]);
    }

    Ok(())
}
