//! Upload command - publish chart packages as GitHub releases

use console::style;

use cr_forge::{GitCli, GitHubClient};
use cr_releaser::{Options, Releaser};

use crate::error::{CliError, Result};

pub async fn run(options: Options) -> Result<()> {
    require(&options.owner, "owner", "--owner")?;
    require(&options.git_repo, "git-repo", "--git-repo")?;
    require(&options.token, "token", "--token")?;

    let forge = GitHubClient::new(
        &options.owner,
        &options.git_repo,
        &options.token,
        &options.git_base_url,
        &options.git_upload_url,
    )?;

    let package_path = options.package_path.clone();
    let releaser = Releaser::new(options, forge, GitCli::default());
    releaser.create_releases().await?;

    println!(
        "{} chart packages from {}",
        style("Released").green().bold(),
        package_path.display()
    );
    Ok(())
}

/// Fail with a usage hint when a mandatory option is empty
pub fn require(value: &str, name: &str, flag: &str) -> Result<()> {
    if value.trim().is_empty() {
        let env = format!("CR_{}", name.replace('-', "_").to_uppercase());
        return Err(CliError::input_with_help(
            format!("{} is required", name),
            format!("pass {}, set {} or add `{}:` to the options file", flag, env, name),
        ));
    }
    Ok(())
}
