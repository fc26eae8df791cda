//! Index command - reconcile index.yaml with GitHub releases

use console::style;

use cr_forge::{GitCli, GitHubClient};
use cr_releaser::{IndexOutcome, Options, Releaser};

use super::upload::require;
use crate::error::Result;

pub async fn run(options: Options) -> Result<()> {
    require(&options.owner, "owner", "--owner")?;
    require(&options.git_repo, "git-repo", "--git-repo")?;
    if options.publishes_index() {
        require(&options.token, "token", "--token")?;
    }

    let forge = GitHubClient::new(
        &options.owner,
        &options.git_repo,
        &options.token,
        &options.git_base_url,
        &options.git_upload_url,
    )?;

    let index_path = options.index_path.clone();
    let mut releaser = Releaser::new(options, forge, GitCli::default());

    match releaser.update_index().await? {
        IndexOutcome::Unchanged => println!(
            "{} {} did not change",
            style("Index").bold(),
            index_path.display()
        ),
        IndexOutcome::Written => println!(
            "{} {}",
            style("Updated").green().bold(),
            index_path.display()
        ),
        IndexOutcome::Pushed { branch } => println!(
            "{} {} and pushed to {}",
            style("Updated").green().bold(),
            index_path.display(),
            style(branch).cyan()
        ),
        IndexOutcome::PullRequest { url, .. } => println!(
            "{} {}\n  {} {}",
            style("Updated").green().bold(),
            index_path.display(),
            style("Pull request").cyan().bold(),
            url
        ),
    }

    Ok(())
}
