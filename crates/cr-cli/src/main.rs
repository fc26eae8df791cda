//! cr - host Helm charts on GitHub releases, indexed on GitHub Pages

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cr_releaser::Options;

mod commands;
mod config;
mod error;
mod exit_codes;

#[derive(Parser)]
#[command(name = "cr")]
#[command(version)]
#[command(about = "Host Helm charts on GitHub releases with an index on GitHub Pages", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Options file (YAML, kebab-case keys) [default: ./cr.yaml, then <config dir>/cr/config.yaml]
    #[arg(long, global = true, env = "CR_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload Helm chart packages to GitHub releases
    Upload(UploadArgs),

    /// Update the Helm repository index file from GitHub releases
    Index(IndexArgs),

    /// Package Helm chart directories into the package path
    Package {
        /// Chart directories to package
        #[arg(required = true)]
        charts: Vec<PathBuf>,

        /// Directory to write packages to [default: .cr-release-packages]
        #[arg(short = 'p', long, env = "CR_PACKAGE_PATH")]
        package_path: Option<PathBuf>,
    },
}

/// Repository options shared by every GitHub-facing command
#[derive(Args)]
struct RepoArgs {
    /// GitHub username or organization
    #[arg(short = 'o', long, env = "CR_OWNER")]
    owner: Option<String>,

    /// GitHub repository
    #[arg(short = 'r', long, env = "CR_GIT_REPO")]
    git_repo: Option<String>,

    /// GitHub auth token
    #[arg(short = 't', long, env = "CR_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Path to the directory with chart packages [default: .cr-release-packages]
    #[arg(short = 'p', long, env = "CR_PACKAGE_PATH")]
    package_path: Option<PathBuf>,

    /// GitHub Base URL (only needed for private GitHub) [default: https://api.github.com/]
    #[arg(short = 'b', long, env = "CR_GIT_BASE_URL")]
    git_base_url: Option<String>,

    /// GitHub Upload URL (only needed for private GitHub) [default: https://uploads.github.com/]
    #[arg(short = 'u', long, env = "CR_GIT_UPLOAD_URL")]
    git_upload_url: Option<String>,
}

impl RepoArgs {
    fn apply(self, options: &mut Options) {
        set(&mut options.owner, self.owner);
        set(&mut options.git_repo, self.git_repo);
        set(&mut options.token, self.token);
        set(&mut options.package_path, self.package_path);
        set(&mut options.git_base_url, self.git_base_url);
        set(&mut options.git_upload_url, self.git_upload_url);
    }
}

#[derive(Args)]
struct UploadArgs {
    #[command(flatten)]
    repo: RepoArgs,

    /// Target commit for the release tags
    #[arg(short = 'c', long, env = "CR_COMMIT")]
    commit: Option<String>,

    /// Skip packages whose release already exists
    #[arg(long, env = "CR_SKIP_EXISTING", num_args = 0..=1, default_missing_value = "true")]
    skip_existing: Option<bool>,

    /// Release name template [default: "{{ .Name }}-{{ .Version }}"]
    #[arg(long, env = "CR_RELEASE_NAME_TEMPLATE")]
    release_name_template: Option<String>,

    /// Chart file whose content is used as release notes
    #[arg(long, env = "CR_RELEASE_NOTES_FILE")]
    release_notes_file: Option<String>,

    /// Let GitHub generate the release notes
    #[arg(long, env = "CR_GENERATE_RELEASE_NOTES", num_args = 0..=1, default_missing_value = "true")]
    generate_release_notes: Option<bool>,

    /// Mark the created releases as latest [default: true]
    #[arg(long, env = "CR_MAKE_RELEASE_LATEST", num_args = 0..=1, default_missing_value = "true")]
    make_release_latest: Option<bool>,
}

impl UploadArgs {
    fn apply(self, options: &mut Options) {
        self.repo.apply(options);
        set(&mut options.commit, self.commit);
        set(&mut options.skip_existing, self.skip_existing);
        set(&mut options.release_name_template, self.release_name_template);
        set(&mut options.release_notes_file, self.release_notes_file);
        set(&mut options.generate_release_notes, self.generate_release_notes);
        set(&mut options.make_release_latest, self.make_release_latest);
    }
}

#[derive(Args)]
struct IndexArgs {
    #[command(flatten)]
    repo: RepoArgs,

    /// Path to the index file [default: .cr-index/index.yaml]
    #[arg(short = 'i', long, env = "CR_INDEX_PATH")]
    index_path: Option<PathBuf>,

    /// The GitHub pages branch [default: gh-pages]
    #[arg(long, env = "CR_PAGES_BRANCH")]
    pages_branch: Option<String>,

    /// The GitHub pages index path [default: index.yaml]
    #[arg(long, env = "CR_PAGES_INDEX_PATH")]
    pages_index_path: Option<String>,

    /// The Git remote used when creating a local worktree for the GitHub Pages branch [default: origin]
    #[arg(long, env = "CR_REMOTE")]
    remote: Option<String>,

    /// Push index.yaml to the GitHub Pages branch
    #[arg(long, env = "CR_PUSH", num_args = 0..=1, default_missing_value = "true")]
    push: Option<bool>,

    /// Create a pull request for index.yaml against the GitHub Pages branch
    #[arg(long, env = "CR_PR", num_args = 0..=1, default_missing_value = "true")]
    pr: Option<bool>,
}

impl IndexArgs {
    fn apply(self, options: &mut Options) {
        self.repo.apply(options);
        set(&mut options.index_path, self.index_path);
        set(&mut options.pages_branch, self.pages_branch);
        set(&mut options.pages_index_path, self.pages_index_path);
        set(&mut options.remote, self.remote);
        set(&mut options.push, self.push);
        set(&mut options.pr, self.pr);
    }
}

/// Overwrite `slot` when a flag or environment variable supplied a value
fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,cr={level},cr_core={level},cr_forge={level},cr_releaser={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> error::Result<()> {
    let mut options = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Upload(args) => {
            args.apply(&mut options);
            commands::upload::run(options).await
        }
        Commands::Index(args) => {
            args.apply(&mut options);
            commands::index::run(options).await
        }
        Commands::Package {
            charts,
            package_path,
        } => {
            set(&mut options.package_path, package_path);
            commands::package::run(&charts, &options.package_path)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS),
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}
