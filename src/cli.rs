use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "git-keepalive",
    version,
    about = "Keeps scheduled CI workflows alive on quiet repositories"
)]
pub struct Cli {
    /// Output machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to a TOML file with default option values
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Keep the repository active by creating an empty commit
    Commit(CommitArgs),
    /// Keep workflows enabled through the hosting platform's API
    Api(ApiArgs),
    /// Report how stale the repository is without touching anything
    Check(CheckArgs),
}

#[derive(Args)]
pub struct CommitArgs {
    /// Access token embedded in the push URL (falls back to $GITHUB_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Author name for the keepalive commit
    #[arg(long)]
    pub committer_username: Option<String>,

    /// Author email for the keepalive commit
    #[arg(long)]
    pub committer_email: Option<String>,

    /// Message for the keepalive commit
    #[arg(long)]
    pub message: Option<String>,

    /// Days since the last commit before a keepalive fires
    #[arg(long, value_name = "DAYS")]
    pub time_elapsed: Option<u64>,

    /// Push the commit to origin after creating it
    #[arg(long)]
    pub auto_push: bool,

    /// Refuse to write to a protected branch and skip pull-request events
    #[arg(long)]
    pub write_check: bool,

    /// Repository to operate on (defaults to the current directory)
    #[arg(long, value_name = "PATH")]
    pub repo: Option<String>,
}

#[derive(Args)]
pub struct ApiArgs {
    /// Access token with actions:write permission (falls back to $GITHUB_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Comma-separated workflow files to enable, in addition to the workflow
    /// this run belongs to
    #[arg(long, value_name = "FILES")]
    pub workflow_files: Option<String>,

    /// API base URL (defaults to $GITHUB_API_URL, then api.github.com)
    #[arg(long, value_name = "URL")]
    pub api_base_url: Option<String>,

    /// Days since the last commit before a keepalive fires
    #[arg(long, value_name = "DAYS")]
    pub time_elapsed: Option<u64>,

    /// Refuse to write to a protected branch and skip pull-request events
    #[arg(long)]
    pub write_check: bool,

    /// Repository to operate on (defaults to the current directory)
    #[arg(long, value_name = "PATH")]
    pub repo: Option<String>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Days since the last commit before a keepalive fires
    #[arg(long, value_name = "DAYS")]
    pub time_elapsed: Option<u64>,

    /// Repository to operate on (defaults to the current directory)
    #[arg(long, value_name = "PATH")]
    pub repo: Option<String>,
}
