//! CLI argument parsing for the publish workflow.
//!
//! Each invocation handles at most one media item and exits; an external
//! scheduler provides repetition.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "reelpost",
    version,
    about = "Publish the oldest pending video in a Drive folder as an Instagram reel",
    after_help = "Required environment:\n  GDRIVE_CREDENTIALS_JSON  service account key (JSON text)\n  GDRIVE_FOLDER_ID         folder holding pending videos\n  IG_ACCESS_TOKEN          Instagram Graph API access token\n  IG_USER_ID               Instagram business account id\n\nExamples:\n  reelpost check\n  reelpost run --caption \"New drop: {name}\"\n  reelpost --env-file /etc/reelpost.env run --max-attempts 20",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Load variables from this dotenv file (default: ./.env when present)
    #[arg(long, value_name = "PATH", global = true)]
    pub env_file: Option<PathBuf>,

    /// Emit debug-level logs
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Publish the oldest pending video and delete it from the folder
    Run(RunOverrides),
    /// Validate configuration and show the video the next run would publish
    Check(RunOverrides),
}

/// Command-line values that take precedence over the environment.
#[derive(Args, Debug, Default, Clone)]
pub struct RunOverrides {
    /// Caption for the reel; `{name}` expands to the file name without extension
    #[arg(long, value_name = "TEXT")]
    pub caption: Option<String>,

    /// Maximum status queries before giving up on processing
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,

    /// Seconds to wait between status queries
    #[arg(long, value_name = "SECS")]
    pub interval_secs: Option<u64>,

    /// Content type filter for the source folder
    #[arg(long, value_name = "TYPE")]
    pub mime_type: Option<String>,
}
