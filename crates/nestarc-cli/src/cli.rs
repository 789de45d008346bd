//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nestarc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the tree of an archive and every nested archive it can open
    Info(InfoArgs),
    /// Extract archive contents, descending into nested archives
    Extract(ExtractArgs),
    /// Check that every entry of an archive opens
    Validate(ValidateArgs),
    /// Generate shell completions
    Completion(CompletionArgs),
}

/// Passwords and discards applied before traversal.
#[derive(clap::Args, Default)]
pub struct PolicyArgs {
    /// Password of the archive itself, inherited by nested archives
    #[arg(short, long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Password of a nested archive by logical path (can be repeated)
    #[arg(
        long = "entry-password",
        short = 'e',
        value_name = "PATH=PASSWORD",
        value_parser = parse_entry_password
    )]
    pub entry_passwords: Vec<(String, String)>,

    /// Skip a logical path and everything below it (can be repeated)
    #[arg(long = "discard", short = 'd', value_name = "PATH")]
    pub discard: Vec<String>,
}

#[derive(clap::Args)]
pub struct InfoArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Capture the content of entries matching a glob (can be repeated)
    #[arg(long = "preview", value_name = "GLOB")]
    pub previews: Vec<String>,
}

#[derive(clap::Args)]
pub struct ExtractArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Output directory (default: current directory)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Descend into the nested archive at a logical path (can be repeated)
    #[arg(long = "descend", value_name = "PATH")]
    pub descend: Vec<String>,

    /// Descend into every nested archive
    #[arg(short, long)]
    pub all: bool,

    /// Overwrite existing files
    #[arg(short, long)]
    pub force: bool,
}

#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Password of the archive
    #[arg(short, long, value_name = "PASSWORD")]
    pub password: Option<String>,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Parse `PATH=PASSWORD`, splitting at the first `=` so passwords may contain
/// one.
fn parse_entry_password(s: &str) -> Result<(String, String), String> {
    let (path, password) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PATH=PASSWORD, got {s:?}"))?;
    let path = path.trim();
    if path.is_empty() {
        return Err("entry path is empty".to_string());
    }
    Ok((path.to_string(), password.to_string()))
}
