//! Validate command implementation.

use super::open_archive;
use crate::cli::PolicyArgs;
use crate::cli::ValidateArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use anyhow::Result;

pub fn execute(args: &ValidateArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let policy = PolicyArgs {
        password: args.password.clone(),
        ..PolicyArgs::default()
    };
    let mut file = open_archive(&args.archive, &policy)?;

    add_archive_context(file.validate(), &args.archive)?;

    formatter.format_validation(&args.archive)
}
