//! Info command implementation.

use super::open_archive;
use crate::cli::InfoArgs;
use crate::error::convert_archive_error;
use crate::output::OutputFormatter;
use anyhow::Result;
use anyhow::bail;
use nestarc_core::ArchiveError;
use nestarc_core::password_failures;

pub fn execute(args: &InfoArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let mut file = open_archive(&args.archive, &args.policy)?;
    let previews: Vec<&str> = args.previews.iter().map(String::as_str).collect();

    let (tree, result) = file.info(&previews);
    let Err(err) = result else {
        return formatter.format_info(&tree, &[]);
    };

    match password_failures(&err) {
        Some(failures) if failures.len() == leaf_count(&err) => {
            formatter.format_info(&tree, &failures)?;
            bail!("{} archive(s) need a password", failures.len())
        }
        _ => Err(convert_archive_error(err, &args.archive)),
    }
}

/// Number of independent failures joined into `err`.
fn leaf_count(err: &ArchiveError) -> usize {
    match err {
        ArchiveError::Joined(errors) => errors.iter().map(leaf_count).sum(),
        _ => 1,
    }
}
