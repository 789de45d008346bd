//! Extract command implementation.

use super::open_archive;
use crate::cli::ExtractArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use nestarc_core::Entry;
use nestarc_core::Visit;
use nestarc_core::path;
use serde::Serialize;
use std::env;
use std::fs;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::path::PathBuf;

/// Counters reported after an extraction.
#[derive(Debug, Default, Serialize)]
pub struct ExtractSummary {
    pub output_dir: PathBuf,
    pub files_extracted: usize,
    pub directories_created: usize,
    pub archives_entered: usize,
    pub bytes_written: u64,
}

pub fn execute(args: &ExtractArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("failed to get current directory")?,
    };

    let mut file = open_archive(&args.archive, &args.policy)?;
    for entry_path in &args.descend {
        add_archive_context(file.extracted_entry(entry_path), &args.archive)?;
    }

    let mut extraction = Extraction {
        all: args.all,
        force: args.force,
        summary: ExtractSummary {
            output_dir,
            ..ExtractSummary::default()
        },
        warnings: Vec::new(),
    };
    let result = file.extract(|entry| extraction.visit(entry));

    for warning in &extraction.warnings {
        formatter.format_warning(warning);
    }
    add_archive_context(result, &args.archive)?;

    formatter.format_extraction_result(&extraction.summary)
}

struct Extraction {
    all: bool,
    force: bool,
    summary: ExtractSummary,
    warnings: Vec<String>,
}

impl Extraction {
    fn visit(&mut self, entry: &mut Entry<'_>) -> nestarc_core::Result<Visit> {
        let target = destination(&self.summary.output_dir, entry.path());

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            self.summary.directories_created += 1;
            return Ok(Visit::Continue);
        }

        if entry.archived().is_some() && self.descends(entry)? {
            log::debug!("entering {}", entry.path());
            self.summary.archives_entered += 1;
            return Ok(Visit::Continue);
        }

        self.write_file(entry, &target)?;
        Ok(Visit::Continue)
    }

    /// Decides whether the walker enters a nested archive. With `--all` the
    /// archive is probed first so locked or broken ones are written as plain
    /// files instead.
    fn descends(&mut self, entry: &mut Entry<'_>) -> nestarc_core::Result<bool> {
        if self.all {
            match entry.probe() {
                Ok(Some(probe)) if probe.password_invalid => {
                    self.warnings.push(format!(
                        "{} is locked, writing it unopened (use --entry-password)",
                        entry.path()
                    ));
                    return Ok(false);
                }
                Ok(Some(_)) => entry.mark_extracted()?,
                Ok(None) => return Ok(false),
                Err(err) if err.is_malformed() => {
                    self.warnings
                        .push(format!("{} cannot be opened: {err}", entry.path()));
                    return Ok(false);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(entry.policy().extracted(entry.path()))
    }

    fn write_file(&mut self, entry: &mut Entry<'_>, target: &Path) -> nestarc_core::Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut options = OpenOptions::new();
        options.write(true);
        if self.force {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let mut out = options.open(target)?;
        self.summary.bytes_written += io::copy(entry, &mut out)?;
        self.summary.files_extracted += 1;
        Ok(())
    }
}

/// Maps a logical path below `output_dir`. Normalization drops `..`, `.` and
/// empty segments, so the result never leaves `output_dir`.
fn destination(output_dir: &Path, logical_path: &str) -> PathBuf {
    path::segments(logical_path)
        .into_iter()
        .fold(output_dir.to_path_buf(), |dir, segment| dir.join(segment))
}
