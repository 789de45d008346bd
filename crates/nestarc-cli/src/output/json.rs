//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use crate::commands::extract::ExtractSummary;
use anyhow::Result;
use nestarc_core::InfoTree;
use nestarc_core::PasswordFailure;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;

pub struct JsonFormatter;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InfoOutput<'a> {
    tree: &'a InfoTree,
    password_failures: &'a [PasswordFailure],
    previews: Vec<PreviewOutput>,
}

#[derive(Serialize)]
struct PreviewOutput {
    path: String,
    content: String,
}

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }

    fn info_output<'a>(tree: &'a InfoTree, failures: &'a [PasswordFailure]) -> InfoOutput<'a> {
        InfoOutput {
            tree,
            password_failures: failures,
            previews: tree
                .previews()
                .into_iter()
                .map(|(path, data)| PreviewOutput {
                    path,
                    content: String::from_utf8_lossy(data).into_owned(),
                })
                .collect(),
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_info(&self, tree: &InfoTree, failures: &[PasswordFailure]) -> Result<()> {
        let data = Self::info_output(tree, failures);
        if failures.is_empty() {
            Self::output(&JsonOutput::success("info", data))
        } else {
            let error = format!("{} archive(s) need a password", failures.len());
            Self::output(&JsonOutput::partial("info", data, error))
        }
    }

    fn format_extraction_result(&self, summary: &ExtractSummary) -> Result<()> {
        Self::output(&JsonOutput::success("extract", summary))
    }

    fn format_validation(&self, archive: &Path) -> Result<()> {
        #[derive(Serialize)]
        struct ValidationOutput {
            archive: String,
            valid: bool,
        }

        let data = ValidationOutput {
            archive: archive.display().to_string(),
            valid: true,
        };
        Self::output(&JsonOutput::success("validate", data))
    }

    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData {
            message: String,
        }

        let output = JsonOutput::success(
            "warning",
            WarningData {
                message: message.to_string(),
            },
        );
        let _ = Self::output(&output);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_info_output_structure() {
        let mut tree = InfoTree::new("a.zip", false, "");
        tree.mount_file("a.zip/x.txt", Some(b"hello".to_vec()));
        tree.mount_archive_file("a.zip/b.7z", true, true, "");
        let failures = vec![PasswordFailure {
            filename: "a.zip/b.7z".into(),
            password_required: true,
            password_invalid: false,
        }];

        let output = JsonOutput::partial(
            "info",
            JsonFormatter::info_output(&tree, &failures),
            "1 archive(s) need a password",
        );
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["data"]["tree"]["name"], "a.zip");
        assert_eq!(value["data"]["passwordFailures"][0]["passwordRequired"], true);
        assert_eq!(value["data"]["previews"][0]["path"], "a.zip/x.txt");
        assert_eq!(value["data"]["previews"][0]["content"], "hello");
    }
}
