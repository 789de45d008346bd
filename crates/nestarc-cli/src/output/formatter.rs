//! Output formatter trait for CLI results.

use crate::commands::extract::ExtractSummary;
use anyhow::Result;
use nestarc_core::InfoTree;
use nestarc_core::PasswordFailure;
use serde::Serialize;
use std::path::Path;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format the entry tree and the nested archives left locked
    fn format_info(&self, tree: &InfoTree, failures: &[PasswordFailure]) -> Result<()>;

    /// Format extraction result
    fn format_extraction_result(&self, summary: &ExtractSummary) -> Result<()>;

    /// Format a successful validation
    fn format_validation(&self, archive: &Path) -> Result<()>;

    /// Format warning message
    fn format_warning(&self, message: &str);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }

    /// Result that carries data but still failed, e.g. a partial tree.
    pub fn partial(operation: impl Into<String>, data: T, error: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Error,
            data: Some(data),
            error: Some(error.into()),
        }
    }
}
