//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use crate::commands::extract::ExtractSummary;
use anyhow::Result;
use console::Term;
use console::style;
use nestarc_core::FileInfo;
use nestarc_core::InfoTree;
use nestarc_core::PasswordFailure;
use std::path::Path;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    /// Bracketed markers shown after a node name.
    fn markers(node: &FileInfo) -> Vec<&'static str> {
        let mut markers = Vec::new();
        if node.archived {
            markers.push("archive");
        }
        if node.encrypted {
            markers.push("encrypted");
        }
        if node.password_invalid {
            markers.push("locked");
        }
        markers
    }

    fn node_label(&self, node: &FileInfo) -> String {
        let name = if node.is_dir {
            format!("{}/", node.name)
        } else {
            node.name.clone()
        };
        let name = if self.use_colors && node.archived {
            style(name).cyan().bold().to_string()
        } else if self.use_colors && node.is_dir {
            style(name).blue().to_string()
        } else {
            name
        };

        let markers = Self::markers(node);
        let mut label = if markers.is_empty() {
            name
        } else if self.use_colors && node.password_invalid {
            format!("{name} {}", style(format!("[{}]", markers.join(", "))).yellow())
        } else {
            format!("{name} [{}]", markers.join(", "))
        };

        if self.verbose {
            if let Some(preview) = &node.preview {
                let size = Self::format_size(preview.len() as u64);
                label.push_str(&format!(" (preview: {size})"));
            }
        }
        label
    }

    /// Renders `index` and its subtree, one line per node.
    fn render(&self, tree: &InfoTree, index: usize, prefix: &str, lines: &mut Vec<String>) {
        let children = tree.node(index).children();
        for (i, &child) in children.iter().enumerate() {
            let last = i + 1 == children.len();
            let (branch, indent) = if last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            lines.push(format!(
                "{prefix}{branch}{}",
                self.node_label(tree.node(child))
            ));
            self.render(tree, child, &format!("{prefix}{indent}"), lines);
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_info(&self, tree: &InfoTree, failures: &[PasswordFailure]) -> Result<()> {
        if !self.quiet {
            let mut lines = vec![self.node_label(tree.root())];
            self.render(tree, 0, "", &mut lines);
            for line in lines {
                let _ = self.term.write_line(&line);
            }

            if self.verbose {
                for (path, data) in tree.previews() {
                    let _ = self.term.write_line("");
                    let _ = self.term.write_line(&format!("--- {path}"));
                    let _ = self
                        .term
                        .write_line(String::from_utf8_lossy(data).trim_end());
                }
            }
        }

        // Always show failures, even in quiet mode
        if !failures.is_empty() {
            let _ = self.term.write_line("");
            if self.use_colors {
                let _ = self
                    .term
                    .write_line(&format!("{}", style("Locked archives:").yellow().bold()));
            } else {
                let _ = self.term.write_line("Locked archives:");
            }
            for failure in failures {
                let _ = self.term.write_line(&format!("  - {failure}"));
            }
        }

        Ok(())
    }

    fn format_extraction_result(&self, summary: &ExtractSummary) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if self.use_colors {
            let _ = self.term.write_line(&format!(
                "{} Extraction complete",
                style("✓").green().bold()
            ));
        } else {
            let _ = self.term.write_line("Extraction complete");
        }

        let _ = self
            .term
            .write_line(&format!("  Files extracted: {}", summary.files_extracted));
        let _ = self
            .term
            .write_line(&format!("  Directories: {}", summary.directories_created));
        let _ = self
            .term
            .write_line(&format!("  Nested archives: {}", summary.archives_entered));
        let _ = self.term.write_line(&format!(
            "  Total size: {}",
            Self::format_size(summary.bytes_written)
        ));

        if self.verbose {
            let _ = self.term.write_line(&format!(
                "  Output: {}",
                summary.output_dir.display()
            ));
        }

        Ok(())
    }

    fn format_validation(&self, archive: &Path) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if self.use_colors {
            let _ = self.term.write_line(&format!(
                "{} {} is valid",
                style("✓").green().bold(),
                archive.display()
            ));
        } else {
            let _ = self
                .term
                .write_line(&format!("{} is valid", archive.display()));
        }
        Ok(())
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = self.term.write_line(&format!("WARNING: {message}"));
        }
    }
}
