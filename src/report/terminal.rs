use crate::analysis::{Classification, DiagnosticCode, ReferenceKind};
use colored::Colorize;
use miette::Result;
use std::path::Path;

/// Terminal reporter with colored output
pub struct TerminalReporter;

impl TerminalReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report(&self, project: &Path, findings: &[Classification]) -> Result<()> {
        if findings.is_empty() {
            println!(
                "{} {}",
                "No removable references in".green().bold(),
                project.display().to_string().cyan()
            );
            return Ok(());
        }

        // Print header
        println!();
        println!(
            "{}",
            format!("Found {} removable references:", findings.len())
                .yellow()
                .bold()
        );
        println!("{}", project.display().to_string().cyan().bold());
        println!();

        // Grouped by kind, in classification order
        for kind in [
            ReferenceKind::Reference,
            ReferenceKind::ProjectReference,
            ReferenceKind::PackageReference,
        ] {
            let items: Vec<_> = findings.iter().filter(|f| f.kind == kind).collect();
            if items.is_empty() {
                continue;
            }

            println!("  {}", kind.as_str().bold());
            for item in items {
                self.print_item(item);
            }
            println!();
        }

        self.print_summary(findings);

        Ok(())
    }

    fn print_item(&self, item: &Classification) {
        println!(
            "    {} [{}] {}",
            "warning".yellow().bold(),
            item.code.code().dimmed(),
            item.message
        );
    }

    fn print_summary(&self, findings: &[Classification]) {
        println!("{}", "─".repeat(60).dimmed());

        let parts: Vec<String> = DiagnosticCode::ALL
            .iter()
            .filter_map(|code| {
                let count = findings.iter().filter(|f| f.code == *code).count();
                (count > 0).then(|| format!("{} {}", count, code.code()).yellow().to_string())
            })
            .collect();
        println!("Summary: {}", parts.join(", "));

        println!();
        println!(
            "{}",
            "Tip: Use --baseline to accept existing findings".dimmed()
        );
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}
