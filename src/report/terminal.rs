use crate::model::{Finding, FindingIcon, SymbolKind};
use colored::{ColoredString, Colorize};
use miette::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Terminal reporter with colored output
pub struct TerminalReporter {
    /// Print the relative path instead of the absolute one
    relative_paths: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self {
            relative_paths: true,
        }
    }

    pub fn with_relative_paths(mut self, relative: bool) -> Self {
        self.relative_paths = relative;
        self
    }

    pub fn report(&self, findings: &[Finding]) -> Result<()> {
        if findings.is_empty() {
            println!("{}", "No unused symbols found!".green().bold());
            return Ok(());
        }

        println!();
        println!(
            "{}",
            format!("Found {} unused symbols:", findings.len())
                .yellow()
                .bold()
        );
        println!();

        for (module, by_file) in Self::group(findings) {
            println!("{}", module.magenta().bold());

            for (file, items) in by_file {
                println!("  {}", file.display().to_string().cyan().bold());
                for item in items {
                    println!("{}", self.format_item(item));
                }
            }

            println!();
        }

        self.print_summary(findings);

        Ok(())
    }

    /// Group findings by module, then by file, both sorted; items by line
    fn group(findings: &[Finding]) -> BTreeMap<&str, BTreeMap<PathBuf, Vec<&Finding>>> {
        let mut grouped: BTreeMap<&str, BTreeMap<PathBuf, Vec<&Finding>>> = BTreeMap::new();
        for finding in findings {
            grouped
                .entry(finding.module.as_str())
                .or_default()
                .entry(finding.location.file.clone())
                .or_default()
                .push(finding);
        }

        for by_file in grouped.values_mut() {
            for items in by_file.values_mut() {
                items.sort_by_key(|f| (f.line(), f.location.column));
            }
        }

        grouped
    }

    fn format_item(&self, item: &Finding) -> String {
        let location = if self.relative_paths {
            format!("{}:{}", item.relative_path.display(), item.line())
        } else {
            format!("{}:{}", item.location.file.display(), item.line())
        };

        let qualified = if item.containing_type.is_empty() {
            item.name.clone()
        } else {
            format!("{}.{}", item.containing_type, item.name)
        };

        format!(
            "    {} {} {} {} {}",
            icon(item.icon),
            location.dimmed(),
            item.kind.display_name().to_lowercase(),
            qualified.bold(),
            format!("({}, {})", item.accessibility, item.remark).dimmed()
        )
    }

    fn print_summary(&self, findings: &[Finding]) {
        let count = |kind: SymbolKind| findings.iter().filter(|f| f.kind == kind).count();

        println!("{}", "─".repeat(50).dimmed());

        let parts: Vec<String> = [
            (SymbolKind::Type, "types"),
            (SymbolKind::Method, "methods"),
            (SymbolKind::Property, "properties"),
            (SymbolKind::Field, "fields"),
            (SymbolKind::Parameter, "parameters"),
        ]
        .into_iter()
        .map(|(kind, label)| (count(kind), label))
        .filter(|(n, _)| *n > 0)
        .map(|(n, label)| format!("{} {}", n, label))
        .collect();

        println!("Summary: {}", parts.join(", "));
        println!();
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn icon(icon: FindingIcon) -> ColoredString {
    let glyph = icon.glyph();
    match icon {
        FindingIcon::Class | FindingIcon::Struct | FindingIcon::Delegate => glyph.yellow().bold(),
        FindingIcon::Interface => glyph.blue().bold(),
        FindingIcon::Enum => glyph.bright_yellow().bold(),
        FindingIcon::Method => glyph.magenta(),
        FindingIcon::Property => glyph.green(),
        FindingIcon::Field => glyph.cyan(),
        FindingIcon::Parameter => glyph.red(),
    }
}
