//! Visibility and generated-code gate
//!
//! Early per-symbol exclusion before any reference search runs.

use regex::RegexSet;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::config::{AnalyzerConfiguration, Config};
use crate::index::Document;
use crate::model::{Accessibility, Symbol};

/// Header comment patterns marking a whole file as tool output
const GENERATED_HEADER_PATTERNS: &[&str] = &[
    r"(?i)<auto-?generated",
    r"(?i)generated by a tool",
    r"(?i)this (code|file) was (auto-?)?generated",
    r"(?i)do not (edit|modify)[^\n]*generated",
];

/// File-name suffixes of generated sources
const GENERATED_FILE_SUFFIXES: &[&str] = &[
    ".g.cs",
    ".g.i.cs",
    ".designer.cs",
    ".generated.cs",
    ".assemblyinfo.cs",
    ".assemblyattributes.cs",
];

/// Declaration-level attributes marking generated members
const GENERATED_ATTRIBUTES: &[&str] = &["GeneratedCode", "CompilerGenerated", "DebuggerNonUserCode"];

/// Why the gate dropped a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    Implicit,
    Protected,
    PublicExcluded,
    InternalExcluded,
    Generated,
    ExcludedRoot,
}

/// Recognizes generated files and declarations
#[derive(Debug, Clone)]
pub struct GeneratedCodeDetector {
    header_patterns: RegexSet,
}

impl GeneratedCodeDetector {
    /// Built-in header patterns plus any configured extras
    pub fn new(extra_header_patterns: &[String]) -> Result<Self, regex::Error> {
        let patterns = GENERATED_HEADER_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .chain(extra_header_patterns.iter().cloned());
        Ok(Self {
            header_patterns: RegexSet::new(patterns)?,
        })
    }

    /// Whether a file is tool output, judged by its name or by the comment
    /// block at its top
    pub fn is_generated_file(&self, path: &Path, text: &str) -> bool {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if GENERATED_FILE_SUFFIXES.iter().any(|s| file_name.ends_with(s)) {
            return true;
        }

        let header = leading_comment_block(text);
        !header.is_empty() && self.header_patterns.is_match(&header)
    }

    pub fn has_generated_marker(&self, symbol: &Symbol) -> bool {
        symbol.has_any_attribute(GENERATED_ATTRIBUTES)
    }
}

/// Comment and blank lines before the first line of code
fn leading_comment_block(text: &str) -> String {
    let mut header = String::new();
    let mut in_block = false;

    for line in text.lines() {
        let trimmed = line.trim();
        let is_comment = in_block
            || trimmed.is_empty()
            || trimmed.starts_with("//")
            || trimmed.starts_with("/*")
            || trimmed.starts_with('#');
        if !is_comment {
            break;
        }
        if trimmed.starts_with("/*") {
            in_block = true;
        }
        if in_block && trimmed.ends_with("*/") {
            in_block = false;
        }
        header.push_str(trimmed);
        header.push('\n');
    }

    header
}

/// Per-unit gate applying configured visibility and generated-code rules
pub struct VisibilityGate<'a> {
    config: &'a Config,
    analyzer: AnalyzerConfiguration,
    detector: &'a GeneratedCodeDetector,
    generated_files: HashSet<PathBuf>,
}

impl<'a> VisibilityGate<'a> {
    /// Classify the unit's documents once up front
    pub fn new(
        config: &'a Config,
        analyzer: AnalyzerConfiguration,
        detector: &'a GeneratedCodeDetector,
        documents: &[Document],
    ) -> Self {
        let generated_files = documents
            .iter()
            .filter(|d| detector.is_generated_file(&d.path, &d.text))
            .map(|d| d.path.clone())
            .collect();

        Self {
            config,
            analyzer,
            detector,
            generated_files,
        }
    }

    pub fn is_generated_file(&self, path: &Path) -> bool {
        self.generated_files.contains(path)
    }

    /// `None` when the symbol may be analyzed
    pub fn rejection(&self, symbol: &Symbol) -> Option<GateRejection> {
        if symbol.is_implicit {
            return Some(GateRejection::Implicit);
        }

        // Protected liveness depends on every possible subclass
        if symbol.accessibility.is_protected() {
            return Some(GateRejection::Protected);
        }

        match symbol.accessibility {
            Accessibility::Public if !self.analyzer.include_public => {
                return Some(GateRejection::PublicExcluded)
            }
            Accessibility::Internal if !self.analyzer.include_internal => {
                return Some(GateRejection::InternalExcluded)
            }
            _ => {}
        }

        if self.analyzer.exclude_generated {
            if self.detector.has_generated_marker(symbol) {
                return Some(GateRejection::Generated);
            }
            if symbol
                .declarations
                .iter()
                .any(|d| self.generated_files.contains(&d.file))
            {
                return Some(GateRejection::Generated);
            }
        }

        if symbol
            .declarations
            .iter()
            .any(|d| self.config.should_exclude(&d.file))
        {
            return Some(GateRejection::ExcludedRoot);
        }

        None
    }

    pub fn allows(&self, symbol: &Symbol) -> bool {
        match self.rejection(symbol) {
            Some(reason) => {
                trace!("Gate rejected {} ({:?})", symbol.key, reason);
                false
            }
            None => true,
        }
    }
}
