use crate::model::{Finding, SymbolKind};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, findings: &[Finding]) -> Result<()> {
        let json = Self::render(findings)?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json).into_diagnostic()?;
            println!("Report written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }

    pub fn render(findings: &[Finding]) -> Result<String> {
        let report = JsonReport::from_findings(findings);
        serde_json::to_string_pretty(&report).into_diagnostic()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct JsonReport {
    version: &'static str,
    total_findings: usize,
    findings: Vec<JsonFinding>,
    summary: JsonSummary,
}

/// One finding in the exchange format
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct JsonFinding {
    module: String,
    file_path: String,
    relative_path: String,
    line: usize,
    symbol_kind: &'static str,
    containing_type: String,
    symbol_name: String,
    accessibility: &'static str,
    remark: String,
    icon: crate::model::FindingIcon,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "PascalCase")]
struct JsonSummary {
    types: usize,
    methods: usize,
    properties: usize,
    fields: usize,
    parameters: usize,
}

impl JsonReport {
    fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = JsonSummary::default();

        let entries = findings
            .iter()
            .map(|f| {
                match f.kind {
                    SymbolKind::Type => summary.types += 1,
                    SymbolKind::Method => summary.methods += 1,
                    SymbolKind::Property => summary.properties += 1,
                    SymbolKind::Field => summary.fields += 1,
                    SymbolKind::Parameter => summary.parameters += 1,
                }

                JsonFinding {
                    module: f.module.clone(),
                    file_path: f.location.file.to_string_lossy().to_string(),
                    relative_path: f.relative_path.to_string_lossy().replace('\\', "/"),
                    line: f.line(),
                    symbol_kind: f.kind.display_name(),
                    containing_type: f.containing_type.clone(),
                    symbol_name: f.name.clone(),
                    accessibility: f.accessibility.as_str(),
                    remark: f.remark.clone(),
                    icon: f.icon,
                }
            })
            .collect();

        Self {
            version: "1.0",
            total_findings: findings.len(),
            findings: entries,
            summary,
        }
    }
}
