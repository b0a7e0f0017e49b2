//! Serialized index snapshots
//!
//! A host language service can export what it knows about a codebase into a
//! JSON or YAML file; the CLI loads it into a [`MemoryIndex`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{Document, MemoryIndex, NamespaceDeclaration, SyntaxNode};
use crate::error::AnalysisError;
use crate::model::{Reference, Symbol, SymbolKey, UnitId};

/// Top-level snapshot file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSnapshot {
    /// Directory findings are reported relative to
    pub root: PathBuf,
    pub units: Vec<UnitSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub name: String,
    /// Set when the host could not produce a compilation for the unit
    #[serde(default)]
    pub compile_error: Option<String>,
    #[serde(default)]
    pub documents: Vec<DocumentSnapshot>,
    /// Types, members and parameters; members follow their type and
    /// parameters follow their method
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub path: PathBuf,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub namespaces: Vec<NamespaceDeclaration>,
    #[serde(default)]
    pub syntax: Vec<ResolvedNode>,
}

/// A syntax node together with what it resolves to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedNode {
    #[serde(flatten)]
    pub node: SyntaxNode,
    #[serde(default)]
    pub resolves_to: Option<SymbolKey>,
}

impl IndexSnapshot {
    /// Read a snapshot from a `.json`, `.yml` or `.yaml` file
    pub fn from_file(path: &Path) -> Result<Self, AnalysisError> {
        if !path.exists() {
            return Err(AnalysisError::TargetNotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::IndexInitialization(format!("cannot read {}: {}", path.display(), e))
        })?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .map_err(|e| AnalysisError::IndexInitialization(e.to_string())),
            _ => serde_json::from_str(&contents)
                .map_err(|e| AnalysisError::IndexInitialization(e.to_string())),
        }
    }

    /// Materialize the snapshot into a queryable index
    pub fn into_index(self) -> Result<MemoryIndex, AnalysisError> {
        let mut index = MemoryIndex::new(self.root);

        for unit in self.units {
            let id = UnitId::new(unit.name.clone());
            index.add_unit(id.clone(), unit.name, unit.compile_error);

            for doc in unit.documents {
                let path = doc.path;
                index
                    .add_document(Document::new(id.clone(), path.clone(), doc.text))
                    .map_err(|e| AnalysisError::IndexInitialization(e.to_string()))?;
                for ns in doc.namespaces {
                    index.add_namespace(&path, ns);
                }
                for resolved in doc.syntax {
                    index.add_syntax(resolved.node, resolved.resolves_to);
                }
            }

            for symbol in unit.symbols {
                index.add_symbol(symbol);
            }
            for reference in unit.references {
                index.add_reference(reference);
            }
            debug!("Loaded unit {}", id);
        }

        info!(
            "Loaded index snapshot: {} symbols, {} references",
            index.symbol_count(),
            index.reference_count()
        );

        Ok(index)
    }
}

/// Load a snapshot file straight into an index
pub fn load_index(path: &Path) -> Result<MemoryIndex, AnalysisError> {
    IndexSnapshot::from_file(path)?.into_index()
}
