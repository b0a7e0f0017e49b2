use std::collections::HashSet;
use tracing::{debug, trace};

use crate::config::Config;
use crate::error::IndexResult;
use crate::index::{Document, SemanticIndex};
use crate::model::{Symbol, UnitId};

/// Enumerates the declared types of a compilation unit
pub struct DeclarationCollector<'a> {
    config: &'a Config,
}

impl<'a> DeclarationCollector<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Source documents of a unit that lie outside excluded roots
    pub fn in_scope_documents(
        &self,
        index: &dyn SemanticIndex,
        unit: &UnitId,
    ) -> IndexResult<Vec<Document>> {
        let documents = index.documents(unit)?;
        let total = documents.len();

        let kept: Vec<Document> = documents
            .into_iter()
            .filter(|doc| {
                if self.config.should_exclude(&doc.path) {
                    trace!("Excluding: {}", doc.path.display());
                    false
                } else {
                    true
                }
            })
            .collect();

        debug!("{}: {} of {} documents in scope", unit, kept.len(), total);
        Ok(kept)
    }

    /// Named types declared in the given documents, without implicit
    /// declarations, deduplicated by key in first-encounter order
    pub fn collect_types(
        &self,
        index: &dyn SemanticIndex,
        documents: &[Document],
    ) -> IndexResult<Vec<Symbol>> {
        let mut seen = HashSet::new();
        let mut types = Vec::new();

        for doc in documents {
            for symbol in index.declared_types(doc)? {
                if symbol.is_implicit {
                    trace!("Skipping implicit type {}", symbol.key);
                    continue;
                }
                if seen.insert(symbol.key.clone()) {
                    types.push(symbol);
                }
            }
        }

        Ok(types)
    }
}
