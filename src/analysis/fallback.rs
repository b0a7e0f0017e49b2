//! Fallback semantic scan
//!
//! Some uses never show up in the index's reference search (attribute
//! arguments, `nameof`, partially bound generic code). The scan walks the
//! syntax of every in-scope document that textually mentions the symbol's
//! name, resolves matching identifiers, and screens calls for name-based
//! reflection lookups.

use std::sync::Arc;
use tracing::trace;

use super::reflection::{ReflectionLookup, ReflectionRuleSet};
use crate::error::IndexResult;
use crate::index::{Document, SemanticIndex, SyntaxNode};
use crate::model::{Location, Symbol};

/// What the fallback scan found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackHit {
    /// An identifier resolving to the symbol
    Identifier(Location),
    /// A string literal passed to a name-based lookup
    Reflection {
        lookup: ReflectionLookup,
        location: Location,
    },
}

impl FallbackHit {
    pub fn location(&self) -> &Location {
        match self {
            FallbackHit::Identifier(location) => location,
            FallbackHit::Reflection { location, .. } => location,
        }
    }
}

/// Scans the in-scope documents of the whole codebase
pub struct FallbackScanner<'a> {
    index: &'a dyn SemanticIndex,
    documents: Arc<Vec<Document>>,
    rules: &'a ReflectionRuleSet,
}

impl<'a> FallbackScanner<'a> {
    pub fn new(
        index: &'a dyn SemanticIndex,
        documents: Arc<Vec<Document>>,
        rules: &'a ReflectionRuleSet,
    ) -> Self {
        Self {
            index,
            documents,
            rules,
        }
    }

    /// First use of `symbol` found by scanning syntax, if any
    pub fn scan(&self, symbol: &Symbol) -> IndexResult<Option<FallbackHit>> {
        let name = symbol.name.as_str();
        if name.is_empty() {
            return Ok(None);
        }

        for doc in self.documents.iter().filter(|d| d.mentions(name)) {
            for node in self.index.syntax_nodes(doc)? {
                if let Some(hit) = self.inspect(doc, &node, symbol)? {
                    trace!("{}: fallback hit at {}", symbol.key, hit.location());
                    return Ok(Some(hit));
                }
            }
        }

        Ok(None)
    }

    fn inspect(
        &self,
        doc: &Document,
        node: &SyntaxNode,
        symbol: &Symbol,
    ) -> IndexResult<Option<FallbackHit>> {
        match node {
            SyntaxNode::Identifier { text, location } => {
                if text != &symbol.name || is_own_declaration(symbol, location) {
                    return Ok(None);
                }
                // Compare identities, not declarations: an overload or a
                // same-named member elsewhere resolves to a different key
                let resolved = self.index.resolve(&doc.unit, node)?;
                Ok(match resolved {
                    Some(key) if key == symbol.key => Some(FallbackHit::Identifier(location.clone())),
                    _ => None,
                })
            }
            SyntaxNode::Invocation { location, .. } => Ok(self
                .rules
                .find_match(node, symbol)
                .map(|lookup| FallbackHit::Reflection {
                    lookup,
                    location: location.clone(),
                })),
        }
    }
}

fn is_own_declaration(symbol: &Symbol, location: &Location) -> bool {
    symbol.declarations.iter().any(|d| d.coincides_with(location))
}
