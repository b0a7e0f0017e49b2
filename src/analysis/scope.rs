//! Namespace scope filtering
//!
//! Only namespaces the codebase itself declares may produce findings.
//! Third-party or generated namespaces that happen to be visible to the
//! index are filtered out here.

use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::index::{Document, NamespaceDeclaration, SemanticIndex};
use crate::model::GLOBAL_NAMESPACE;

/// Namespaces owned by the codebase, with every parent prefix and the
/// global sentinel when something is declared outside any namespace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredNamespaceSet {
    namespaces: BTreeSet<String>,
}

impl DeclaredNamespaceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the set from the namespace declarations of every document
    pub fn from_documents<'d>(
        index: &dyn SemanticIndex,
        documents: impl IntoIterator<Item = &'d Document>,
    ) -> Self {
        let mut set = Self::new();
        for doc in documents {
            match index.namespace_declarations(doc) {
                Ok(declarations) => {
                    for declaration in &declarations {
                        set.add_declaration(declaration);
                    }
                }
                Err(e) => warn!("Cannot read namespaces of {}: {}", doc.path.display(), e),
            }
        }
        debug!("Declared namespace set has {} entries", set.len());
        set
    }

    pub fn add_declaration(&mut self, declaration: &NamespaceDeclaration) {
        match declaration {
            NamespaceDeclaration::Block(name) | NamespaceDeclaration::FileScoped(name) => {
                self.insert(name)
            }
            NamespaceDeclaration::Global => {
                self.namespaces.insert(GLOBAL_NAMESPACE.to_string());
            }
        }
    }

    /// Insert a namespace and all of its dot-separated parents
    pub fn insert(&mut self, namespace: &str) {
        let namespace = namespace.trim();
        if namespace.is_empty() {
            self.namespaces.insert(GLOBAL_NAMESPACE.to_string());
            return;
        }

        let mut end = 0;
        for part in namespace.split('.') {
            end += part.len();
            self.namespaces.insert(namespace[..end].to_string());
            end += 1;
        }
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.namespaces.contains(namespace)
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.namespaces.iter().map(String::as_str)
    }

    /// Whether symbols in `namespace` may be analyzed.
    ///
    /// An empty set allows everything. The global sentinel is allowed only
    /// when something was declared globally. Otherwise the namespace must
    /// equal, contain, or be contained in a declared namespace on a dot
    /// boundary.
    pub fn is_allowed(&self, namespace: &str) -> bool {
        if self.namespaces.is_empty() {
            return true;
        }
        if namespace.is_empty() || namespace == GLOBAL_NAMESPACE {
            return self.namespaces.contains(GLOBAL_NAMESPACE);
        }

        self.namespaces
            .iter()
            .filter(|declared| declared.as_str() != GLOBAL_NAMESPACE)
            .any(|declared| {
                declared == namespace
                    || is_dotted_prefix(declared, namespace)
                    || is_dotted_prefix(namespace, declared)
            })
    }
}

/// `parent` is a proper dot-boundary prefix of `child`
fn is_dotted_prefix(parent: &str, child: &str) -> bool {
    child.len() > parent.len()
        && child.starts_with(parent)
        && child.as_bytes()[parent.len()] == b'.'
}
