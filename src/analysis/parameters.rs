//! Unused parameter detection
//!
//! Parameters are analyzed per method with the same reference search the
//! oracle uses for members. Only the fallback scan and entry-point tiers
//! are skipped: a parameter is local to its method body.

use tracing::trace;

use crate::cache::ReferenceCache;
use crate::error::IndexResult;
use crate::index::SemanticIndex;
use crate::model::{MethodKind, Symbol};

/// Decides which parameters of a method are never referenced
#[derive(Debug, Clone)]
pub struct ParameterAnalyzer {
    /// Skip discard-style names (`_`, `_unused`)
    skip_underscore: bool,
}

impl ParameterAnalyzer {
    pub fn new() -> Self {
        Self {
            skip_underscore: true,
        }
    }

    pub fn with_skip_underscore(mut self, skip: bool) -> Self {
        self.skip_underscore = skip;
        self
    }

    fn should_skip_name(&self, name: &str) -> bool {
        self.skip_underscore && name.starts_with('_')
    }

    /// Methods whose parameter list is dictated elsewhere or that have no
    /// body to read parameters in
    pub fn should_skip_method(&self, method: &Symbol, owner: Option<&Symbol>) -> bool {
        // Bodiless
        if method.is_abstract || method.is_extern {
            return true;
        }
        if owner.map_or(false, Symbol::is_interface) {
            return true;
        }

        // Signature fixed by a base or an interface
        if method.is_override || !method.explicit_implementations.is_empty() {
            return true;
        }

        matches!(
            method.method_kind(),
            MethodKind::PropertyAccessor
                | MethodKind::EventAccessor
                | MethodKind::ExplicitInterfaceImplementation
        )
    }

    /// Parameters of `method` with no qualifying reference, in declaration
    /// order. By-reference parameters are always used.
    pub fn unused_parameters(
        &self,
        index: &dyn SemanticIndex,
        cache: &mut ReferenceCache,
        method: &Symbol,
        owner: Option<&Symbol>,
    ) -> IndexResult<Vec<Symbol>> {
        if self.should_skip_method(method, owner) {
            trace!("Skipping parameters of {}", method.key);
            return Ok(Vec::new());
        }

        let mut unused = Vec::new();
        for parameter in index.parameters(method)? {
            if parameter.ref_kind.is_by_reference() || self.should_skip_name(&parameter.name) {
                continue;
            }
            if parameter.is_implicit {
                continue;
            }
            if cache.get(index, &parameter)?.is_empty() {
                unused.push(parameter);
            }
        }

        Ok(unused)
    }
}

impl Default for ParameterAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
