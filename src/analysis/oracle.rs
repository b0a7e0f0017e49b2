//! Usage oracle
//!
//! Decides whether one declared symbol is used. Evidence sources are tried
//! from cheapest to most expensive and the first positive one wins:
//!
//! 1. framework entry points and configured roots (no index query)
//! 2. direct references through the per-unit [`ReferenceCache`]
//! 3. interface contracts, for methods
//! 4. implementations and derived classes, for interfaces and classes
//! 5. the fallback syntax scan, including reflection lookups
//!
//! A symbol is unused only when every source came back empty.

use tracing::{debug, info, trace};

use super::entry_points::{EntryPointClassifier, EntryPointKind};
use super::fallback::{FallbackHit, FallbackScanner};
use super::orchestrator::RunContext;
use super::parameters::ParameterAnalyzer;
use crate::cache::{CacheStats, ReferenceCache};
use crate::error::IndexResult;
use crate::index::SemanticIndex;
use crate::model::{Remark, Symbol, SymbolKey, SymbolKind, TypeKind};

/// Why a symbol counts as used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageEvidence {
    EntryPoint(EntryPointKind),
    DirectReferences(usize),
    /// An interface member the method implements is referenced
    InterfaceContract { member: SymbolKey, references: usize },
    /// A referenced implementation of an interface member, or an in-source
    /// implementing type of an interface
    Implementation(SymbolKey),
    DerivedClass(SymbolKey),
    Fallback(FallbackHit),
}

impl std::fmt::Display for UsageEvidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsageEvidence::EntryPoint(kind) => write!(f, "entry point ({})", kind),
            UsageEvidence::DirectReferences(n) => write!(f, "{} direct reference(s)", n),
            UsageEvidence::InterfaceContract { member, references } => {
                write!(f, "{} reference(s) through {}", references, member)
            }
            UsageEvidence::Implementation(key) => write!(f, "implemented by {}", key),
            UsageEvidence::DerivedClass(key) => write!(f, "derived by {}", key),
            UsageEvidence::Fallback(FallbackHit::Identifier(location)) => {
                write!(f, "identifier at {}", location)
            }
            UsageEvidence::Fallback(FallbackHit::Reflection { lookup, location }) => {
                write!(f, "{} lookup at {}", lookup, location)
            }
        }
    }
}

/// Outcome for one symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Used(UsageEvidence),
    Unused(Remark),
}

impl Verdict {
    pub fn is_used(&self) -> bool {
        matches!(self, Verdict::Used(_))
    }
}

/// Whether the symbol's liveness is decided on its own. Constructors,
/// accessors, operators, overrides and explicit implementations follow the
/// construct they belong to.
pub fn is_standalone_candidate(symbol: &Symbol) -> bool {
    match symbol.kind {
        SymbolKind::Type | SymbolKind::Field => true,
        SymbolKind::Method => {
            !symbol.method_kind().is_governed_by_owner()
                && !symbol.is_override
                && symbol.explicit_implementations.is_empty()
        }
        SymbolKind::Property => !symbol.is_override && symbol.explicit_implementations.is_empty(),
        SymbolKind::Parameter => false,
    }
}

fn remark_for(symbol: &Symbol) -> Remark {
    match symbol.kind {
        SymbolKind::Type => Remark::TypeKind(symbol.type_kind.unwrap_or(TypeKind::Class)),
        _ => Remark::NoReferences,
    }
}

/// Same name, return type and parameter types
fn same_shape(a: &Symbol, b: &Symbol) -> bool {
    a.kind == b.kind
        && a.name == b.name
        && a.value_type == b.value_type
        && a.parameter_types == b.parameter_types
}

/// Usage oracle for one compilation unit; owns the unit's reference cache
pub struct UsageOracle<'a> {
    index: &'a dyn SemanticIndex,
    context: &'a RunContext,
    classifier: &'a EntryPointClassifier,
    fallback: FallbackScanner<'a>,
    parameters: ParameterAnalyzer,
    cache: ReferenceCache,
}

impl<'a> UsageOracle<'a> {
    pub fn new(
        index: &'a dyn SemanticIndex,
        context: &'a RunContext,
        classifier: &'a EntryPointClassifier,
        fallback: FallbackScanner<'a>,
        cache: ReferenceCache,
    ) -> Self {
        let parameters = ParameterAnalyzer::new()
            .with_skip_underscore(context.config.skip_underscore_parameters);
        Self {
            index,
            context,
            classifier,
            fallback,
            parameters,
            cache,
        }
    }

    /// Evaluate every evidence source for `symbol`. `owner` is the
    /// containing type of a member.
    pub fn evaluate(&mut self, symbol: &Symbol, owner: Option<&Symbol>) -> IndexResult<Verdict> {
        if let Some(kind) = self.classifier.classify(symbol, owner) {
            return Ok(self.used(symbol, UsageEvidence::EntryPoint(kind)));
        }
        self.tier(symbol, "entry point", "no rule matched");

        let direct = self.cache.get(self.index, symbol)?.len();
        if direct > 0 {
            return Ok(self.used(symbol, UsageEvidence::DirectReferences(direct)));
        }
        self.tier(symbol, "direct references", "none qualifying");

        match symbol.kind {
            SymbolKind::Method => {
                if let Some(owner) = owner {
                    if let Some(evidence) = self.contract_usage(symbol, owner)? {
                        return Ok(self.used(symbol, evidence));
                    }
                    self.tier(symbol, "interface contract", "no referenced contract");
                }
            }
            SymbolKind::Type => {
                if let Some(evidence) = self.structural_usage(symbol)? {
                    return Ok(self.used(symbol, evidence));
                }
                self.tier(symbol, "type hierarchy", "no in-source implementation or subclass");
            }
            _ => {}
        }

        if let Some(hit) = self.fallback.scan(symbol)? {
            return Ok(self.used(symbol, UsageEvidence::Fallback(hit)));
        }
        self.tier(symbol, "fallback scan", "no resolving identifier or reflection lookup");

        let remark = remark_for(symbol);
        if self.context.diagnostics {
            info!("{} is unused ({})", symbol.key, remark);
        } else {
            debug!("{} is unused ({})", symbol.key, remark);
        }
        Ok(Verdict::Unused(remark))
    }

    /// Unused parameters of a method, in declaration order
    pub fn unused_parameters(&mut self, method: &Symbol, owner: Option<&Symbol>) -> IndexResult<Vec<Symbol>> {
        // Handler signatures are fixed by the delegate they are bound to
        if self.classifier.classify(method, owner) == Some(EntryPointKind::EventHandler) {
            return Ok(Vec::new());
        }
        self.parameters
            .unused_parameters(self.index, &mut self.cache, method, owner)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Methods: referenced interface members they implement; interface
    /// members: referenced implementations
    fn contract_usage(&mut self, method: &Symbol, owner: &Symbol) -> IndexResult<Option<UsageEvidence>> {
        if owner.is_interface() {
            return self.implementation_usage(method, owner);
        }

        let interfaces = self.index.all_interfaces(owner)?;
        if interfaces.is_empty() {
            return Ok(None);
        }

        let mut explicit = Vec::new();
        let mut by_shape = Vec::new();
        for iface in &interfaces {
            for member in self.index.members(iface)? {
                if method.explicit_implementations.contains(&member.key) {
                    explicit.push(member);
                } else if same_shape(&member, method) {
                    by_shape.push(member);
                }
            }
        }

        for member in explicit.into_iter().chain(by_shape) {
            let references = self.cache.get(self.index, &member)?.len();
            trace!("{}: contract {} has {} reference(s)", method.key, member.key, references);
            if references > 0 {
                return Ok(Some(UsageEvidence::InterfaceContract {
                    member: member.key,
                    references,
                }));
            }
        }

        Ok(None)
    }

    fn implementation_usage(
        &mut self,
        member: &Symbol,
        interface: &Symbol,
    ) -> IndexResult<Option<UsageEvidence>> {
        for implementation in self.index.find_implementations(interface)? {
            for candidate in self.index.members(&implementation)? {
                let implements = candidate.explicit_implementations.contains(&member.key)
                    || same_shape(&candidate, member);
                if implements && !self.cache.get(self.index, &candidate)?.is_empty() {
                    return Ok(Some(UsageEvidence::Implementation(candidate.key)));
                }
            }
        }
        Ok(None)
    }

    /// Interfaces with an in-source implementation, classes with an
    /// in-source subclass
    fn structural_usage(&mut self, ty: &Symbol) -> IndexResult<Option<UsageEvidence>> {
        let in_source = |s: &Symbol| s.declarations.iter().any(|d| d.in_source);

        if ty.is_interface() {
            let found = self
                .index
                .find_implementations(ty)?
                .into_iter()
                .find(|s| in_source(s));
            return Ok(found.map(|s| UsageEvidence::Implementation(s.key)));
        }

        if ty.is_class() {
            let found = self
                .index
                .find_derived_classes(ty)?
                .into_iter()
                .find(|s| in_source(s));
            return Ok(found.map(|s| UsageEvidence::DerivedClass(s.key)));
        }

        Ok(None)
    }

    fn used(&self, symbol: &Symbol, evidence: UsageEvidence) -> Verdict {
        if self.context.diagnostics {
            info!("{} is used: {}", symbol.key, evidence);
        } else {
            debug!("{} is used: {}", symbol.key, evidence);
        }
        Verdict::Used(evidence)
    }

    fn tier(&self, symbol: &Symbol, tier: &str, outcome: &str) {
        if self.context.diagnostics {
            info!("{}: {} - {}", symbol.key, tier, outcome);
        } else {
            trace!("{}: {} - {}", symbol.key, tier, outcome);
        }
    }
}
