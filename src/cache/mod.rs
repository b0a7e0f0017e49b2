//! Per-unit reference cache
//!
//! Memoizes the qualifying reference set of each symbol queried while one
//! compilation unit is analyzed. Entries are written once and never
//! invalidated; the program is treated as immutable for the whole run.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::trace;

use crate::error::IndexResult;
use crate::index::SemanticIndex;
use crate::model::{Reference, Symbol, SymbolKey, UnitId};

/// Qualifying references of one symbol, shared by every consumer
pub type ReferenceSet = Arc<Vec<Reference>>;

/// Reference cache owned by a single unit task
#[derive(Debug)]
pub struct ReferenceCache {
    unit: UnitId,
    codebase: Arc<HashSet<UnitId>>,
    entries: HashMap<SymbolKey, ReferenceSet>,
    hits: usize,
    misses: usize,
}

impl ReferenceCache {
    /// `codebase` holds every unit of the analyzed program; references
    /// located anywhere else do not count
    pub fn new(unit: UnitId, codebase: Arc<HashSet<UnitId>>) -> Self {
        Self {
            unit,
            codebase,
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn unit(&self) -> &UnitId {
        &self.unit
    }

    /// Qualifying references of `symbol`, searching the index on a miss
    pub fn get(&mut self, index: &dyn SemanticIndex, symbol: &Symbol) -> IndexResult<ReferenceSet> {
        if let Some(cached) = self.entries.get(&symbol.key) {
            self.hits += 1;
            return Ok(Arc::clone(cached));
        }

        self.misses += 1;
        let all = index.find_references(symbol)?;
        let total = all.len();
        let qualifying: Vec<Reference> = all
            .into_iter()
            .filter(|r| self.qualifies(symbol, r))
            .collect();
        trace!(
            "{}: {} of {} references qualify",
            symbol.key,
            qualifying.len(),
            total
        );

        let set = Arc::new(qualifying);
        self.entries.insert(symbol.key.clone(), Arc::clone(&set));
        Ok(set)
    }

    /// In-source, inside the codebase, and not the symbol's own declaration
    fn qualifies(&self, symbol: &Symbol, reference: &Reference) -> bool {
        let location = &reference.location;
        location.in_source
            && self.codebase.contains(&location.unit)
            && !symbol
                .declarations
                .iter()
                .any(|d| d.coincides_with(location))
    }

    pub fn contains(&self, key: &SymbolKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} symbols cached, {} hits, {} misses",
            self.entries, self.hits, self.misses
        )
    }
}
