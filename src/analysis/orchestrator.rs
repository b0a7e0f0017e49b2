//! Concurrent per-unit analysis
//!
//! One rayon task per compilation unit. Inside a unit everything runs
//! sequentially; the namespace set, configuration and shared document list
//! are read-only for the whole run, and each unit owns its reference cache.

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::entry_points::EntryPointClassifier;
use super::fallback::FallbackScanner;
use super::gate::{GeneratedCodeDetector, VisibilityGate};
use super::oracle::{is_standalone_candidate, UsageOracle, Verdict};
use super::reflection::ReflectionRuleSet;
use super::scope::DeclaredNamespaceSet;
use crate::cache::{CacheStats, ReferenceCache};
use crate::config::{AnalyzerConfiguration, Config};
use crate::discovery::DeclarationCollector;
use crate::error::{AnalysisError, IndexError};
use crate::index::{CompilationUnit, Document, SemanticIndex};
use crate::model::{Finding, Remark, Symbol, SymbolKind, UnitId};

/// Everything a run needs, passed down explicitly
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: Config,
    pub analyzer: AnalyzerConfiguration,
    /// Log every tier's evidence at info level
    pub diagnostics: bool,
    cancelled: Arc<AtomicBool>,
}

impl RunContext {
    pub fn new(config: Config) -> Self {
        let analyzer = config.analyzer();
        Self {
            config,
            analyzer,
            diagnostics: false,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Flag another thread can set to stop the run
    pub fn cancellation_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Aggregated result of a run
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    /// Findings of every unit, each unit's in declaration-encounter order
    pub findings: Vec<Finding>,
    pub units_analyzed: usize,
    pub units_skipped: Vec<UnitId>,
    pub symbols_skipped: usize,
    pub cache: CacheTotals,
}

/// Reference cache statistics summed over units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheTotals {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

impl CacheTotals {
    fn add(&mut self, stats: CacheStats) {
        self.entries += stats.entries;
        self.hits += stats.hits;
        self.misses += stats.misses;
    }
}

impl AnalysisReport {
    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }
}

enum UnitOutcome {
    Completed {
        findings: Vec<Finding>,
        symbols_skipped: usize,
        cache: CacheStats,
    },
    Skipped(UnitId),
    Cancelled,
}

/// Read-only state shared by every unit task
struct SharedState<'a> {
    index: &'a dyn SemanticIndex,
    context: &'a RunContext,
    root: &'a Path,
    namespaces: Arc<DeclaredNamespaceSet>,
    codebase: Arc<HashSet<UnitId>>,
    documents: Arc<Vec<Document>>,
    unit_documents: HashMap<UnitId, Vec<Document>>,
    detector: GeneratedCodeDetector,
    rules: ReflectionRuleSet,
    classifier: EntryPointClassifier,
}

/// Fans analysis out over compilation units and merges their findings
pub struct Orchestrator {
    context: RunContext,
}

impl Orchestrator {
    pub fn new(context: RunContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Analyze every unit of `index`, reporting paths relative to `root`
    pub fn run(&self, index: &dyn SemanticIndex, root: &Path) -> Result<AnalysisReport, AnalysisError> {
        let context = &self.context;
        if context.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        let units = index
            .units()
            .map_err(|e| AnalysisError::IndexInitialization(e.to_string()))?;
        info!("Analyzing {} compilation units", units.len());

        let shared = self.prepare(index, root, &units)?;

        let outcomes: Vec<UnitOutcome> = units
            .par_iter()
            .map(|unit| analyze_unit(&shared, unit))
            .collect();

        let mut report = AnalysisReport::default();
        let mut cancelled = false;
        for outcome in outcomes {
            match outcome {
                UnitOutcome::Completed {
                    findings,
                    symbols_skipped,
                    cache,
                } => {
                    report.units_analyzed += 1;
                    report.symbols_skipped += symbols_skipped;
                    report.cache.add(cache);
                    report.findings.extend(findings);
                }
                UnitOutcome::Skipped(unit) => report.units_skipped.push(unit),
                UnitOutcome::Cancelled => cancelled = true,
            }
        }

        if cancelled || context.is_cancelled() {
            info!("Analysis cancelled");
            return Err(AnalysisError::Cancelled);
        }

        info!(
            "Found {} unused symbols in {} units ({} skipped)",
            report.findings.len(),
            report.units_analyzed,
            report.units_skipped.len()
        );
        debug!(
            "Reference cache: {} entries, {} hits, {} misses",
            report.cache.entries, report.cache.hits, report.cache.misses
        );

        Ok(report)
    }

    /// Build the run-wide read-only state before fanning out
    fn prepare<'a>(
        &'a self,
        index: &'a dyn SemanticIndex,
        root: &'a Path,
        units: &[CompilationUnit],
    ) -> Result<SharedState<'a>, AnalysisError> {
        let context = &self.context;
        let config = &context.config;

        let detector = GeneratedCodeDetector::new(&config.generated.header_patterns)
            .map_err(|e| AnalysisError::InvalidConfiguration(format!("generated header pattern: {}", e)))?;
        let rules = ReflectionRuleSet::from_config(&config.reflection).ok_or_else(|| {
            AnalysisError::InvalidConfiguration(format!(
                "unknown reflection rule set {:?}",
                config.reflection.rule_set
            ))
        })?;
        debug!("Using reflection rule set v{}", rules.version_number());

        let collector = DeclarationCollector::new(config);
        let mut unit_documents = HashMap::new();
        let mut documents = Vec::new();
        for unit in units {
            match collector.in_scope_documents(index, &unit.id) {
                Ok(docs) => {
                    documents.extend(docs.iter().cloned());
                    unit_documents.insert(unit.id.clone(), docs);
                }
                Err(e) => warn!("Cannot list documents of {}: {}", unit.name, e),
            }
        }

        let namespaces = DeclaredNamespaceSet::from_documents(index, &documents);

        Ok(SharedState {
            index,
            context,
            root,
            namespaces: Arc::new(namespaces),
            codebase: Arc::new(units.iter().map(|u| u.id.clone()).collect()),
            documents: Arc::new(documents),
            unit_documents,
            detector,
            rules,
            classifier: EntryPointClassifier::new(config),
        })
    }
}

fn analyze_unit(shared: &SharedState<'_>, unit: &CompilationUnit) -> UnitOutcome {
    let context = shared.context;
    if context.is_cancelled() {
        return UnitOutcome::Cancelled;
    }

    if let Err(source) = shared.index.compile(&unit.id) {
        let error = AnalysisError::Compilation {
            unit: unit.id.clone(),
            source,
        };
        warn!("{}", error);
        return UnitOutcome::Skipped(unit.id.clone());
    }

    let Some(documents) = shared.unit_documents.get(&unit.id) else {
        warn!("Skipping compilation unit '{}': documents unavailable", unit.name);
        return UnitOutcome::Skipped(unit.id.clone());
    };

    let collector = DeclarationCollector::new(&context.config);
    let types = match collector.collect_types(shared.index, documents) {
        Ok(types) => types,
        Err(source) => {
            let error = AnalysisError::Compilation {
                unit: unit.id.clone(),
                source,
            };
            warn!("{}", error);
            return UnitOutcome::Skipped(unit.id.clone());
        }
    };
    debug!("{}: {} declared types", unit.name, types.len());

    let gate = VisibilityGate::new(&context.config, context.analyzer, &shared.detector, documents);
    let fallback = FallbackScanner::new(shared.index, Arc::clone(&shared.documents), &shared.rules);
    let cache = ReferenceCache::new(unit.id.clone(), Arc::clone(&shared.codebase));
    let oracle = UsageOracle::new(shared.index, context, &shared.classifier, fallback, cache);

    let mut analysis = UnitAnalysis {
        shared,
        unit,
        gate,
        oracle,
        findings: Vec::new(),
        symbols_skipped: 0,
    };

    for ty in &types {
        if context.is_cancelled() {
            return UnitOutcome::Cancelled;
        }
        if !shared.namespaces.is_allowed(ty.namespace_or_global()) {
            debug!("Out of scope: {} ({})", ty.key, ty.namespace_or_global());
            continue;
        }
        if !analysis.analyze_type(ty) {
            return UnitOutcome::Cancelled;
        }
    }

    debug!(
        "{}: {} findings, cache {}",
        unit.name,
        analysis.findings.len(),
        analysis.oracle.cache_stats()
    );

    UnitOutcome::Completed {
        cache: analysis.oracle.cache_stats(),
        findings: analysis.findings,
        symbols_skipped: analysis.symbols_skipped,
    }
}

/// Sequential analysis of one unit's types
struct UnitAnalysis<'s, 'a> {
    shared: &'s SharedState<'a>,
    unit: &'s CompilationUnit,
    gate: VisibilityGate<'s>,
    oracle: UsageOracle<'s>,
    findings: Vec<Finding>,
    symbols_skipped: usize,
}

impl UnitAnalysis<'_, '_> {
    /// Analyze a type, its members and their parameters. Returns `false`
    /// when the run was cancelled midway.
    fn analyze_type(&mut self, ty: &Symbol) -> bool {
        if self.gate.allows(ty) && is_standalone_candidate(ty) {
            self.check(ty, None);
        }

        let members = match self.shared.index.members(ty) {
            Ok(members) => members,
            Err(source) => {
                self.skip(ty, source);
                return true;
            }
        };

        for member in &members {
            if self.shared.context.is_cancelled() {
                return false;
            }
            if !self.gate.allows(member) {
                continue;
            }

            if is_standalone_candidate(member) {
                self.check(member, Some(ty));
            }

            if member.kind == SymbolKind::Method {
                match self.oracle.unused_parameters(member, Some(ty)) {
                    Ok(unused) => {
                        for parameter in &unused {
                            self.report(parameter, Remark::NoReferences);
                        }
                    }
                    Err(source) => self.skip(member, source),
                }
            }
        }

        true
    }

    fn check(&mut self, symbol: &Symbol, owner: Option<&Symbol>) {
        match self.oracle.evaluate(symbol, owner) {
            Ok(Verdict::Unused(remark)) => self.report(symbol, remark),
            Ok(Verdict::Used(_)) => {}
            Err(source) => self.skip(symbol, source),
        }
    }

    fn report(&mut self, symbol: &Symbol, remark: Remark) {
        let Some(location) = symbol.primary_location() else {
            debug!("No declaration location for {}", symbol.key);
            return;
        };
        let mut finding = Finding::new(symbol, location.clone(), remark, self.shared.root);
        finding.module = self.unit.name.clone();
        self.findings.push(finding);
    }

    fn skip(&mut self, symbol: &Symbol, source: IndexError) {
        let error = AnalysisError::Query {
            symbol: symbol.key.clone(),
            source,
        };
        warn!("{}", error);
        self.symbols_skipped += 1;
    }
}
