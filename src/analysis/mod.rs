//! Usage determination
//!
//! Per unit: declared types are scope-filtered by namespace, gated by
//! visibility and generated-code markers, then handed member by member to
//! the [`UsageOracle`]. The [`Orchestrator`] runs units concurrently.

pub mod entry_points;
pub mod fallback;
pub mod gate;
pub mod oracle;
mod orchestrator;
pub mod parameters;
pub mod reflection;
pub mod scope;

pub use entry_points::{EntryPointClassifier, EntryPointKind, EntryPointRule};
pub use fallback::{FallbackHit, FallbackScanner};
pub use gate::{GateRejection, GeneratedCodeDetector, VisibilityGate};
pub use oracle::{UsageEvidence, UsageOracle, Verdict};
pub use orchestrator::{AnalysisReport, CacheTotals, Orchestrator, RunContext};
pub use parameters::ParameterAnalyzer;
pub use reflection::{ReflectionLookup, ReflectionRule, ReflectionRuleSet};
pub use scope::DeclaredNamespaceSet;
