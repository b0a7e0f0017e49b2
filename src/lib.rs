//! deadsymbols - find declared symbols with no reachable use
//!
//! Given a multi-module codebase exposed through a [`SemanticIndex`], this
//! library reports types, members and parameters that nothing uses.
//!
//! # Architecture
//!
//! The analysis pipeline consists of:
//! 1. **Discovery** - Collect in-scope documents and declared types per unit
//! 2. **Scope filtering** - Keep types whose namespace is declared in source
//! 3. **Gating** - Apply visibility switches and generated-code markers
//! 4. **Usage determination** - Ask the [`UsageOracle`] tier by tier
//! 5. **Reporting** - Output findings as colored text or JSON
//!
//! Units are analyzed concurrently; each keeps its own reference cache.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod discovery;
pub mod error;
pub mod index;
pub mod model;
pub mod report;

pub use analysis::{AnalysisReport, Orchestrator, RunContext, UsageOracle, Verdict};
pub use config::Config;
pub use error::{AnalysisError, IndexError};
pub use index::snapshot::load_index;
pub use index::{MemoryIndex, MemoryIndexBuilder, SemanticIndex};
pub use model::{Finding, Symbol, SymbolKey, SymbolKind, UnitId};
pub use report::{ReportFormat, Reporter};
