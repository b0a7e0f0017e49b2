//! Error types for a dead-symbol analysis run

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::model::{SymbolKey, UnitId};

/// Failure reported by a semantic index implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("compilation unit '{0}' is not known to the index")]
    UnknownUnit(UnitId),
    #[error("symbol '{0}' is not known to the index")]
    UnknownSymbol(SymbolKey),
    #[error("compilation of '{unit}' failed: {message}")]
    CompilationFailed { unit: UnitId, message: String },
    #[error("index query failed: {0}")]
    Query(String),
}

/// Errors surfaced by an analysis run
///
/// `TargetNotFound`, `IndexInitialization` and `InvalidConfiguration` abort
/// the whole run, as does `Cancelled`. Unit and symbol failures are
/// recovered inside the orchestrator and only logged.
#[derive(Error, Diagnostic, Debug)]
pub enum AnalysisError {
    #[error("analysis target not found: {}", .0.display())]
    #[diagnostic(code(deadsymbols::target_not_found), help("pass the path of an index snapshot file"))]
    TargetNotFound(PathBuf),

    #[error("semantic index failed to initialize: {0}")]
    #[diagnostic(code(deadsymbols::index_init))]
    IndexInitialization(String),

    #[error("invalid configuration: {0}")]
    #[diagnostic(code(deadsymbols::config))]
    InvalidConfiguration(String),

    #[error("skipping compilation unit '{unit}': {source}")]
    #[diagnostic(code(deadsymbols::unit_skipped))]
    Compilation {
        unit: UnitId,
        #[source]
        source: IndexError,
    },

    #[error("skipping symbol '{symbol}': {source}")]
    #[diagnostic(code(deadsymbols::symbol_skipped))]
    Query {
        symbol: SymbolKey,
        #[source]
        source: IndexError,
    },

    #[error("analysis cancelled")]
    #[diagnostic(code(deadsymbols::cancelled))]
    Cancelled,
}

pub type IndexResult<T> = Result<T, IndexError>;
