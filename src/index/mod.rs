//! Boundary to the semantic index
//!
//! The analysis never parses source text. Everything it knows about the
//! codebase comes through [`SemanticIndex`], which a host language service
//! or compiler frontend implements. [`MemoryIndex`] is the in-crate
//! implementation used by the tests and by the CLI's snapshot loader.
//!
//! Every method is a potential suspension point: implementations may block
//! on a language-server round trip.

mod memory;
pub mod snapshot;

pub use memory::{MemoryIndex, MemoryIndexBuilder};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::IndexResult;
use crate::model::{Location, Reference, Symbol, SymbolKey, UnitId};

/// An independently buildable module of the codebase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub id: UnitId,
    /// Display name used as the owning module in findings
    pub name: String,
}

/// A source document belonging to one unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub unit: UnitId,
    pub path: PathBuf,
    /// Full text, used for textual pre-filtering and header checks
    #[serde(default)]
    pub text: String,
}

impl Document {
    pub fn new(unit: UnitId, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            unit,
            path: path.into(),
            text: text.into(),
        }
    }

    /// Cheap textual check run before any semantic resolution
    pub fn mentions(&self, name: &str) -> bool {
        !name.is_empty() && self.text.contains(name)
    }
}

/// Namespace-level declaration found at the top of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "form", content = "name", rename_all = "snake_case")]
pub enum NamespaceDeclaration {
    /// `namespace A.B { ... }`, nested blocks already joined with dots
    Block(String),
    /// `namespace A.B;`
    FileScoped(String),
    /// A type or statement declared outside any namespace
    Global,
}

/// Syntax nodes the fallback scan inspects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum SyntaxNode {
    /// A simple name in an expression or type position
    Identifier { text: String, location: Location },
    /// A call such as `typeof(Foo).GetMethod("Bar")` or `Enum.Parse<Color>("Red")`
    Invocation {
        /// Name of the invoked method (`GetMethod`)
        method: String,
        /// Text of the receiver expression (`typeof(Foo)`, `Type`, `Activator`)
        #[serde(default)]
        receiver: Option<String>,
        /// Type arguments written at the call (`Parse<Color>` -> `Color`)
        #[serde(default)]
        type_arguments: Vec<String>,
        /// Arguments that are plain string literals, unquoted
        #[serde(default)]
        string_arguments: Vec<String>,
        location: Location,
    },
}

impl SyntaxNode {
    pub fn location(&self) -> &Location {
        match self {
            SyntaxNode::Identifier { location, .. } => location,
            SyntaxNode::Invocation { location, .. } => location,
        }
    }
}

/// Queries the usage analysis needs from a semantic index
pub trait SemanticIndex: Send + Sync {
    /// All compilation units of the codebase
    fn units(&self) -> IndexResult<Vec<CompilationUnit>>;

    /// Obtain the unit's compilation; an error means the unit is skipped
    fn compile(&self, unit: &UnitId) -> IndexResult<()>;

    /// Source documents of a unit
    fn documents(&self, unit: &UnitId) -> IndexResult<Vec<Document>>;

    /// Namespace declarations of a document, including file-scoped forms
    fn namespace_declarations(&self, document: &Document) -> IndexResult<Vec<NamespaceDeclaration>>;

    /// Top-level and nested named types declared in a document
    fn declared_types(&self, document: &Document) -> IndexResult<Vec<Symbol>>;

    /// Methods, properties and fields declared by a type, in source order
    fn members(&self, ty: &Symbol) -> IndexResult<Vec<Symbol>>;

    /// Parameters of a method, in declaration order
    fn parameters(&self, method: &Symbol) -> IndexResult<Vec<Symbol>>;

    /// Every use of the symbol across the whole program
    fn find_references(&self, symbol: &Symbol) -> IndexResult<Vec<Reference>>;

    /// Every interface a type implements, directly or through its bases
    fn all_interfaces(&self, ty: &Symbol) -> IndexResult<Vec<Symbol>>;

    /// Types implementing an interface
    fn find_implementations(&self, interface: &Symbol) -> IndexResult<Vec<Symbol>>;

    /// Classes deriving from a class, directly or transitively
    fn find_derived_classes(&self, class: &Symbol) -> IndexResult<Vec<Symbol>>;

    /// Syntax nodes of a document that may denote a symbol
    fn syntax_nodes(&self, document: &Document) -> IndexResult<Vec<SyntaxNode>>;

    /// Resolve the symbol an identifier denotes
    fn resolve(&self, unit: &UnitId, node: &SyntaxNode) -> IndexResult<Option<SymbolKey>>;
}
