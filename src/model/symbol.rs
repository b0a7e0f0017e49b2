// Symbol types shared by the index, the oracle and the reporters

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use super::{Location, UnitId};

/// Display string for the root namespace
pub const GLOBAL_NAMESPACE: &str = "<global namespace>";

/// Canonical identity of a symbol
///
/// Keys follow the documentation-ID shape so that two queries for the same
/// declaration always yield byte-identical keys within one run:
///
/// - types: `T:App.Models.Order`, nested `T:App.Models.Order+Line`,
///   generic arity as a backtick suffix (`T:App.Repo`1`)
/// - methods: `M:App.Models.Order.Total(System.Int32,System.String)`
/// - properties: `P:App.Models.Order.Id`
/// - fields: `F:App.Models.Order._id`
/// - parameters: `A:App.Models.Order.Total(System.Int32)#count`
///
/// Types in the global namespace carry no namespace prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolKey(String);

impl SymbolKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Key for a top-level or nested type. `containing` is the key of the
    /// enclosing type for nested declarations.
    pub fn for_type(namespace: Option<&str>, containing: Option<&SymbolKey>, name: &str) -> Self {
        if let Some(outer) = containing {
            return Self(format!("T:{}+{}", outer.body(), name));
        }
        match namespace {
            Some(ns) if !ns.is_empty() => Self(format!("T:{}.{}", ns, name)),
            _ => Self(format!("T:{}", name)),
        }
    }

    pub fn for_method(containing: &SymbolKey, name: &str, parameter_types: &[String]) -> Self {
        Self(format!(
            "M:{}.{}({})",
            containing.body(),
            name,
            parameter_types.join(",")
        ))
    }

    pub fn for_property(containing: &SymbolKey, name: &str) -> Self {
        Self(format!("P:{}.{}", containing.body(), name))
    }

    pub fn for_field(containing: &SymbolKey, name: &str) -> Self {
        Self(format!("F:{}.{}", containing.body(), name))
    }

    pub fn for_parameter(method: &SymbolKey, name: &str) -> Self {
        Self(format!("A:{}#{}", method.body(), name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key text without the kind prefix
    pub fn body(&self) -> &str {
        match self.0.split_once(':') {
            Some((_, rest)) => rest,
            None => &self.0,
        }
    }

    /// Unqualified name of the keyed symbol, without generic arity or
    /// parameter list (`T:Ns.Hub`1` -> `Hub`)
    pub fn simple_name(&self) -> &str {
        let body = self.body();
        if let Some((_, param)) = body.rsplit_once('#') {
            return param;
        }
        let body = body.split('(').next().unwrap_or(body);
        let last = body
            .rsplit(|c| c == '.' || c == '+')
            .next()
            .unwrap_or(body);
        last.split('`').next().unwrap_or(last)
    }
}

impl std::fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of symbol the analysis can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Type,
    Method,
    Property,
    Field,
    Parameter,
}

impl SymbolKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            SymbolKind::Type => "Type",
            SymbolKind::Method => "Method",
            SymbolKind::Property => "Property",
            SymbolKind::Field => "Field",
            SymbolKind::Parameter => "Parameter",
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Shape of a named type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Class,
    Interface,
    Struct,
    Enum,
    Delegate,
    Record,
}

impl TypeKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            TypeKind::Class => "Class",
            TypeKind::Interface => "Interface",
            TypeKind::Struct => "Struct",
            TypeKind::Enum => "Enum",
            TypeKind::Delegate => "Delegate",
            TypeKind::Record => "Record",
        }
    }
}

/// Role a method plays in its containing type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MethodKind {
    #[default]
    Ordinary,
    Constructor,
    StaticConstructor,
    PropertyAccessor,
    EventAccessor,
    ExplicitInterfaceImplementation,
    Destructor,
    Operator,
}

impl MethodKind {
    /// Methods whose liveness follows the construct they belong to
    pub fn is_governed_by_owner(&self) -> bool {
        !matches!(self, MethodKind::Ordinary)
    }
}

/// Declared accessibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Accessibility {
    Public,
    Internal,
    Protected,
    ProtectedOrInternal,
    ProtectedAndInternal,
    #[default]
    Private,
}

impl Accessibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Accessibility::Public => "public",
            Accessibility::Internal => "internal",
            Accessibility::Protected => "protected",
            Accessibility::ProtectedOrInternal => "protected internal",
            Accessibility::ProtectedAndInternal => "private protected",
            Accessibility::Private => "private",
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Accessibility::Protected
                | Accessibility::ProtectedOrInternal
                | Accessibility::ProtectedAndInternal
        )
    }
}

impl std::fmt::Display for Accessibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Passing mode of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RefKind {
    #[default]
    Value,
    Ref,
    Out,
    In,
}

impl RefKind {
    /// By-reference parameters are bound at every call site
    pub fn is_by_reference(&self) -> bool {
        !matches!(self, RefKind::Value)
    }
}

/// A declared program entity
///
/// Equality and hashing go through [`SymbolKey`] only, so two `Symbol`
/// values returned by separate index queries compare equal when they denote
/// the same declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub key: SymbolKey,

    pub kind: SymbolKind,

    /// Simple name (e.g., "OrderService")
    pub name: String,

    /// Containing namespace; `None` for the global namespace
    #[serde(default)]
    pub namespace: Option<String>,

    /// Compilation unit the symbol is declared in
    pub unit: UnitId,

    #[serde(default)]
    pub containing_type: Option<SymbolKey>,

    /// Display name of the containing type
    #[serde(default)]
    pub containing_name: Option<String>,

    /// Declaring method of a parameter
    #[serde(default)]
    pub containing_method: Option<SymbolKey>,

    #[serde(default)]
    pub accessibility: Accessibility,

    #[serde(default)]
    pub declarations: Vec<Location>,

    #[serde(default)]
    pub is_implicit: bool,

    #[serde(default)]
    pub is_static: bool,

    #[serde(default)]
    pub is_abstract: bool,

    #[serde(default)]
    pub is_override: bool,

    #[serde(default)]
    pub is_extern: bool,

    #[serde(default)]
    pub type_kind: Option<TypeKind>,

    #[serde(default)]
    pub method_kind: Option<MethodKind>,

    /// Return type for methods, declared type for members and parameters
    #[serde(default)]
    pub value_type: Option<String>,

    /// Parameter types of a method, in declaration order
    #[serde(default)]
    pub parameter_types: Vec<String>,

    /// Parameter names of a method, in declaration order
    #[serde(default)]
    pub parameter_names: Vec<String>,

    #[serde(default)]
    pub ref_kind: RefKind,

    /// Attribute names without the `Attribute` suffix
    #[serde(default)]
    pub attributes: Vec<String>,

    /// Base type chain, nearest first
    #[serde(default)]
    pub base_types: Vec<SymbolKey>,

    /// Every interface the type implements, directly or inherited
    #[serde(default)]
    pub interfaces: Vec<SymbolKey>,

    /// Interface members this member implements explicitly
    #[serde(default)]
    pub explicit_implementations: Vec<SymbolKey>,
}

impl Symbol {
    pub fn new(key: SymbolKey, kind: SymbolKind, name: impl Into<String>, unit: UnitId) -> Self {
        Self {
            key,
            kind,
            name: name.into(),
            namespace: None,
            unit,
            containing_type: None,
            containing_name: None,
            containing_method: None,
            accessibility: Accessibility::default(),
            declarations: Vec::new(),
            is_implicit: false,
            is_static: false,
            is_abstract: false,
            is_override: false,
            is_extern: false,
            type_kind: None,
            method_kind: None,
            value_type: None,
            parameter_types: Vec::new(),
            parameter_names: Vec::new(),
            ref_kind: RefKind::default(),
            attributes: Vec::new(),
            base_types: Vec::new(),
            interfaces: Vec::new(),
            explicit_implementations: Vec::new(),
        }
    }

    pub fn is_interface(&self) -> bool {
        self.type_kind == Some(TypeKind::Interface)
    }

    pub fn is_class(&self) -> bool {
        matches!(self.type_kind, Some(TypeKind::Class) | Some(TypeKind::Record))
    }

    pub fn method_kind(&self) -> MethodKind {
        self.method_kind.unwrap_or_default()
    }

    /// Whether the symbol carries the attribute, with or without the
    /// `Attribute` suffix
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| {
            let a = a.rsplit('.').next().unwrap_or(a);
            let a = a.strip_suffix("Attribute").unwrap_or(a);
            a == name
        })
    }

    pub fn has_any_attribute(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.has_attribute(n))
    }

    /// Simple names of the base type chain
    pub fn base_type_names(&self) -> impl Iterator<Item = &str> {
        self.base_types.iter().map(|k| k.simple_name())
    }

    pub fn interface_names(&self) -> impl Iterator<Item = &str> {
        self.interfaces.iter().map(|k| k.simple_name())
    }

    /// Namespace for scope checks, with the global sentinel for `None`
    pub fn namespace_or_global(&self) -> &str {
        self.namespace.as_deref().unwrap_or(GLOBAL_NAMESPACE)
    }

    /// First declaration, used for reporting
    pub fn primary_location(&self) -> Option<&Location> {
        self.declarations.first()
    }

    /// Name shown in findings; parameters render as `Method :: param`
    pub fn display_name(&self) -> String {
        match (self.kind, &self.containing_method) {
            (SymbolKind::Parameter, Some(method)) => {
                format!("{} :: {}", method.simple_name(), self.name)
            }
            _ => self.name.clone(),
        }
    }

    /// Check if this symbol matches a retain pattern (`*Suffix`, `Prefix*`,
    /// simple name, or qualified name)
    pub fn matches_pattern(&self, pattern: &str) -> bool {
        if let Some(suffix) = pattern.strip_prefix('*') {
            self.name.ends_with(suffix)
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            self.name.starts_with(prefix)
        } else {
            self.name == pattern || self.qualified_name() == pattern
        }
    }

    /// Dotted name without the key prefix or parameter list
    pub fn qualified_name(&self) -> String {
        let body = self.key.body();
        let body = body.split('(').next().unwrap_or(body);
        body.replace('+', ".")
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}
