//! Reflection-style usage heuristics
//!
//! A symbol named by a string literal passed to a well-known name-based
//! lookup counts as used. The set of recognized lookups is versioned: newer
//! rule sets only ever add rules, so results from an older version stay a
//! subset of a newer one.

use crate::config::ReflectionConfig;
use crate::index::SyntaxNode;
use crate::model::{Symbol, SymbolKind, TypeKind};

/// Newest rule set version
pub const LATEST_RULE_SET: u32 = 2;

/// Category of name-based lookup a rule recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReflectionLookup {
    /// `typeof(T).GetMethod("Name")` and friends
    MemberByName,
    /// `Type.GetType("Ns.Name")`
    TypeByName,
    /// `Activator.CreateInstance("Asm", "Ns.Name")`
    CreateInstanceByName,
    /// `Enum.Parse<T>("Member")`
    EnumParse,
}

impl ReflectionLookup {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReflectionLookup::MemberByName => "member-by-name",
            ReflectionLookup::TypeByName => "type-by-name",
            ReflectionLookup::CreateInstanceByName => "create-instance-by-name",
            ReflectionLookup::EnumParse => "enum-parse",
        }
    }
}

impl std::fmt::Display for ReflectionLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recognized lookup call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionRule {
    pub lookup: ReflectionLookup,
    /// Invoked method name
    pub method: String,
    /// Required receiver text (last segment), any receiver when `None`
    pub receiver: Option<String>,
}

impl ReflectionRule {
    pub fn new(lookup: ReflectionLookup, method: &str) -> Self {
        Self {
            lookup,
            method: method.to_string(),
            receiver: None,
        }
    }

    pub fn on(mut self, receiver: &str) -> Self {
        self.receiver = Some(receiver.to_string());
        self
    }

    /// Whether `node` is a call this rule recognizes that names `symbol`
    pub fn matches(&self, node: &SyntaxNode, symbol: &Symbol) -> bool {
        let SyntaxNode::Invocation {
            method,
            receiver,
            type_arguments,
            string_arguments,
            ..
        } = node
        else {
            return false;
        };

        if method != &self.method {
            return false;
        }
        if let Some(required) = &self.receiver {
            let actual = receiver.as_deref().map(last_segment);
            if actual != Some(required.as_str()) {
                return false;
            }
        }

        match self.lookup {
            ReflectionLookup::MemberByName => {
                is_member(symbol)
                    && string_arguments.iter().any(|a| a == &symbol.name)
                    && receiver_allows_owner(receiver.as_deref(), symbol)
            }
            ReflectionLookup::TypeByName | ReflectionLookup::CreateInstanceByName => {
                symbol.kind == SymbolKind::Type
                    && string_arguments.iter().any(|a| names_type(a, symbol))
            }
            ReflectionLookup::EnumParse => matches_enum_parse(symbol, type_arguments, string_arguments),
        }
    }
}

fn is_member(symbol: &Symbol) -> bool {
    matches!(
        symbol.kind,
        SymbolKind::Method | SymbolKind::Property | SymbolKind::Field
    )
}

fn last_segment(text: &str) -> &str {
    text.rsplit('.').next().unwrap_or(text)
}

/// `typeof(Other).GetMethod("Name")` does not name a member of this type
fn receiver_allows_owner(receiver: Option<&str>, symbol: &Symbol) -> bool {
    let Some(inner) = receiver
        .and_then(|r| r.trim().strip_prefix("typeof("))
        .and_then(|r| r.strip_suffix(')'))
    else {
        return true;
    };
    let inner = inner.split('<').next().unwrap_or(inner).trim();
    match &symbol.containing_name {
        Some(owner) => last_segment(inner) == owner,
        None => true,
    }
}

/// A type name argument, simple or qualified, optionally assembly-qualified
fn names_type(argument: &str, symbol: &Symbol) -> bool {
    let name = argument.split(',').next().unwrap_or(argument).trim();
    let name = name.split('`').next().unwrap_or(name);
    let name = name.replace('+', ".");
    name == symbol.name || name == symbol.qualified_name() || name.ends_with(&format!(".{}", symbol.name))
}

fn matches_enum_parse(symbol: &Symbol, type_arguments: &[String], string_arguments: &[String]) -> bool {
    match symbol.kind {
        SymbolKind::Type if symbol.type_kind == Some(TypeKind::Enum) => type_arguments
            .iter()
            .any(|t| last_segment(t) == symbol.name),
        SymbolKind::Field => {
            let owner_matches = match &symbol.containing_name {
                Some(owner) => {
                    type_arguments.is_empty() || type_arguments.iter().any(|t| last_segment(t) == owner)
                }
                None => true,
            };
            owner_matches && string_arguments.iter().any(|a| a == &symbol.name)
        }
        _ => false,
    }
}

/// An ordered, versioned list of reflection rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionRuleSet {
    version: u32,
    rules: Vec<ReflectionRule>,
}

impl ReflectionRuleSet {
    /// Member, type, activator and enum-parse lookups
    pub fn v1() -> Self {
        use ReflectionLookup::*;

        let mut rules: Vec<ReflectionRule> = [
            "GetMethod",
            "GetProperty",
            "GetField",
            "GetMember",
            "GetEvent",
            "InvokeMember",
        ]
        .iter()
        .map(|m| ReflectionRule::new(MemberByName, m))
        .collect();

        rules.push(ReflectionRule::new(TypeByName, "GetType").on("Type"));
        rules.push(ReflectionRule::new(TypeByName, "GetType").on("Assembly"));
        rules.push(ReflectionRule::new(TypeByName, "GetType"));
        rules.push(ReflectionRule::new(CreateInstanceByName, "CreateInstance").on("Activator"));
        rules.push(ReflectionRule::new(EnumParse, "Parse").on("Enum"));

        Self { version: 1, rules }
    }

    /// Adds runtime reflection extensions, remote activation and the
    /// non-throwing enum lookups
    pub fn v2() -> Self {
        use ReflectionLookup::*;

        let mut set = Self::v1();
        set.version = 2;
        for method in ["GetRuntimeMethod", "GetRuntimeProperty", "GetRuntimeField", "GetRuntimeEvent"] {
            set.rules.push(ReflectionRule::new(MemberByName, method));
        }
        set.rules
            .push(ReflectionRule::new(CreateInstanceByName, "CreateInstanceFrom").on("Activator"));
        set.rules
            .push(ReflectionRule::new(CreateInstanceByName, "CreateInstanceAndUnwrap"));
        set.rules.push(ReflectionRule::new(EnumParse, "TryParse").on("Enum"));
        set.rules.push(ReflectionRule::new(EnumParse, "IsDefined").on("Enum"));
        set
    }

    pub fn latest() -> Self {
        Self::v2()
    }

    /// Rule set for a version number, `None` when unknown
    pub fn version(version: u32) -> Option<Self> {
        match version {
            1 => Some(Self::v1()),
            2 => Some(Self::v2()),
            _ => None,
        }
    }

    /// Rule set selected by configuration plus configured extra lookups
    pub fn from_config(config: &ReflectionConfig) -> Option<Self> {
        let base = match config.rule_set {
            Some(v) => Self::version(v)?,
            None => Self::latest(),
        };
        Some(base.with_member_lookups(&config.extra_member_lookups))
    }

    /// Treat additional methods as member-by-name lookups
    pub fn with_member_lookups(mut self, methods: &[String]) -> Self {
        for method in methods {
            let rule = ReflectionRule::new(ReflectionLookup::MemberByName, method);
            if !self.rules.contains(&rule) {
                self.rules.push(rule);
            }
        }
        self
    }

    pub fn with_rule(mut self, rule: ReflectionRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn version_number(&self) -> u32 {
        self.version
    }

    pub fn rules(&self) -> &[ReflectionRule] {
        &self.rules
    }

    /// First rule recognizing `node` as a lookup of `symbol`
    pub fn find_match(&self, node: &SyntaxNode, symbol: &Symbol) -> Option<ReflectionLookup> {
        self.rules
            .iter()
            .find(|r| r.matches(node, symbol))
            .map(|r| r.lookup)
    }
}

impl Default for ReflectionRuleSet {
    fn default() -> Self {
        Self::latest()
    }
}
