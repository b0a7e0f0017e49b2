use serde::Serialize;
use std::path::{Path, PathBuf};

use super::{Accessibility, Location, Symbol, SymbolKind, TypeKind};

/// Which evidence category was exhausted for a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remark {
    /// No tier found a use of a member or parameter
    NoReferences,
    /// No tier found a use of a type of this shape
    TypeKind(TypeKind),
}

impl std::fmt::Display for Remark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Remark::NoReferences => f.write_str("no references found"),
            Remark::TypeKind(kind) => write!(f, "TypeKind={}", kind.display_name()),
        }
    }
}

/// Classification icon attached to each finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingIcon {
    Class,
    Interface,
    Struct,
    Enum,
    Delegate,
    Method,
    Property,
    Field,
    Parameter,
}

impl FindingIcon {
    pub fn for_symbol(symbol: &Symbol) -> Self {
        match symbol.kind {
            SymbolKind::Type => match symbol.type_kind {
                Some(TypeKind::Interface) => FindingIcon::Interface,
                Some(TypeKind::Struct) => FindingIcon::Struct,
                Some(TypeKind::Enum) => FindingIcon::Enum,
                Some(TypeKind::Delegate) => FindingIcon::Delegate,
                Some(TypeKind::Class) | Some(TypeKind::Record) | None => FindingIcon::Class,
            },
            SymbolKind::Method => FindingIcon::Method,
            SymbolKind::Property => FindingIcon::Property,
            SymbolKind::Field => FindingIcon::Field,
            SymbolKind::Parameter => FindingIcon::Parameter,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            FindingIcon::Class => "C",
            FindingIcon::Interface => "I",
            FindingIcon::Struct => "S",
            FindingIcon::Enum => "E",
            FindingIcon::Delegate => "D",
            FindingIcon::Method => "m",
            FindingIcon::Property => "p",
            FindingIcon::Field => "f",
            FindingIcon::Parameter => "a",
        }
    }
}

/// One reported unused symbol
#[derive(Debug, Clone)]
pub struct Finding {
    /// Owning module (compilation unit) name
    pub module: String,

    pub kind: SymbolKind,

    /// Display name of the containing type; empty for top-level types
    pub containing_type: String,

    /// Display name of the symbol (`Method :: param` for parameters)
    pub name: String,

    pub accessibility: Accessibility,

    /// Declaration location
    pub location: Location,

    /// Declaring file relative to the analysis root, when it lies under it
    pub relative_path: PathBuf,

    pub remark: String,

    pub icon: FindingIcon,
}

impl Finding {
    pub fn new(symbol: &Symbol, location: Location, remark: Remark, root: &Path) -> Self {
        let relative_path = location
            .file
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| location.file.clone());

        Self {
            module: symbol.unit.to_string(),
            kind: symbol.kind,
            containing_type: symbol.containing_name.clone().unwrap_or_default(),
            name: symbol.display_name(),
            accessibility: symbol.accessibility,
            location,
            relative_path,
            remark: remark.to_string(),
            icon: FindingIcon::for_symbol(symbol),
        }
    }

    /// 1-based line of the declaration
    pub fn line(&self) -> usize {
        self.location.line
    }

    /// Key used to compare findings across runs
    pub fn identity(&self) -> (String, PathBuf, usize, SymbolKind, String) {
        (
            self.module.clone(),
            self.location.file.clone(),
            self.location.line,
            self.kind,
            self.name.clone(),
        )
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} '{}' ({}) - {}",
            self.accessibility,
            self.kind.display_name().to_lowercase(),
            self.name,
            self.location,
            self.remark
        )
    }
}
