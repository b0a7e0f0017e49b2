mod finding;
mod reference;
mod symbol;

pub use finding::{Finding, FindingIcon, Remark};
pub use reference::{Location, Reference, UnitId};
pub use symbol::{
    Accessibility, MethodKind, RefKind, Symbol, SymbolKey, SymbolKind, TypeKind, GLOBAL_NAMESPACE,
};
