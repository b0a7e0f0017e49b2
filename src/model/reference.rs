use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::SymbolKey;

/// Identifier of a compilation unit (a module / project)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Location in source code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Unit the location belongs to
    pub unit: UnitId,
    /// File path
    pub file: PathBuf,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Starting byte offset
    #[serde(default)]
    pub start_byte: usize,
    /// Ending byte offset
    #[serde(default)]
    pub end_byte: usize,
    /// False for metadata-only locations outside the analyzed sources
    #[serde(default = "default_in_source")]
    pub in_source: bool,
}

fn default_in_source() -> bool {
    true
}

impl Location {
    pub fn new(
        unit: UnitId,
        file: impl Into<PathBuf>,
        line: usize,
        column: usize,
        start_byte: usize,
        end_byte: usize,
    ) -> Self {
        Self {
            unit,
            file: file.into(),
            line,
            column,
            start_byte,
            end_byte,
            in_source: true,
        }
    }

    /// A location that only exists in referenced metadata
    pub fn metadata(unit: UnitId, assembly: impl Into<PathBuf>) -> Self {
        Self {
            unit,
            file: assembly.into(),
            line: 0,
            column: 0,
            start_byte: 0,
            end_byte: 0,
            in_source: false,
        }
    }

    /// True when the index supplied byte offsets for this location
    pub fn has_offsets(&self) -> bool {
        self.start_byte != 0 || self.end_byte != 0
    }

    /// Same file and overlapping spans. An empty span matches on its start.
    /// Without offsets on either side, line and column decide.
    pub fn coincides_with(&self, other: &Location) -> bool {
        if self.file != other.file {
            return false;
        }
        if !self.has_offsets() || !other.has_offsets() {
            return self.line == other.line && self.column == other.column;
        }
        if self.start_byte == other.start_byte {
            return true;
        }
        self.start_byte < other.end_byte && other.start_byte < self.end_byte
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// A use site of a symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Where the use occurs
    pub location: Location,
    /// The symbol the use resolves to
    pub target: SymbolKey,
}

impl Reference {
    pub fn new(location: Location, target: SymbolKey) -> Self {
        Self { location, target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(file: &str, start: usize, end: usize) -> Location {
        Location::new(UnitId::new("App"), file, 1, 1, start, end)
    }

    #[test]
    fn test_coincides_overlapping_span() {
        assert!(loc("a.cs", 10, 20).coincides_with(&loc("a.cs", 15, 18)));
        assert!(loc("a.cs", 10, 20).coincides_with(&loc("a.cs", 10, 10)));
    }

    #[test]
    fn test_does_not_coincide_across_files_or_disjoint() {
        assert!(!loc("a.cs", 10, 20).coincides_with(&loc("b.cs", 10, 20)));
        assert!(!loc("a.cs", 10, 20).coincides_with(&loc("a.cs", 20, 25)));
    }

    #[test]
    fn test_locations_without_offsets_compare_by_position() {
        let at = |line, column| Location::new(UnitId::new("App"), "a.cs", line, column, 0, 0);
        assert!(!at(1, 18).has_offsets());
        assert!(at(1, 18).coincides_with(&at(1, 18)));
        assert!(!at(1, 18).coincides_with(&at(1, 38)));
        assert!(!at(1, 18).coincides_with(&at(3, 18)));
        assert!(!loc("a.cs", 10, 20).coincides_with(&at(7, 1)));
    }

    #[test]
    fn test_metadata_location_is_not_in_source() {
        let meta = Location::metadata(UnitId::new("App"), "System.Runtime.dll");
        assert!(!meta.in_source);
    }
}
