//! In-memory semantic index
//!
//! Holds a fully materialized snapshot of a codebase: units, documents,
//! symbols, references and the syntax nodes the fallback scan looks at.
//! [`MemoryIndexBuilder`] assembles one programmatically; the snapshot
//! loader fills one from a serialized file.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::{CompilationUnit, Document, NamespaceDeclaration, SemanticIndex, SyntaxNode};
use crate::error::{IndexError, IndexResult};
use crate::model::{
    Accessibility, Location, MethodKind, RefKind, Reference, Symbol, SymbolKey, SymbolKind,
    TypeKind, UnitId,
};

#[derive(Debug, Clone)]
struct UnitEntry {
    unit: CompilationUnit,
    documents: Vec<PathBuf>,
    compile_error: Option<String>,
}

/// Semantic index backed by plain maps
#[derive(Debug, Default)]
pub struct MemoryIndex {
    root: PathBuf,
    units: Vec<UnitEntry>,
    documents: HashMap<PathBuf, Document>,
    symbols: HashMap<SymbolKey, Symbol>,
    /// Symbol keys in insertion order, for stable enumeration
    symbol_order: Vec<SymbolKey>,
    members: HashMap<SymbolKey, Vec<SymbolKey>>,
    parameters: HashMap<SymbolKey, Vec<SymbolKey>>,
    references: HashMap<SymbolKey, Vec<Reference>>,
    namespaces: HashMap<PathBuf, Vec<NamespaceDeclaration>>,
    syntax: HashMap<PathBuf, Vec<SyntaxNode>>,
    /// Identifier resolutions keyed by file, line, column and start offset
    resolutions: HashMap<(PathBuf, usize, usize, usize), SymbolKey>,
}

impl MemoryIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Directory findings are made relative to
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn symbol(&self, key: &SymbolKey) -> Option<&Symbol> {
        self.symbols.get(key)
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn reference_count(&self) -> usize {
        self.references.values().map(Vec::len).sum()
    }

    pub(crate) fn add_unit(&mut self, id: UnitId, name: String, compile_error: Option<String>) {
        self.units.push(UnitEntry {
            unit: CompilationUnit { id, name },
            documents: Vec::new(),
            compile_error,
        });
    }

    pub(crate) fn add_document(&mut self, document: Document) -> IndexResult<()> {
        let entry = self
            .units
            .iter_mut()
            .find(|e| e.unit.id == document.unit)
            .ok_or_else(|| IndexError::UnknownUnit(document.unit.clone()))?;
        entry.documents.push(document.path.clone());
        self.documents.insert(document.path.clone(), document);
        Ok(())
    }

    pub(crate) fn add_namespace(&mut self, file: &Path, declaration: NamespaceDeclaration) {
        self.namespaces
            .entry(file.to_path_buf())
            .or_default()
            .push(declaration);
    }

    /// Register a symbol and hook it under its container
    pub(crate) fn add_symbol(&mut self, symbol: Symbol) {
        match symbol.kind {
            SymbolKind::Type => {}
            SymbolKind::Parameter => {
                if let Some(method) = &symbol.containing_method {
                    self.parameters
                        .entry(method.clone())
                        .or_default()
                        .push(symbol.key.clone());
                }
            }
            SymbolKind::Method | SymbolKind::Property | SymbolKind::Field => {
                if let Some(ty) = &symbol.containing_type {
                    self.members
                        .entry(ty.clone())
                        .or_default()
                        .push(symbol.key.clone());
                }
            }
        }

        if !self.symbols.contains_key(&symbol.key) {
            self.symbol_order.push(symbol.key.clone());
        }
        self.symbols.insert(symbol.key.clone(), symbol);
    }

    pub(crate) fn add_reference(&mut self, reference: Reference) {
        self.references
            .entry(reference.target.clone())
            .or_default()
            .push(reference);
    }

    pub(crate) fn add_syntax(&mut self, node: SyntaxNode, resolves_to: Option<SymbolKey>) {
        let location = node.location().clone();
        if let Some(key) = resolves_to {
            self.resolutions.insert(resolution_key(&location), key);
        }
        self.syntax.entry(location.file).or_default().push(node);
    }

    fn known(&self, symbol: &Symbol) -> IndexResult<()> {
        if self.symbols.contains_key(&symbol.key) {
            Ok(())
        } else {
            Err(IndexError::UnknownSymbol(symbol.key.clone()))
        }
    }

    fn symbols_for(&self, keys: Option<&Vec<SymbolKey>>) -> Vec<Symbol> {
        keys.map(|keys| {
            keys.iter()
                .filter_map(|k| self.symbols.get(k).cloned())
                .collect()
        })
        .unwrap_or_default()
    }

    fn types(&self) -> impl Iterator<Item = &Symbol> {
        self.symbol_order
            .iter()
            .filter_map(|k| self.symbols.get(k))
            .filter(|s| s.kind == SymbolKind::Type)
    }
}

impl SemanticIndex for MemoryIndex {
    fn units(&self) -> IndexResult<Vec<CompilationUnit>> {
        Ok(self.units.iter().map(|e| e.unit.clone()).collect())
    }

    fn compile(&self, unit: &UnitId) -> IndexResult<()> {
        let entry = self
            .units
            .iter()
            .find(|e| &e.unit.id == unit)
            .ok_or_else(|| IndexError::UnknownUnit(unit.clone()))?;

        match &entry.compile_error {
            Some(message) => Err(IndexError::CompilationFailed {
                unit: unit.clone(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn documents(&self, unit: &UnitId) -> IndexResult<Vec<Document>> {
        let entry = self
            .units
            .iter()
            .find(|e| &e.unit.id == unit)
            .ok_or_else(|| IndexError::UnknownUnit(unit.clone()))?;

        Ok(entry
            .documents
            .iter()
            .filter_map(|p| self.documents.get(p).cloned())
            .collect())
    }

    fn namespace_declarations(&self, document: &Document) -> IndexResult<Vec<NamespaceDeclaration>> {
        Ok(self
            .namespaces
            .get(&document.path)
            .cloned()
            .unwrap_or_default())
    }

    fn declared_types(&self, document: &Document) -> IndexResult<Vec<Symbol>> {
        Ok(self
            .types()
            .filter(|t| t.declarations.iter().any(|d| d.file == document.path))
            .cloned()
            .collect())
    }

    fn members(&self, ty: &Symbol) -> IndexResult<Vec<Symbol>> {
        self.known(ty)?;
        Ok(self.symbols_for(self.members.get(&ty.key)))
    }

    fn parameters(&self, method: &Symbol) -> IndexResult<Vec<Symbol>> {
        self.known(method)?;
        Ok(self.symbols_for(self.parameters.get(&method.key)))
    }

    fn find_references(&self, symbol: &Symbol) -> IndexResult<Vec<Reference>> {
        Ok(self
            .references
            .get(&symbol.key)
            .cloned()
            .unwrap_or_default())
    }

    fn all_interfaces(&self, ty: &Symbol) -> IndexResult<Vec<Symbol>> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();

        // Interfaces declared on the type and on every base in the chain
        let chain = std::iter::once(&ty.key).chain(ty.base_types.iter());
        for owner in chain {
            let Some(owner) = self.symbols.get(owner) else {
                continue;
            };
            for iface in &owner.interfaces {
                if seen.insert(iface.clone()) {
                    if let Some(symbol) = self.symbols.get(iface) {
                        result.push(symbol.clone());
                    }
                }
            }
        }

        Ok(result)
    }

    fn find_implementations(&self, interface: &Symbol) -> IndexResult<Vec<Symbol>> {
        Ok(self
            .types()
            .filter(|t| !t.is_interface())
            .filter(|t| {
                t.interfaces.contains(&interface.key)
                    || t.base_types.iter().any(|b| {
                        self.symbols
                            .get(b)
                            .map(|base| base.interfaces.contains(&interface.key))
                            .unwrap_or(false)
                    })
            })
            .cloned()
            .collect())
    }

    fn find_derived_classes(&self, class: &Symbol) -> IndexResult<Vec<Symbol>> {
        Ok(self
            .types()
            .filter(|t| t.base_types.contains(&class.key))
            .cloned()
            .collect())
    }

    fn syntax_nodes(&self, document: &Document) -> IndexResult<Vec<SyntaxNode>> {
        Ok(self.syntax.get(&document.path).cloned().unwrap_or_default())
    }

    fn resolve(&self, _unit: &UnitId, node: &SyntaxNode) -> IndexResult<Option<SymbolKey>> {
        let location = node.location();
        Ok(self
            .resolutions
            .get(&resolution_key(location))
            .cloned())
    }
}

fn resolution_key(location: &Location) -> (PathBuf, usize, usize, usize) {
    (
        location.file.clone(),
        location.line,
        location.column,
        location.start_byte,
    )
}

/// Fluent construction of a [`MemoryIndex`]
///
/// Every declaration, reference and identifier appends a line with its name
/// to the owning document's text, so locations carry real offsets and the
/// textual pre-filter of the fallback scan sees the names it should.
#[derive(Debug)]
pub struct MemoryIndexBuilder {
    index: MemoryIndex,
    texts: HashMap<PathBuf, String>,
}

impl MemoryIndexBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            index: MemoryIndex::new(root),
            texts: HashMap::new(),
        }
    }

    pub fn unit(&mut self, name: &str) -> UnitId {
        let id = UnitId::new(name);
        self.index.add_unit(id.clone(), name.to_string(), None);
        id
    }

    /// A unit whose compilation step fails
    pub fn failing_unit(&mut self, name: &str, message: &str) -> UnitId {
        let id = UnitId::new(name);
        self.index
            .add_unit(id.clone(), name.to_string(), Some(message.to_string()));
        id
    }

    /// Add an empty document at `root/relative`
    pub fn document(&mut self, unit: &UnitId, relative: &str) -> PathBuf {
        self.document_with_text(unit, relative, "")
    }

    /// Add a document starting with the given text (e.g. a generated header)
    pub fn document_with_text(&mut self, unit: &UnitId, relative: &str, text: &str) -> PathBuf {
        let path = self.index.root.join(relative);
        let mut text = text.to_string();
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        self.texts.insert(path.clone(), text);
        self.index.documents.insert(
            path.clone(),
            Document::new(unit.clone(), path.clone(), String::new()),
        );
        if let Some(entry) = self.index.units.iter_mut().find(|e| &e.unit.id == unit) {
            entry.documents.push(path.clone());
        }
        path
    }

    pub fn namespace(&mut self, document: &Path, declaration: NamespaceDeclaration) {
        self.index.add_namespace(document, declaration);
    }

    /// Append a snippet to a document and return its location
    fn place(&mut self, document: &Path, snippet: &str) -> Location {
        let unit = self
            .index
            .documents
            .get(document)
            .map(|d| d.unit.clone())
            .unwrap_or_else(|| UnitId::new(""));
        let text = self.texts.entry(document.to_path_buf()).or_default();

        let line = text.matches('\n').count() + 1;
        let start = text.len();
        text.push_str(snippet);
        let end = text.len();
        text.push('\n');

        Location::new(unit, document, line, 1, start, end)
    }

    fn unit_of(&self, document: &Path) -> UnitId {
        self.index
            .documents
            .get(document)
            .map(|d| d.unit.clone())
            .unwrap_or_else(|| UnitId::new(""))
    }

    /// Declare a top-level type. Defaults to internal accessibility.
    pub fn add_type(
        &mut self,
        document: &Path,
        namespace: Option<&str>,
        name: &str,
        kind: TypeKind,
    ) -> SymbolKey {
        let key = SymbolKey::for_type(namespace, None, name);
        let location = self.place(document, name);

        let mut symbol = Symbol::new(key.clone(), SymbolKind::Type, name, self.unit_of(document));
        symbol.namespace = namespace.map(str::to_string);
        symbol.type_kind = Some(kind);
        symbol.accessibility = Accessibility::Internal;
        symbol.declarations.push(location);
        self.index.add_symbol(symbol);
        key
    }

    /// Declare a type nested in `outer`. Defaults to private accessibility.
    pub fn add_nested_type(
        &mut self,
        document: &Path,
        outer: &SymbolKey,
        name: &str,
        kind: TypeKind,
    ) -> SymbolKey {
        let key = SymbolKey::for_type(None, Some(outer), name);
        let location = self.place(document, name);
        let outer_symbol = self.index.symbols.get(outer).cloned();

        let mut symbol = Symbol::new(key.clone(), SymbolKind::Type, name, self.unit_of(document));
        symbol.namespace = outer_symbol.as_ref().and_then(|o| o.namespace.clone());
        symbol.containing_type = Some(outer.clone());
        symbol.containing_name = outer_symbol.map(|o| o.name);
        symbol.type_kind = Some(kind);
        symbol.declarations.push(location);
        self.index.add_symbol(symbol);
        key
    }

    /// Add another declaration of an existing type (partial types)
    pub fn add_partial_declaration(&mut self, document: &Path, ty: &SymbolKey) {
        let name = ty.simple_name().to_string();
        let location = self.place(document, &name);
        if let Some(symbol) = self.index.symbols.get_mut(ty) {
            symbol.declarations.push(location);
        }
    }

    fn member(
        &mut self,
        document: &Path,
        ty: &SymbolKey,
        key: SymbolKey,
        kind: SymbolKind,
        name: &str,
    ) -> Symbol {
        let location = self.place(document, name);
        let owner = self.index.symbols.get(ty).cloned();

        let mut symbol = Symbol::new(key, kind, name, self.unit_of(document));
        symbol.namespace = owner.as_ref().and_then(|o| o.namespace.clone());
        symbol.containing_type = Some(ty.clone());
        symbol.containing_name = owner.map(|o| o.name);
        symbol.declarations.push(location);
        symbol
    }

    /// Declare a private `void` method with value parameters `(name, type)`
    pub fn add_method(
        &mut self,
        document: &Path,
        ty: &SymbolKey,
        name: &str,
        parameters: &[(&str, &str)],
    ) -> SymbolKey {
        let parameter_types: Vec<String> = parameters.iter().map(|(_, t)| t.to_string()).collect();
        let key = SymbolKey::for_method(ty, name, &parameter_types);

        let mut method = self.member(document, ty, key.clone(), SymbolKind::Method, name);
        method.method_kind = Some(MethodKind::Ordinary);
        method.value_type = Some("void".to_string());
        method.parameter_types = parameter_types;
        method.parameter_names = parameters.iter().map(|(n, _)| n.to_string()).collect();
        let unit = method.unit.clone();
        let namespace = method.namespace.clone();
        let containing_name = method.containing_name.clone();
        self.index.add_symbol(method);

        for (param_name, param_type) in parameters {
            let location = self.place(document, param_name);
            let mut param = Symbol::new(
                SymbolKey::for_parameter(&key, param_name),
                SymbolKind::Parameter,
                *param_name,
                unit.clone(),
            );
            param.namespace = namespace.clone();
            param.containing_type = Some(ty.clone());
            param.containing_name = containing_name.clone();
            param.containing_method = Some(key.clone());
            param.value_type = Some(param_type.to_string());
            param.declarations.push(location);
            self.index.add_symbol(param);
        }

        key
    }

    pub fn add_property(&mut self, document: &Path, ty: &SymbolKey, name: &str, value_type: &str) -> SymbolKey {
        let key = SymbolKey::for_property(ty, name);
        let mut property = self.member(document, ty, key.clone(), SymbolKind::Property, name);
        property.value_type = Some(value_type.to_string());
        self.index.add_symbol(property);
        key
    }

    pub fn add_field(&mut self, document: &Path, ty: &SymbolKey, name: &str, value_type: &str) -> SymbolKey {
        let key = SymbolKey::for_field(ty, name);
        let mut field = self.member(document, ty, key.clone(), SymbolKind::Field, name);
        field.value_type = Some(value_type.to_string());
        self.index.add_symbol(field);
        key
    }

    /// Mutate a registered symbol in place
    pub fn configure(&mut self, key: &SymbolKey, f: impl FnOnce(&mut Symbol)) {
        if let Some(symbol) = self.index.symbols.get_mut(key) {
            f(symbol);
        }
    }

    /// First declaration of a registered symbol
    pub fn declaration_of(&self, key: &SymbolKey) -> Option<Location> {
        self.index
            .symbols
            .get(key)
            .and_then(|s| s.primary_location().cloned())
    }

    pub fn set_accessibility(&mut self, key: &SymbolKey, accessibility: Accessibility) {
        self.configure(key, |s| s.accessibility = accessibility);
    }

    pub fn set_ref_kind(&mut self, parameter: &SymbolKey, ref_kind: RefKind) {
        self.configure(parameter, |s| s.ref_kind = ref_kind);
    }

    /// Make `ty` implement `interface` (which may be external)
    pub fn implement(&mut self, ty: &SymbolKey, interface: &SymbolKey) {
        self.configure(ty, |s| {
            if !s.interfaces.contains(interface) {
                s.interfaces.push(interface.clone());
            }
        });
    }

    /// Make `ty` derive from `base`, inheriting the base's own chain
    pub fn derive(&mut self, ty: &SymbolKey, base: &SymbolKey) {
        let inherited = self
            .index
            .symbols
            .get(base)
            .map(|b| b.base_types.clone())
            .unwrap_or_default();
        self.configure(ty, |s| {
            s.base_types = std::iter::once(base.clone()).chain(inherited).collect();
        });
    }

    /// Record a use of `target` inside `document`
    pub fn add_reference(&mut self, document: &Path, target: &SymbolKey) -> Location {
        let location = self.place(document, target.simple_name());
        self.index
            .add_reference(Reference::new(location.clone(), target.clone()));
        location
    }

    /// Record a use that only exists in referenced metadata
    pub fn add_metadata_reference(&mut self, unit: &UnitId, target: &SymbolKey) {
        let location = Location::metadata(unit.clone(), "metadata.dll");
        self.index.add_reference(Reference::new(location, target.clone()));
    }

    /// Record a raw reference at a known location
    pub fn add_reference_at(&mut self, location: Location, target: &SymbolKey) {
        self.index.add_reference(Reference::new(location, target.clone()));
    }

    /// An identifier the reference search does not report but the syntax
    /// tree still contains
    pub fn add_identifier(&mut self, document: &Path, text: &str, resolves_to: Option<&SymbolKey>) -> Location {
        let location = self.place(document, text);
        self.index.add_syntax(
            SyntaxNode::Identifier {
                text: text.to_string(),
                location: location.clone(),
            },
            resolves_to.cloned(),
        );
        location
    }

    /// A call with string literal arguments, e.g.
    /// `add_invocation(doc, "GetMethod", Some("typeof(Foo)"), &[], &["Bar"])`
    pub fn add_invocation(
        &mut self,
        document: &Path,
        method: &str,
        receiver: Option<&str>,
        type_arguments: &[&str],
        string_arguments: &[&str],
    ) -> Location {
        let mut snippet = String::new();
        if let Some(r) = receiver {
            snippet.push_str(r);
            snippet.push('.');
        }
        snippet.push_str(method);
        snippet.push('(');
        snippet.push_str(
            &string_arguments
                .iter()
                .map(|a| format!("\"{}\"", a))
                .collect::<Vec<_>>()
                .join(", "),
        );
        snippet.push(')');

        let location = self.place(document, &snippet);
        self.index.add_syntax(
            SyntaxNode::Invocation {
                method: method.to_string(),
                receiver: receiver.map(str::to_string),
                type_arguments: type_arguments.iter().map(|t| t.to_string()).collect(),
                string_arguments: string_arguments.iter().map(|a| a.to_string()).collect(),
                location: location.clone(),
            },
            None,
        );
        location
    }

    pub fn build(mut self) -> MemoryIndex {
        for (path, text) in self.texts {
            if let Some(doc) = self.index.documents.get_mut(&path) {
                doc.text = text;
            }
        }
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (MemoryIndex, SymbolKey, SymbolKey) {
        let mut b = MemoryIndexBuilder::new("/repo");
        let app = b.unit("App");
        let doc = b.document(&app, "src/Shapes.cs");
        let shape = b.add_type(&doc, Some("App"), "IShape", TypeKind::Interface);
        let base = b.add_type(&doc, Some("App"), "ShapeBase", TypeKind::Class);
        let circle = b.add_type(&doc, Some("App"), "Circle", TypeKind::Class);
        b.implement(&base, &shape);
        b.derive(&circle, &base);
        (b.build(), shape, circle)
    }

    #[test]
    fn test_declared_types_in_order() {
        let (index, _, _) = sample();
        let unit = &index.units().unwrap()[0];
        let docs = index.documents(&unit.id).unwrap();
        let names: Vec<_> = index
            .declared_types(&docs[0])
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["IShape", "ShapeBase", "Circle"]);
    }

    #[test]
    fn test_implementations_include_derived_types() {
        let (index, shape, _) = sample();
        let shape = index.symbol(&shape).unwrap().clone();
        let names: Vec<_> = index
            .find_implementations(&shape)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["ShapeBase", "Circle"]);
    }

    #[test]
    fn test_all_interfaces_walks_base_chain() {
        let (index, _, circle) = sample();
        let circle = index.symbol(&circle).unwrap().clone();
        let ifaces = index.all_interfaces(&circle).unwrap();
        assert_eq!(ifaces.len(), 1);
        assert_eq!(ifaces[0].name, "IShape");
    }

    #[test]
    fn test_failing_unit_reports_compilation_error() {
        let mut b = MemoryIndexBuilder::new("/repo");
        let broken = b.failing_unit("Broken", "missing reference");
        let index = b.build();
        assert!(matches!(
            index.compile(&broken),
            Err(IndexError::CompilationFailed { .. })
        ));
    }

    #[test]
    fn test_members_of_unknown_symbol() {
        let (index, _, _) = sample();
        let stranger = Symbol::new(
            SymbolKey::new("T:Elsewhere.Ghost"),
            SymbolKind::Type,
            "Ghost",
            UnitId::new("Elsewhere"),
        );
        assert_eq!(
            index.members(&stranger).unwrap_err(),
            IndexError::UnknownSymbol(SymbolKey::new("T:Elsewhere.Ghost"))
        );
        assert!(matches!(
            index.parameters(&stranger),
            Err(IndexError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_document_text_contains_declared_names() {
        let mut b = MemoryIndexBuilder::new("/repo");
        let app = b.unit("App");
        let doc = b.document(&app, "src/Foo.cs");
        let foo = b.add_type(&doc, Some("App"), "Foo", TypeKind::Class);
        b.add_method(&doc, &foo, "Bar", &[("count", "int")]);
        let index = b.build();

        let docs = index.documents(&app).unwrap();
        assert!(docs[0].mentions("Bar"));
        assert!(docs[0].mentions("count"));
        assert!(!docs[0].mentions("Baz"));
    }

    #[test]
    fn test_resolve_identifier() {
        let mut b = MemoryIndexBuilder::new("/repo");
        let app = b.unit("App");
        let doc = b.document(&app, "src/Foo.cs");
        let foo = b.add_type(&doc, Some("App"), "Foo", TypeKind::Class);
        b.add_identifier(&doc, "Foo", Some(&foo));
        let index = b.build();

        let docs = index.documents(&app).unwrap();
        let nodes = index.syntax_nodes(&docs[0]).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(index.resolve(&app, &nodes[0]).unwrap(), Some(foo));
    }
}
