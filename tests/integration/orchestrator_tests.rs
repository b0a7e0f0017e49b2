//! Run-level behavior: unit failures, aggregation, gating and cancellation

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use deadsymbols::analysis::{AnalysisReport, Orchestrator, RunContext};
use deadsymbols::error::IndexResult;
use deadsymbols::index::{
    CompilationUnit, Document, MemoryIndex, MemoryIndexBuilder, NamespaceDeclaration,
    SemanticIndex, SyntaxNode,
};
use deadsymbols::model::{Accessibility, Reference, Symbol, SymbolKey, SymbolKind, TypeKind};
use deadsymbols::{AnalysisError, Config, IndexError, UnitId};

fn run(index: &MemoryIndex, config: Config) -> Result<AnalysisReport, AnalysisError> {
    Orchestrator::new(RunContext::new(config)).run(index, index.root())
}

fn identities(report: &AnalysisReport) -> HashSet<(String, PathBuf, usize, SymbolKind, String)> {
    report.findings.iter().map(|f| f.identity()).collect()
}

/// Three units; `Broken` cannot be compiled
fn workspace() -> MemoryIndex {
    let mut b = MemoryIndexBuilder::new("/repo");
    let core = b.unit("Shop.Core");
    let web = b.unit("Shop.Web");
    let broken = b.failing_unit("Broken", "project file is missing");

    let core_doc = b.document(&core, "core/Orders.cs");
    let order = b.add_type(&core_doc, Some("Shop"), "Order", TypeKind::Class);
    b.add_field(&core_doc, &order, "_legacyId", "System.Int32");
    let total = b.add_property(&core_doc, &order, "Total", "System.Decimal");

    let web_doc = b.document(&web, "web/Checkout.cs");
    let checkout = b.add_type(&web_doc, Some("Shop.Web"), "Checkout", TypeKind::Class);
    b.add_method(&web_doc, &checkout, "Recalculate", &[]);
    b.add_reference(&web_doc, &order);
    b.add_reference(&web_doc, &total);
    b.add_reference(&core_doc, &checkout);

    let broken_doc = b.document(&broken, "broken/Dead.cs");
    b.add_type(&broken_doc, Some("Broken"), "Dead", TypeKind::Class);

    b.build()
}

#[test]
fn test_failing_unit_is_skipped_and_others_complete() {
    let index = workspace();
    let report = run(&index, Config::default()).unwrap();

    assert_eq!(report.units_analyzed, 2);
    assert_eq!(report.units_skipped, vec![UnitId::new("Broken")]);
    assert!(report.findings.iter().all(|f| f.module != "Broken"));
}

#[test]
fn test_findings_aggregate_across_units() {
    let index = workspace();
    let report = run(&index, Config::default()).unwrap();

    let mut found: Vec<_> = report
        .findings
        .iter()
        .map(|f| (f.module.as_str(), f.name.as_str()))
        .collect();
    found.sort();
    assert_eq!(
        found,
        vec![("Shop.Core", "_legacyId"), ("Shop.Web", "Recalculate")]
    );

    let legacy = report.findings.iter().find(|f| f.name == "_legacyId").unwrap();
    assert_eq!(legacy.relative_path, Path::new("core/Orders.cs"));
    assert_eq!(legacy.containing_type, "Order");
}

#[test]
fn test_repeated_runs_agree_as_sets() {
    let index = workspace();
    let first = run(&index, Config::default()).unwrap();
    let second = run(&index, Config::default()).unwrap();
    assert_eq!(identities(&first), identities(&second));
}

#[test]
fn test_diagnostics_mode_does_not_change_findings() {
    let index = workspace();
    let plain = run(&index, Config::default()).unwrap();
    let verbose = Orchestrator::new(RunContext::new(Config::default()).with_diagnostics(true))
        .run(&index, index.root())
        .unwrap();
    assert_eq!(identities(&plain), identities(&verbose));
}

#[test]
fn test_cancelled_run_returns_error() {
    let index = workspace();
    let context = RunContext::new(Config::default());
    let handle = context.cancellation_handle();
    handle.store(true, std::sync::atomic::Ordering::SeqCst);

    let result = Orchestrator::new(context).run(&index, index.root());
    assert!(matches!(result, Err(AnalysisError::Cancelled)));
}

#[test]
fn test_visibility_switches() {
    let mut b = MemoryIndexBuilder::new("/repo");
    let app = b.unit("App");
    let doc = b.document(&app, "src/Api.cs");
    let api = b.add_type(&doc, Some("App"), "Api", TypeKind::Class);
    let open = b.add_method(&doc, &api, "Open", &[]);
    let shared = b.add_method(&doc, &api, "Shared", &[]);
    let hook = b.add_method(&doc, &api, "Hook", &[]);
    b.set_accessibility(&open, Accessibility::Public);
    b.set_accessibility(&shared, Accessibility::Internal);
    b.set_accessibility(&hook, Accessibility::Protected);
    b.add_reference(&doc, &api);
    let index = b.build();

    let names = |report: AnalysisReport| -> BTreeSet<String> {
        report.findings.into_iter().map(|f| f.name).collect()
    };

    let defaults = names(run(&index, Config::default()).unwrap());
    assert_eq!(defaults, BTreeSet::from(["Shared".to_string()]));

    let mut config = Config::default();
    config.include_public = true;
    config.include_internal = false;
    let flipped = names(run(&index, config).unwrap());
    assert_eq!(flipped, BTreeSet::from(["Open".to_string()]));
}

#[test]
fn test_generated_documents_excluded_unless_requested() {
    let mut b = MemoryIndexBuilder::new("/repo");
    let app = b.unit("App");
    let generated = b.document_with_text(
        &app,
        "src/Client.cs",
        "// <auto-generated>\n//     This code was generated by a tool.\n// </auto-generated>",
    );
    b.add_type(&generated, Some("App"), "Client", TypeKind::Class);
    let designer = b.document(&app, "src/MainForm.Designer.cs");
    b.add_type(&designer, Some("App"), "MainForm", TypeKind::Class);
    let index = b.build();

    assert!(run(&index, Config::default()).unwrap().findings.is_empty());

    let mut config = Config::default();
    config.exclude_generated = false;
    assert_eq!(run(&index, config).unwrap().findings.len(), 2);
}

#[test]
fn test_excluded_roots_never_reported() {
    let mut b = MemoryIndexBuilder::new("/repo");
    let app = b.unit("App");
    let vendored = b.document(&app, "obj/Debug/Shim.cs");
    b.add_type(&vendored, Some("App"), "Shim", TypeKind::Class);
    let doc = b.document(&app, "src/Real.cs");
    b.add_type(&doc, Some("App"), "Real", TypeKind::Class);
    let index = b.build();

    let report = run(&index, Config::default()).unwrap();
    let names: Vec<_> = report.findings.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Real"]);
}

#[test]
fn test_unknown_rule_set_is_fatal() {
    let index = workspace();
    let mut config = Config::default();
    config.reflection.rule_set = Some(99);
    assert!(matches!(
        run(&index, config),
        Err(AnalysisError::InvalidConfiguration(_))
    ));
}

/// Delegates to a [`MemoryIndex`] but fails reference and member queries
/// about one key
struct FlakyIndex {
    inner: MemoryIndex,
    failing: SymbolKey,
}

impl FlakyIndex {
    fn check(&self, symbol: &Symbol) -> IndexResult<()> {
        if symbol.key == self.failing {
            Err(IndexError::Query(format!("timed out resolving {}", symbol.key)))
        } else {
            Ok(())
        }
    }
}

impl SemanticIndex for FlakyIndex {
    fn units(&self) -> IndexResult<Vec<CompilationUnit>> {
        self.inner.units()
    }

    fn compile(&self, unit: &UnitId) -> IndexResult<()> {
        self.inner.compile(unit)
    }

    fn documents(&self, unit: &UnitId) -> IndexResult<Vec<Document>> {
        self.inner.documents(unit)
    }

    fn namespace_declarations(&self, document: &Document) -> IndexResult<Vec<NamespaceDeclaration>> {
        self.inner.namespace_declarations(document)
    }

    fn declared_types(&self, document: &Document) -> IndexResult<Vec<Symbol>> {
        self.inner.declared_types(document)
    }

    fn members(&self, ty: &Symbol) -> IndexResult<Vec<Symbol>> {
        self.check(ty)?;
        self.inner.members(ty)
    }

    fn parameters(&self, method: &Symbol) -> IndexResult<Vec<Symbol>> {
        self.inner.parameters(method)
    }

    fn find_references(&self, symbol: &Symbol) -> IndexResult<Vec<Reference>> {
        self.check(symbol)?;
        self.inner.find_references(symbol)
    }

    fn all_interfaces(&self, ty: &Symbol) -> IndexResult<Vec<Symbol>> {
        self.inner.all_interfaces(ty)
    }

    fn find_implementations(&self, interface: &Symbol) -> IndexResult<Vec<Symbol>> {
        self.inner.find_implementations(interface)
    }

    fn find_derived_classes(&self, class: &Symbol) -> IndexResult<Vec<Symbol>> {
        self.inner.find_derived_classes(class)
    }

    fn syntax_nodes(&self, document: &Document) -> IndexResult<Vec<SyntaxNode>> {
        self.inner.syntax_nodes(document)
    }

    fn resolve(&self, unit: &UnitId, node: &SyntaxNode) -> IndexResult<Option<SymbolKey>> {
        self.inner.resolve(unit, node)
    }
}

/// `Shop.Core` with a referenced `Order` type holding two unused members and
/// the unreferenced `Invoice` type
fn shop() -> (MemoryIndex, SymbolKey, SymbolKey) {
    let mut b = MemoryIndexBuilder::new("/repo");
    let core = b.unit("Shop.Core");
    let doc = b.document(&core, "core/Orders.cs");
    let order = b.add_type(&doc, Some("Shop"), "Order", TypeKind::Class);
    let recalculate = b.add_method(&doc, &order, "Recalculate", &[]);
    b.add_field(&doc, &order, "_legacyId", "System.Int32");
    let invoice = b.add_type(&doc, Some("Shop"), "Invoice", TypeKind::Class);
    b.add_field(&doc, &invoice, "_number", "System.Int32");
    b.add_reference(&doc, &order);
    (b.build(), recalculate, invoice)
}

fn run_flaky(index: FlakyIndex) -> AnalysisReport {
    Orchestrator::new(RunContext::new(Config::default()))
        .run(&index, Path::new("/repo"))
        .unwrap()
}

fn names(report: &AnalysisReport) -> BTreeSet<String> {
    report.findings.iter().map(|f| f.name.clone()).collect()
}

#[test]
fn test_failing_member_query_skips_only_that_member() {
    let (inner, recalculate, _) = shop();
    let report = run_flaky(FlakyIndex {
        inner,
        failing: recalculate,
    });

    assert_eq!(report.units_analyzed, 1);
    assert!(report.units_skipped.is_empty());
    assert_eq!(report.symbols_skipped, 1);
    assert_eq!(
        names(&report),
        BTreeSet::from([
            "Invoice".to_string(),
            "_legacyId".to_string(),
            "_number".to_string(),
        ])
    );
}

#[test]
fn test_failing_type_query_skips_type_and_its_members() {
    let (inner, _, invoice) = shop();
    let report = run_flaky(FlakyIndex {
        inner,
        failing: invoice,
    });

    // The type's own verdict and its member listing both fail
    assert_eq!(report.symbols_skipped, 2);
    assert_eq!(
        names(&report),
        BTreeSet::from(["Recalculate".to_string(), "_legacyId".to_string()])
    );
}
