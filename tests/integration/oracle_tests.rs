//! End-to-end usage determination over in-memory indexes

use deadsymbols::analysis::{AnalysisReport, Orchestrator, RunContext};
use deadsymbols::index::{MemoryIndex, MemoryIndexBuilder, NamespaceDeclaration};
use deadsymbols::model::{Accessibility, RefKind, SymbolKind, TypeKind};
use deadsymbols::Config;

fn analyze_with(index: &MemoryIndex, config: Config) -> AnalysisReport {
    Orchestrator::new(RunContext::new(config))
        .run(index, index.root())
        .unwrap()
}

fn analyze(index: &MemoryIndex) -> AnalysisReport {
    analyze_with(index, Config::default())
}

/// (kind, display name) of every finding, sorted
fn reported(report: &AnalysisReport) -> Vec<(SymbolKind, String)> {
    let mut names: Vec<_> = report
        .findings
        .iter()
        .map(|f| (f.kind, f.name.clone()))
        .collect();
    names.sort_by(|a, b| a.1.cmp(&b.1));
    names
}

fn scenario_a() -> MemoryIndex {
    let mut b = MemoryIndexBuilder::new("/repo");
    let app = b.unit("App");
    let foo_doc = b.document(&app, "src/Foo.cs");
    let caller_doc = b.document(&app, "src/Caller.cs");

    let foo = b.add_type(&foo_doc, Some("App"), "Foo", TypeKind::Class);
    b.add_method(&foo_doc, &foo, "Bar", &[]);
    let baz = b.add_method(&foo_doc, &foo, "Baz", &[]);
    b.set_accessibility(&baz, Accessibility::Public);

    b.add_reference(&caller_doc, &foo);
    b.add_reference(&caller_doc, &baz);
    b.build()
}

#[test]
fn test_unused_private_method_is_the_only_finding() {
    let report = analyze(&scenario_a());
    assert_eq!(reported(&report), vec![(SymbolKind::Method, "Bar".to_string())]);
    assert_eq!(report.findings[0].remark, "no references found");
}

#[test]
fn test_called_public_method_not_reported_when_public_included() {
    let mut config = Config::default();
    config.include_public = true;
    let report = analyze_with(&scenario_a(), config);
    assert_eq!(reported(&report), vec![(SymbolKind::Method, "Bar".to_string())]);
}

#[test]
fn test_unread_value_parameter_reported() {
    let mut b = MemoryIndexBuilder::new("/repo");
    let app = b.unit("App");
    let doc = b.document(&app, "src/Foo.cs");
    let foo = b.add_type(&doc, Some("App"), "Foo", TypeKind::Class);
    let m = b.add_method(&doc, &foo, "M", &[("x", "System.Int32")]);
    b.add_reference(&doc, &foo);
    b.add_reference(&doc, &m);
    let index = b.build();

    let report = analyze(&index);
    assert_eq!(reported(&report), vec![(SymbolKind::Parameter, "M :: x".to_string())]);
}

#[test]
fn test_ref_parameter_never_reported() {
    let mut b = MemoryIndexBuilder::new("/repo");
    let app = b.unit("App");
    let doc = b.document(&app, "src/Foo.cs");
    let foo = b.add_type(&doc, Some("App"), "Foo", TypeKind::Class);
    let m = b.add_method(&doc, &foo, "M", &[("x", "System.Int32&")]);
    b.set_ref_kind(&deadsymbols::SymbolKey::for_parameter(&m, "x"), RefKind::Ref);
    b.add_reference(&doc, &foo);
    b.add_reference(&doc, &m);
    let index = b.build();

    assert!(analyze(&index).findings.is_empty());
}

#[test]
fn test_interface_member_used_through_referenced_implementation() {
    let mut b = MemoryIndexBuilder::new("/repo");
    let app = b.unit("App");
    let doc = b.document(&app, "src/Handlers.cs");
    let caller = b.document(&app, "src/Dispatcher.cs");

    let iface = b.add_type(&doc, Some("App"), "IHandler", TypeKind::Interface);
    b.add_method(&doc, &iface, "Handle", &[]);
    let h = b.add_type(&doc, Some("App"), "H", TypeKind::Class);
    let h_handle = b.add_method(&doc, &h, "Handle", &[]);
    b.implement(&h, &iface);

    b.add_reference(&caller, &iface);
    b.add_reference(&caller, &h);
    b.add_reference(&caller, &h_handle);
    let index = b.build();

    let report = analyze(&index);
    assert!(report.findings.is_empty(), "unexpected: {:?}", reported(&report));
}

#[test]
fn test_implementation_used_through_referenced_interface_member() {
    let mut b = MemoryIndexBuilder::new("/repo");
    let app = b.unit("App");
    let doc = b.document(&app, "src/Handlers.cs");
    let caller = b.document(&app, "src/Dispatcher.cs");

    let iface = b.add_type(&doc, Some("App"), "IHandler", TypeKind::Interface);
    let handle = b.add_method(&doc, &iface, "Handle", &[]);
    let h = b.add_type(&doc, Some("App"), "H", TypeKind::Class);
    b.add_method(&doc, &h, "Handle", &[]);
    b.add_method(&doc, &h, "Unrelated", &[]);
    b.implement(&h, &iface);

    b.add_reference(&caller, &iface);
    b.add_reference(&caller, &h);
    b.add_reference(&caller, &handle);
    let index = b.build();

    let report = analyze(&index);
    assert_eq!(reported(&report), vec![(SymbolKind::Method, "Unrelated".to_string())]);
}

#[test]
fn test_declaration_is_not_a_use() {
    let mut b = MemoryIndexBuilder::new("/repo");
    let app = b.unit("App");
    let doc = b.document(&app, "src/Foo.cs");
    let foo = b.add_type(&doc, Some("App"), "Foo", TypeKind::Class);
    let field = b.add_field(&doc, &foo, "_count", "System.Int32");
    b.add_reference(&doc, &foo);

    // Some indexes report the declaring token as a reference
    let declaration = b.declaration_of(&field).unwrap();
    b.add_reference_at(declaration, &field);
    let index = b.build();

    assert_eq!(
        reported(&analyze(&index)),
        vec![(SymbolKind::Field, "_count".to_string())]
    );
}

#[test]
fn test_uses_in_other_units_count() {
    let mut b = MemoryIndexBuilder::new("/repo");
    let core = b.unit("Core");
    let web = b.unit("Web");
    let core_doc = b.document(&core, "core/Pricing.cs");
    let web_doc = b.document(&web, "web/Checkout.cs");

    let pricing = b.add_type(&core_doc, Some("Shop"), "Pricing", TypeKind::Class);
    let web_type = b.add_type(&web_doc, Some("Shop.Web"), "Checkout", TypeKind::Class);
    b.add_reference(&web_doc, &pricing);
    b.add_reference(&core_doc, &web_type);
    let index = b.build();

    assert!(analyze(&index).findings.is_empty());
}

#[test]
fn test_uses_in_metadata_do_not_count() {
    let mut b = MemoryIndexBuilder::new("/repo");
    let app = b.unit("App");
    let doc = b.document(&app, "src/Foo.cs");
    let foo = b.add_type(&doc, Some("App"), "Foo", TypeKind::Class);
    b.add_metadata_reference(&app, &foo);
    let index = b.build();

    let report = analyze(&index);
    assert_eq!(reported(&report), vec![(SymbolKind::Type, "Foo".to_string())]);
    assert_eq!(report.findings[0].remark, "TypeKind=Class");
}

#[test]
fn test_entry_points_are_never_reported() {
    let mut b = MemoryIndexBuilder::new("/repo");
    let app = b.unit("App.Tests");
    let doc = b.document(&app, "tests/OrderTests.cs");
    let tests = b.add_type(&doc, Some("App.Tests"), "OrderTests", TypeKind::Class);
    let fact = b.add_method(&doc, &tests, "Totals_add_up", &[]);
    b.configure(&fact, |m| m.attributes.push("Fact".to_string()));
    let index = b.build();

    assert!(analyze(&index).findings.is_empty());
}

#[test]
fn test_configured_entry_point() {
    let mut b = MemoryIndexBuilder::new("/repo");
    let app = b.unit("App");
    let doc = b.document(&app, "src/Plugin.cs");
    b.add_type(&doc, Some("App"), "Plugin", TypeKind::Class);
    let index = b.build();

    assert_eq!(analyze(&index).findings.len(), 1);

    let mut config = Config::default();
    config.entry_points.push("App.Plugin".to_string());
    assert!(analyze_with(&index, config).findings.is_empty());
}

#[test]
fn test_reflection_lookup_keeps_member_alive() {
    let mut b = MemoryIndexBuilder::new("/repo");
    let app = b.unit("App");
    let doc = b.document(&app, "src/Foo.cs");
    let foo = b.add_type(&doc, Some("App"), "Foo", TypeKind::Class);
    b.add_method(&doc, &foo, "Hidden", &[]);
    b.add_method(&doc, &foo, "Forgotten", &[]);
    b.add_reference(&doc, &foo);
    b.add_invocation(&doc, "GetMethod", Some("typeof(Foo)"), &[], &["Hidden"]);
    let index = b.build();

    assert_eq!(
        reported(&analyze(&index)),
        vec![(SymbolKind::Method, "Forgotten".to_string())]
    );
}

#[test]
fn test_identifier_resolution_keeps_member_alive() {
    let mut b = MemoryIndexBuilder::new("/repo");
    let app = b.unit("App");
    let doc = b.document(&app, "src/Foo.cs");
    let foo = b.add_type(&doc, Some("App"), "Foo", TypeKind::Class);
    let prop = b.add_property(&doc, &foo, "Name", "System.String");
    b.add_reference(&doc, &foo);
    b.add_identifier(&doc, "Name", Some(&prop));
    let index = b.build();

    assert!(analyze(&index).findings.is_empty());
}

#[test]
fn test_out_of_scope_namespace_skipped() {
    let mut b = MemoryIndexBuilder::new("/repo");
    let app = b.unit("App");
    let doc = b.document(&app, "src/Foo.cs");
    b.namespace(&doc, NamespaceDeclaration::Block("App".to_string()));
    b.add_type(&doc, Some("App"), "Foo", TypeKind::Class);
    b.add_type(&doc, Some("Vendor.Sdk"), "Shim", TypeKind::Class);
    let index = b.build();

    assert_eq!(
        reported(&analyze(&index)),
        vec![(SymbolKind::Type, "Foo".to_string())]
    );
}

#[test]
fn test_interface_with_in_source_implementation_is_used() {
    let mut b = MemoryIndexBuilder::new("/repo");
    let app = b.unit("App");
    let doc = b.document(&app, "src/Repo.cs");
    let iface = b.add_type(&doc, Some("App"), "IRepository", TypeKind::Interface);
    let repo = b.add_type(&doc, Some("App"), "SqlRepository", TypeKind::Class);
    b.implement(&repo, &iface);
    let index = b.build();

    // Only the implementation itself lacks a use
    assert_eq!(
        reported(&analyze(&index)),
        vec![(SymbolKind::Type, "SqlRepository".to_string())]
    );
}

#[test]
fn test_snapshot_without_byte_offsets_keeps_called_method() {
    let snapshot = r#"{
        "root": "/repo",
        "units": [{
            "name": "App",
            "documents": [{
                "path": "/repo/src/Foo.cs",
                "text": "namespace App { class Foo { void Bar() { } void Run() { Bar(); } } }",
                "namespaces": [{ "form": "block", "name": "App" }]
            }],
            "symbols": [
                {
                    "key": "T:App.Foo", "kind": "Type", "name": "Foo", "namespace": "App", "unit": "App",
                    "type_kind": "Class", "accessibility": "Internal",
                    "declarations": [{ "unit": "App", "file": "/repo/src/Foo.cs", "line": 1, "column": 23 }]
                },
                {
                    "key": "M:App.Foo.Bar()", "kind": "Method", "name": "Bar", "namespace": "App", "unit": "App",
                    "containing_type": "T:App.Foo", "containing_name": "Foo", "accessibility": "Private",
                    "method_kind": "Ordinary", "value_type": "void",
                    "declarations": [{ "unit": "App", "file": "/repo/src/Foo.cs", "line": 1, "column": 34 }]
                },
                {
                    "key": "M:App.Foo.Run()", "kind": "Method", "name": "Run", "namespace": "App", "unit": "App",
                    "containing_type": "T:App.Foo", "containing_name": "Foo", "accessibility": "Private",
                    "method_kind": "Ordinary", "value_type": "void",
                    "declarations": [{ "unit": "App", "file": "/repo/src/Foo.cs", "line": 1, "column": 49 }]
                }
            ],
            "references": [{
                "location": { "unit": "App", "file": "/repo/src/Foo.cs", "line": 1, "column": 57 },
                "target": "M:App.Foo.Bar()"
            }]
        }]
    }"#;
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("index.json");
    std::fs::write(&path, snapshot).unwrap();
    let index = deadsymbols::load_index(&path).unwrap();

    assert_eq!(
        reported(&analyze(&index)),
        vec![
            (SymbolKind::Type, "Foo".to_string()),
            (SymbolKind::Method, "Run".to_string()),
        ]
    );
}

#[test]
fn test_private_helpers_in_controllers_and_test_classes_reported() {
    let mut b = MemoryIndexBuilder::new("/repo");
    let web = b.unit("Shop.Web");
    let doc = b.document(&web, "web/OrdersController.cs");
    let controller = b.add_type(&doc, Some("Shop.Web"), "OrdersController", TypeKind::Class);
    let index_action = b.add_method(&doc, &controller, "Index", &[]);
    b.set_accessibility(&index_action, Accessibility::Public);
    b.add_method(&doc, &controller, "FormatTotal", &[]);

    let tests = b.unit("Shop.Tests");
    let test_doc = b.document(&tests, "tests/OrderTests.cs");
    let suite = b.add_type(&test_doc, Some("Shop.Tests"), "OrderTests", TypeKind::Class);
    let case = b.add_method(&test_doc, &suite, "Totals_add_up", &[]);
    b.set_accessibility(&case, Accessibility::Public);
    b.add_method(&test_doc, &suite, "OldHelper", &[]);
    let index = b.build();

    let mut config = Config::default();
    config.include_public = true;
    assert_eq!(
        reported(&analyze_with(&index, config)),
        vec![
            (SymbolKind::Method, "FormatTotal".to_string()),
            (SymbolKind::Method, "OldHelper".to_string()),
        ]
    );
}
