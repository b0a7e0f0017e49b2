use tracing::debug;

use crate::config::Config;
use crate::model::{Accessibility, MethodKind, Symbol, SymbolKind};

/// Framework convention a root was recognized by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPointKind {
    HttpHandler,
    TestMethod,
    RpcService,
    RealtimeHub,
    UiComponentLifecycle,
    BackgroundService,
    EventHandler,
    DependencyInjectionBootstrap,
    ProcessEntry,
    Configured,
}

impl EntryPointKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            EntryPointKind::HttpHandler => "HTTP handler",
            EntryPointKind::TestMethod => "test",
            EntryPointKind::RpcService => "RPC service",
            EntryPointKind::RealtimeHub => "real-time hub",
            EntryPointKind::UiComponentLifecycle => "UI component lifecycle",
            EntryPointKind::BackgroundService => "background service",
            EntryPointKind::EventHandler => "event handler",
            EntryPointKind::DependencyInjectionBootstrap => "DI bootstrap",
            EntryPointKind::ProcessEntry => "process entry",
            EntryPointKind::Configured => "configured",
        }
    }
}

impl std::fmt::Display for EntryPointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn contains(list: &[String], name: &str) -> bool {
    list.iter().any(|s| s == name)
}

/// `prefix` followed by the end of the name or the start of a new word, so
/// `On` covers `OnInitialized` but not `Once`
fn starts_with_word(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .map_or(false, |rest| rest.chars().next().map_or(true, |c| !c.is_lowercase()))
}

/// Public instance methods a framework can dispatch to by convention alone
fn is_dispatchable(method: &Symbol) -> bool {
    method.accessibility == Accessibility::Public
        && !method.is_static
        && method.method_kind() == MethodKind::Ordinary
}

/// Any base type or implemented interface with one of the given simple names
fn inherits_any(ty: &Symbol, names: &[String]) -> bool {
    ty.base_type_names()
        .chain(ty.interface_names())
        .any(|n| contains(names, n))
}

/// One framework convention, as a shape predicate over a method and its
/// containing type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPointRule {
    /// Controllers by name suffix, base type or attribute; actions by
    /// routing attribute; page handlers by `OnGet`/`OnPost` prefix
    HttpHandler {
        type_suffixes: Vec<String>,
        base_types: Vec<String>,
        type_attributes: Vec<String>,
        method_attributes: Vec<String>,
        page_base_types: Vec<String>,
        page_handler_prefixes: Vec<String>,
    },
    /// Test attributes on methods, or public methods of a class recognized by
    /// name suffix or attribute
    TestMethod {
        method_attributes: Vec<String>,
        class_suffixes: Vec<String>,
        class_attributes: Vec<String>,
    },
    /// Service implementations deriving a generated `*Base` stub
    RpcService {
        base_suffixes: Vec<String>,
        method_attributes: Vec<String>,
    },
    RealtimeHub { base_types: Vec<String> },
    /// Lifecycle methods recognized by name prefix on a component base
    UiComponentLifecycle {
        base_types: Vec<String>,
        method_prefixes: Vec<String>,
    },
    BackgroundService {
        base_types: Vec<String>,
        methods: Vec<String>,
    },
    /// `(object sender, XyzEventArgs e)`
    EventHandler { args_suffix: String },
    /// Composition-root methods inside well-known bootstrap types
    DependencyInjectionBootstrap {
        type_names: Vec<String>,
        method_names: Vec<String>,
    },
    /// Static `Main`
    ProcessEntry { method_names: Vec<String> },
    /// Names listed in `entry_points` or matching `retain_patterns`
    Configured { patterns: Vec<String> },
}

impl EntryPointRule {
    pub fn http_handler() -> Self {
        EntryPointRule::HttpHandler {
            type_suffixes: strings(&["Controller"]),
            base_types: strings(&["Controller", "ControllerBase", "ApiController"]),
            type_attributes: strings(&["ApiController", "Controller"]),
            method_attributes: strings(&[
                "HttpGet",
                "HttpPost",
                "HttpPut",
                "HttpDelete",
                "HttpPatch",
                "HttpHead",
                "HttpOptions",
                "Route",
                "AcceptVerbs",
            ]),
            page_base_types: strings(&["PageModel"]),
            page_handler_prefixes: strings(&["OnGet", "OnPost", "OnPut", "OnDelete", "OnPatch"]),
        }
    }

    pub fn test_method() -> Self {
        EntryPointRule::TestMethod {
            method_attributes: strings(&[
                // xUnit
                "Fact",
                "Theory",
                // NUnit
                "Test",
                "TestCase",
                "TestCaseSource",
                "SetUp",
                "TearDown",
                "OneTimeSetUp",
                "OneTimeTearDown",
                // MSTest
                "TestMethod",
                "DataTestMethod",
                "TestInitialize",
                "TestCleanup",
                "ClassInitialize",
                "ClassCleanup",
                "AssemblyInitialize",
                "AssemblyCleanup",
                // Benchmarks
                "Benchmark",
                "GlobalSetup",
                "GlobalCleanup",
            ]),
            class_suffixes: strings(&["Tests", "Test", "Fixture", "Benchmarks"]),
            class_attributes: strings(&["TestClass", "TestFixture"]),
        }
    }

    pub fn rpc_service() -> Self {
        EntryPointRule::RpcService {
            base_suffixes: strings(&["ServiceBase", "Base"]),
            method_attributes: strings(&["OperationContract"]),
        }
    }

    pub fn realtime_hub() -> Self {
        EntryPointRule::RealtimeHub {
            base_types: strings(&["Hub", "IHub"]),
        }
    }

    pub fn ui_component_lifecycle() -> Self {
        EntryPointRule::UiComponentLifecycle {
            base_types: strings(&["ComponentBase", "LayoutComponentBase", "OwningComponentBase"]),
            method_prefixes: strings(&[
                "On",
                "SetParameters",
                "ShouldRender",
                "BuildRenderTree",
                "Dispose",
            ]),
        }
    }

    pub fn background_service() -> Self {
        EntryPointRule::BackgroundService {
            base_types: strings(&["BackgroundService", "IHostedService", "IHostedLifecycleService"]),
            methods: strings(&[
                "ExecuteAsync",
                "StartAsync",
                "StopAsync",
                "StartingAsync",
                "StartedAsync",
                "StoppingAsync",
                "StoppedAsync",
                "Dispose",
            ]),
        }
    }

    pub fn event_handler() -> Self {
        EntryPointRule::EventHandler {
            args_suffix: "EventArgs".to_string(),
        }
    }

    pub fn dependency_injection_bootstrap() -> Self {
        EntryPointRule::DependencyInjectionBootstrap {
            type_names: strings(&["Startup", "Program", "CompositionRoot", "Bootstrapper"]),
            method_names: strings(&[
                "ConfigureServices",
                "Configure",
                "ConfigureContainer",
                "CreateHostBuilder",
                "CreateWebHostBuilder",
            ]),
        }
    }

    pub fn process_entry() -> Self {
        EntryPointRule::ProcessEntry {
            method_names: strings(&["Main", "<Main>$"]),
        }
    }

    pub fn configured(config: &Config) -> Self {
        EntryPointRule::Configured {
            patterns: config
                .entry_points
                .iter()
                .chain(config.retain_patterns.iter())
                .cloned()
                .collect(),
        }
    }

    pub fn kind(&self) -> EntryPointKind {
        match self {
            EntryPointRule::HttpHandler { .. } => EntryPointKind::HttpHandler,
            EntryPointRule::TestMethod { .. } => EntryPointKind::TestMethod,
            EntryPointRule::RpcService { .. } => EntryPointKind::RpcService,
            EntryPointRule::RealtimeHub { .. } => EntryPointKind::RealtimeHub,
            EntryPointRule::UiComponentLifecycle { .. } => EntryPointKind::UiComponentLifecycle,
            EntryPointRule::BackgroundService { .. } => EntryPointKind::BackgroundService,
            EntryPointRule::EventHandler { .. } => EntryPointKind::EventHandler,
            EntryPointRule::DependencyInjectionBootstrap { .. } => {
                EntryPointKind::DependencyInjectionBootstrap
            }
            EntryPointRule::ProcessEntry { .. } => EntryPointKind::ProcessEntry,
            EntryPointRule::Configured { .. } => EntryPointKind::Configured,
        }
    }

    /// Whether a method (with its containing type, when known) is a root
    pub fn matches_method(&self, method: &Symbol, owner: Option<&Symbol>) -> bool {
        match self {
            EntryPointRule::HttpHandler {
                method_attributes,
                page_base_types,
                page_handler_prefixes,
                ..
            } => {
                method_attributes.iter().any(|a| method.has_attribute(a))
                    || (is_dispatchable(method)
                        && owner.map_or(false, |o| {
                            self.is_controller(o)
                                || (inherits_any(o, page_base_types)
                                    && page_handler_prefixes
                                        .iter()
                                        .any(|p| starts_with_word(&method.name, p)))
                        }))
            }
            EntryPointRule::TestMethod {
                method_attributes, ..
            }
            | EntryPointRule::RpcService {
                method_attributes, ..
            } => {
                method_attributes.iter().any(|a| method.has_attribute(a))
                    || (is_dispatchable(method) && owner.map_or(false, |o| self.matches_type(o)))
            }
            EntryPointRule::RealtimeHub { .. } => {
                is_dispatchable(method) && owner.map_or(false, |o| self.matches_type(o))
            }
            EntryPointRule::UiComponentLifecycle { method_prefixes, .. } => {
                owner.map_or(false, |o| self.matches_type(o))
                    && method_prefixes
                        .iter()
                        .any(|p| starts_with_word(&method.name, p))
            }
            EntryPointRule::BackgroundService { methods, .. } => {
                owner.map_or(false, |o| self.matches_type(o)) && contains(methods, &method.name)
            }
            EntryPointRule::EventHandler { args_suffix } => {
                if method.parameter_types.len() != 2 {
                    return false;
                }
                let args_type = method.parameter_types[1].rsplit('.').next().unwrap_or("");
                let args_name = method.parameter_names.get(1).map(String::as_str).unwrap_or("");
                args_type.ends_with(args_suffix.as_str()) || args_name.ends_with(args_suffix.as_str())
            }
            EntryPointRule::DependencyInjectionBootstrap { method_names, .. } => {
                contains(method_names, &method.name)
                    && owner.map_or(false, |o| self.matches_type(o))
            }
            EntryPointRule::ProcessEntry { method_names } => {
                method.is_static && contains(method_names, &method.name)
            }
            EntryPointRule::Configured { patterns } => {
                patterns.iter().any(|p| method.matches_pattern(p))
            }
        }
    }

    /// Whether a type is instantiated by the framework convention
    pub fn matches_type(&self, ty: &Symbol) -> bool {
        match self {
            EntryPointRule::HttpHandler {
                page_base_types, ..
            } => self.is_controller(ty) || inherits_any(ty, page_base_types),
            EntryPointRule::TestMethod {
                class_suffixes,
                class_attributes,
                ..
            } => {
                class_suffixes.iter().any(|s| ty.name.ends_with(s.as_str()))
                    || class_attributes.iter().any(|a| ty.has_attribute(a))
            }
            EntryPointRule::RpcService { base_suffixes, .. } => ty.base_types.iter().any(|b| {
                let name = b.simple_name();
                // Generated stubs are nested in their service class:
                // `Greeter.GreeterBase`
                base_suffixes.iter().any(|s| name.ends_with(s.as_str()))
                    && (name.ends_with("ServiceBase") || b.body().contains('+'))
            }),
            EntryPointRule::RealtimeHub { base_types }
            | EntryPointRule::UiComponentLifecycle { base_types, .. }
            | EntryPointRule::BackgroundService { base_types, .. } => inherits_any(ty, base_types),
            EntryPointRule::EventHandler { .. } | EntryPointRule::ProcessEntry { .. } => false,
            EntryPointRule::DependencyInjectionBootstrap { type_names, .. } => {
                contains(type_names, &ty.name)
            }
            EntryPointRule::Configured { patterns } => patterns.iter().any(|p| ty.matches_pattern(p)),
        }
    }

    fn is_controller(&self, ty: &Symbol) -> bool {
        match self {
            EntryPointRule::HttpHandler {
                type_suffixes,
                base_types,
                type_attributes,
                ..
            } => {
                type_suffixes.iter().any(|s| ty.name.ends_with(s.as_str()))
                    || inherits_any(ty, base_types)
                    || type_attributes.iter().any(|a| ty.has_attribute(a))
            }
            _ => false,
        }
    }

    /// Properties and fields are only ever rooted by configuration
    pub fn matches_member(&self, member: &Symbol) -> bool {
        match self {
            EntryPointRule::Configured { patterns } => {
                patterns.iter().any(|p| member.matches_pattern(p))
            }
            _ => false,
        }
    }
}

/// Ordered table of entry-point rules
#[derive(Debug, Clone)]
pub struct EntryPointClassifier {
    rules: Vec<EntryPointRule>,
}

impl EntryPointClassifier {
    /// Built-in framework conventions plus the configured names
    pub fn new(config: &Config) -> Self {
        Self::builtin().with_rule(EntryPointRule::configured(config))
    }

    /// Framework conventions only
    pub fn builtin() -> Self {
        Self {
            rules: vec![
                EntryPointRule::http_handler(),
                EntryPointRule::test_method(),
                EntryPointRule::rpc_service(),
                EntryPointRule::realtime_hub(),
                EntryPointRule::ui_component_lifecycle(),
                EntryPointRule::background_service(),
                EntryPointRule::event_handler(),
                EntryPointRule::dependency_injection_bootstrap(),
                EntryPointRule::process_entry(),
            ],
        }
    }

    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: EntryPointRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[EntryPointRule] {
        &self.rules
    }

    /// First rule treating `symbol` as a framework-invoked root
    pub fn classify(&self, symbol: &Symbol, owner: Option<&Symbol>) -> Option<EntryPointKind> {
        let kind = self
            .rules
            .iter()
            .find(|rule| match symbol.kind {
                SymbolKind::Method => rule.matches_method(symbol, owner),
                SymbolKind::Type => rule.matches_type(symbol),
                SymbolKind::Property | SymbolKind::Field | SymbolKind::Parameter => {
                    rule.matches_member(symbol)
                }
            })
            .map(EntryPointRule::kind);

        if let Some(kind) = kind {
            debug!("Entry point ({}): {}", kind, symbol.key);
        }
        kind
    }
}
