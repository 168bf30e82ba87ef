//! Integration tests for module factories
//!
//! Covers the three module kinds end to end: callback modules, singleton
//! modules and multi-instance modules, with dependency checks against a
//! registry that changes between calls.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use serde_json::{json, Value};
use winter_core::modules::{
    ModuleClass, ModuleDefinition, ModuleFactory, ModuleKind, ModuleOutput, ModuleRegistry,
};
use winter_core::{FactoryConfig, ModuleError, NameCase};

/// Registry whose contents can change while factories hold it
#[derive(Default)]
struct TestRegistry {
    names: RwLock<HashSet<String>>,
}

impl TestRegistry {
    fn with_modules(names: &[&str]) -> Arc<Self> {
        let registry = Self::default();
        for name in names {
            registry.add(name);
        }
        Arc::new(registry)
    }

    fn add(&self, name: &str) {
        self.names.write().unwrap().insert(name.to_string());
    }
}

impl ModuleRegistry for TestRegistry {
    fn has_module(&self, name: &str) -> bool {
        self.names.read().unwrap().contains(name)
    }

    fn module_names(&self) -> Vec<String> {
        self.names.read().unwrap().iter().cloned().collect()
    }
}

/// Instance type shared by the test modules
#[derive(Debug)]
struct Widget {
    label: String,
    registry_knows_storage: bool,
}

fn label_from(args: &[Value]) -> String {
    args.first()
        .and_then(Value::as_str)
        .unwrap_or("unnamed")
        .to_string()
}

fn widget(registry: &Arc<dyn ModuleRegistry>, args: &[Value]) -> Widget {
    Widget {
        label: label_from(args),
        registry_knows_storage: registry.has_module("storage"),
    }
}

/// Multi-instance module without a dependency declaration
struct Gallery;

impl ModuleClass for Gallery {
    type Instance = Widget;

    fn construct(&self, registry: &Arc<dyn ModuleRegistry>, args: &[Value]) -> Widget {
        widget(registry, args)
    }

    fn methods(&self) -> &[&'static str] {
        &["render", "destroy"]
    }
}

/// Singleton module depending on storage
struct Settings;

impl ModuleClass for Settings {
    type Instance = Widget;

    fn construct(&self, registry: &Arc<dyn ModuleRegistry>, args: &[Value]) -> Widget {
        widget(registry, args)
    }

    fn dependencies(&self) -> Option<Vec<String>> {
        Some(vec!["storage".to_string()])
    }
}

/// Multi-instance module with several mixed-case dependencies
struct Editor;

impl ModuleClass for Editor {
    type Instance = Widget;

    fn construct(&self, registry: &Arc<dyn ModuleRegistry>, args: &[Value]) -> Widget {
        widget(registry, args)
    }

    fn dependencies(&self) -> Option<Vec<String>> {
        Some(vec![
            "Storage".to_string(),
            "History".to_string(),
            "CLIPBOARD".to_string(),
        ])
    }
}

fn label(output: &ModuleOutput) -> String {
    output
        .instance()
        .and_then(|i| i.downcast_ref::<Widget>())
        .map(|w| w.label.clone())
        .unwrap_or_default()
}

#[test]
fn test_callback_returns_function_result() {
    let registry = TestRegistry::with_modules(&[]);
    let factory = ModuleFactory::new(
        "greet",
        registry,
        ModuleDefinition::callback(|args| {
            json!({ "greeting": format!("hello {}", label_from(args)) })
        }),
    );

    assert!(factory.is_function());
    assert!(!factory.is_singleton());
    assert_eq!(factory.kind(), ModuleKind::Callback);
    assert!(factory.get_dependencies().is_empty());
    assert!(factory.dependencies_fulfilled());
    assert!(!factory.has_method("render"));

    let output = factory.get_instance(&[json!("world")]).unwrap();
    assert!(!output.is_instance());
    assert_eq!(output.value(), Some(&json!({ "greeting": "hello world" })));

    factory.get_instance(&[]).unwrap();
    assert!(factory.get_instances().is_empty());
    assert_eq!(factory.instance_count(), 0);
}

#[test]
fn test_module_without_dependencies_ignores_registry() {
    let registry = TestRegistry::with_modules(&[]);
    let factory = ModuleFactory::new("gallery", registry, ModuleDefinition::multi(Gallery));

    assert!(!factory.is_function());
    assert!(factory.get_dependencies().is_empty());
    assert!(factory.dependencies_fulfilled());
    assert!(factory.has_method("render"));
    assert!(!factory.has_method("dependencies"));

    let output = factory.get_instance(&[json!("first")]).unwrap();
    assert_eq!(label(&output), "first");
}

#[test]
fn test_missing_storage_dependency() {
    let registry = TestRegistry::with_modules(&["router"]);
    let factory = ModuleFactory::new("settings", registry, ModuleDefinition::singleton(Settings));

    assert!(!factory.dependencies_fulfilled());

    let err = factory.get_instance(&[]).unwrap_err();
    assert!(err.is_missing_dependency());
    assert!(err.to_string().contains("storage"));
    assert!(err.to_string().contains("settings"));
    assert!(factory.get_instances().is_empty());
}

#[test]
fn test_dependency_declaration_is_a_method() {
    let registry = TestRegistry::with_modules(&["storage"]);
    let settings = ModuleFactory::new("settings", registry, ModuleDefinition::singleton(Settings));

    assert_eq!(settings.get_dependencies(), vec!["storage"]);
    assert!(settings.has_method("dependencies"));
    assert!(!settings.has_method("render"));

    let registry = TestRegistry::with_modules(&[]);
    let gallery = ModuleFactory::new("gallery", registry, ModuleDefinition::multi(Gallery));

    assert!(gallery.get_dependencies().is_empty());
    assert!(!gallery.has_method("dependencies"));
}

#[test]
fn test_dependency_check_happens_at_call_time() {
    let registry = TestRegistry::with_modules(&[]);
    let factory = ModuleFactory::new(
        "settings",
        registry.clone(),
        ModuleDefinition::singleton(Settings),
    );

    assert!(factory.get_instance(&[]).is_err());

    registry.add("storage");
    let output = factory.get_instance(&[]).unwrap();
    let settings = output.instance().unwrap().downcast_ref::<Widget>().unwrap();
    assert!(settings.registry_knows_storage);
}

#[test]
fn test_all_missing_dependencies_are_listed() {
    let registry = TestRegistry::with_modules(&["history"]);
    let factory = ModuleFactory::new("editor", registry, ModuleDefinition::multi(Editor));

    assert_eq!(
        factory.get_dependencies(),
        vec!["storage", "history", "clipboard"]
    );

    match factory.get_instance(&[]) {
        Err(ModuleError::MissingDependency { module, missing }) => {
            assert_eq!(module, "editor");
            assert_eq!(missing, vec!["storage", "clipboard"]);
        }
        other => panic!("Expected missing dependency error, got {:?}", other),
    }
}

#[test]
fn test_preserved_case_needs_exact_names() {
    let registry = TestRegistry::with_modules(&["storage", "history", "clipboard"]);
    let factory = ModuleFactory::with_config(
        "editor",
        registry,
        ModuleDefinition::multi(Editor),
        FactoryConfig::new().with_dependency_case(NameCase::Preserve),
    );

    let err = factory.get_instance(&[]).unwrap_err();
    assert_eq!(err.missing(), ["Storage", "History", "CLIPBOARD"]);
}

#[test]
fn test_singleton_returns_same_instance() {
    let registry = TestRegistry::with_modules(&["storage"]);
    let factory = ModuleFactory::new("settings", registry, ModuleDefinition::singleton(Settings));

    assert!(factory.is_singleton());

    let first = factory.get_instance(&[json!("first")]).unwrap();
    let second = factory.get_instance(&[json!("second")]).unwrap();

    let first = first.instance().unwrap();
    let second = second.instance().unwrap();
    assert!(first.ptr_eq(second));
    assert_eq!(first.id(), second.id());
    // Arguments of later calls are ignored
    assert_eq!(second.downcast_ref::<Widget>().unwrap().label, "first");
    assert_eq!(factory.get_instances().len(), 1);
}

#[test]
fn test_detached_singleton_is_rebuilt() {
    let registry = TestRegistry::with_modules(&["storage"]);
    let factory = ModuleFactory::new("settings", registry, ModuleDefinition::singleton(Settings));

    let (first, handle) = factory
        .get_instance(&[json!("first")])
        .unwrap()
        .into_instance()
        .unwrap();
    assert!(handle.detach());
    assert!(factory.get_instances().is_empty());

    let output = factory.get_instance(&[json!("second")]).unwrap();
    assert!(!output.instance().unwrap().ptr_eq(&first));
    assert_eq!(label(&output), "second");
    assert_eq!(factory.instance_count(), 1);
}

#[test]
fn test_multi_instances_are_distinct() {
    let registry = TestRegistry::with_modules(&[]);
    let factory = ModuleFactory::new("gallery", registry, ModuleDefinition::multi(Gallery));

    let first = factory.get_instance(&[json!("a")]).unwrap();
    let second = factory.get_instance(&[json!("b")]).unwrap();

    assert!(!first.instance().unwrap().ptr_eq(second.instance().unwrap()));
    assert_eq!(factory.get_instances().len(), 2);

    assert!(first.handle().unwrap().detach());

    let remaining = factory.get_instances();
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0].ptr_eq(second.instance().unwrap()));
}

#[test]
fn test_detach_preserves_sibling_order() {
    let registry = TestRegistry::with_modules(&[]);
    let factory = ModuleFactory::new("gallery", registry, ModuleDefinition::multi(Gallery));

    let outputs: Vec<ModuleOutput> = ["a", "b", "c", "d"]
        .iter()
        .map(|l| factory.get_instance(&[json!(l)]).unwrap())
        .collect();

    assert!(outputs[1].handle().unwrap().detach());
    assert!(!outputs[1].handle().unwrap().detach());
    assert!(!outputs[1].handle().unwrap().is_attached());
    assert!(outputs[2].handle().unwrap().is_attached());

    let labels: Vec<String> = factory
        .get_instances()
        .iter()
        .map(|i| i.downcast_ref::<Widget>().unwrap().label.clone())
        .collect();
    assert_eq!(labels, vec!["a", "c", "d"]);
}

#[test]
fn test_handle_outlives_factory() {
    let registry = TestRegistry::with_modules(&[]);
    let factory = ModuleFactory::new("gallery", registry, ModuleDefinition::multi(Gallery));

    let (instance, handle) = factory.get_instance(&[]).unwrap().into_instance().unwrap();
    drop(factory);

    assert!(!handle.detach());
    assert_eq!(handle.instance_id(), instance.id());
    // The instance itself stays usable
    assert_eq!(instance.downcast_ref::<Widget>().unwrap().label, "unnamed");
}

#[test]
fn test_factory_metadata() {
    let registry = TestRegistry::with_modules(&["history"]);
    let factory = ModuleFactory::new("editor", registry, ModuleDefinition::multi(Editor));

    let metadata = factory.metadata();
    assert_eq!(metadata.name, "editor");
    assert_eq!(metadata.kind, ModuleKind::Multi);
    assert_eq!(metadata.missing_dependencies, vec!["storage", "clipboard"]);
    assert_eq!(metadata.instance_count, 0);
    assert!(!metadata.is_ready());

    let registry = TestRegistry::with_modules(&[]);
    let gallery = ModuleFactory::new("gallery", registry, ModuleDefinition::multi(Gallery));
    gallery.get_instance(&[]).unwrap();

    let metadata = gallery.metadata();
    assert!(metadata.is_ready());
    assert_eq!(metadata.instance_count, 1);
    assert_eq!(metadata.methods, vec!["render", "destroy"]);
}
