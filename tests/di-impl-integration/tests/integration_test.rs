//! 规划器与参考运行时的端到端集成测试

use di_abstractions::{ComponentOutcome, ComponentPlanner, DeclarationCatalog, ResolutionPlan};
use di_impl::ComponentPlannerImpl;
use di_runtime::{
    downcast, same_instance, ComponentBuilder, Construction, Constructor, Dependency, Instance,
    MemoizingSupplier, RuntimeError, SetInstance, Supplier,
};
use infrastructure_common::{DependencyError, ErrorKind, Key, TypeName};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

fn init_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .try_init()
            .ok();
    });
}

/// 构造出的对象，记录键、序号和依赖
#[derive(Debug)]
struct Built {
    key: String,
    serial: usize,
    dependencies: Vec<Dependency>,
}

/// 按声明构造 `Built`，集合贡献返回成员名
#[derive(Default)]
struct RecordingConstructor {
    serial: AtomicUsize,
    defaults: AtomicUsize,
}

impl Constructor for RecordingConstructor {
    fn construct(&self, construction: Construction<'_>) -> anyhow::Result<Instance> {
        let declaration = construction.declaration;
        if let Some(kind) = declaration.contribution_kind() {
            return match kind {
                di_abstractions::ContributionKind::Elements => {
                    Ok(Arc::new(Vec::<Instance>::new()))
                }
                _ => {
                    let member = declaration
                        .origin
                        .member
                        .clone()
                        .ok_or_else(|| anyhow::anyhow!("贡献缺少成员名: {}", declaration.key))?;
                    Ok(Arc::new(member))
                }
            };
        }
        Ok(Arc::new(Built {
            key: declaration.key.to_string(),
            serial: self.serial.fetch_add(1, Ordering::SeqCst),
            dependencies: construction.dependencies.to_vec(),
        }))
    }

    fn default_module(&self, module: &TypeName) -> anyhow::Result<Instance> {
        self.defaults.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(module.to_string()))
    }

    fn inject_members(
        &self,
        _target: &TypeName,
        _instance: &Instance,
        _members: &[Dependency],
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

fn plan_all(catalog: serde_json::Value) -> Vec<ComponentOutcome> {
    let catalog: DeclarationCatalog = serde_json::from_value(catalog).unwrap();
    ComponentPlannerImpl::default().plan_all(&catalog)
}

fn only_plan(catalog: serde_json::Value) -> Arc<ResolutionPlan> {
    let mut outcomes = plan_all(catalog);
    assert_eq!(outcomes.len(), 1);
    Arc::new(outcomes.remove(0).result.unwrap())
}

fn built(instance: &Instance) -> Arc<Built> {
    downcast::<Built>(instance).unwrap()
}

fn constructor_binding(key: &str, dependencies: serde_json::Value) -> serde_json::Value {
    json!({
        "key": { "type": key },
        "dependencies": dependencies,
        "origin": { "owner": key },
        "factory_kind": "ConstructorInjection"
    })
}

fn provision(method: &str, key: &str) -> serde_json::Value {
    json!({ "Provision": { "method": method, "key": { "type": key } } })
}

#[test]
fn test_one_binding_per_reachable_key() {
    init_logger();

    let plan = only_plan(json!({
        "declarations": [
            constructor_binding("test.A", json!([
                { "key": { "type": "test.B" } },
                { "key": { "type": "test.C" } }
            ])),
            constructor_binding("test.B", json!([ { "key": { "type": "test.D" } } ])),
            constructor_binding("test.C", json!([ { "key": { "type": "test.D" } } ])),
            constructor_binding("test.D", json!([])),
            constructor_binding("test.Unreachable", json!([]))
        ],
        "components": [
            { "type_name": "test.DiamondComponent", "requests": [ provision("a", "test.A") ] }
        ]
    }));

    let mut keys: Vec<String> = plan.bindings.iter().map(|b| b.key.to_string()).collect();
    keys.sort();
    assert_eq!(keys, vec!["test.A", "test.B", "test.C", "test.D"]);
    let order: Vec<String> = plan
        .initialization_order()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(order.first().map(String::as_str), Some("test.D"));
    assert_eq!(order.last().map(String::as_str), Some("test.A"));
}

#[test]
fn test_scoped_identity_and_unscoped_distinctness() {
    init_logger();

    let mut scoped = constructor_binding("test.Scoped", json!([]));
    scoped["scope"] = json!("Singleton");
    let plan = only_plan(json!({
        "declarations": [ scoped, constructor_binding("test.Unscoped", json!([])) ],
        "components": [
            {
                "type_name": "test.AppComponent",
                "scope": "Singleton",
                "requests": [
                    provision("scoped", "test.Scoped"),
                    { "Provision": {
                        "method": "scopedSupplier",
                        "key": { "type": "test.Scoped" },
                        "access": "DeferredSupplier"
                    } },
                    { "Provision": {
                        "method": "scopedLazy",
                        "key": { "type": "test.Scoped" },
                        "access": "MemoizingDeferredSupplier"
                    } },
                    provision("unscoped", "test.Unscoped")
                ]
            }
        ]
    }));

    let component = ComponentBuilder::new(plan, Arc::new(RecordingConstructor::default()))
        .build()
        .unwrap();

    let direct = component.provision("scoped").unwrap();
    let supplier = downcast::<Supplier>(&component.provision("scopedSupplier").unwrap()).unwrap();
    let lazy = downcast::<MemoizingSupplier>(&component.provision("scopedLazy").unwrap()).unwrap();
    assert!(same_instance(&direct, &supplier.get().unwrap()));
    assert!(same_instance(&direct, &lazy.get().unwrap()));

    let first = component.provision("unscoped").unwrap();
    let second = component.provision("unscoped").unwrap();
    assert!(!same_instance(&first, &second));
}

#[test]
fn test_missing_binding_names_key_and_path() {
    init_logger();

    let outcomes = plan_all(json!({
        "declarations": [
            constructor_binding("test.A", json!([ { "key": { "type": "test.B" } } ])),
            constructor_binding("test.B", json!([ { "key": { "type": "test.Missing" } } ]))
        ],
        "components": [
            { "type_name": "test.AppComponent", "requests": [ provision("a", "test.A") ] }
        ]
    }));

    let diagnostic = &outcomes[0].diagnostics()[0];
    assert_eq!(diagnostic.kind(), ErrorKind::BindingNotFound);
    match &diagnostic.error {
        DependencyError::BindingNotFound {
            key, request, path, ..
        } => {
            assert_eq!(key, &Key::of("test.Missing"));
            assert_eq!(request.as_deref(), Some("a"));
            assert_eq!(path.to_string(), "test.A -> test.B -> test.Missing");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_colliding_simple_names_get_suffixes() {
    init_logger();

    let plan = only_plan(json!({
        "declarations": [
            {
                "key": { "type": "com.one.Database" },
                "origin": { "owner": "com.one.DatabaseModule", "member": "database" },
                "factory_kind": "ProviderMethod"
            },
            {
                "key": { "type": "com.two.Database" },
                "origin": { "owner": "com.two.DatabaseModule", "member": "database" },
                "factory_kind": "ProviderMethod"
            }
        ],
        "modules": [
            { "type_name": "com.one.DatabaseModule", "no_arg_constructible": false },
            { "type_name": "com.two.DatabaseModule", "no_arg_constructible": false }
        ],
        "components": [
            {
                "type_name": "test.AppComponent",
                "modules": ["com.one.DatabaseModule", "com.two.DatabaseModule"],
                "requests": [
                    provision("first", "com.one.Database"),
                    provision("second", "com.two.Database")
                ]
            }
        ]
    }));

    assert_eq!(plan.request("first").unwrap().symbol, "database");
    assert_eq!(plan.request("second").unwrap().symbol, "database1");
    let fields: Vec<&str> = plan.builder.fields.iter().map(|f| f.symbol.as_str()).collect();
    assert_eq!(fields, vec!["databaseModule", "databaseModule1"]);

    let first_module: Instance = Arc::new("one".to_string());
    let second_module: Instance = Arc::new("two".to_string());
    let component = ComponentBuilder::new(plan, Arc::new(RecordingConstructor::default()))
        .set("databaseModule", first_module)
        .unwrap()
        .set("databaseModule1", second_module)
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(built(&component.provision("second").unwrap()).key, "com.two.Database");
}

#[test]
fn test_set_union_of_empty_and_singleton_contributions() {
    init_logger();

    let set = "java.util.Set<java.lang.String>";
    let plan = only_plan(json!({
        "declarations": [
            {
                "key": { "type": set },
                "kind": { "SetContribution": "Elements" },
                "origin": { "owner": "test.EmptySetModule", "member": "emptySet" },
                "factory_kind": "ProviderMethod"
            },
            {
                "key": { "type": set },
                "kind": { "SetContribution": "Element" },
                "origin": { "owner": "test.SetModule", "member": "x" },
                "factory_kind": "ProviderMethod"
            }
        ],
        "modules": [
            { "type_name": "test.EmptySetModule" },
            { "type_name": "test.SetModule" }
        ],
        "components": [
            {
                "type_name": "test.SetComponent",
                "modules": ["test.EmptySetModule", "test.SetModule"],
                "requests": [ provision("strings", set) ]
            }
        ]
    }));

    let component = ComponentBuilder::new(plan, Arc::new(RecordingConstructor::default()))
        .build()
        .unwrap();
    let strings = downcast::<SetInstance>(&component.provision("strings").unwrap()).unwrap();

    assert_eq!(strings.len(), 1);
    assert_eq!(strings.values::<String>()[0].as_str(), "x");
}

#[test]
fn test_upstream_component_is_required() {
    init_logger();

    let plan = only_plan(json!({
        "declarations": [
            {
                "key": { "type": "test.Database" },
                "origin": { "owner": "test.ParentComponent", "member": "database" },
                "factory_kind": "ComponentDependencyAccessor"
            }
        ],
        "components": [
            {
                "type_name": "test.ChildComponent",
                "dependencies": ["test.ParentComponent"],
                "requests": [ provision("database", "test.Database") ]
            }
        ]
    }));

    let field = plan
        .builder
        .field_for(&TypeName::new("test.ParentComponent"))
        .unwrap();
    assert!(field.is_required());

    let constructor = Arc::new(RecordingConstructor::default());
    let error = ComponentBuilder::new(plan, constructor.clone())
        .build()
        .unwrap_err();
    assert!(matches!(
        error,
        RuntimeError::DependencyError {
            source: DependencyError::BuilderRequiredValueMissing { ref field, .. }
        } if field == "parentComponent"
    ));
    assert_eq!(constructor.serial.load(Ordering::SeqCst), 0);
}

#[test]
fn test_unscoped_binding_requested_three_ways() {
    init_logger();

    let plan = only_plan(json!({
        "declarations": [ constructor_binding("test.A", json!([])) ],
        "components": [
            {
                "type_name": "test.AppComponent",
                "requests": [
                    provision("a", "test.A"),
                    { "Provision": {
                        "method": "aSupplier",
                        "key": { "type": "test.A" },
                        "access": "DeferredSupplier"
                    } },
                    { "Provision": {
                        "method": "aLazy",
                        "key": { "type": "test.A" },
                        "access": "MemoizingDeferredSupplier"
                    } }
                ]
            }
        ]
    }));

    assert_eq!(plan.bindings.len(), 1);
    assert!(!plan.bindings[0].cached);
    assert!(plan.requests.iter().all(|r| r.symbol == plan.bindings[0].symbol));

    let component = ComponentBuilder::new(plan, Arc::new(RecordingConstructor::default()))
        .build()
        .unwrap();
    let first = built(&component.provision("a").unwrap());
    let second = built(&component.provision("a").unwrap());
    assert_ne!(first.serial, second.serial);
}

#[test]
fn test_module_binding_order_and_default() {
    init_logger();

    let plan = only_plan(json!({
        "declarations": [
            constructor_binding("test.A", json!([ { "key": { "type": "test.B" } } ])),
            {
                "key": { "type": "test.B" },
                "dependencies": [ { "key": { "type": "test.C" } } ],
                "origin": { "owner": "test.M", "member": "provideB" },
                "factory_kind": "ProviderMethod"
            },
            constructor_binding("test.C", json!([]))
        ],
        "modules": [ { "type_name": "test.M" } ],
        "components": [
            {
                "type_name": "test.AppComponent",
                "modules": ["test.M"],
                "requests": [ provision("a", "test.A") ]
            }
        ]
    }));

    let order: Vec<String> = plan
        .initialization_order()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(order, vec!["test.C", "test.B", "test.A"]);
    assert!(!plan.builder.fields[0].is_required());

    let constructor = Arc::new(RecordingConstructor::default());
    let component = ComponentBuilder::new(plan, constructor.clone())
        .build()
        .unwrap();
    let a = built(&component.provision("a").unwrap());
    assert_eq!(constructor.defaults.load(Ordering::SeqCst), 1);
    assert_eq!(built(a.dependencies[0].value().unwrap()).key, "test.B");
}
