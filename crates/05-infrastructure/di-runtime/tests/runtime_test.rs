//! 参考运行时的集成测试

use di_abstractions::{
    AccessMode, BindingDeclaration, ComponentPlanner, ComponentSpec, ContributionKind, DeclarationCatalog,
    DependencyEdge, ModuleDescriptor, ResolutionPlan,
};
use di_impl::ComponentPlannerImpl;
use di_runtime::{
    downcast, same_instance, ComponentBuilder, ComponentHandle, Construction, Constructor,
    Dependency, Instance, MemoizingSupplier, RuntimeError, SetInstance, Supplier,
};
use infrastructure_common::{DependencyError, Key, TypeName};
use std::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::Mutex;
use std::sync::{Arc, Once};
use std::time::Duration;

static INIT_LOGGER: Once = Once::new();

fn init_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .try_init()
            .ok();
    });
}

/// 构造出的测试对象
#[derive(Debug)]
struct Token {
    key: String,
    serial: usize,
    owner: Option<Instance>,
    dependencies: Vec<Dependency>,
}

#[derive(Default)]
struct TestConstructor {
    serial: AtomicUsize,
    defaults: AtomicUsize,
    delay: Option<Duration>,
    injected: Mutex<Vec<(String, usize)>>,
}

impl TestConstructor {
    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    fn constructed(&self) -> usize {
        self.serial.load(Ordering::SeqCst)
    }
}

impl Constructor for TestConstructor {
    fn construct(&self, construction: Construction<'_>) -> anyhow::Result<Instance> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let declaration = construction.declaration;
        match declaration.contribution_kind() {
            Some(ContributionKind::Elements) => return Ok(Arc::new(Vec::<Instance>::new())),
            Some(ContributionKind::Element) => {
                return Ok(Arc::new(declaration.origin.member.clone().unwrap_or_default()))
            }
            _ => {}
        }
        Ok(Arc::new(Token {
            key: declaration.key.to_string(),
            serial: self.serial.fetch_add(1, Ordering::SeqCst),
            owner: construction.owner.cloned(),
            dependencies: construction.dependencies.to_vec(),
        }))
    }

    fn default_module(&self, module: &TypeName) -> anyhow::Result<Instance> {
        self.defaults.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(module.to_string()))
    }

    fn inject_members(
        &self,
        target: &TypeName,
        _instance: &Instance,
        members: &[Dependency],
    ) -> anyhow::Result<()> {
        self.injected
            .lock()
            .push((target.to_string(), members.len()));
        Ok(())
    }
}

fn plan(catalog: &DeclarationCatalog, component: &ComponentSpec) -> Arc<ResolutionPlan> {
    Arc::new(
        ComponentPlannerImpl::default()
            .plan(catalog, component)
            .unwrap(),
    )
}

fn token(instance: &Instance) -> Arc<Token> {
    downcast::<Token>(instance).unwrap()
}

#[test]
fn test_scoped_binding_is_shared_across_access_modes() {
    init_logger();

    let catalog = DeclarationCatalog::new()
        .with_declaration(
            BindingDeclaration::constructor(Key::of("test.Scoped")).in_scope("Singleton"),
        )
        .with_declaration(BindingDeclaration::constructor(Key::of("test.Unscoped")));
    let component = ComponentSpec::new(TypeName::new("test.TestComponent"))
        .with_scope("Singleton")
        .provision("scoped", Key::of("test.Scoped"))
        .provision_with("scopedSupplier", Key::of("test.Scoped"), AccessMode::DeferredSupplier)
        .provision_with(
            "scopedLazy",
            Key::of("test.Scoped"),
            AccessMode::MemoizingDeferredSupplier,
        )
        .provision("unscoped", Key::of("test.Unscoped"));
    let constructor = Arc::new(TestConstructor::default());
    let instance = ComponentBuilder::new(plan(&catalog, &component), constructor.clone())
        .build()
        .unwrap();

    let direct = instance.provision("scoped").unwrap();
    let supplier = downcast::<Supplier>(&instance.provision("scopedSupplier").unwrap()).unwrap();
    let lazy =
        downcast::<MemoizingSupplier>(&instance.provision("scopedLazy").unwrap()).unwrap();
    assert!(same_instance(&direct, &instance.provision("scoped").unwrap()));
    assert!(same_instance(&direct, &supplier.get().unwrap()));
    assert!(same_instance(&direct, &lazy.get().unwrap()));
    assert_eq!(instance.construction_count(&Key::of("test.Scoped")), 1);

    let first = instance.provision("unscoped").unwrap();
    let second = instance.provision("unscoped").unwrap();
    assert!(!same_instance(&first, &second));
    assert_ne!(token(&first).serial, token(&second).serial);
    assert_eq!(instance.construction_count(&Key::of("test.Unscoped")), 2);
}

#[test]
fn test_scoped_binding_is_per_component_instance() {
    init_logger();

    let catalog = DeclarationCatalog::new().with_declaration(
        BindingDeclaration::constructor(Key::of("test.Scoped")).in_scope("Singleton"),
    );
    let component = ComponentSpec::new(TypeName::new("test.TestComponent"))
        .with_scope("Singleton")
        .provision("scoped", Key::of("test.Scoped"));
    let plan = plan(&catalog, &component);
    let constructor = Arc::new(TestConstructor::default());

    let first = ComponentBuilder::new(plan.clone(), constructor.clone())
        .build()
        .unwrap();
    let second = ComponentBuilder::new(plan, constructor).build().unwrap();

    assert_ne!(first.id(), second.id());
    assert!(!same_instance(
        &first.provision("scoped").unwrap(),
        &second.provision("scoped").unwrap()
    ));
}

#[test]
fn test_concurrent_first_access_constructs_once() {
    init_logger();

    let catalog = DeclarationCatalog::new().with_declaration(
        BindingDeclaration::constructor(Key::of("test.Scoped")).in_scope("Singleton"),
    );
    let component = ComponentSpec::new(TypeName::new("test.TestComponent"))
        .with_scope("Singleton")
        .provision("scoped", Key::of("test.Scoped"));
    let constructor = Arc::new(TestConstructor::slow(Duration::from_millis(20)));
    let instance = ComponentBuilder::new(plan(&catalog, &component), constructor.clone())
        .build()
        .unwrap();

    let results: Vec<Instance> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| instance.provision("scoped").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.iter().all(|r| same_instance(r, &results[0])));
    assert_eq!(constructor.constructed(), 1);
    assert_eq!(instance.construction_count(&Key::of("test.Scoped")), 1);
}

#[test]
fn test_unscoped_binding_requested_three_ways() {
    init_logger();

    let catalog =
        DeclarationCatalog::new().with_declaration(BindingDeclaration::constructor(Key::of("test.A")));
    let component = ComponentSpec::new(TypeName::new("test.TestComponent"))
        .provision("a", Key::of("test.A"))
        .provision_with("aSupplier", Key::of("test.A"), AccessMode::DeferredSupplier)
        .provision_with("aLazy", Key::of("test.A"), AccessMode::MemoizingDeferredSupplier);
    let plan = plan(&catalog, &component);

    let a_bindings: Vec<_> = plan
        .bindings
        .iter()
        .filter(|b| b.key == Key::of("test.A"))
        .collect();
    assert_eq!(a_bindings.len(), 1);
    assert!(!a_bindings[0].cached);
    let symbols: Vec<&str> = plan.requests.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["a", "a", "a"]);

    let instance = ComponentBuilder::new(plan, Arc::new(TestConstructor::default()))
        .build()
        .unwrap();
    let first = instance.provision("a").unwrap();
    let second = instance.provision("a").unwrap();
    assert!(!same_instance(&first, &second));

    let supplier = downcast::<Supplier>(&instance.provision("aSupplier").unwrap()).unwrap();
    assert!(!same_instance(&supplier.get().unwrap(), &supplier.get().unwrap()));

    let lazy = downcast::<MemoizingSupplier>(&instance.provision("aLazy").unwrap()).unwrap();
    assert!(same_instance(&lazy.get().unwrap(), &lazy.get().unwrap()));
    assert_eq!(instance.construction_count(&Key::of("test.A")), 5);
}

#[test]
fn test_set_union_of_empty_and_element_contributions() {
    init_logger();

    let set = Key::of("java.util.Set<java.lang.String>");
    let empty_module = TypeName::new("test.EmptySetModule");
    let set_module = TypeName::new("test.SetModule");
    let catalog = DeclarationCatalog::new()
        .with_module(ModuleDescriptor::new(empty_module.clone()))
        .with_module(ModuleDescriptor::new(set_module.clone()))
        .with_declaration(
            BindingDeclaration::provides(empty_module.clone(), "emptySet", set.clone())
                .contributes(ContributionKind::Elements),
        )
        .with_declaration(
            BindingDeclaration::provides(set_module.clone(), "x", set.clone())
                .contributes(ContributionKind::Element),
        );
    let component = ComponentSpec::new(TypeName::new("test.SetComponent"))
        .with_module(empty_module)
        .with_module(set_module)
        .provision("strings", set);

    let instance = ComponentBuilder::new(plan(&catalog, &component), Arc::new(TestConstructor::default()))
        .build()
        .unwrap();
    let strings = downcast::<SetInstance>(&instance.provision("strings").unwrap()).unwrap();

    assert_eq!(strings.len(), 1);
    let values: Vec<String> = strings.values::<String>().iter().map(|s| s.to_string()).collect();
    assert_eq!(values, vec!["x"]);
}

#[test]
fn test_equal_elements_from_different_modules_collapse() {
    init_logger();

    let set = Key::of("java.util.Set<java.lang.String>");
    let first_module = TypeName::new("test.FirstSetModule");
    let second_module = TypeName::new("test.SecondSetModule");
    let catalog = DeclarationCatalog::new()
        .with_module(ModuleDescriptor::new(first_module.clone()))
        .with_module(ModuleDescriptor::new(second_module.clone()))
        .with_declaration(
            BindingDeclaration::provides(first_module.clone(), "x", set.clone())
                .contributes(ContributionKind::Element),
        )
        .with_declaration(
            BindingDeclaration::provides(second_module.clone(), "x", set.clone())
                .contributes(ContributionKind::Element),
        );
    let component = ComponentSpec::new(TypeName::new("test.SetComponent"))
        .with_module(first_module)
        .with_module(second_module)
        .provision("strings", set);

    let instance = ComponentBuilder::new(plan(&catalog, &component), Arc::new(TestConstructor::default()))
        .build()
        .unwrap();
    let strings = downcast::<SetInstance>(&instance.provision("strings").unwrap()).unwrap();

    assert_eq!(strings.len(), 1);
    assert_eq!(strings.values::<String>()[0].as_str(), "x");
}

#[test]
fn test_missing_upstream_component_fails_before_construction() {
    init_logger();

    let parent = TypeName::new("test.ParentComponent");
    let catalog = DeclarationCatalog::new()
        .with_component(ComponentSpec::new(parent.clone()))
        .with_declaration(BindingDeclaration::accessor(
            parent.clone(),
            "database",
            Key::of("test.Database"),
        ));
    let component = ComponentSpec::new(TypeName::new("test.ChildComponent"))
        .with_dependency(parent.clone())
        .provision("database", Key::of("test.Database"));
    let plan = plan(&catalog, &component);

    let field = plan.builder.field_for(&parent).unwrap();
    assert_eq!(field.symbol, "parentComponent");
    assert!(field.is_required());

    let constructor = Arc::new(TestConstructor::default());
    let error = ComponentBuilder::new(plan.clone(), constructor.clone())
        .build()
        .unwrap_err();
    match error {
        RuntimeError::DependencyError {
            source: DependencyError::BuilderRequiredValueMissing { field, .. },
        } => assert_eq!(field, "parentComponent"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(constructor.constructed(), 0);
    assert_eq!(constructor.defaults.load(Ordering::SeqCst), 0);

    let upstream: Instance = Arc::new("parent".to_string());
    let instance = ComponentBuilder::new(plan, constructor.clone())
        .set("parentComponent", upstream.clone())
        .unwrap()
        .build()
        .unwrap();
    let database = token(&instance.provision("database").unwrap());
    assert!(same_instance(database.owner.as_ref().unwrap(), &upstream));
    assert_eq!(database.key, "test.Database");
}

#[test]
fn test_unknown_builder_field_is_rejected() {
    let component = ComponentSpec::new(TypeName::new("test.TestComponent"));
    let result = ComponentBuilder::new(
        plan(&DeclarationCatalog::new(), &component),
        Arc::new(TestConstructor::default()),
    )
    .set("nothing", Arc::new(()));
    assert!(matches!(result, Err(RuntimeError::UnknownBuilderField { .. })));
}

#[test]
fn test_module_is_defaulted_and_dependencies_come_first() {
    init_logger();

    let module = TypeName::new("test.M");
    let catalog = DeclarationCatalog::new()
        .with_module(ModuleDescriptor::new(module.clone()))
        .with_declaration(
            BindingDeclaration::constructor(Key::of("test.A")).depends_on(Key::of("test.B")),
        )
        .with_declaration(
            BindingDeclaration::provides(module.clone(), "provideB", Key::of("test.B"))
                .depends_on(Key::of("test.C")),
        )
        .with_declaration(BindingDeclaration::constructor(Key::of("test.C")));
    let component = ComponentSpec::new(TypeName::new("test.TestComponent"))
        .with_module(module)
        .provision("a", Key::of("test.A"));
    let plan = plan(&catalog, &component);
    let order: Vec<String> = plan
        .initialization_order()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(order, vec!["test.C", "test.B", "test.A"]);

    let constructor = Arc::new(TestConstructor::default());
    let instance = ComponentBuilder::new(plan, constructor.clone())
        .build()
        .unwrap();
    let a = token(&instance.provision("a").unwrap());

    assert_eq!(constructor.defaults.load(Ordering::SeqCst), 1);
    let b = token(a.dependencies[0].value().unwrap());
    assert_eq!(b.key, "test.B");
    let owner = downcast::<String>(b.owner.as_ref().unwrap()).unwrap();
    assert_eq!(owner.as_str(), "test.M");
    let c = token(b.dependencies[0].value().unwrap());
    assert!(c.serial < b.serial && b.serial < a.serial);
}

#[test]
fn test_deferred_cycle_runs_through_forward_cell() {
    init_logger();

    let catalog = DeclarationCatalog::new()
        .with_declaration(
            BindingDeclaration::constructor(Key::of("test.A"))
                .depends_on_deferred(Key::of("test.B")),
        )
        .with_declaration(
            BindingDeclaration::constructor(Key::of("test.B")).depends_on(Key::of("test.A")),
        );
    let component = ComponentSpec::new(TypeName::new("test.TestComponent"))
        .provision("a", Key::of("test.A"));
    let instance = ComponentBuilder::new(plan(&catalog, &component), Arc::new(TestConstructor::default()))
        .build()
        .unwrap();

    let a = token(&instance.provision("a").unwrap());
    let Dependency::Supplier(b_supplier) = &a.dependencies[0] else {
        panic!("expected a deferred dependency");
    };
    let b = token(&b_supplier.get().unwrap());
    assert_eq!(b.key, "test.B");
    assert_eq!(token(b.dependencies[0].value().unwrap()).key, "test.A");
}

#[test]
fn test_self_injection_yields_component_handle() {
    let component = ComponentSpec::new(TypeName::new("test.TestComponent"))
        .provision("self", Key::of("test.TestComponent"));
    let instance = ComponentBuilder::new(
        plan(&DeclarationCatalog::new(), &component),
        Arc::new(TestConstructor::default()),
    )
    .build()
    .unwrap();

    let first = instance.provision("self").unwrap();
    let handle = downcast::<ComponentHandle>(&first).unwrap();
    assert_eq!(handle.id, instance.id());
    assert!(same_instance(&first, &instance.get(&Key::of("test.TestComponent")).unwrap()));
}

#[test]
fn test_members_injection() {
    init_logger();

    let catalog =
        DeclarationCatalog::new().with_declaration(BindingDeclaration::constructor(Key::of("test.A")));
    let members = vec![
        DependencyEdge::value(Key::of("test.A")),
        DependencyEdge::new(Key::of("test.A"), AccessMode::DeferredSupplier),
    ];
    let component = ComponentSpec::new(TypeName::new("test.TestComponent"))
        .members_injection("inject", TypeName::new("test.Target"), members.clone(), false)
        .members_injection("injectAndReturn", TypeName::new("test.Target"), members, true)
        .provision("a", Key::of("test.A"));
    let constructor = Arc::new(TestConstructor::default());
    let instance = ComponentBuilder::new(plan(&catalog, &component), constructor.clone())
        .build()
        .unwrap();

    let target: Instance = Arc::new("target".to_string());
    assert!(instance.inject("inject", &target).unwrap().is_none());
    let returned = instance.inject("injectAndReturn", &target).unwrap().unwrap();
    assert!(same_instance(&returned, &target));

    let injected = constructor.injected.lock().clone();
    assert_eq!(
        injected,
        vec![("test.Target".to_string(), 2), ("test.Target".to_string(), 2)]
    );
    assert!(matches!(
        instance.inject("a", &target),
        Err(RuntimeError::WrongRequestKind { .. })
    ));
}
