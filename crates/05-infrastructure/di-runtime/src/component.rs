//! 组件构建器与组件实例

use crate::constructor::{Construction, Constructor};
use crate::error::{RuntimeError, RuntimeResult};
use crate::instance::{downcast, ComponentHandle, Instance, SetInstance};
use crate::supplier::{Dependency, MemoizingSupplier, Provider, Slot, Supplier};
use di_abstractions::{
    AccessMode, BindingDeclaration, CachePolicy, ContributionKind, FactoryKind, PlannedBinding,
    PlannedContribution, PlannedDependency, PlannedSource, Requirement, RequestKind,
    ResolutionPlan,
};
use infrastructure_common::Key;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info};
use uuid::Uuid;

/// 每个绑定一个前向单元
struct Slots {
    cells: HashMap<Key, Slot>,
}

impl Slots {
    fn for_plan(plan: &ResolutionPlan) -> Self {
        let cells = plan
            .bindings
            .iter()
            .map(|binding| (binding.key.clone(), Arc::new(OnceCell::new())))
            .collect();
        Self { cells }
    }

    fn supplier(&self, key: &Key) -> RuntimeResult<Supplier> {
        self.cells
            .get(key)
            .map(|slot| Supplier::new(key.clone(), Arc::clone(slot)))
            .ok_or_else(|| RuntimeError::UnknownBinding { key: key.clone() })
    }

    fn install(&self, key: &Key, provider: Provider) -> RuntimeResult<()> {
        let slot = self
            .cells
            .get(key)
            .ok_or_else(|| RuntimeError::UnknownBinding { key: key.clone() })?;
        if slot.set(provider).is_err() {
            debug!("前向单元已填充: {}", key);
        }
        Ok(())
    }

    /// 按访问方式解析依赖，值依赖在此时构造
    fn resolve(&self, dependencies: &[PlannedDependency]) -> RuntimeResult<Vec<Dependency>> {
        dependencies
            .iter()
            .map(|dependency| {
                let supplier = self.supplier(&dependency.key)?;
                Ok(match dependency.access {
                    AccessMode::Value => Dependency::Value(supplier.get()?),
                    AccessMode::DeferredSupplier => Dependency::Supplier(supplier),
                    AccessMode::MemoizingDeferredSupplier => {
                        Dependency::Memoizing(Arc::new(MemoizingSupplier::new(supplier)))
                    }
                })
            })
            .collect()
    }
}

/// 构造次数统计
type Constructions = Arc<Mutex<HashMap<Key, usize>>>;

/// 组件构建器
///
/// 调用方设置模块和上游组件实例，`build` 先检查必需字段再开始任何构造。
pub struct ComponentBuilder {
    plan: Arc<ResolutionPlan>,
    constructor: Arc<dyn Constructor>,
    values: HashMap<String, Instance>,
}

impl ComponentBuilder {
    /// 创建构建器
    pub fn new(plan: Arc<ResolutionPlan>, constructor: Arc<dyn Constructor>) -> Self {
        Self {
            plan,
            constructor,
            values: HashMap::new(),
        }
    }

    /// 设置字段
    pub fn set(mut self, field: &str, instance: Instance) -> RuntimeResult<Self> {
        if self.plan.builder.field(field).is_none() {
            return Err(RuntimeError::UnknownBuilderField {
                field: field.to_string(),
            });
        }
        self.values.insert(field.to_string(), instance);
        Ok(self)
    }

    /// 字段是否已设置
    pub fn is_set(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// 构建组件实例
    pub fn build(self) -> RuntimeResult<ComponentInstance> {
        let Self {
            plan,
            constructor,
            mut values,
        } = self;

        plan.builder.verify(|field| values.contains_key(field))?;

        for field in &plan.builder.fields {
            if field.requirement == Requirement::OptionalDefaulted
                && !values.contains_key(&field.symbol)
            {
                debug!("使用无参构造默认模块: {}", field.type_name);
                let module = constructor
                    .default_module(&field.type_name)
                    .map_err(|e| RuntimeError::construction(&field.type_name, e))?;
                values.insert(field.symbol.clone(), module);
            }
        }

        let id = Uuid::new_v4();
        let handle: Instance = Arc::new(ComponentHandle {
            id,
            component: plan.component.clone(),
        });
        let slots = Arc::new(Slots::for_plan(&plan));
        let constructions: Constructions = Arc::new(Mutex::new(HashMap::new()));

        let wiring = Wiring {
            plan: &plan,
            constructor: &constructor,
            instances: &values,
            slots: Arc::downgrade(&slots),
            handle: &handle,
            constructions: &constructions,
        };
        for binding in &plan.bindings {
            slots.install(&binding.key, wiring.binding(binding)?)?;
        }

        info!(
            "组件实例已构建: {} ({}), {} 个绑定",
            plan.component,
            id,
            plan.bindings.len()
        );
        Ok(ComponentInstance {
            id,
            plan,
            constructor,
            slots,
            constructions,
        })
    }
}

impl fmt::Debug for ComponentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentBuilder")
            .field("component", &self.plan.component)
            .field("set", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// 按初始化顺序为每个绑定生成构造入口
struct Wiring<'a> {
    plan: &'a ResolutionPlan,
    constructor: &'a Arc<dyn Constructor>,
    instances: &'a HashMap<String, Instance>,
    slots: Weak<Slots>,
    handle: &'a Instance,
    constructions: &'a Constructions,
}

impl Wiring<'_> {
    fn binding(&self, binding: &PlannedBinding) -> RuntimeResult<Provider> {
        let raw = match &binding.source {
            PlannedSource::Declared(declaration) => self.declared(
                declaration,
                binding.owner_symbol.as_deref(),
                &binding.dependencies,
            )?,
            PlannedSource::Multibinding { contributions } => {
                self.multibinding(&binding.key, contributions)?
            }
        };
        Ok(cached(raw, &binding.cache_policy))
    }

    fn declared(
        &self,
        declaration: &BindingDeclaration,
        owner_symbol: Option<&str>,
        dependencies: &[PlannedDependency],
    ) -> RuntimeResult<Provider> {
        if declaration.factory_kind == FactoryKind::Instance
            && declaration.origin.owner == self.plan.component
        {
            let handle = Arc::clone(self.handle);
            let provider: Provider = Arc::new(move || -> RuntimeResult<Instance> { Ok(handle.clone()) });
            return Ok(provider);
        }

        let owner = match owner_symbol {
            Some(symbol) => Some(self.instances.get(symbol).cloned().ok_or_else(|| {
                RuntimeError::UnknownSymbol {
                    symbol: symbol.to_string(),
                }
            })?),
            None => None,
        };
        let declaration = declaration.clone();
        let dependencies = dependencies.to_vec();
        let slots = self.slots.clone();
        let constructor = Arc::clone(self.constructor);
        let constructions = Arc::clone(self.constructions);

        let provider: Provider = Arc::new(move || -> RuntimeResult<Instance> {
            let slots = slots.upgrade().ok_or(RuntimeError::ComponentReleased)?;
            let resolved = slots.resolve(&dependencies)?;
            *constructions.lock().entry(declaration.key.clone()).or_insert(0) += 1;
            constructor
                .construct(Construction {
                    declaration: &declaration,
                    owner: owner.as_ref(),
                    dependencies: &resolved,
                })
                .map_err(|e| RuntimeError::construction(&declaration.key, e))
        });
        Ok(provider)
    }

    fn multibinding(
        &self,
        key: &Key,
        contributions: &[PlannedContribution],
    ) -> RuntimeResult<Provider> {
        let mut parts: Vec<(ContributionKind, Provider)> = Vec::new();
        for contribution in contributions {
            let Some(kind) = contribution.declaration.contribution_kind() else {
                continue;
            };
            if kind == ContributionKind::Declaration {
                continue;
            }
            let raw = self.declared(
                &contribution.declaration,
                contribution.owner_symbol.as_deref(),
                &contribution.dependencies,
            )?;
            parts.push((kind, cached(raw, &contribution.cache_policy)));
        }

        let key = key.clone();
        let constructor = Arc::clone(self.constructor);
        let provider: Provider = Arc::new(move || -> RuntimeResult<Instance> {
            let eq = |left: &Instance, right: &Instance| constructor.element_eq(left, right);
            let mut set = SetInstance::new();
            for (kind, provider) in &parts {
                let value = provider()?;
                match kind {
                    ContributionKind::Element => {
                        set.insert_by(value, eq);
                    }
                    ContributionKind::Elements => {
                        let elements = downcast::<Vec<Instance>>(&value).ok_or_else(|| {
                            RuntimeError::ElementsTypeMismatch { key: key.clone() }
                        })?;
                        for element in elements.iter() {
                            set.insert_by(Arc::clone(element), eq);
                        }
                    }
                    ContributionKind::Declaration => {}
                }
            }
            Ok(Arc::new(set) as Instance)
        });
        Ok(provider)
    }
}

/// 按缓存策略包装构造入口
///
/// 作用域与实例绑定在每个组件实例内只构造一次，并发首次访问也只有一次构造。
fn cached(raw: Provider, policy: &CachePolicy) -> Provider {
    match policy {
        CachePolicy::Scoped(_) | CachePolicy::Instance => {
            let cell: Arc<OnceCell<Instance>> = Arc::new(OnceCell::new());
            Arc::new(move || -> RuntimeResult<Instance> {
                cell.get_or_try_init(|| raw()).cloned()
            })
        }
        CachePolicy::None | CachePolicy::Delegated => raw,
    }
}

/// 组件实例
pub struct ComponentInstance {
    id: Uuid,
    plan: Arc<ResolutionPlan>,
    constructor: Arc<dyn Constructor>,
    slots: Arc<Slots>,
    constructions: Constructions,
}

impl ComponentInstance {
    /// 组件实例 ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 组件的解析计划
    pub fn plan(&self) -> &ResolutionPlan {
        &self.plan
    }

    /// 调用提供方法
    ///
    /// 延迟访问返回包装为实例的 [`Supplier`] 或 [`MemoizingSupplier`]。
    pub fn provision(&self, method: &str) -> RuntimeResult<Instance> {
        let request = self
            .plan
            .request(method)
            .ok_or_else(|| RuntimeError::UnknownRequest {
                method: method.to_string(),
            })?;
        let RequestKind::Provision(access) = request.kind else {
            return Err(RuntimeError::WrongRequestKind {
                method: method.to_string(),
                expected: "提供方法",
            });
        };
        let binding = self.plan.binding_by_symbol(&request.symbol).ok_or_else(|| {
            RuntimeError::UnknownSymbol {
                symbol: request.symbol.clone(),
            }
        })?;

        let supplier = self.slots.supplier(&binding.key)?;
        match access {
            AccessMode::Value => supplier.get(),
            AccessMode::DeferredSupplier => Ok(Arc::new(supplier) as Instance),
            AccessMode::MemoizingDeferredSupplier => {
                Ok(Arc::new(MemoizingSupplier::new(supplier)) as Instance)
            }
        }
    }

    /// 按键取得实例
    pub fn get(&self, key: &Key) -> RuntimeResult<Instance> {
        self.slots.supplier(key)?.get()
    }

    /// 按键取得延迟提供者
    pub fn supplier(&self, key: &Key) -> RuntimeResult<Supplier> {
        self.slots.supplier(key)
    }

    /// 按键取得带记忆的延迟提供者
    pub fn memoizing_supplier(&self, key: &Key) -> RuntimeResult<MemoizingSupplier> {
        Ok(MemoizingSupplier::new(self.slots.supplier(key)?))
    }

    /// 调用成员注入方法，`returns_instance` 为真时返回传入的实例
    pub fn inject(&self, method: &str, instance: &Instance) -> RuntimeResult<Option<Instance>> {
        let request = self
            .plan
            .request(method)
            .ok_or_else(|| RuntimeError::UnknownRequest {
                method: method.to_string(),
            })?;
        let RequestKind::MembersInjection { returns_instance } = request.kind else {
            return Err(RuntimeError::WrongRequestKind {
                method: method.to_string(),
                expected: "成员注入方法",
            });
        };
        let injector = self
            .plan
            .members_injector(&request.symbol)
            .ok_or_else(|| RuntimeError::UnknownSymbol {
                symbol: request.symbol.clone(),
            })?;

        let members = self.slots.resolve(&injector.dependencies)?;
        self.constructor
            .inject_members(&injector.target, instance, &members)
            .map_err(|e| RuntimeError::construction(&injector.target, e))?;
        debug!("成员注入完成: {} ({})", injector.target, method);

        Ok(returns_instance.then(|| Arc::clone(instance)))
    }

    /// 绑定被构造的次数
    pub fn construction_count(&self, key: &Key) -> usize {
        self.constructions.lock().get(key).copied().unwrap_or(0)
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("id", &self.id)
            .field("component", &self.plan.component)
            .finish()
    }
}
