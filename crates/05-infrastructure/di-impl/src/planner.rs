//! 组件规划流水线
//!
//! 验证 → 索引 → 集合聚合 → 图解析 → 作用域缓存 → 初始化顺序 → 符号分配 → 构建器契约

use crate::builder_contract::BuilderContractValidator;
use crate::index::BindingIndexImpl;
use crate::multibinding::MultibindingAggregator;
use crate::ordering::{InitializationOrder, InitializationOrderPlanner};
use crate::resolver::GraphResolverImpl;
use crate::scope::ScopeCachePlanner;
use crate::symbols::{SymbolAllocator, SymbolOwner, SymbolTable};
use crate::validation::ComponentValidator;
use di_abstractions::{
    BindingGraph, BindingSource, CachePolicy, ComponentPlanner, ComponentSpec, ContributionKind,
    DeclarationCatalog, DependencyEdge, FactoryKind, GraphResolver, MembersInjectorPlan,
    PlannedBinding, PlannedContribution, PlannedDependency, PlannedSource, RequestBinding,
    RequestKind, ResolutionPlan, ResolvedDependency, ResolvedRequest,
};
use infrastructure_common::{Diagnostic, Key, PlannerOptions, TypeName};
use tracing::{info, info_span};

/// 组件规划器实现
#[derive(Debug, Clone, Default)]
pub struct ComponentPlannerImpl {
    options: PlannerOptions,
}

impl ComponentPlannerImpl {
    /// 使用指定选项创建规划器
    pub fn new(options: PlannerOptions) -> Self {
        Self { options }
    }

    /// 规划器选项
    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }
}

impl ComponentPlanner for ComponentPlannerImpl {
    fn plan(
        &self,
        catalog: &DeclarationCatalog,
        component: &ComponentSpec,
    ) -> Result<ResolutionPlan, Vec<Diagnostic>> {
        let span = info_span!("plan_component", component = %component.type_name);
        let _enter = span.enter();
        info!("开始规划组件: {}", component.type_name);

        let diagnose = |error| vec![Diagnostic::new(component.type_name.clone(), error)];

        let mut errors = ComponentValidator::new().validate(catalog, component);
        if !errors.is_empty() {
            if self.options.fail_fast {
                errors.truncate(1);
            }
            return Err(errors
                .into_iter()
                .map(|error| Diagnostic::new(component.type_name.clone(), error))
                .collect());
        }

        let index =
            BindingIndexImpl::for_component(catalog, component, &self.options).map_err(diagnose)?;
        let multibindings = MultibindingAggregator::new().aggregate(&index);
        let mut graph =
            GraphResolverImpl::new(&index, &multibindings, component, &self.options).resolve()?;
        ScopeCachePlanner::new().plan(&mut graph, component)?;
        let order = InitializationOrderPlanner::new()
            .plan(&graph)
            .map_err(diagnose)?;
        let symbols = SymbolAllocator::new().allocate(&graph, &order);
        let builder = BuilderContractValidator::new().derive(&graph, &order, catalog, &symbols);

        let plan = PlanAssembler {
            component,
            graph: &graph,
            order: &order,
            symbols: &symbols,
        }
        .assemble(builder);

        info!(
            "组件 {} 规划完成: {} 个绑定, {} 个成员注入器, {} 个构建器字段",
            component.type_name,
            plan.bindings.len(),
            plan.members_injectors.len(),
            plan.builder.fields.len()
        );
        Ok(plan)
    }
}

/// 将带注解的绑定图组装为解析计划
struct PlanAssembler<'a> {
    component: &'a ComponentSpec,
    graph: &'a BindingGraph,
    order: &'a InitializationOrder,
    symbols: &'a SymbolTable,
}

impl PlanAssembler<'_> {
    fn symbol(&self, key: &Key) -> String {
        self.symbols
            .binding(key)
            .map(str::to_string)
            .unwrap_or_else(|| SymbolOwner::Binding(key.clone()).base_name())
    }

    fn instance_symbol(&self, owner: &TypeName) -> Option<String> {
        self.symbols.instance(owner).map(str::to_string)
    }

    fn edge(&self, edge: &DependencyEdge) -> PlannedDependency {
        PlannedDependency {
            key: edge.key.clone(),
            symbol: self.symbol(&edge.key),
            access: edge.access,
        }
    }

    fn resolved(&self, dependency: &ResolvedDependency) -> PlannedDependency {
        PlannedDependency {
            key: dependency.key.clone(),
            symbol: self.symbol(&dependency.key),
            access: dependency.access,
        }
    }

    fn assemble(self, builder: di_abstractions::BuilderContract) -> ResolutionPlan {
        let scopes = ScopeCachePlanner::new();
        let mut bindings = Vec::with_capacity(self.order.sequence.len());

        for key in &self.order.sequence {
            let Some(binding) = self.graph.get(key) else {
                continue;
            };

            let (source, owner_symbol) = match &binding.source {
                BindingSource::Declared(declaration) => {
                    let owner_symbol = match declaration.factory_kind {
                        FactoryKind::ProviderMethod | FactoryKind::ComponentDependencyAccessor => {
                            self.instance_symbol(&declaration.origin.owner)
                        }
                        FactoryKind::ConstructorInjection | FactoryKind::Instance => None,
                    };
                    (PlannedSource::Declared(declaration.clone()), owner_symbol)
                }
                BindingSource::Multibinding(multibinding) => {
                    let contributions = multibinding
                        .contributions
                        .iter()
                        .map(|contribution| PlannedContribution {
                            declaration: contribution.clone(),
                            owner_symbol: if contribution.contribution_kind()
                                == Some(ContributionKind::Declaration)
                            {
                                None
                            } else {
                                self.instance_symbol(&contribution.origin.owner)
                            },
                            dependencies: contribution
                                .dependencies
                                .iter()
                                .map(|edge| self.edge(edge))
                                .collect(),
                            cache_policy: scopes
                                .policy_for(contribution, self.component)
                                .unwrap_or(CachePolicy::None),
                        })
                        .collect();
                    (PlannedSource::Multibinding { contributions }, None)
                }
            };

            bindings.push(PlannedBinding {
                key: key.clone(),
                symbol: self.symbol(key),
                source,
                dependencies: binding
                    .dependencies
                    .iter()
                    .map(|dependency| self.resolved(dependency))
                    .collect(),
                cached: binding.cached,
                cache_policy: binding.cache_policy.clone(),
                owner_symbol,
                needs_forward_cell: self.order.needs_forward_cell(key),
            });
        }

        let mut members_injectors: Vec<MembersInjectorPlan> = Vec::new();
        let mut requests = Vec::with_capacity(self.graph.requests.len());
        for request in &self.graph.requests {
            match request {
                ResolvedRequest::Provision {
                    method,
                    key,
                    access,
                } => requests.push(RequestBinding {
                    method: method.clone(),
                    kind: RequestKind::Provision(*access),
                    symbol: self.symbol(key),
                }),
                ResolvedRequest::MembersInjection {
                    method,
                    target,
                    members,
                    returns_instance,
                } => {
                    let symbol = self
                        .symbols
                        .members_injector(target)
                        .map(str::to_string)
                        .unwrap_or_else(|| SymbolOwner::MembersInjector(target.clone()).base_name());
                    if !members_injectors.iter().any(|m| &m.target == target) {
                        members_injectors.push(MembersInjectorPlan {
                            target: target.clone(),
                            symbol: symbol.clone(),
                            dependencies: members.iter().map(|edge| self.edge(edge)).collect(),
                        });
                    }
                    requests.push(RequestBinding {
                        method: method.clone(),
                        kind: RequestKind::MembersInjection {
                            returns_instance: *returns_instance,
                        },
                        symbol,
                    });
                }
            }
        }

        ResolutionPlan {
            component: self.component.type_name.clone(),
            scope: self.component.scope.clone(),
            bindings,
            members_injectors,
            builder,
            requests,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use di_abstractions::{AccessMode, BindingDeclaration, ModuleDescriptor, Requirement};
    use infrastructure_common::ErrorKind;

    #[test]
    fn test_plan_orders_and_names_bindings() {
        let module = TypeName::new("test.TestModule");
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

        let plan = ComponentPlannerImpl::default().plan(&catalog, &component).unwrap();

        let order: Vec<String> = plan.initialization_order().iter().map(ToString::to_string).collect();
        assert_eq!(order, vec!["test.C", "test.B", "test.A"]);
        let b = plan.binding(&Key::of("test.B")).unwrap();
        assert_eq!(b.owner_symbol.as_deref(), Some("testModule"));
        assert_eq!(b.dependencies[0].symbol, "c");
        assert_eq!(plan.request("a").unwrap().symbol, "a");
        assert_eq!(plan.builder.fields.len(), 1);
        assert_eq!(plan.builder.fields[0].requirement, Requirement::OptionalDefaulted);
    }

    #[test]
    fn test_members_injection_plan() {
        let catalog =
            DeclarationCatalog::new().with_declaration(BindingDeclaration::constructor(Key::of("test.A")));
        let component = ComponentSpec::new(TypeName::new("test.TestComponent"))
            .members_injection(
                "inject",
                TypeName::new("test.Target"),
                vec![DependencyEdge::new(Key::of("test.A"), AccessMode::DeferredSupplier)],
                false,
            )
            .members_injection(
                "injectAndReturn",
                TypeName::new("test.Target"),
                vec![DependencyEdge::new(Key::of("test.A"), AccessMode::DeferredSupplier)],
                true,
            );

        let plan = ComponentPlannerImpl::default().plan(&catalog, &component).unwrap();

        assert_eq!(plan.members_injectors.len(), 1);
        assert_eq!(plan.members_injectors[0].symbol, "targetMembersInjector");
        assert_eq!(plan.members_injectors[0].dependencies[0].symbol, "a");
        assert_eq!(
            plan.request("injectAndReturn").unwrap().kind,
            RequestKind::MembersInjection {
                returns_instance: true
            }
        );
    }

    #[test]
    fn test_configuration_errors_stop_planning() {
        let component = ComponentSpec::new(TypeName::new("test.TestComponent"))
            .with_module(TypeName::new("test.Unknown"))
            .with_module(TypeName::new("test.AlsoUnknown"));

        let diagnostics = ComponentPlannerImpl::default()
            .plan(&DeclarationCatalog::new(), &component)
            .unwrap_err();
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.kind() == ErrorKind::Configuration));

        let fail_fast = ComponentPlannerImpl::new(PlannerOptions::default().with_fail_fast(true));
        assert_eq!(
            fail_fast
                .plan(&DeclarationCatalog::new(), &component)
                .unwrap_err()
                .len(),
            1
        );
    }

    #[test]
    fn test_failures_are_isolated_per_component() {
        let catalog = DeclarationCatalog::new()
            .with_declaration(BindingDeclaration::constructor(Key::of("test.A")))
            .with_component(
                ComponentSpec::new(TypeName::new("test.Broken")).provision("m", Key::of("test.Missing")),
            )
            .with_component(
                ComponentSpec::new(TypeName::new("test.Healthy")).provision("a", Key::of("test.A")),
            );

        let outcomes = ComponentPlannerImpl::default().plan_all(&catalog);

        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].is_success());
        assert_eq!(outcomes[0].diagnostics()[0].kind(), ErrorKind::BindingNotFound);
        assert!(outcomes[1].is_success());
    }
}
