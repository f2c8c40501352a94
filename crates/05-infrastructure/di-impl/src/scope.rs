//! 作用域与缓存规划

use di_abstractions::{
    BindingDeclaration, BindingGraph, BindingSource, CachePolicy, ComponentSpec, FactoryKind,
};
use infrastructure_common::{DependencyError, Diagnostic, DependencyResult};
use tracing::debug;

/// 作用域与缓存规划器
#[derive(Debug, Default)]
pub struct ScopeCachePlanner;

impl ScopeCachePlanner {
    /// 创建新的规划器
    pub fn new() -> Self {
        Self
    }

    /// 单个声明的缓存策略
    ///
    /// 访问器转发给上游组件；实例天然唯一；显式作用域必须与组件作用域一致。
    pub fn policy_for(
        &self,
        declaration: &BindingDeclaration,
        component: &ComponentSpec,
    ) -> DependencyResult<CachePolicy> {
        match declaration.factory_kind {
            FactoryKind::ComponentDependencyAccessor => return Ok(CachePolicy::Delegated),
            FactoryKind::Instance => return Ok(CachePolicy::Instance),
            FactoryKind::ConstructorInjection | FactoryKind::ProviderMethod => {}
        }

        match &declaration.scope {
            None => Ok(CachePolicy::None),
            Some(scope) if component.scope.as_ref() == Some(scope) => {
                Ok(CachePolicy::Scoped(scope.clone()))
            }
            Some(scope) => Err(DependencyError::ScopeMismatch {
                key: declaration.key.clone(),
                binding_scope: scope.clone(),
                component_scope: component.scope.clone(),
                location: declaration.location().cloned(),
            }),
        }
    }

    /// 为绑定图中的每个绑定标记缓存策略
    pub fn plan(
        &self,
        graph: &mut BindingGraph,
        component: &ComponentSpec,
    ) -> Result<(), Vec<Diagnostic>> {
        let mut diagnostics = Vec::new();
        let mut report = |error: DependencyError| {
            diagnostics.push(Diagnostic::new(component.type_name.clone(), error));
        };

        for key in graph.discovery.clone() {
            let Some(binding) = graph.bindings.get_mut(&key) else {
                continue;
            };

            let policy = match &binding.source {
                BindingSource::Declared(declaration) => match self.policy_for(declaration, component) {
                    Ok(policy) => policy,
                    Err(error) => {
                        report(error);
                        continue;
                    }
                },
                BindingSource::Multibinding(multibinding) => {
                    for contribution in &multibinding.contributions {
                        if let Err(error) = self.policy_for(contribution, component) {
                            report(error);
                        }
                    }
                    CachePolicy::None
                }
            };

            debug!("绑定 {} 的缓存策略: {:?}", key, policy);
            binding.cached = policy.is_cached();
            binding.cache_policy = policy;
        }

        if diagnostics.is_empty() {
            Ok(())
        } else {
            Err(diagnostics)
        }
    }
}
