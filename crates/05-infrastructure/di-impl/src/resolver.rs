//! 图解析器实现
//!
//! 从组件的每个请求出发做深度优先闭包计算。节点状态为 InProgress / Resolved / Failed，
//! 值边回到 InProgress 节点构成循环错误，除非该环在当前解析链上经过了延迟边，
//! 此时记录为前向引用。

use crate::multibinding::Multibindings;
use di_abstractions::{
    AccessMode, BindingGraph, BindingIndex, BindingSource, CachePolicy, ComponentSpec,
    DependencyEdge, FactoryKind, GraphResolver, LookupOutcome, Request, ResolveContext,
    ResolvedBinding, ResolvedDependency, ResolvedRequest, VisitState,
};
use infrastructure_common::{DependencyError, Diagnostic, Key, PlannerOptions};
use std::collections::HashMap;
use tracing::{debug, info_span, warn};

/// 单次访问的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    /// 目标已解析
    Ready,
    /// 目标仍在解析中，通过前向引用满足
    Forward,
    /// 目标解析失败
    Failed,
}

/// 深度优先的图解析器
pub struct GraphResolverImpl<'a, I: BindingIndex> {
    index: &'a I,
    multibindings: &'a Multibindings,
    component: &'a ComponentSpec,
    options: &'a PlannerOptions,
    states: HashMap<Key, VisitState>,
    graph: BindingGraph,
    diagnostics: Vec<Diagnostic>,
    next_discovery: usize,
}

impl<'a, I: BindingIndex> GraphResolverImpl<'a, I> {
    /// 创建新的解析器
    pub fn new(
        index: &'a I,
        multibindings: &'a Multibindings,
        component: &'a ComponentSpec,
        options: &'a PlannerOptions,
    ) -> Self {
        Self {
            index,
            multibindings,
            component,
            options,
            states: HashMap::new(),
            graph: BindingGraph::new(component.type_name.clone()),
            diagnostics: Vec::new(),
            next_discovery: 0,
        }
    }

    fn should_stop(&self) -> bool {
        self.options.fail_fast && !self.diagnostics.is_empty()
    }

    fn report(&mut self, error: DependencyError) {
        warn!("组件 {} 解析失败: {}", self.component.type_name, error);
        self.diagnostics
            .push(Diagnostic::new(self.component.type_name.clone(), error));
    }

    fn fail(&mut self, key: &Key, error: DependencyError) -> Visit {
        self.report(error);
        self.states.insert(key.clone(), VisitState::Failed);
        Visit::Failed
    }

    fn resolve_request(&mut self, request: &Request) {
        match request {
            Request::Provision {
                method,
                key,
                access,
            } => {
                let mut context = ResolveContext::new(method.as_str());
                self.visit(&mut context, key, *access);
                self.graph.requests.push(ResolvedRequest::Provision {
                    method: method.clone(),
                    key: key.clone(),
                    access: *access,
                });
            }
            Request::MembersInjection {
                method,
                target,
                members,
                returns_instance,
            } => {
                let mut context = ResolveContext::new(method.as_str());
                context.push(
                    Key::new(target.clone()),
                    AccessMode::Value,
                    self.component.location.clone(),
                );
                for member in members {
                    if self.should_stop() {
                        break;
                    }
                    self.visit(&mut context, &member.key, member.access);
                }
                context.pop();
                self.graph.requests.push(ResolvedRequest::MembersInjection {
                    method: method.clone(),
                    target: target.clone(),
                    members: members.clone(),
                    returns_instance: *returns_instance,
                });
            }
        }
    }

    fn lookup_source(
        &self,
        context: &ResolveContext,
        key: &Key,
    ) -> Result<BindingSource, DependencyError> {
        match self.index.lookup(key) {
            LookupOutcome::Unique(declaration) => Ok(BindingSource::Declared(declaration.clone())),
            LookupOutcome::Contributions(_) => self
                .multibindings
                .get(key)
                .map(|multibinding| BindingSource::Multibinding(multibinding.clone()))
                .ok_or_else(|| self.not_found(context, key)),
            LookupOutcome::Conflicting(declarations) => Err(DependencyError::DuplicateBinding {
                key: key.clone(),
                origins: declarations.iter().map(|d| d.origin.clone()).collect(),
                request: Some(context.request().to_string()),
                path: context.path_to(key),
            }),
            LookupOutcome::Absent => Err(self.not_found(context, key)),
        }
    }

    fn not_found(&self, context: &ResolveContext, key: &Key) -> DependencyError {
        DependencyError::BindingNotFound {
            key: key.clone(),
            request: Some(context.request().to_string()),
            path: context.path_to(key),
            location: context
                .current_location()
                .cloned()
                .or_else(|| self.component.location.clone()),
        }
    }

    fn visit(&mut self, context: &mut ResolveContext, key: &Key, access: AccessMode) -> Visit {
        match self.states.get(key).copied() {
            Some(VisitState::Resolved) => return Visit::Ready,
            Some(VisitState::Failed) => return Visit::Failed,
            Some(VisitState::InProgress) => {
                if context.closes_through_deferred(key, access) {
                    debug!("前向引用: {} (请求 {})", key, context.request());
                    return Visit::Forward;
                }
                let error = DependencyError::Cycle {
                    cycle: context.cycle_to(key),
                    request: Some(context.request().to_string()),
                    location: context.current_location().cloned(),
                };
                return self.fail(key, error);
            }
            None => {}
        }

        if context.depth() >= self.options.max_resolution_depth {
            let error = DependencyError::configuration(
                &self.component.type_name,
                format!(
                    "解析深度超过上限 {}: {}",
                    self.options.max_resolution_depth,
                    context.path_to(key)
                ),
            )
            .at(context.current_location().cloned());
            return self.fail(key, error);
        }

        let source = match self.lookup_source(context, key) {
            Ok(source) => source,
            Err(error) => return self.fail(key, error),
        };

        let discovery_index = self.next_discovery;
        self.next_discovery += 1;
        self.states.insert(key.clone(), VisitState::InProgress);
        context.push(key.clone(), access, source.location().cloned());

        // 访问器的依赖是上游组件实例本身，由构建器提供
        let edges: Vec<DependencyEdge> =
            if source.factory_kind() == Some(FactoryKind::ComponentDependencyAccessor) {
                Vec::new()
            } else {
                source.dependencies().to_vec()
            };

        let mut dependencies = Vec::with_capacity(edges.len());
        let mut failed = false;
        for edge in &edges {
            if self.should_stop() {
                failed = true;
                break;
            }
            match self.visit(context, &edge.key, edge.access) {
                Visit::Ready => dependencies.push(ResolvedDependency {
                    key: edge.key.clone(),
                    access: edge.access,
                    forward_reference: false,
                }),
                Visit::Forward => dependencies.push(ResolvedDependency {
                    key: edge.key.clone(),
                    access: edge.access,
                    forward_reference: true,
                }),
                Visit::Failed => failed = true,
            }
        }
        context.pop();

        if failed {
            self.states.insert(key.clone(), VisitState::Failed);
            return Visit::Failed;
        }

        self.states.insert(key.clone(), VisitState::Resolved);
        self.graph.insert(ResolvedBinding {
            key: key.clone(),
            source,
            dependencies,
            discovery_index,
            cached: false,
            cache_policy: CachePolicy::None,
        });
        Visit::Ready
    }
}

impl<I: BindingIndex> GraphResolver for GraphResolverImpl<'_, I> {
    fn resolve(mut self) -> Result<BindingGraph, Vec<Diagnostic>> {
        let component = self.component;
        let span = info_span!("resolve_graph", component = %component.type_name);
        let _enter = span.enter();

        for request in &component.requests {
            if self.should_stop() {
                break;
            }
            self.resolve_request(request);
        }

        if self.diagnostics.is_empty() {
            debug!(
                "组件 {} 解析完成, 共 {} 个绑定",
                self.component.type_name,
                self.graph.len()
            );
            Ok(self.graph)
        } else {
            Err(self.diagnostics)
        }
    }
}
