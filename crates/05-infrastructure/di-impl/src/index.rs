//! 绑定索引实现

use di_abstractions::{
    BindingDeclaration, BindingIndex, ComponentSpec, DeclarationCatalog, FactoryKind,
    LookupOutcome,
};
use infrastructure_common::{
    DependencyError, DependencyPath, DependencyResult, Key, Origin, PlannerOptions,
};
use std::collections::HashMap;
use tracing::debug;

/// 基于哈希表的绑定索引
#[derive(Debug, Clone, Default)]
pub struct BindingIndexImpl {
    /// 键到声明列表的映射（按注册顺序）
    entries: HashMap<Key, Vec<BindingDeclaration>>,
    /// 键的首次注册顺序
    order: Vec<Key>,
    /// 声明总数
    count: usize,
}

impl BindingIndexImpl {
    /// 创建空索引
    pub fn new() -> Self {
        Self::default()
    }

    /// 为组件构建可见声明的索引
    ///
    /// 构造函数注入和实例绑定对所有组件可见；提供方法只对声明了所属模块的组件可见；
    /// 访问器只对声明了所属上游组件的组件可见。启用自注入时，组件自身类型注册为实例绑定，
    /// 若同一键已有用户声明则立即报告重复绑定。
    pub fn for_component(
        catalog: &DeclarationCatalog,
        component: &ComponentSpec,
        options: &PlannerOptions,
    ) -> DependencyResult<Self> {
        let mut index = Self::new();

        for declaration in &catalog.declarations {
            if is_visible(declaration, component) {
                index.register(declaration.clone());
            }
        }

        if options.self_injection {
            let key = component.self_key();
            let mut origin = Origin::new(component.type_name.clone());
            origin.location = component.location.clone();

            let existing: Vec<Origin> = index
                .entries
                .get(&key)
                .map(|declarations| declarations.iter().map(|d| d.origin.clone()).collect())
                .unwrap_or_default();
            if !existing.is_empty() {
                let mut origins = existing;
                origins.push(origin);
                return Err(DependencyError::DuplicateBinding {
                    key,
                    origins,
                    request: None,
                    path: DependencyPath::default(),
                });
            }

            let mut declaration = BindingDeclaration::instance(component.type_name.clone(), key);
            declaration.origin = origin;
            index.register(declaration);
        }

        debug!(
            "组件 {} 的绑定索引包含 {} 个声明, {} 个键",
            component.type_name,
            index.count,
            index.order.len()
        );
        Ok(index)
    }
}

pub(crate) fn is_visible(declaration: &BindingDeclaration, component: &ComponentSpec) -> bool {
    match declaration.factory_kind {
        FactoryKind::ConstructorInjection | FactoryKind::Instance => true,
        FactoryKind::ProviderMethod => component.modules.contains(&declaration.origin.owner),
        FactoryKind::ComponentDependencyAccessor => {
            component.dependencies.contains(&declaration.origin.owner)
        }
    }
}

impl BindingIndex for BindingIndexImpl {
    fn register(&mut self, declaration: BindingDeclaration) {
        let key = declaration.key.clone();
        let declarations = self.entries.entry(key.clone()).or_default();
        if declarations.is_empty() {
            self.order.push(key);
        }
        declarations.push(declaration);
        self.count += 1;
    }

    fn lookup(&self, key: &Key) -> LookupOutcome<'_> {
        let declarations = match self.entries.get(key) {
            Some(declarations) if !declarations.is_empty() => declarations,
            _ => return LookupOutcome::Absent,
        };

        let unique = declarations.iter().filter(|d| d.is_unique()).count();
        match (unique, declarations.len()) {
            (1, 1) => LookupOutcome::Unique(&declarations[0]),
            (0, _) => LookupOutcome::Contributions(declarations.iter().collect()),
            _ => LookupOutcome::Conflicting(declarations.iter().collect()),
        }
    }

    fn keys(&self) -> &[Key] {
        &self.order
    }

    fn len(&self) -> usize {
        self.count
    }
}
