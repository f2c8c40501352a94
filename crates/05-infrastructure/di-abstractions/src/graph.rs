//! 已解析的绑定图

use crate::binding::{AccessMode, BindingDeclaration, ContributionKind, DependencyEdge, FactoryKind};
use infrastructure_common::{Key, Origin, ScopeName, SourceLocation, TypeName};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 合成的集合绑定
///
/// 同一键的全部集合贡献合并为一个唯一绑定，构造语义为所有贡献元素的并集
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultibindingDeclaration {
    /// 集合键
    pub key: Key,
    /// 贡献声明（按首次注册顺序）
    pub contributions: Vec<BindingDeclaration>,
    /// 全部贡献依赖的并集（按首次出现顺序去重）
    pub dependencies: Vec<DependencyEdge>,
}

impl MultibindingDeclaration {
    /// 是否没有任何实际贡献元素的声明
    pub fn declares_only(&self) -> bool {
        self.contributions
            .iter()
            .all(|c| c.contribution_kind() == Some(ContributionKind::Declaration))
    }
}

/// 绑定来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingSource {
    /// 声明的唯一绑定
    Declared(BindingDeclaration),
    /// 合成的集合绑定
    Multibinding(MultibindingDeclaration),
}

impl BindingSource {
    /// 声明的作用域（集合绑定本身没有作用域）
    pub fn scope(&self) -> Option<&ScopeName> {
        match self {
            Self::Declared(declaration) => declaration.scope.as_ref(),
            Self::Multibinding(_) => None,
        }
    }

    /// 构造方式（集合绑定没有单一构造方式）
    pub fn factory_kind(&self) -> Option<FactoryKind> {
        match self {
            Self::Declared(declaration) => Some(declaration.factory_kind),
            Self::Multibinding(_) => None,
        }
    }

    /// 声明来源
    pub fn origin(&self) -> Option<&Origin> {
        match self {
            Self::Declared(declaration) => Some(&declaration.origin),
            Self::Multibinding(_) => None,
        }
    }

    /// 源码位置，集合绑定取第一个带位置的贡献
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::Declared(declaration) => declaration.location(),
            Self::Multibinding(multibinding) => multibinding
                .contributions
                .iter()
                .find_map(BindingDeclaration::location),
        }
    }

    /// 依赖边
    pub fn dependencies(&self) -> &[DependencyEdge] {
        match self {
            Self::Declared(declaration) => &declaration.dependencies,
            Self::Multibinding(multibinding) => &multibinding.dependencies,
        }
    }
}

/// 缓存策略
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CachePolicy {
    /// 每次调用都重新构造
    #[default]
    None,
    /// 在组件实例内按作用域缓存
    Scoped(ScopeName),
    /// 转发给上游组件，由上游负责缓存
    Delegated,
    /// 外部实例，天然唯一
    Instance,
}

impl CachePolicy {
    /// 是否缓存
    pub fn is_cached(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// 已解析的依赖
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedDependency {
    /// 目标键
    pub key: Key,
    /// 访问方式
    pub access: AccessMode,
    /// 解析时目标仍在解析中，需要前向引用
    pub forward_reference: bool,
}

/// 已解析的绑定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBinding {
    /// 绑定键
    pub key: Key,
    /// 绑定来源
    pub source: BindingSource,
    /// 已解析的依赖
    pub dependencies: Vec<ResolvedDependency>,
    /// 首次发现的顺序
    pub discovery_index: usize,
    /// 是否缓存
    pub cached: bool,
    /// 缓存策略
    pub cache_policy: CachePolicy,
}

/// 已解析的请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedRequest {
    /// 提供方法
    Provision {
        method: String,
        key: Key,
        access: AccessMode,
    },
    /// 成员注入方法
    MembersInjection {
        method: String,
        target: TypeName,
        members: Vec<DependencyEdge>,
        returns_instance: bool,
    },
}

/// 绑定图
///
/// 恰好覆盖组件全部请求的传递闭包，每个键对应一个已解析绑定
#[derive(Debug, Clone)]
pub struct BindingGraph {
    /// 所属组件
    pub component: TypeName,
    /// 键到已解析绑定的映射
    pub bindings: HashMap<Key, ResolvedBinding>,
    /// 按首次发现顺序排列的键
    pub discovery: Vec<Key>,
    /// 已解析的请求（按声明顺序）
    pub requests: Vec<ResolvedRequest>,
}

impl BindingGraph {
    /// 创建空绑定图
    pub fn new(component: TypeName) -> Self {
        Self {
            component,
            bindings: HashMap::new(),
            discovery: Vec::new(),
            requests: Vec::new(),
        }
    }

    /// 查找已解析绑定
    pub fn get(&self, key: &Key) -> Option<&ResolvedBinding> {
        self.bindings.get(key)
    }

    /// 绑定数量
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// 绑定图是否为空
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// 按首次发现顺序遍历绑定
    pub fn iter_discovered(&self) -> impl Iterator<Item = &ResolvedBinding> {
        self.discovery.iter().filter_map(|key| self.bindings.get(key))
    }

    /// 插入已解析绑定，发现顺序按 `discovery_index` 维护
    pub fn insert(&mut self, binding: ResolvedBinding) {
        let index = binding.discovery_index;
        let position = self
            .discovery
            .partition_point(|key| self.bindings[key].discovery_index < index);
        self.discovery.insert(position, binding.key.clone());
        self.bindings.insert(binding.key.clone(), binding);
    }
}
