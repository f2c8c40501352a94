//! 符号分配
//!
//! 每个组件一张独立的符号表，规划结束后丢弃。候选名按首次出现顺序处理：
//! 第一个占用基础名，后续冲突依次追加 `1`、`2`……

use crate::ordering::InitializationOrder;
use di_abstractions::{
    BindingGraph, BindingSource, ContributionKind, FactoryKind, ResolvedBinding, ResolvedRequest,
};
use infrastructure_common::{Key, TypeName};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// 符号的所有者
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SymbolOwner {
    /// 已解析绑定
    Binding(Key),
    /// 模块或上游组件实例
    Instance(TypeName),
    /// 成员注入器
    MembersInjector(TypeName),
}

impl SymbolOwner {
    /// 基础名
    pub fn base_name(&self) -> String {
        let base = match self {
            Self::Binding(key) => {
                let mut name: String = key
                    .qualifier
                    .as_deref()
                    .map(qualifier_tokens)
                    .unwrap_or_default();
                name.push_str(&upper_name(&key.type_name));
                lower_first(&name)
            }
            Self::Instance(type_name) => lower_first(&upper_name(type_name)),
            Self::MembersInjector(type_name) => {
                format!("{}MembersInjector", lower_first(&upper_name(type_name)))
            }
        };
        if base.chars().next().map_or(true, |c| c.is_ascii_digit()) {
            format!("_{}", base)
        } else {
            base
        }
    }
}

/// 类型的大驼峰名，类型参数以 `Of…And…` 追加
fn upper_name(type_name: &TypeName) -> String {
    let mut name = upper_first(type_name.simple_name());
    for (index, argument) in type_name.arguments.iter().enumerate() {
        name.push_str(if index == 0 { "Of" } else { "And" });
        name.push_str(&upper_name(argument));
    }
    name
}

/// 限定符中的字母数字片段按大驼峰拼接
fn qualifier_tokens(qualifier: &str) -> String {
    qualifier
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(upper_first)
        .collect()
}

fn upper_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lower_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// 组件符号表
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    /// 已占用的名称
    taken: HashSet<String>,
    /// 每个基础名最近一次使用的后缀
    counters: HashMap<String, usize>,
    /// 所有者到符号的映射
    assigned: HashMap<SymbolOwner, String>,
}

impl SymbolTable {
    /// 创建空符号表
    pub fn new() -> Self {
        Self::default()
    }

    /// 为所有者分配符号，对同一所有者重复调用返回同一符号
    pub fn allocate(&mut self, owner: SymbolOwner) -> String {
        if let Some(symbol) = self.assigned.get(&owner) {
            return symbol.clone();
        }

        let base = owner.base_name();
        let symbol = if self.taken.contains(&base) {
            let mut suffix = self.counters.get(&base).copied().unwrap_or(0);
            loop {
                suffix += 1;
                let candidate = format!("{}{}", base, suffix);
                if !self.taken.contains(&candidate) {
                    self.counters.insert(base.clone(), suffix);
                    break candidate;
                }
            }
        } else {
            base
        };

        debug!("分配符号: {:?} -> {}", owner, symbol);
        self.taken.insert(symbol.clone());
        self.assigned.insert(owner, symbol.clone());
        symbol
    }

    /// 查找已分配的符号
    pub fn symbol(&self, owner: &SymbolOwner) -> Option<&str> {
        self.assigned.get(owner).map(String::as_str)
    }

    /// 绑定的符号
    pub fn binding(&self, key: &Key) -> Option<&str> {
        self.symbol(&SymbolOwner::Binding(key.clone()))
    }

    /// 模块或上游组件实例的符号
    pub fn instance(&self, type_name: &TypeName) -> Option<&str> {
        self.symbol(&SymbolOwner::Instance(type_name.clone()))
    }

    /// 成员注入器的符号
    pub fn members_injector(&self, target: &TypeName) -> Option<&str> {
        self.symbol(&SymbolOwner::MembersInjector(target.clone()))
    }

    /// 已分配的符号数量
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    /// 符号表是否为空
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

/// 绑定所需的模块或上游组件实例（按出现顺序去重）
pub fn owning_instances(binding: &ResolvedBinding) -> Vec<TypeName> {
    let mut owners: Vec<TypeName> = Vec::new();
    match &binding.source {
        BindingSource::Declared(declaration) => match declaration.factory_kind {
            FactoryKind::ProviderMethod | FactoryKind::ComponentDependencyAccessor => {
                owners.push(declaration.origin.owner.clone());
            }
            FactoryKind::ConstructorInjection | FactoryKind::Instance => {}
        },
        BindingSource::Multibinding(multibinding) => {
            for contribution in &multibinding.contributions {
                if contribution.contribution_kind() == Some(ContributionKind::Declaration) {
                    continue;
                }
                if !owners.contains(&contribution.origin.owner) {
                    owners.push(contribution.origin.owner.clone());
                }
            }
        }
    }
    owners
}

/// 符号分配器
#[derive(Debug, Default)]
pub struct SymbolAllocator;

impl SymbolAllocator {
    /// 创建新的分配器
    pub fn new() -> Self {
        Self
    }

    /// 按初始化顺序为绑定及其所属实例分配符号，成员注入器按请求顺序排在最后
    pub fn allocate(&self, graph: &BindingGraph, order: &InitializationOrder) -> SymbolTable {
        let mut table = SymbolTable::new();

        for key in &order.sequence {
            let Some(binding) = graph.get(key) else {
                continue;
            };
            for owner in owning_instances(binding) {
                table.allocate(SymbolOwner::Instance(owner));
            }
            table.allocate(SymbolOwner::Binding(key.clone()));
        }

        for request in &graph.requests {
            if let ResolvedRequest::MembersInjection { target, .. } = request {
                table.allocate(SymbolOwner::MembersInjector(target.clone()));
            }
        }

        table
    }
}
