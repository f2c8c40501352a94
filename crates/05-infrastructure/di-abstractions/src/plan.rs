//! 解析计划
//!
//! 交给生成器的完整计划：按初始化顺序排列、已命名、带缓存标记的绑定，
//! 构建器契约以及请求到符号的映射

use crate::binding::{AccessMode, BindingDeclaration};
use crate::component::{ComponentSpec, DeclarationCatalog};
use crate::graph::CachePolicy;
use infrastructure_common::{
    DependencyError, DependencyResult, Diagnostic, Key, ScopeName, TypeName,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 构建器字段种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// 模块实例
    Module,
    /// 上游组件实例
    ComponentDependency,
}

/// 构建器字段要求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Requirement {
    /// 必须由调用方提供
    Required,
    /// 可省略，省略时使用无参构造的默认值
    OptionalDefaulted,
}

/// 构建器字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderField {
    /// 字段符号
    pub symbol: String,
    /// 字段类型
    pub type_name: TypeName,
    /// 字段种类
    pub kind: FieldKind,
    /// 字段要求
    pub requirement: Requirement,
}

impl BuilderField {
    /// 是否必需
    pub fn is_required(&self) -> bool {
        self.requirement == Requirement::Required
    }
}

/// 构建器契约
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderContract {
    /// 有序字段列表
    pub fields: Vec<BuilderField>,
}

impl BuilderContract {
    /// 按符号查找字段
    pub fn field(&self, symbol: &str) -> Option<&BuilderField> {
        self.fields.iter().find(|f| f.symbol == symbol)
    }

    /// 按类型查找字段
    pub fn field_for(&self, type_name: &TypeName) -> Option<&BuilderField> {
        self.fields.iter().find(|f| &f.type_name == type_name)
    }

    /// 必需字段
    pub fn required(&self) -> impl Iterator<Item = &BuilderField> {
        self.fields.iter().filter(|f| f.is_required())
    }

    /// 构建时守卫：在任何构造开始前检查必需字段
    ///
    /// 返回第一个未设置的必需字段。
    pub fn verify(&self, is_set: impl Fn(&str) -> bool) -> DependencyResult<()> {
        for field in self.required() {
            if !is_set(&field.symbol) {
                debug!("构建器缺少必需字段: {}", field.symbol);
                return Err(DependencyError::BuilderRequiredValueMissing {
                    field: field.symbol.clone(),
                    type_name: field.type_name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// 计划中的依赖
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedDependency {
    /// 目标键
    pub key: Key,
    /// 目标绑定的符号
    pub symbol: String,
    /// 访问方式
    pub access: AccessMode,
}

/// 计划中的集合贡献
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedContribution {
    /// 贡献声明
    pub declaration: BindingDeclaration,
    /// 所属模块实例的符号
    pub owner_symbol: Option<String>,
    /// 贡献自身的依赖
    pub dependencies: Vec<PlannedDependency>,
    /// 贡献的缓存策略
    pub cache_policy: CachePolicy,
}

/// 计划中的绑定来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlannedSource {
    /// 声明的唯一绑定
    Declared(BindingDeclaration),
    /// 集合绑定，贡献按首次注册顺序
    Multibinding { contributions: Vec<PlannedContribution> },
}

/// 计划中的绑定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedBinding {
    /// 绑定键
    pub key: Key,
    /// 绑定符号
    pub symbol: String,
    /// 绑定来源
    pub source: PlannedSource,
    /// 依赖
    pub dependencies: Vec<PlannedDependency>,
    /// 是否缓存
    pub cached: bool,
    /// 缓存策略
    pub cache_policy: CachePolicy,
    /// 所属模块或上游组件实例的符号
    pub owner_symbol: Option<String>,
    /// 是否需要前向声明的单元
    pub needs_forward_cell: bool,
}

/// 成员注入器计划
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembersInjectorPlan {
    /// 注入目标类型
    pub target: TypeName,
    /// 注入器符号
    pub symbol: String,
    /// 成员依赖（按声明顺序）
    pub dependencies: Vec<PlannedDependency>,
}

/// 请求种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    /// 提供方法
    Provision(AccessMode),
    /// 成员注入方法
    MembersInjection { returns_instance: bool },
}

/// 请求到符号的映射
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestBinding {
    /// 方法名称
    pub method: String,
    /// 请求种类
    pub kind: RequestKind,
    /// 绑定符号或成员注入器符号
    pub symbol: String,
}

/// 解析计划
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionPlan {
    /// 组件类型
    pub component: TypeName,
    /// 组件作用域
    pub scope: Option<ScopeName>,
    /// 按初始化顺序排列的绑定
    pub bindings: Vec<PlannedBinding>,
    /// 成员注入器
    pub members_injectors: Vec<MembersInjectorPlan>,
    /// 构建器契约
    pub builder: BuilderContract,
    /// 请求映射
    pub requests: Vec<RequestBinding>,
}

impl ResolutionPlan {
    /// 按键查找绑定
    pub fn binding(&self, key: &Key) -> Option<&PlannedBinding> {
        self.bindings.iter().find(|b| &b.key == key)
    }

    /// 按符号查找绑定
    pub fn binding_by_symbol(&self, symbol: &str) -> Option<&PlannedBinding> {
        self.bindings.iter().find(|b| b.symbol == symbol)
    }

    /// 按方法名查找请求
    pub fn request(&self, method: &str) -> Option<&RequestBinding> {
        self.requests.iter().find(|r| r.method == method)
    }

    /// 按符号查找成员注入器
    pub fn members_injector(&self, symbol: &str) -> Option<&MembersInjectorPlan> {
        self.members_injectors.iter().find(|m| m.symbol == symbol)
    }

    /// 初始化顺序中的键
    pub fn initialization_order(&self) -> Vec<&Key> {
        self.bindings.iter().map(|b| &b.key).collect()
    }
}

/// 单个组件的规划结果
#[derive(Debug, Clone)]
pub struct ComponentOutcome {
    /// 组件类型
    pub component: TypeName,
    /// 完整计划，或非空的诊断列表
    pub result: Result<ResolutionPlan, Vec<Diagnostic>>,
}

impl ComponentOutcome {
    /// 是否成功
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// 诊断列表（成功时为空）
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match &self.result {
            Ok(_) => &[],
            Err(diagnostics) => diagnostics,
        }
    }
}

/// 组件规划器 trait
pub trait ComponentPlanner: Send + Sync {
    /// 规划单个组件
    fn plan(
        &self,
        catalog: &DeclarationCatalog,
        component: &ComponentSpec,
    ) -> Result<ResolutionPlan, Vec<Diagnostic>>;

    /// 按目录顺序规划全部组件，各组件互不影响
    fn plan_all(&self, catalog: &DeclarationCatalog) -> Vec<ComponentOutcome> {
        catalog
            .components
            .iter()
            .map(|component| ComponentOutcome {
                component: component.type_name.clone(),
                result: self.plan(catalog, component),
            })
            .collect()
    }
}
