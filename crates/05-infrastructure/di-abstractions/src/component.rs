//! 组件契约与声明目录

use crate::binding::{AccessMode, BindingDeclaration, DependencyEdge};
use infrastructure_common::{Key, ScopeName, SourceLocation, TypeName};
use serde::{Deserialize, Serialize};

/// 声明组件的类型形态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TypeKind {
    /// 接口
    #[default]
    Interface,
    /// 抽象类
    AbstractClass,
    /// 具体类
    ConcreteClass,
    /// 枚举
    Enum,
    /// 注解
    Annotation,
}

impl TypeKind {
    /// 该形态能否声明组件
    pub fn can_declare_component(&self) -> bool {
        matches!(self, Self::Interface | Self::AbstractClass)
    }
}

/// 组件请求
///
/// 组件暴露的入口：提供方法解析一个键，成员注入方法为已有实例填充成员
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// 提供方法
    Provision {
        method: String,
        key: Key,
        #[serde(default)]
        access: AccessMode,
    },
    /// 成员注入方法
    MembersInjection {
        method: String,
        target: TypeName,
        #[serde(default)]
        members: Vec<DependencyEdge>,
        #[serde(default)]
        returns_instance: bool,
    },
}

impl Request {
    /// 方法名称
    pub fn method(&self) -> &str {
        match self {
            Self::Provision { method, .. } | Self::MembersInjection { method, .. } => method,
        }
    }
}

/// 组件契约
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// 组件类型
    pub type_name: TypeName,
    /// 组件类型形态
    #[serde(default)]
    pub type_kind: TypeKind,
    /// 组件作用域
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<ScopeName>,
    /// 请求列表
    #[serde(default)]
    pub requests: Vec<Request>,
    /// 声明的模块
    #[serde(default)]
    pub modules: Vec<TypeName>,
    /// 声明的上游组件
    #[serde(default)]
    pub dependencies: Vec<TypeName>,
    /// 源码位置
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl ComponentSpec {
    /// 创建新的组件契约
    pub fn new(type_name: TypeName) -> Self {
        Self {
            type_name,
            type_kind: TypeKind::Interface,
            scope: None,
            requests: Vec::new(),
            modules: Vec::new(),
            dependencies: Vec::new(),
            location: None,
        }
    }

    /// 设置类型形态
    pub fn with_type_kind(mut self, type_kind: TypeKind) -> Self {
        self.type_kind = type_kind;
        self
    }

    /// 设置作用域
    pub fn with_scope(mut self, scope: impl Into<ScopeName>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// 添加模块
    pub fn with_module(mut self, module: TypeName) -> Self {
        self.modules.push(module);
        self
    }

    /// 添加上游组件
    pub fn with_dependency(mut self, component: TypeName) -> Self {
        self.dependencies.push(component);
        self
    }

    /// 添加值访问的提供方法
    pub fn provision(self, method: impl Into<String>, key: Key) -> Self {
        self.provision_with(method, key, AccessMode::Value)
    }

    /// 添加指定访问方式的提供方法
    pub fn provision_with(mut self, method: impl Into<String>, key: Key, access: AccessMode) -> Self {
        self.requests.push(Request::Provision {
            method: method.into(),
            key,
            access,
        });
        self
    }

    /// 添加成员注入方法
    pub fn members_injection(
        mut self,
        method: impl Into<String>,
        target: TypeName,
        members: Vec<DependencyEdge>,
        returns_instance: bool,
    ) -> Self {
        self.requests.push(Request::MembersInjection {
            method: method.into(),
            target,
            members,
            returns_instance,
        });
        self
    }

    /// 设置源码位置
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.location = Some(SourceLocation::new(file, line, 0));
        self
    }

    /// 组件自身的键
    pub fn self_key(&self) -> Key {
        Key::new(self.type_name.clone())
    }
}

/// 模块描述符
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// 模块类型
    pub type_name: TypeName,
    /// 是否确实是模块
    #[serde(default = "default_true")]
    pub is_module: bool,
    /// 是否可以无参构造
    #[serde(default = "default_true")]
    pub no_arg_constructible: bool,
    /// 源码位置
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

fn default_true() -> bool {
    true
}

impl ModuleDescriptor {
    /// 创建可无参构造的模块描述符
    pub fn new(type_name: TypeName) -> Self {
        Self {
            type_name,
            is_module: true,
            no_arg_constructible: true,
            location: None,
        }
    }

    /// 标记为需要外部提供（无法无参构造）
    pub fn requiring_arguments(mut self) -> Self {
        self.no_arg_constructible = false;
        self
    }

    /// 标记为非模块类型
    pub fn not_a_module(mut self) -> Self {
        self.is_module = false;
        self
    }

    /// 是否需要外部提供
    pub fn requires_arguments(&self) -> bool {
        !self.no_arg_constructible
    }
}

/// 声明目录
///
/// 前端一次提取得到的全部声明、模块和组件，多个组件共享同一个目录
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationCatalog {
    /// 绑定声明
    #[serde(default)]
    pub declarations: Vec<BindingDeclaration>,
    /// 模块描述符
    #[serde(default)]
    pub modules: Vec<ModuleDescriptor>,
    /// 组件契约
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
}

impl DeclarationCatalog {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加绑定声明
    pub fn with_declaration(mut self, declaration: BindingDeclaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    /// 添加模块描述符
    pub fn with_module(mut self, module: ModuleDescriptor) -> Self {
        self.modules.push(module);
        self
    }

    /// 添加组件契约
    pub fn with_component(mut self, component: ComponentSpec) -> Self {
        self.components.push(component);
        self
    }

    /// 查找模块描述符
    pub fn module(&self, type_name: &TypeName) -> Option<&ModuleDescriptor> {
        self.modules.iter().find(|m| &m.type_name == type_name)
    }

    /// 查找组件契约
    pub fn component(&self, type_name: &TypeName) -> Option<&ComponentSpec> {
        self.components.iter().find(|c| &c.type_name == type_name)
    }

    /// 从 JSON 文本解析目录
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
