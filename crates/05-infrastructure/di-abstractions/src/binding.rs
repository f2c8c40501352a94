//! 绑定声明模型
//!
//! 前端协作者提供已解析的绑定声明，规划器只消费这里的抽象模型

use infrastructure_common::{Key, Origin, ScopeName, SourceLocation, TypeName};
use serde::{Deserialize, Serialize};

/// 依赖访问方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccessMode {
    /// 依赖必须在当前绑定运行前构造完成
    #[default]
    Value,
    /// 延迟提供者，调用时才构造
    DeferredSupplier,
    /// 带记忆的延迟提供者，同一个提供者实例只构造一次
    MemoizingDeferredSupplier,
}

impl AccessMode {
    /// 是否为延迟访问（可以通过前向引用满足）
    pub fn is_deferred(&self) -> bool {
        !matches!(self, Self::Value)
    }
}

/// 依赖边
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// 目标键
    pub key: Key,
    /// 访问方式
    #[serde(default)]
    pub access: AccessMode,
}

impl DependencyEdge {
    /// 创建新的依赖边
    pub fn new(key: Key, access: AccessMode) -> Self {
        Self { key, access }
    }

    /// 创建值依赖边
    pub fn value(key: Key) -> Self {
        Self::new(key, AccessMode::Value)
    }
}

/// 集合贡献方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContributionKind {
    /// 贡献单个元素
    Element,
    /// 贡献一组元素（可以为空）
    Elements,
    /// 仅声明集合存在，不贡献任何元素
    Declaration,
}

/// 绑定种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BindingKind {
    /// 唯一绑定
    #[default]
    Unique,
    /// 集合贡献
    SetContribution(ContributionKind),
}

/// 构造方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactoryKind {
    /// 构造函数注入
    ConstructorInjection,
    /// 模块提供方法
    ProviderMethod,
    /// 上游组件访问器
    ComponentDependencyAccessor,
    /// 外部提供的实例
    Instance,
}

/// 绑定声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingDeclaration {
    /// 目标键
    pub key: Key,
    /// 绑定种类
    #[serde(default)]
    pub kind: BindingKind,
    /// 作用域，缺省表示不限作用域
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<ScopeName>,
    /// 有序依赖列表
    #[serde(default)]
    pub dependencies: Vec<DependencyEdge>,
    /// 声明来源
    pub origin: Origin,
    /// 构造方式
    pub factory_kind: FactoryKind,
}

impl BindingDeclaration {
    fn with_origin(key: Key, origin: Origin, factory_kind: FactoryKind) -> Self {
        Self {
            key,
            kind: BindingKind::Unique,
            scope: None,
            dependencies: Vec::new(),
            origin,
            factory_kind,
        }
    }

    /// 构造函数注入绑定，来源为目标类型本身
    pub fn constructor(key: Key) -> Self {
        let origin = Origin::new(key.type_name.clone());
        Self::with_origin(key, origin, FactoryKind::ConstructorInjection)
    }

    /// 模块提供方法绑定
    pub fn provides(module: TypeName, method: impl Into<String>, key: Key) -> Self {
        Self::with_origin(
            key,
            Origin::new(module).with_member(method),
            FactoryKind::ProviderMethod,
        )
    }

    /// 上游组件访问器绑定
    pub fn accessor(component: TypeName, method: impl Into<String>, key: Key) -> Self {
        Self::with_origin(
            key,
            Origin::new(component).with_member(method),
            FactoryKind::ComponentDependencyAccessor,
        )
    }

    /// 外部实例绑定
    pub fn instance(owner: TypeName, key: Key) -> Self {
        Self::with_origin(key, Origin::new(owner), FactoryKind::Instance)
    }

    /// 设置为集合贡献
    pub fn contributes(mut self, kind: ContributionKind) -> Self {
        self.kind = BindingKind::SetContribution(kind);
        self
    }

    /// 添加值依赖
    pub fn depends_on(self, key: Key) -> Self {
        self.with_dependency(DependencyEdge::new(key, AccessMode::Value))
    }

    /// 添加延迟提供者依赖
    pub fn depends_on_deferred(self, key: Key) -> Self {
        self.with_dependency(DependencyEdge::new(key, AccessMode::DeferredSupplier))
    }

    /// 添加带记忆的延迟提供者依赖
    pub fn depends_on_memoized(self, key: Key) -> Self {
        self.with_dependency(DependencyEdge::new(
            key,
            AccessMode::MemoizingDeferredSupplier,
        ))
    }

    /// 添加依赖边
    pub fn with_dependency(mut self, edge: DependencyEdge) -> Self {
        self.dependencies.push(edge);
        self
    }

    /// 设置作用域
    pub fn in_scope(mut self, scope: impl Into<ScopeName>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// 设置源码位置
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.origin.location = Some(SourceLocation::new(file, line, 0));
        self
    }

    /// 是否为唯一绑定
    pub fn is_unique(&self) -> bool {
        matches!(self.kind, BindingKind::Unique)
    }

    /// 集合贡献方式
    pub fn contribution_kind(&self) -> Option<ContributionKind> {
        match self.kind {
            BindingKind::Unique => None,
            BindingKind::SetContribution(kind) => Some(kind),
        }
    }

    /// 源码位置
    pub fn location(&self) -> Option<&SourceLocation> {
        self.origin.location.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_method_declaration() {
        let declaration = BindingDeclaration::provides(
            TypeName::new("test.TestModule"),
            "provideB",
            Key::of("test.B"),
        )
        .depends_on(Key::of("test.C"))
        .depends_on_deferred(Key::of("test.D"))
        .in_scope("Singleton")
        .at("TestModule.java", 12);

        assert_eq!(declaration.factory_kind, FactoryKind::ProviderMethod);
        assert_eq!(declaration.origin.member.as_deref(), Some("provideB"));
        assert_eq!(declaration.dependencies.len(), 2);
        assert!(!declaration.dependencies[0].access.is_deferred());
        assert!(declaration.dependencies[1].access.is_deferred());
        assert_eq!(declaration.scope, Some(ScopeName::singleton()));
        assert_eq!(declaration.location().map(|l| l.line), Some(12));
    }

    #[test]
    fn test_declaration_from_json_uses_defaults() {
        let declaration: BindingDeclaration = serde_json::from_value(serde_json::json!({
            "key": { "type": "test.A" },
            "origin": { "owner": "test.A" },
            "factory_kind": "ConstructorInjection"
        }))
        .unwrap();

        assert!(declaration.is_unique());
        assert!(declaration.dependencies.is_empty());
        assert!(declaration.scope.is_none());
    }

    #[test]
    fn test_set_contribution_from_json() {
        let declaration: BindingDeclaration = serde_json::from_value(serde_json::json!({
            "key": { "type": "java.util.Set<java.lang.String>" },
            "kind": { "SetContribution": "Elements" },
            "origin": { "owner": "test.EmptySetModule", "member": "emptySet" },
            "factory_kind": "ProviderMethod"
        }))
        .unwrap();

        assert_eq!(declaration.contribution_kind(), Some(ContributionKind::Elements));
        assert_eq!(declaration.key.type_name.arguments.len(), 1);
    }
}
