//! 错误类型定义

use crate::lifecycle::ScopeName;
use crate::metadata::{Key, Origin, SourceLocation, TypeName};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 类型名称解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("无效的类型名称 '{input}': {reason}")]
pub struct TypeNameError {
    pub input: String,
    pub reason: String,
}

impl TypeNameError {
    /// 创建类型名称解析错误
    pub fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// 依赖注入错误种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// 组件或模块声明格式错误
    Configuration,
    /// 没有声明能满足请求的键
    BindingNotFound,
    /// 同一键存在多个唯一声明
    DuplicateBinding,
    /// 没有延迟访问打断的值依赖循环
    Cycle,
    /// 绑定的作用域与组件不兼容
    ScopeMismatch,
    /// 构建时缺少必需的外部值
    BuilderRequiredValueMissing,
}

/// 依赖链
///
/// 从触发请求开始的键序列，用于定位出错的声明
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyPath(pub Vec<Key>);

impl DependencyPath {
    /// 获取依赖链中的键
    pub fn keys(&self) -> &[Key] {
        &self.0
    }
}

impl fmt::Display for DependencyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ");
        write!(f, "{}", rendered)
    }
}

impl From<Vec<Key>> for DependencyPath {
    fn from(value: Vec<Key>) -> Self {
        Self(value)
    }
}

/// 依赖注入错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("组件配置错误: {component}, 原因: {message}")]
    Configuration {
        component: TypeName,
        message: String,
        location: Option<SourceLocation>,
    },

    #[error("未找到绑定: {key}, 请求: {}, 依赖链: {path}", request.as_deref().unwrap_or("<无>"))]
    BindingNotFound {
        key: Key,
        request: Option<String>,
        path: DependencyPath,
        location: Option<SourceLocation>,
    },

    #[error("重复绑定: {key}, 声明: {}", render_origins(origins))]
    DuplicateBinding {
        key: Key,
        origins: Vec<Origin>,
        request: Option<String>,
        path: DependencyPath,
    },

    #[error("检测到循环依赖: {cycle}")]
    Cycle {
        cycle: DependencyPath,
        request: Option<String>,
        location: Option<SourceLocation>,
    },

    #[error("作用域不匹配: {key} 声明于 {binding_scope}, 组件作用域为 {}", component_scope.as_ref().map(ToString::to_string).unwrap_or_else(|| "<无>".to_string()))]
    ScopeMismatch {
        key: Key,
        binding_scope: ScopeName,
        component_scope: Option<ScopeName>,
        location: Option<SourceLocation>,
    },

    #[error("构建器缺少必需的值: {field} ({type_name})")]
    BuilderRequiredValueMissing { field: String, type_name: TypeName },
}

fn render_origins(origins: &[Origin]) -> String {
    origins
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl DependencyError {
    /// 创建组件配置错误
    pub fn configuration(component: &TypeName, message: impl Into<String>) -> Self {
        Self::Configuration {
            component: component.clone(),
            message: message.into(),
            location: None,
        }
    }

    /// 设置源码位置（仅对携带位置信息的错误生效）
    pub fn at(mut self, new_location: Option<SourceLocation>) -> Self {
        match &mut self {
            Self::Configuration { location, .. }
            | Self::BindingNotFound { location, .. }
            | Self::Cycle { location, .. }
            | Self::ScopeMismatch { location, .. } => *location = new_location,
            Self::DuplicateBinding { .. } | Self::BuilderRequiredValueMissing { .. } => {}
        }
        self
    }

    /// 错误种类
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::BindingNotFound { .. } => ErrorKind::BindingNotFound,
            Self::DuplicateBinding { .. } => ErrorKind::DuplicateBinding,
            Self::Cycle { .. } => ErrorKind::Cycle,
            Self::ScopeMismatch { .. } => ErrorKind::ScopeMismatch,
            Self::BuilderRequiredValueMissing { .. } => ErrorKind::BuilderRequiredValueMissing,
        }
    }

    /// 触发错误的声明所在的源码位置
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::Configuration { location, .. }
            | Self::BindingNotFound { location, .. }
            | Self::Cycle { location, .. }
            | Self::ScopeMismatch { location, .. } => location.as_ref(),
            Self::DuplicateBinding { origins, .. } => {
                origins.iter().find_map(|origin| origin.location.as_ref())
            }
            Self::BuilderRequiredValueMissing { .. } => None,
        }
    }

    /// 与路径相关的错误所携带的依赖链
    pub fn key_path(&self) -> Option<&DependencyPath> {
        match self {
            Self::BindingNotFound { path, .. } | Self::DuplicateBinding { path, .. } => Some(path),
            Self::Cycle { cycle, .. } => Some(cycle),
            _ => None,
        }
    }
}

/// 组件诊断信息
///
/// 一个组件的解析失败只会产生该组件的诊断，不影响其他组件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 所属组件
    pub component: TypeName,
    /// 错误详情
    pub error: DependencyError,
}

impl Diagnostic {
    /// 创建新的诊断信息
    pub fn new(component: TypeName, error: DependencyError) -> Self {
        Self { component, error }
    }

    /// 错误种类
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.component, self.error)?;
        if let Some(location) = self.error.location() {
            write!(f, " @ {}", location)?;
        }
        Ok(())
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("组件不存在: {name}")]
    ComponentNotFound { name: String },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_not_found_message_names_key_and_path() {
        let error = DependencyError::BindingNotFound {
            key: Key::of("test.B"),
            request: Some("a".to_string()),
            path: vec![Key::of("test.A"), Key::of("test.B")].into(),
            location: Some(SourceLocation::new("A.java", 3, 10)),
        };

        let message = error.to_string();
        assert!(message.contains("test.B"));
        assert!(message.contains("test.A -> test.B"));
        assert_eq!(error.kind(), ErrorKind::BindingNotFound);
        assert_eq!(error.location().map(|l| l.line), Some(3));
        assert_eq!(error.key_path().map(|p| p.keys().len()), Some(2));
    }

    #[test]
    fn test_duplicate_binding_location_comes_from_origins() {
        let error = DependencyError::DuplicateBinding {
            key: Key::of("test.A"),
            origins: vec![
                Origin::new(TypeName::new("test.ModuleOne")),
                Origin::new(TypeName::new("test.ModuleTwo"))
                    .with_location(SourceLocation::new("ModuleTwo.java", 7, 3)),
            ],
            request: None,
            path: DependencyPath::default(),
        };

        assert_eq!(error.location().map(|l| l.file.as_str()), Some("ModuleTwo.java"));
        assert!(error.to_string().contains("test.ModuleOne"));
    }

    #[test]
    fn test_diagnostic_display_includes_component() {
        let component = TypeName::new("test.TestComponent");
        let diagnostic = Diagnostic::new(
            component.clone(),
            DependencyError::configuration(&component, "不是模块"),
        );

        assert_eq!(diagnostic.kind(), ErrorKind::Configuration);
        assert!(diagnostic.to_string().starts_with("[test.TestComponent]"));
    }
}
