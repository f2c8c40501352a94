//! 运行时错误类型

use infrastructure_common::{DependencyError, Key};
use thiserror::Error;

/// 运行时错误
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("未知的构建器字段: {field}")]
    UnknownBuilderField { field: String },

    #[error("未知的请求方法: {method}")]
    UnknownRequest { method: String },

    #[error("请求方法 {method} 不是{expected}")]
    WrongRequestKind {
        method: String,
        expected: &'static str,
    },

    #[error("计划中没有符号: {symbol}")]
    UnknownSymbol { symbol: String },

    #[error("计划中没有绑定: {key}")]
    UnknownBinding { key: Key },

    #[error("绑定 {key} 的前向单元尚未就绪")]
    ForwardReferenceUnset { key: Key },

    #[error("集合贡献 {key} 必须返回 Vec<Instance>")]
    ElementsTypeMismatch { key: Key },

    #[error("组件实例已释放")]
    ComponentReleased,

    #[error("构造 {target} 失败: {source}")]
    ConstructionFailed {
        target: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl RuntimeError {
    /// 包装用户构造代码返回的错误
    pub fn construction(target: impl ToString, error: anyhow::Error) -> Self {
        Self::ConstructionFailed {
            target: target.to_string(),
            source: error.into(),
        }
    }
}

/// 运行时结果类型
pub type RuntimeResult<T> = Result<T, RuntimeError>;
