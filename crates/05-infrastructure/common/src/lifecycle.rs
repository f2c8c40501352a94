//! 作用域定义
//!
//! 作用域是一个命名的缓存域：同一组件实例内，属于该作用域的绑定只构造一次

use serde::{Deserialize, Serialize};
use std::fmt;

/// 作用域名称
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeName(String);

impl ScopeName {
    /// 创建新的作用域名称
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// 单例作用域
    pub fn singleton() -> Self {
        Self::new("Singleton")
    }

    /// 获取作用域名称
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl From<&str> for ScopeName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
