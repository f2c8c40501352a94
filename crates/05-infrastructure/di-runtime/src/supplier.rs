//! 提供者、延迟提供者与带记忆的延迟提供者

use crate::error::{RuntimeError, RuntimeResult};
use crate::instance::Instance;
use infrastructure_common::Key;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// 绑定的构造入口
pub(crate) type Provider = Arc<dyn Fn() -> RuntimeResult<Instance> + Send + Sync>;

/// 前向声明的单元，组件构建时按初始化顺序填入提供者
pub(crate) type Slot = Arc<OnceCell<Provider>>;

/// 延迟提供者
///
/// 每次调用都经由绑定的构造入口，未缓存的绑定每次得到新实例。
#[derive(Clone)]
pub struct Supplier {
    key: Key,
    slot: Slot,
}

impl Supplier {
    pub(crate) fn new(key: Key, slot: Slot) -> Self {
        Self { key, slot }
    }

    /// 目标键
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// 取得实例
    pub fn get(&self) -> RuntimeResult<Instance> {
        let provider = self
            .slot
            .get()
            .ok_or_else(|| RuntimeError::ForwardReferenceUnset {
                key: self.key.clone(),
            })?;
        provider()
    }
}

impl fmt::Debug for Supplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supplier")
            .field("key", &self.key)
            .field("ready", &self.slot.get().is_some())
            .finish()
    }
}

/// 带记忆的延迟提供者，同一个提供者实例只构造一次
pub struct MemoizingSupplier {
    supplier: Supplier,
    value: OnceCell<Instance>,
}

impl MemoizingSupplier {
    /// 包装一个延迟提供者
    pub fn new(supplier: Supplier) -> Self {
        Self {
            supplier,
            value: OnceCell::new(),
        }
    }

    /// 目标键
    pub fn key(&self) -> &Key {
        self.supplier.key()
    }

    /// 取得实例，首次调用后保持不变
    pub fn get(&self) -> RuntimeResult<Instance> {
        self.value.get_or_try_init(|| self.supplier.get()).cloned()
    }
}

impl fmt::Debug for MemoizingSupplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoizingSupplier")
            .field("key", self.key())
            .field("memoized", &self.value.get().is_some())
            .finish()
    }
}

/// 交给构造代码的依赖
#[derive(Debug, Clone)]
pub enum Dependency {
    /// 已构造的值
    Value(Instance),
    /// 延迟提供者
    Supplier(Supplier),
    /// 带记忆的延迟提供者
    Memoizing(Arc<MemoizingSupplier>),
}

impl Dependency {
    /// 取得实例，延迟依赖在此时构造
    pub fn get(&self) -> RuntimeResult<Instance> {
        match self {
            Self::Value(instance) => Ok(instance.clone()),
            Self::Supplier(supplier) => supplier.get(),
            Self::Memoizing(supplier) => supplier.get(),
        }
    }

    /// 值依赖的实例
    pub fn value(&self) -> Option<&Instance> {
        match self {
            Self::Value(instance) => Some(instance),
            Self::Supplier(_) | Self::Memoizing(_) => None,
        }
    }
}
