//! # 解析计划参考运行时
//!
//! 按 [`ResolutionPlan`](di_abstractions::ResolutionPlan) 调度构造：构建器守卫、
//! 作用域缓存、延迟与带记忆的提供者、集合绑定和成员注入。
//! 实际构造代码由宿主通过 [`Constructor`] 提供。

pub mod component;
pub mod constructor;
pub mod error;
pub mod instance;
pub mod supplier;

pub use component::{ComponentBuilder, ComponentInstance};
pub use constructor::{Construction, Constructor};
pub use error::{RuntimeError, RuntimeResult};
pub use instance::{downcast, same_instance, value_eq, ComponentHandle, Instance, SetInstance};
pub use supplier::{Dependency, MemoizingSupplier, Supplier};
