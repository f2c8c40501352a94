//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn Inject 依赖图规划器的公共词汇和工具。
//!
//! ## 核心类型
//!
//! - [`TypeName`] / [`Key`] - 类型名称与绑定键
//! - [`ScopeName`] - 作用域名称
//! - [`Origin`] / [`SourceLocation`] - 声明来源与源码位置
//! - [`DependencyError`] / [`Diagnostic`] - 错误分类与组件诊断
//! - [`PlannerOptions`] - 规划器配置
//!
//! ## 设计原则
//!
//! - 纯数据，无运行时反射
//! - 所有类型均可通过 serde 在前端和生成器之间交换

pub mod configuration;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use configuration::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
