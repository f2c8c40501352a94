//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义声明模型、解析接口和计划类型。
//!
//! ## 核心接口
//!
//! - [`BindingDeclaration`] / [`ComponentSpec`] / [`DeclarationCatalog`] - 前端提供的声明模型
//! - [`BindingIndex`] - 绑定索引接口
//! - [`GraphResolver`] - 图解析器接口
//! - [`ComponentPlanner`] - 组件规划器接口
//! - [`ResolutionPlan`] - 交给生成器的解析计划

pub mod binding;
pub mod component;
pub mod graph;
pub mod plan;
pub mod registry;
pub mod resolver;

pub use binding::*;
pub use component::*;
pub use graph::*;
pub use plan::*;
pub use registry::*;
pub use resolver::*;
