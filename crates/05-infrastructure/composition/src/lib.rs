//! # 基础设施组合层
//!
//! 将选项加载、日志初始化和组件规划器组合成可直接使用的规划会话。
//!
//! ## 主要功能
//!
//! - **规划器构建器**: 从选项文件和环境变量组装规划器
//! - **规划会话**: 顺序或并发地规划目录中的全部组件
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{LoggingConfig, PlannerBuilder};
//! use di_abstractions::DeclarationCatalog;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = PlannerBuilder::new()
//!         .with_options_file("inject.toml")?
//!         .with_logging(LoggingConfig::development())
//!         .build()?;
//!
//!     let catalog = DeclarationCatalog::from_json(r#"{ "components": [] }"#)?;
//!     let report = session.plan_concurrently(Arc::new(catalog)).await?;
//!     println!("{}", report);
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod session;

// 重新导出主要类型
pub use builder::{LoggingConfig, PlannerBuilder};
pub use session::{PlanningReport, PlanningSession};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
