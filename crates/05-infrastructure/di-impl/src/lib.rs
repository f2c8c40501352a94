//! # 依赖注入具体实现
//!
//! 提供绑定索引、集合聚合、图解析、作用域缓存、初始化顺序、符号分配和构建器契约的实现，
//! 以及串联它们的组件规划器。

pub mod builder_contract;
pub mod index;
pub mod multibinding;
pub mod ordering;
pub mod planner;
pub mod resolver;
pub mod scope;
pub mod symbols;
pub mod validation;

pub use builder_contract::BuilderContractValidator;
pub use index::BindingIndexImpl;
pub use multibinding::{MultibindingAggregator, Multibindings};
pub use ordering::{InitializationOrder, InitializationOrderPlanner};
pub use planner::ComponentPlannerImpl;
pub use resolver::GraphResolverImpl;
pub use scope::ScopeCachePlanner;
pub use symbols::{owning_instances, SymbolAllocator, SymbolOwner, SymbolTable};
pub use validation::ComponentValidator;
