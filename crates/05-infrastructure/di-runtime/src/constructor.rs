//! 宿主提供的构造代码

use crate::instance::{value_eq, Instance};
use crate::supplier::Dependency;
use di_abstractions::BindingDeclaration;
use infrastructure_common::TypeName;

/// 一次构造调用的输入
#[derive(Debug)]
pub struct Construction<'a> {
    /// 被构造的声明
    pub declaration: &'a BindingDeclaration,
    /// 提供方法所属的模块实例，或访问器所属的上游组件实例
    pub owner: Option<&'a Instance>,
    /// 按声明顺序排列的依赖
    pub dependencies: &'a [Dependency],
}

/// 构造器 trait
///
/// 运行时只负责按计划调度，实际的构造、模块默认值和成员填充由宿主实现。
/// `Elements` 集合贡献必须返回 `Vec<Instance>`。
pub trait Constructor: Send + Sync {
    /// 构造绑定的实例
    fn construct(&self, construction: Construction<'_>) -> anyhow::Result<Instance>;

    /// 使用无参构造创建模块实例
    fn default_module(&self, module: &TypeName) -> anyhow::Result<Instance>;

    /// 为已有实例填充成员
    fn inject_members(
        &self,
        target: &TypeName,
        instance: &Instance,
        members: &[Dependency],
    ) -> anyhow::Result<()>;

    /// 集合元素是否相等，相等的元素在集合中只保留先出现的一个
    fn element_eq(&self, left: &Instance, right: &Instance) -> bool {
        value_eq(left, right)
    }
}
