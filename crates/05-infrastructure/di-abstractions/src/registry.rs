//! 绑定索引抽象接口

use crate::binding::BindingDeclaration;
use infrastructure_common::Key;

/// 查找结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome<'a> {
    /// 恰好一个唯一声明
    Unique(&'a BindingDeclaration),
    /// 一个或多个集合贡献声明（按注册顺序）
    Contributions(Vec<&'a BindingDeclaration>),
    /// 多个唯一声明，或唯一声明与集合贡献混用
    Conflicting(Vec<&'a BindingDeclaration>),
    /// 没有任何声明
    Absent,
}

impl LookupOutcome<'_> {
    /// 是否找到了声明
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// 绑定索引 trait
///
/// 按键索引一个组件可见的全部声明。重复的唯一声明在注册时不报错，
/// 由解析器在查找时结合依赖链报告。
pub trait BindingIndex {
    /// 注册声明
    fn register(&mut self, declaration: BindingDeclaration);

    /// 查找键对应的声明，无副作用
    fn lookup(&self, key: &Key) -> LookupOutcome<'_>;

    /// 按首次注册顺序返回所有键
    fn keys(&self) -> &[Key];

    /// 已注册声明的数量
    fn len(&self) -> usize;

    /// 索引是否为空
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
