//! 图解析器抽象接口
//!
//! 提供解析链管理和循环依赖判定的能力

use crate::binding::AccessMode;
use crate::graph::BindingGraph;
use infrastructure_common::{DependencyPath, Diagnostic, Key, SourceLocation};

/// 图解析器 trait
///
/// 从组件的全部请求出发计算传递闭包，生成经过循环校验的绑定图
pub trait GraphResolver {
    /// 解析绑定图；失败时返回非空的诊断列表
    fn resolve(self) -> Result<BindingGraph, Vec<Diagnostic>>;
}

/// 节点访问状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitState {
    /// 正在解析
    InProgress,
    /// 解析完成
    Resolved,
    /// 解析失败（诊断已报告）
    Failed,
}

/// 解析链中的一环
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveLink {
    /// 当前键
    pub key: Key,
    /// 进入当前键所经过的边的访问方式
    pub access: AccessMode,
    /// 当前键所用声明的源码位置
    pub location: Option<SourceLocation>,
}

/// 解析上下文
///
/// 记录从触发请求开始的解析链，用于报告依赖路径和判定循环
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// 触发解析的请求方法名
    request: String,
    /// 当前解析链
    resolution_chain: Vec<ResolveLink>,
}

impl ResolveContext {
    /// 为一个请求创建新的解析上下文
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            resolution_chain: Vec::new(),
        }
    }

    /// 触发解析的请求
    pub fn request(&self) -> &str {
        &self.request
    }

    /// 当前解析深度
    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }

    /// 当前链尾声明的源码位置
    pub fn current_location(&self) -> Option<&SourceLocation> {
        self.resolution_chain
            .last()
            .and_then(|link| link.location.as_ref())
    }

    /// 将键压入解析链
    pub fn push(&mut self, key: Key, access: AccessMode, location: Option<SourceLocation>) {
        self.resolution_chain.push(ResolveLink {
            key,
            access,
            location,
        });
    }

    /// 从解析链中移除链尾
    pub fn pop(&mut self) {
        self.resolution_chain.pop();
    }

    fn position(&self, key: &Key) -> Option<usize> {
        self.resolution_chain.iter().rposition(|link| &link.key == key)
    }

    /// 经 `access` 边回到链上的 `key` 所形成的环是否经过延迟边
    ///
    /// `key` 不在链上时返回 `false`。
    pub fn closes_through_deferred(&self, key: &Key, access: AccessMode) -> bool {
        if access.is_deferred() {
            return self.position(key).is_some();
        }
        match self.position(key) {
            Some(start) => self.resolution_chain[start + 1..]
                .iter()
                .any(|link| link.access.is_deferred()),
            None => false,
        }
    }

    /// 从链上的 `key` 出发再回到 `key` 的环
    pub fn cycle_to(&self, key: &Key) -> DependencyPath {
        let start = self.position(key).unwrap_or(0);
        let mut cycle: Vec<Key> = self.resolution_chain[start..]
            .iter()
            .map(|link| link.key.clone())
            .collect();
        cycle.push(key.clone());
        DependencyPath::from(cycle)
    }

    /// 从请求出发到 `key` 的完整路径
    pub fn path_to(&self, key: &Key) -> DependencyPath {
        let mut path: Vec<Key> = self
            .resolution_chain
            .iter()
            .map(|link| link.key.clone())
            .collect();
        path.push(key.clone());
        DependencyPath::from(path)
    }
}
