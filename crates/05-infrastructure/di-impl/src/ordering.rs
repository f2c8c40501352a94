//! 初始化顺序规划
//!
//! 只以值依赖边作为顺序约束做拓扑排序，就绪集合按首次发现顺序出队。
//! 延迟依赖边不施加顺序约束，引用到尚未初始化的绑定时需要前向声明的单元。

use di_abstractions::BindingGraph;
use infrastructure_common::{DependencyError, DependencyPath, DependencyResult, Key};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use tracing::debug;

/// 初始化顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitializationOrder {
    /// 构造入口的实例化顺序
    pub sequence: Vec<Key>,
    /// 需要前向声明单元的绑定（按初始化顺序）
    pub forward_cells: Vec<Key>,
}

impl InitializationOrder {
    /// 键在初始化顺序中的位置
    pub fn position(&self, key: &Key) -> Option<usize> {
        self.sequence.iter().position(|k| k == key)
    }

    /// 键是否需要前向声明单元
    pub fn needs_forward_cell(&self, key: &Key) -> bool {
        self.forward_cells.contains(key)
    }
}

/// 初始化顺序规划器
#[derive(Debug, Default)]
pub struct InitializationOrderPlanner;

impl InitializationOrderPlanner {
    /// 创建新的规划器
    pub fn new() -> Self {
        Self
    }

    /// 计算初始化顺序
    ///
    /// 残留的纯值依赖循环报告为循环错误。
    pub fn plan(&self, graph: &BindingGraph) -> DependencyResult<InitializationOrder> {
        let mut pending: HashMap<&Key, usize> = HashMap::new();
        let mut dependents: HashMap<&Key, Vec<&Key>> = HashMap::new();

        for binding in graph.iter_discovered() {
            let value_dependencies: HashSet<&Key> = binding
                .dependencies
                .iter()
                .filter(|d| !d.access.is_deferred() && graph.bindings.contains_key(&d.key))
                .map(|d| &d.key)
                .collect();
            pending.insert(&binding.key, value_dependencies.len());
            for dependency in value_dependencies {
                dependents.entry(dependency).or_default().push(&binding.key);
            }
        }

        let mut ready: BinaryHeap<Reverse<(usize, &Key)>> = graph
            .iter_discovered()
            .filter(|b| pending.get(&b.key) == Some(&0))
            .map(|b| Reverse((b.discovery_index, &b.key)))
            .collect();

        let mut sequence = Vec::with_capacity(graph.len());
        while let Some(Reverse((_, key))) = ready.pop() {
            sequence.push(key.clone());
            for dependent in dependents.get(key).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        if let Some(binding) = graph.get(dependent) {
                            ready.push(Reverse((binding.discovery_index, *dependent)));
                        }
                    }
                }
            }
        }

        if sequence.len() < graph.len() {
            return Err(residual_cycle(graph, &pending));
        }

        let positions: HashMap<&Key, usize> =
            sequence.iter().enumerate().map(|(i, k)| (k, i)).collect();
        let mut forward: HashSet<&Key> = HashSet::new();
        for key in &sequence {
            let Some(binding) = graph.get(key) else {
                continue;
            };
            for dependency in binding.dependencies.iter().filter(|d| d.access.is_deferred()) {
                if positions.get(&dependency.key) >= positions.get(key) {
                    forward.insert(&dependency.key);
                }
            }
        }
        let forward_cells: Vec<Key> = sequence
            .iter()
            .filter(|k| forward.contains(k))
            .cloned()
            .collect();

        debug!(
            "组件 {} 初始化顺序: {} 个绑定, {} 个前向单元",
            graph.component,
            sequence.len(),
            forward_cells.len()
        );
        Ok(InitializationOrder {
            sequence,
            forward_cells,
        })
    }
}

/// 在未能出队的绑定中找出一个纯值依赖循环
fn residual_cycle(graph: &BindingGraph, pending: &HashMap<&Key, usize>) -> DependencyError {
    let residual = |key: &Key| pending.get(key).is_some_and(|count| *count > 0);

    let start = graph
        .iter_discovered()
        .find(|b| residual(&b.key))
        .map(|b| b.key.clone());

    let mut walk: Vec<Key> = Vec::new();
    let mut current = start;
    while let Some(key) = current {
        if let Some(position) = walk.iter().position(|k| k == &key) {
            let mut cycle = walk.split_off(position);
            cycle.push(key);
            let location = graph
                .get(&cycle[0])
                .and_then(|b| b.source.location().cloned());
            return DependencyError::Cycle {
                cycle: DependencyPath::from(cycle),
                request: None,
                location,
            };
        }
        current = graph.get(&key).and_then(|binding| {
            binding
                .dependencies
                .iter()
                .find(|d| !d.access.is_deferred() && residual(&d.key))
                .map(|d| d.key.clone())
        });
        walk.push(key);
    }

    DependencyError::Cycle {
        cycle: DependencyPath::from(walk),
        request: None,
        location: None,
    }
}
