//! 集合绑定聚合

use di_abstractions::{BindingIndex, DependencyEdge, LookupOutcome, MultibindingDeclaration};
use infrastructure_common::Key;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// 聚合后的集合绑定
#[derive(Debug, Clone, Default)]
pub struct Multibindings {
    declarations: HashMap<Key, MultibindingDeclaration>,
}

impl Multibindings {
    /// 查找集合绑定
    pub fn get(&self, key: &Key) -> Option<&MultibindingDeclaration> {
        self.declarations.get(key)
    }

    /// 集合绑定数量
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// 是否没有集合绑定
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

/// 集合绑定聚合器
#[derive(Debug, Default)]
pub struct MultibindingAggregator;

impl MultibindingAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self
    }

    /// 为每个只有集合贡献的键合成一个集合绑定
    pub fn aggregate(&self, index: &impl BindingIndex) -> Multibindings {
        let mut declarations = HashMap::new();

        for key in index.keys() {
            let contributions = match index.lookup(key) {
                LookupOutcome::Contributions(contributions) => contributions,
                _ => continue,
            };

            let mut seen = HashSet::new();
            let mut dependencies: Vec<DependencyEdge> = Vec::new();
            for edge in contributions.iter().flat_map(|c| c.dependencies.iter()) {
                if seen.insert((edge.key.clone(), edge.access)) {
                    dependencies.push(edge.clone());
                }
            }

            debug!(
                "合成集合绑定: {} ({} 个贡献, {} 个依赖)",
                key,
                contributions.len(),
                dependencies.len()
            );
            declarations.insert(
                key.clone(),
                MultibindingDeclaration {
                    key: key.clone(),
                    contributions: contributions.into_iter().cloned().collect(),
                    dependencies,
                },
            );
        }

        Multibindings { declarations }
    }
}
