//! 规划会话
//!
//! 按目录顺序或在阻塞线程池上并发规划全部组件

use di_abstractions::{
    ComponentOutcome, ComponentPlanner, ComponentSpec, DeclarationCatalog, ResolutionPlan,
};
use di_impl::ComponentPlannerImpl;
use infrastructure_common::{
    Diagnostic, InfrastructureError, InfrastructureResult, PlannerOptions, TypeName,
};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// 规划会话
#[derive(Debug, Clone)]
pub struct PlanningSession {
    planner: Arc<ComponentPlannerImpl>,
}

impl PlanningSession {
    /// 使用指定选项创建会话
    pub fn new(options: PlannerOptions) -> Self {
        Self {
            planner: Arc::new(ComponentPlannerImpl::new(options)),
        }
    }

    /// 规划器选项
    pub fn options(&self) -> &PlannerOptions {
        self.planner.options()
    }

    /// 规划单个组件
    pub fn plan(
        &self,
        catalog: &DeclarationCatalog,
        component: &ComponentSpec,
    ) -> Result<ResolutionPlan, Vec<Diagnostic>> {
        self.planner.plan(catalog, component)
    }

    /// 按类型名规划目录中的组件
    pub fn plan_named(
        &self,
        catalog: &DeclarationCatalog,
        name: &TypeName,
    ) -> InfrastructureResult<ComponentOutcome> {
        let component = catalog
            .component(name)
            .ok_or_else(|| InfrastructureError::ComponentNotFound {
                name: name.to_string(),
            })?;
        Ok(ComponentOutcome {
            component: name.clone(),
            result: self.planner.plan(catalog, component),
        })
    }

    /// 按目录顺序依次规划全部组件
    pub fn plan_all(&self, catalog: &DeclarationCatalog) -> PlanningReport {
        let report = PlanningReport::new(self.planner.plan_all(catalog));
        report.log_summary();
        report
    }

    /// 在阻塞线程池上并发规划全部组件，结果按目录顺序返回
    pub async fn plan_concurrently(
        &self,
        catalog: Arc<DeclarationCatalog>,
    ) -> InfrastructureResult<PlanningReport> {
        let mut tasks = JoinSet::new();
        for index in 0..catalog.components.len() {
            let planner = Arc::clone(&self.planner);
            let catalog = Arc::clone(&catalog);
            tasks.spawn_blocking(move || {
                let component = &catalog.components[index];
                let outcome = ComponentOutcome {
                    component: component.type_name.clone(),
                    result: planner.plan(&catalog, component),
                };
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<ComponentOutcome>> =
            (0..catalog.components.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined.map_err(|e| InfrastructureError::BootstrapFailed {
                message: format!("规划任务失败: {}", e),
            })?;
            slots[index] = Some(outcome);
        }

        let report = PlanningReport::new(slots.into_iter().flatten().collect());
        report.log_summary();
        Ok(report)
    }
}

/// 全部组件的规划结果
#[derive(Debug, Clone, Default)]
pub struct PlanningReport {
    /// 按目录顺序排列的结果
    pub outcomes: Vec<ComponentOutcome>,
}

impl PlanningReport {
    /// 创建报告
    pub fn new(outcomes: Vec<ComponentOutcome>) -> Self {
        Self { outcomes }
    }

    /// 组件数量
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// 是否全部成功
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(ComponentOutcome::is_success)
    }

    /// 成功的组件数量
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// 失败的组件数量
    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// 按组件类型查找结果
    pub fn outcome(&self, component: &TypeName) -> Option<&ComponentOutcome> {
        self.outcomes.iter().find(|o| &o.component == component)
    }

    /// 成功得到的计划
    pub fn plans(&self) -> impl Iterator<Item = &ResolutionPlan> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// 全部诊断
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.outcomes.iter().flat_map(ComponentOutcome::diagnostics)
    }

    fn log_summary(&self) {
        for diagnostic in self.diagnostics() {
            warn!("{}", diagnostic);
        }
        info!(
            "规划完成: {} 个组件成功, {} 个失败",
            self.succeeded(),
            self.failed()
        );
    }
}

impl fmt::Display for PlanningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} 个组件: {} 成功, {} 失败",
            self.len(),
            self.succeeded(),
            self.failed()
        )?;
        for diagnostic in self.diagnostics() {
            writeln!(f, "  {}", diagnostic)?;
        }
        Ok(())
    }
}
