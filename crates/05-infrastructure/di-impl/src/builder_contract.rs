//! 构建器契约推导

use crate::ordering::InitializationOrder;
use crate::symbols::{SymbolOwner, SymbolTable};
use di_abstractions::{
    BindingDeclaration, BindingGraph, BindingSource, BuilderContract, BuilderField,
    ContributionKind, DeclarationCatalog, FactoryKind, FieldKind, Requirement,
};
use infrastructure_common::TypeName;
use std::collections::HashSet;
use tracing::debug;

/// 构建器契约验证器
///
/// 从绑定图推导调用方需要在构建时提供的外部值
#[derive(Debug, Default)]
pub struct BuilderContractValidator;

impl BuilderContractValidator {
    /// 创建新的验证器
    pub fn new() -> Self {
        Self
    }

    /// 推导构建器契约，字段按初始化顺序首次出现排列
    pub fn derive(
        &self,
        graph: &BindingGraph,
        order: &InitializationOrder,
        catalog: &DeclarationCatalog,
        symbols: &SymbolTable,
    ) -> BuilderContract {
        let mut seen: HashSet<&TypeName> = HashSet::new();
        let mut fields = Vec::new();

        for key in &order.sequence {
            let Some(binding) = graph.get(key) else {
                continue;
            };
            let declarations: Vec<&BindingDeclaration> = match &binding.source {
                BindingSource::Declared(declaration) => vec![declaration],
                BindingSource::Multibinding(multibinding) => multibinding
                    .contributions
                    .iter()
                    .filter(|c| c.contribution_kind() != Some(ContributionKind::Declaration))
                    .collect(),
            };

            for declaration in declarations {
                let owner = &declaration.origin.owner;
                let (kind, requirement) = match declaration.factory_kind {
                    FactoryKind::ProviderMethod => {
                        let defaultable = catalog
                            .module(owner)
                            .is_some_and(|module| module.no_arg_constructible);
                        let requirement = if defaultable {
                            Requirement::OptionalDefaulted
                        } else {
                            Requirement::Required
                        };
                        (FieldKind::Module, requirement)
                    }
                    FactoryKind::ComponentDependencyAccessor => {
                        (FieldKind::ComponentDependency, Requirement::Required)
                    }
                    FactoryKind::ConstructorInjection | FactoryKind::Instance => continue,
                };
                if !seen.insert(owner) {
                    continue;
                }

                let symbol = symbols
                    .instance(owner)
                    .map(str::to_string)
                    .unwrap_or_else(|| SymbolOwner::Instance(owner.clone()).base_name());
                debug!("构建器字段: {} ({}, {:?})", symbol, owner, requirement);
                fields.push(BuilderField {
                    symbol,
                    type_name: owner.clone(),
                    kind,
                    requirement,
                });
            }
        }

        BuilderContract { fields }
    }
}
