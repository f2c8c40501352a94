//! 组件配置验证
//!
//! 在解析前检查组件和模块声明的形态

use crate::index::is_visible;
use di_abstractions::{ComponentSpec, DeclarationCatalog, FactoryKind};
use infrastructure_common::DependencyError;
use tracing::warn;

/// 组件配置验证器
#[derive(Debug, Default)]
pub struct ComponentValidator;

impl ComponentValidator {
    /// 创建新的验证器
    pub fn new() -> Self {
        Self
    }

    /// 验证组件声明，返回全部配置错误
    pub fn validate(
        &self,
        catalog: &DeclarationCatalog,
        component: &ComponentSpec,
    ) -> Vec<DependencyError> {
        let mut errors = Vec::new();
        let name = &component.type_name;

        if !component.type_kind.can_declare_component() {
            errors.push(
                DependencyError::configuration(
                    name,
                    format!("组件只能声明在接口或抽象类上, 实际为 {:?}", component.type_kind),
                )
                .at(component.location.clone()),
            );
        }

        for module in &component.modules {
            match catalog.module(module) {
                None => errors.push(
                    DependencyError::configuration(name, format!("{} 不是已知的模块", module))
                        .at(component.location.clone()),
                ),
                Some(descriptor) if !descriptor.is_module => errors.push(
                    DependencyError::configuration(name, format!("{} 不是模块", module))
                        .at(descriptor.location.clone().or_else(|| component.location.clone())),
                ),
                Some(_) => {}
            }
        }

        for dependency in &component.dependencies {
            if dependency == name {
                errors.push(
                    DependencyError::configuration(name, "组件不能依赖自身")
                        .at(component.location.clone()),
                );
            } else if catalog.module(dependency).is_some_and(|m| m.is_module) {
                errors.push(
                    DependencyError::configuration(
                        name,
                        format!("{} 是模块, 不能作为上游组件", dependency),
                    )
                    .at(component.location.clone()),
                );
            }
        }

        for declaration in catalog
            .declarations
            .iter()
            .filter(|d| is_visible(d, component))
        {
            if !declaration.is_unique() && declaration.factory_kind != FactoryKind::ProviderMethod {
                errors.push(
                    DependencyError::configuration(
                        name,
                        format!(
                            "集合贡献 {} 必须由模块提供方法声明: {}",
                            declaration.key, declaration.origin
                        ),
                    )
                    .at(declaration.origin.location.clone()),
                );
            }
        }

        for error in &errors {
            warn!("组件配置无效: {}", error);
        }
        errors
    }
}
