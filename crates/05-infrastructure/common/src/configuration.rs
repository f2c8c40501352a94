//! 规划器配置

use crate::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "LORN_INJECT";

/// 环境变量层级分隔符
pub const ENV_SEPARATOR: &str = "__";

/// 规划器选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerOptions {
    /// 是否将组件自身类型注册为隐式实例绑定
    pub self_injection: bool,
    /// 遇到第一个诊断后是否立即停止该组件的解析
    pub fail_fast: bool,
    /// 最大解析深度
    pub max_resolution_depth: usize,
}

impl PlannerOptions {
    /// 创建默认选项
    pub fn new() -> Self {
        Self {
            self_injection: true,
            fail_fast: false,
            max_resolution_depth: 512,
        }
    }

    /// 设置是否启用自注入
    pub fn with_self_injection(mut self, enabled: bool) -> Self {
        self.self_injection = enabled;
        self
    }

    /// 设置是否快速失败
    pub fn with_fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }

    /// 设置最大解析深度
    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }

    /// 加载选项
    ///
    /// 依次叠加默认值、可选的配置文件（按扩展名识别 TOML/JSON/YAML）
    /// 以及 `LORN_INJECT__*` 环境变量。
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            debug!("加载规划器配置文件: {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigError::ParseError {
                source: Box::new(e),
            })?;

        let options: Self = settings
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError {
                source: Box::new(e),
            })?;

        options.validate()?;
        Ok(options)
    }

    /// 验证选项
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_resolution_depth == 0 {
            return Err(ConfigError::ValidationError {
                message: "max_resolution_depth 必须大于 0".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self::new()
    }
}
