//! 规划器构建器

use crate::session::PlanningSession;
use infrastructure_common::{InfrastructureError, PlannerOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// 规划器构建器
///
/// 组合选项文件、环境变量覆盖和日志初始化，产出 [`PlanningSession`]
pub struct PlannerBuilder {
    /// 选项文件
    options_file: Option<PathBuf>,
    /// 显式指定的选项，优先于文件和环境变量
    options: Option<PlannerOptions>,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl PlannerBuilder {
    /// 创建新的规划器构建器
    pub fn new() -> Self {
        Self {
            options_file: None,
            options: None,
            logging_enabled: false, // 默认不启用日志初始化
            logging_config: LoggingConfig::default(),
        }
    }

    /// 添加选项文件（TOML / JSON / YAML，按扩展名识别）
    pub fn with_options_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(InfrastructureError::BootstrapFailed {
                message: format!("选项文件不存在: {}", path.display()),
            });
        }

        info!("添加选项文件: {}", path.display());
        self.options_file = Some(path.to_path_buf());
        Ok(self)
    }

    /// 直接指定选项
    pub fn with_options(mut self, options: PlannerOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true;
        self
    }

    /// 构建规划会话
    pub fn build(self) -> Result<PlanningSession, InfrastructureError> {
        if self.logging_enabled {
            self.initialize_logging()?;
        }

        let options = match self.options {
            Some(options) => {
                options.validate()?;
                options
            }
            None => PlannerOptions::load(self.options_file.as_deref())?,
        };

        info!(
            "规划器选项: self_injection={}, fail_fast={}, max_resolution_depth={}",
            options.self_injection, options.fail_fast, options.max_resolution_depth
        );
        Ok(PlanningSession::new(options))
    }

    /// 初始化日志系统
    ///
    /// `RUST_LOG` 优先于配置中的过滤指令；已有全局订阅者时保留原订阅者。
    fn initialize_logging(&self) -> Result<(), InfrastructureError> {
        let config = &self.logging_config;
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&config.filter).map_err(|e| {
                InfrastructureError::BootstrapFailed {
                    message: format!("日志过滤指令无效 '{}': {}", config.filter, e),
                }
            })?,
        };

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.show_target)
            .with_thread_ids(config.show_thread_ids)
            .with_file(config.show_source)
            .with_line_number(config.show_source);
        let installed = if config.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        };

        match installed {
            Ok(()) => info!("日志系统初始化完成: {}", config.filter),
            Err(e) => debug!("沿用已安装的日志订阅者: {}", e),
        }
        Ok(())
    }
}

impl Default for PlannerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` 过滤指令，例如 `info,di_impl=debug`
    pub filter: String,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示源码文件和行号
    pub show_source: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            show_target: true,
            show_thread_ids: false,
            show_source: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 开发环境：规划器各阶段输出调试日志
    pub fn development() -> Self {
        Self {
            filter: "info,di_impl=debug,di_runtime=debug,infrastructure_composition=debug"
                .to_string(),
            show_thread_ids: true,
            show_source: true,
            ..Self::default()
        }
    }

    /// 生产环境：只保留会话摘要和警告，JSON 输出
    pub fn production() -> Self {
        Self {
            filter: "warn,infrastructure_composition=info".to_string(),
            show_target: false,
            json_format: true,
            ..Self::default()
        }
    }

    /// 替换过滤指令
    pub fn with_filter(mut self, directive: impl Into<String>) -> Self {
        self.filter = directive.into();
        self
    }
}
