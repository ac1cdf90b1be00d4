//! 配置管理
//!
//! 配置来源按优先级从低到高：内置默认值、配置文件、`CLINIC_` 前缀的环境变量
//! （层级分隔符为 `__`，例如 `CLINIC_SCHEDULING__SUGGESTION_DAYS=5`）。

use anyhow::{Context, Result};
use clinic_odontogram::{DentitionType, InMemoryOdontogramStore};
use clinic_scheduling::{
    AvailabilityResolver, ConflictPolicy, InMemoryBookingStore, ResolverOptions, Timetable,
};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};

/// 配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    /// 配置数据
    config: Arc<RwLock<ClinicConfig>>,
    /// 配置文件路径
    config_path: Option<String>,
    /// 配置验证器
    validator: ConfigValidator,
}

/// 诊所系统完整配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicConfig {
    /// 排班配置
    pub scheduling: SchedulingConfig,
    /// 牙位图配置
    pub odontogram: OdontogramConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 排班配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// 机构课表
    pub timetable: Timetable,
    /// 预约冲突判断策略
    pub conflict_policy: ConflictPolicy,
    /// 向后查找替代时段的天数
    pub suggestion_days: u32,
    /// 每天最多推荐的时段数
    pub max_suggestions_per_day: usize,
}

impl SchedulingConfig {
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            suggestion_days: self.suggestion_days,
            max_suggestions_per_day: self.max_suggestions_per_day,
        }
    }

    /// 使用种子预约构建解析器
    pub fn build_resolver(&self) -> AvailabilityResolver {
        AvailabilityResolver::new(
            self.timetable.clone(),
            Arc::new(InMemoryBookingStore::seeded(self.conflict_policy)),
        )
        .with_options(self.resolver_options())
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        let options = ResolverOptions::default();
        Self {
            timetable: Timetable::default(),
            conflict_policy: ConflictPolicy::default(),
            suggestion_days: options.suggestion_days,
            max_suggestions_per_day: options.max_suggestions_per_day,
        }
    }
}

/// 牙位图配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OdontogramConfig {
    /// 新建牙位图的默认牙列
    pub default_dentition: DentitionType,
    /// 模拟的存储延迟（毫秒），0 表示不模拟
    pub simulated_latency_ms: u64,
}

impl OdontogramConfig {
    pub fn build_store(&self) -> InMemoryOdontogramStore {
        if self.simulated_latency_ms == 0 {
            InMemoryOdontogramStore::new()
        } else {
            InMemoryOdontogramStore::with_latency(Duration::from_millis(self.simulated_latency_ms))
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别或过滤指令
    pub level: String,
    /// 显示日志目标
    pub with_target: bool,
    /// 彩色输出
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: true,
            ansi: true,
        }
    }
}

/// 配置验证器
#[derive(Debug)]
pub struct ConfigValidator {
    /// 验证规则
    validation_rules: Vec<ValidationRule>,
}

/// 验证规则
#[derive(Debug)]
struct ValidationRule {
    /// 字段路径
    field_path: String,
    /// 验证函数
    validator: fn(&ClinicConfig) -> Result<()>,
    /// 错误消息
    error_message: String,
}

impl ConfigManager {
    /// 创建新的配置管理器；未给出路径时只使用默认值和环境变量
    pub fn new(config_path: Option<&str>) -> Result<Self> {
        let config = Self::load_config(config_path)?;
        let validator = ConfigValidator::new();
        validator.validate(&config)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path: config_path.map(str::to_string),
            validator,
        })
    }

    /// 使用给定配置创建管理器
    pub fn from_config(config: ClinicConfig) -> Result<Self> {
        let validator = ConfigValidator::new();
        validator.validate(&config)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path: None,
            validator,
        })
    }

    /// 加载配置
    fn load_config(config_path: Option<&str>) -> Result<ClinicConfig> {
        let defaults = Config::try_from(&ClinicConfig::default())
            .context("Failed to build default configuration")?;

        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix("CLINIC")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration sources")?;

        let config: ClinicConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        match config_path {
            Some(path) => info!("Configuration loaded successfully from: {}", path),
            None => info!("Configuration loaded from defaults and environment"),
        }
        Ok(config)
    }

    pub fn config_path(&self) -> Option<&str> {
        self.config_path.as_deref()
    }

    /// 获取配置
    pub async fn get_config(&self) -> ClinicConfig {
        let config = self.config.read().await;
        config.clone()
    }

    /// 更新配置
    pub async fn update_config(&self, new_config: ClinicConfig) -> Result<()> {
        self.validator.validate(&new_config)?;

        let mut config = self.config.write().await;
        *config = new_config;

        info!("Configuration updated successfully");
        Ok(())
    }

    /// 保存配置到文件
    pub async fn save_to(&self, path: &str) -> Result<()> {
        let config = self.config.read().await;
        let config_str =
            toml::to_string_pretty(&*config).context("Failed to serialize configuration")?;

        tokio::fs::write(path, config_str)
            .await
            .context("Failed to write configuration file")?;

        info!("Configuration saved to: {}", path);
        Ok(())
    }

    /// 重新加载配置
    pub async fn reload_config(&self) -> Result<()> {
        let new_config = Self::load_config(self.config_path.as_deref())?;
        self.update_config(new_config).await
    }

    /// 按点分路径读取配置值，例如 `scheduling.suggestion_days`
    pub async fn get_value<T>(&self, path: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let config = self.config.read().await;
        let value = extract_nested_value(&config, path)
            .with_context(|| format!("Configuration path not found: {}", path))?;

        serde_json::from_value(value).context("Failed to deserialize configuration value")
    }

    /// 验证配置
    pub async fn validate_config(&self) -> Result<()> {
        let config = self.config.read().await;
        self.validator.validate(&config)
    }
}

/// 提取嵌套值
fn extract_nested_value(config: &ClinicConfig, path: &str) -> Result<serde_json::Value> {
    let config_json = serde_json::to_value(config).context("Failed to serialize config to JSON")?;

    let mut current = &config_json;
    for part in path.split('.') {
        match current {
            serde_json::Value::Object(map) => {
                current = map
                    .get(part)
                    .ok_or_else(|| anyhow::anyhow!("Path segment not found: {}", part))?;
            }
            _ => return Err(anyhow::anyhow!("Invalid path at segment: {}", part)),
        }
    }

    Ok(current.clone())
}

impl ConfigValidator {
    /// 创建新的配置验证器
    pub fn new() -> Self {
        let validation_rules = vec![
            ValidationRule {
                field_path: "scheduling.timetable".to_string(),
                validator: |config| {
                    config
                        .scheduling
                        .timetable
                        .validate()
                        .map_err(|e| anyhow::anyhow!(e))
                },
                error_message: "Invalid timetable".to_string(),
            },
            ValidationRule {
                field_path: "scheduling.suggestion_days".to_string(),
                validator: |config| {
                    if config.scheduling.suggestion_days == 0 {
                        Err(anyhow::anyhow!("Suggestion horizon cannot be 0 days"))
                    } else if config.scheduling.suggestion_days > 366 {
                        Err(anyhow::anyhow!("Suggestion horizon cannot exceed 366 days"))
                    } else {
                        Ok(())
                    }
                },
                error_message: "Invalid suggestion horizon".to_string(),
            },
            ValidationRule {
                field_path: "scheduling.max_suggestions_per_day".to_string(),
                validator: |config| {
                    if config.scheduling.max_suggestions_per_day == 0 {
                        Err(anyhow::anyhow!("At least one suggestion per day is required"))
                    } else {
                        Ok(())
                    }
                },
                error_message: "Invalid suggestions per day".to_string(),
            },
            ValidationRule {
                field_path: "logging.level".to_string(),
                validator: |config| {
                    tracing_subscriber::EnvFilter::try_new(&config.logging.level)
                        .map(|_| ())
                        .map_err(|e| anyhow::anyhow!(e))
                },
                error_message: "Invalid log level".to_string(),
            },
        ];

        Self { validation_rules }
    }

    /// 验证配置
    pub fn validate(&self, config: &ClinicConfig) -> Result<()> {
        for rule in &self.validation_rules {
            if let Err(e) = (rule.validator)(config) {
                error!("Configuration validation failed for {}: {}", rule.field_path, e);
                return Err(anyhow::anyhow!("{}: {}", rule.error_message, e));
            }
        }

        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn temp_path() -> String {
        std::env::temp_dir()
            .join(format!("clinic-config-{}.toml", uuid::Uuid::new_v4()))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ClinicConfig::default();
        assert!(ConfigValidator::new().validate(&config).is_ok());
        assert_eq!(config.scheduling.suggestion_days, 7);
        assert_eq!(config.scheduling.max_suggestions_per_day, 3);
        assert_eq!(config.scheduling.conflict_policy, ConflictPolicy::ExactStart);
    }

    #[test]
    fn test_validator_rejects_bad_values() {
        let validator = ConfigValidator::new();

        let mut config = ClinicConfig::default();
        config.scheduling.timetable.granularity_minutes = 0;
        assert!(validator.validate(&config).is_err());

        let mut config = ClinicConfig::default();
        config.scheduling.suggestion_days = 0;
        assert!(validator.validate(&config).is_err());
        config.scheduling.suggestion_days = 10_000;
        assert!(validator.validate(&config).is_err());

        let mut config = ClinicConfig::default();
        config.logging.level = "clinic=notalevel".to_string();
        assert!(validator.validate(&config).is_err());
    }

    #[tokio::test]
    async fn test_save_and_reload_from_file() {
        let path = temp_path();
        let mut config = ClinicConfig::default();
        config.scheduling.suggestion_days = 14;
        config.scheduling.conflict_policy = ConflictPolicy::Overlap;
        config.scheduling.timetable.closing = NaiveTime::from_hms_opt(19, 0, 0).unwrap();
        config.odontogram.default_dentition = DentitionType::Mixed;

        let manager = ConfigManager::from_config(config.clone()).unwrap();
        manager.save_to(&path).await.unwrap();

        let reloaded = ConfigManager::new(Some(path.as_str())).unwrap();
        let loaded = reloaded.get_config().await;
        assert_eq!(loaded.scheduling.suggestion_days, 14);
        assert_eq!(loaded.scheduling.conflict_policy, ConflictPolicy::Overlap);
        assert_eq!(loaded.scheduling.timetable, config.scheduling.timetable);
        assert_eq!(loaded.odontogram.default_dentition, DentitionType::Mixed);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let path = temp_path();
        std::fs::write(&path, "[scheduling]\nmax_suggestions_per_day = 5\n").unwrap();

        let manager = ConfigManager::new(Some(path.as_str())).unwrap();
        let config = manager.get_config().await;
        assert_eq!(config.scheduling.max_suggestions_per_day, 5);
        assert_eq!(config.scheduling.suggestion_days, 7);
        assert_eq!(config.scheduling.timetable, Timetable::default());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_update_config_is_validated() {
        let manager = ConfigManager::from_config(ClinicConfig::default()).unwrap();
        let mut bad = ClinicConfig::default();
        bad.scheduling.max_suggestions_per_day = 0;
        assert!(manager.update_config(bad).await.is_err());

        let mut good = ClinicConfig::default();
        good.scheduling.suggestion_days = 3;
        manager.update_config(good).await.unwrap();
        assert_eq!(manager.get_value::<u32>("scheduling.suggestion_days").await.unwrap(), 3);
        assert!(manager.get_value::<u32>("scheduling.missing").await.is_err());
    }

    #[test]
    fn test_build_resolver_uses_options() {
        let mut config = SchedulingConfig::default();
        config.suggestion_days = 2;
        let resolver = config.build_resolver();
        assert_eq!(resolver.options().suggestion_days, 2);
        assert_eq!(resolver.timetable(), &Timetable::default());
    }
}
