use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::clients::circuit_breaker::MAX_COOLDOWN;
use crate::clients::{CircuitBreakerConfig, RetryPolicy};
use crate::error::{AppResult, ConfigError, FileError};
use crate::services::{QuotaLimits, ValidatorSettings};

/// 程序配置
///
/// 优先级：环境变量 > TOML 文件 > 默认值
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub temperature: f32,
    pub max_tokens: u32,
    // --- 弹性调用 ---
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 总尝试次数
    pub max_attempts: u32,
    /// 退避基数（毫秒）
    pub retry_base_delay_ms: u64,
    pub circuit_failure_threshold: u32,
    pub circuit_cooldown_secs: u64,
    // --- 配额 ---
    pub standard_daily_limit: u32,
    pub elevated_daily_limit: u32,
    // --- 文本校验 ---
    pub min_word_count: usize,
    pub max_word_count: usize,
    pub english_confidence_threshold: f64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://openrouter.ai/api/v1".to_string(),
            llm_model_name: "openai/gpt-4o".to_string(),
            temperature: 0.3,
            max_tokens: 1500,
            request_timeout_secs: 30,
            max_attempts: 3,
            retry_base_delay_ms: 1000,
            circuit_failure_threshold: 5,
            circuit_cooldown_secs: 300,
            standard_daily_limit: 3,
            elevated_daily_limit: 50,
            min_word_count: 50,
            max_word_count: 1000,
            english_confidence_threshold: 0.8,
            verbose_logging: false,
        }
    }
}

/// 环境变量存在且能解析时覆盖
fn override_from_env<T: FromStr>(key: &str, target: &mut T) {
    if let Some(value) = std::env::var(key).ok().and_then(|v| v.parse().ok()) {
        *target = value;
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取，缺失的键取默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| FileError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;
        Ok(config)
    }

    /// 有文件先读文件，再叠加环境变量
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        override_from_env("LLM_API_KEY", &mut self.llm_api_key);
        override_from_env("LLM_API_BASE_URL", &mut self.llm_api_base_url);
        override_from_env("LLM_MODEL_NAME", &mut self.llm_model_name);
        override_from_env("LLM_TEMPERATURE", &mut self.temperature);
        override_from_env("LLM_MAX_TOKENS", &mut self.max_tokens);
        override_from_env("REQUEST_TIMEOUT_SECS", &mut self.request_timeout_secs);
        override_from_env("MAX_ATTEMPTS", &mut self.max_attempts);
        override_from_env("RETRY_BASE_DELAY_MS", &mut self.retry_base_delay_ms);
        override_from_env("CIRCUIT_FAILURE_THRESHOLD", &mut self.circuit_failure_threshold);
        override_from_env("CIRCUIT_COOLDOWN_SECS", &mut self.circuit_cooldown_secs);
        override_from_env("STANDARD_DAILY_LIMIT", &mut self.standard_daily_limit);
        override_from_env("ELEVATED_DAILY_LIMIT", &mut self.elevated_daily_limit);
        override_from_env("MIN_WORD_COUNT", &mut self.min_word_count);
        override_from_env("MAX_WORD_COUNT", &mut self.max_word_count);
        override_from_env(
            "ENGLISH_CONFIDENCE_THRESHOLD",
            &mut self.english_confidence_threshold,
        );
        override_from_env("VERBOSE_LOGGING", &mut self.verbose_logging);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::MissingValue {
                key: "llm_api_key".to_string(),
            });
        }

        let positive = [
            ("max_attempts", self.max_attempts),
            ("circuit_failure_threshold", self.circuit_failure_threshold),
            ("standard_daily_limit", self.standard_daily_limit),
            ("elevated_daily_limit", self.elevated_daily_limit),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    reason: "必须大于 0".to_string(),
                });
            }
        }

        if self.circuit_cooldown_secs > MAX_COOLDOWN.as_secs() {
            return Err(ConfigError::InvalidValue {
                key: "circuit_cooldown_secs".to_string(),
                value: self.circuit_cooldown_secs.to_string(),
                reason: format!("不能超过 {} 秒", MAX_COOLDOWN.as_secs()),
            });
        }

        if self.min_word_count == 0 || self.min_word_count > self.max_word_count {
            return Err(ConfigError::InvalidValue {
                key: "min_word_count".to_string(),
                value: self.min_word_count.to_string(),
                reason: "必须大于 0 且不超过 max_word_count".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.english_confidence_threshold) {
            return Err(ConfigError::InvalidValue {
                key: "english_confidence_threshold".to_string(),
                value: self.english_confidence_threshold.to_string(),
                reason: "必须在 0 到 1 之间".to_string(),
            });
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn circuit_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.circuit_failure_threshold,
            cooldown: Duration::from_secs(self.circuit_cooldown_secs),
        }
    }

    pub fn quota_limits(&self) -> QuotaLimits {
        QuotaLimits {
            standard: self.standard_daily_limit,
            elevated: self.elevated_daily_limit,
        }
    }

    pub fn validator_settings(&self) -> ValidatorSettings {
        ValidatorSettings {
            min_word_count: self.min_word_count,
            max_word_count: self.max_word_count,
            english_confidence_threshold: self.english_confidence_threshold,
            ..ValidatorSettings::default()
        }
    }
}
