use std::env;
use std::fmt;

use crate::matching::matcher::MatchPolicy;

/// Distinguishes runtime behavior for different stages of the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Scoring knobs. The GPA ceiling anchors the academic interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSettings {
    pub policy: MatchPolicy,
    pub gpa_ceiling: f32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            policy: MatchPolicy::default(),
            gpa_ceiling: 4.0,
        }
    }
}

/// Ledger and transaction-retry knobs for the allocation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationSettings {
    pub institution_application_limit: u32,
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for AllocationSettings {
    fn default() -> Self {
        Self {
            institution_application_limit: 2,
            retry_attempts: 3,
            retry_base_delay_ms: 50,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Top-level configuration for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub environment: AppEnvironment,
    pub matching: MatchSettings,
    pub allocation: AllocationSettings,
    pub telemetry: TelemetryConfig,
}

impl EngineConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let matching = MatchSettings {
            policy: MatchPolicy {
                qualify_threshold: parse_threshold("MATCH_QUALIFY_THRESHOLD", 0.7)?,
                recommend_threshold: parse_threshold("MATCH_RECOMMEND_THRESHOLD", 0.8)?,
            },
            gpa_ceiling: parse_positive_f32("MATCH_GPA_CEILING", 4.0)?,
        };

        let allocation = AllocationSettings {
            institution_application_limit: parse_positive_u32(
                "INSTITUTION_APPLICATION_LIMIT",
                2,
            )?,
            retry_attempts: parse_positive_u32("TRANSACTION_RETRY_ATTEMPTS", 3)?,
            retry_base_delay_ms: parse_u64("TRANSACTION_RETRY_BASE_DELAY_MS", 50)?,
        };

        Ok(Self {
            environment,
            matching,
            allocation,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            environment: AppEnvironment::Development,
            matching: MatchSettings::default(),
            allocation: AllocationSettings::default(),
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

fn parse_threshold(key: &'static str, default: f32) -> Result<f32, ConfigError> {
    let value = parse_positive_f32(key, default)?;
    if value > 1.0 {
        return Err(ConfigError::OutOfRange { key });
    }
    Ok(value)
}

fn parse_positive_f32(key: &'static str, default: f32) -> Result<f32, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => {
            let value = raw
                .parse::<f32>()
                .map_err(|_| ConfigError::InvalidNumber { key })?;
            if value <= 0.0 {
                return Err(ConfigError::OutOfRange { key });
            }
            Ok(value)
        }
    }
}

fn parse_positive_u32(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => {
            let value = raw
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidNumber { key })?;
            if value == 0 {
                return Err(ConfigError::OutOfRange { key });
            }
            Ok(value)
        }
    }
}

fn parse_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { key: &'static str },
    OutOfRange { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a valid number")
            }
            ConfigError::OutOfRange { key } => {
                write!(f, "{key} is outside its allowed range")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("MATCH_QUALIFY_THRESHOLD");
        env::remove_var("MATCH_RECOMMEND_THRESHOLD");
        env::remove_var("MATCH_GPA_CEILING");
        env::remove_var("INSTITUTION_APPLICATION_LIMIT");
        env::remove_var("TRANSACTION_RETRY_ATTEMPTS");
        env::remove_var("TRANSACTION_RETRY_BASE_DELAY_MS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = EngineConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.matching.policy.qualify_threshold, 0.7);
        assert_eq!(config.matching.policy.recommend_threshold, 0.8);
        assert_eq!(config.allocation.institution_application_limit, 2);
        assert_eq!(config.allocation.retry_attempts, 3);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn thresholds_are_overridable_per_deployment() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MATCH_QUALIFY_THRESHOLD", "0.65");
        env::set_var("INSTITUTION_APPLICATION_LIMIT", "3");
        let config = EngineConfig::load().expect("config loads");
        assert_eq!(config.matching.policy.qualify_threshold, 0.65);
        assert_eq!(config.allocation.institution_application_limit, 3);
        reset_env();
    }

    #[test]
    fn rejects_threshold_above_one() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MATCH_QUALIFY_THRESHOLD", "1.5");
        match EngineConfig::load() {
            Err(ConfigError::OutOfRange { key }) => {
                assert_eq!(key, "MATCH_QUALIFY_THRESHOLD");
            }
            other => panic!("expected out-of-range error, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_zero_retry_attempts() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("TRANSACTION_RETRY_ATTEMPTS", "0");
        assert!(EngineConfig::load().is_err());
        reset_env();
    }
}
