/**
* filename : config
* author : HAMA
* date: 2025. 5. 8.
* description:
**/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TradingError;

/// 기본 거래소 주소 (USDT-M 선물)
pub const DEFAULT_BASE_URL: &str = "https://fapi.binance.com";

/// API 키 환경변수
pub const API_KEY_ENV: &str = "BINANCE_API_KEY";

/// API 시크릿 환경변수
pub const API_SECRET_ENV: &str = "BINANCE_SECRET";

const ENV_PREFIX: &str = "XQUANT";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub exchange: ExchangeSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeSettings {
    pub base_url: String,
    pub recv_window_ms: u64,
    pub timeout_ms: u64,
    pub max_quantity: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        ExchangeSettings {
            base_url: DEFAULT_BASE_URL.to_string(),
            recv_window_ms: 5000,
            timeout_ms: 10000,
            max_quantity: crate::order_core::DEFAULT_MAX_QUANTITY,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            exchange: ExchangeSettings::default(),
            logging: LoggingSettings { level: "info".to_string() },
        }
    }
}

impl Settings {
    /// 설정 로드: 기본값 -> config.{toml,json} (선택) -> XQUANT__ 환경변수
    pub fn load() -> Result<Self, TradingError> {
        Self::load_from("config")
    }

    pub fn load_from(file_stem: &str) -> Result<Self, TradingError> {
        let defaults = Settings::default();

        config::Config::builder()
            .set_default("exchange.base_url", defaults.exchange.base_url)
            .and_then(|b| b.set_default("exchange.recv_window_ms", defaults.exchange.recv_window_ms as i64))
            .and_then(|b| b.set_default("exchange.timeout_ms", defaults.exchange.timeout_ms as i64))
            .and_then(|b| b.set_default("exchange.max_quantity", defaults.exchange.max_quantity.to_string()))
            .and_then(|b| b.set_default("logging.level", defaults.logging.level))
            .map_err(|e| TradingError::ConfigError(format!("Failed to set defaults: {}", e)))?
            .add_source(config::File::with_name(file_stem).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(|e| TradingError::ConfigError(format!("Failed to read config: {}", e)))?
            .try_deserialize()
            .map_err(|e| TradingError::ConfigError(format!("Failed to parse config: {}", e)))
    }
}

/// 로그와 Debug 출력에 노출되지 않는 비밀 값
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// 거래소 클라이언트 자격 증명 및 실행 모드
///
/// API 키나 시크릿이 없으면 항상 dry-run이다. 생성 후 변경 불가.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    api_key: Option<Secret>,
    api_secret: Option<Secret>,
    dry_run: bool,
}

impl ClientConfig {
    pub fn new(api_key: Option<String>, api_secret: Option<String>, dry_run: bool) -> Self {
        let api_key = api_key.filter(|v| !v.is_empty()).map(Secret::new);
        let api_secret = api_secret.filter(|v| !v.is_empty()).map(Secret::new);
        let dry_run = dry_run || api_key.is_none() || api_secret.is_none();

        ClientConfig { api_key, api_secret, dry_run }
    }

    /// Simulation-only config without credentials.
    pub fn simulated() -> Self {
        ClientConfig::new(None, None, true)
    }

    /// 명시 인자 -> 환경변수 -> 없음 순서로 자격 증명 결정
    pub fn resolve(api_key: Option<String>, api_secret: Option<String>, dry_run: bool) -> Self {
        Self::resolve_with(api_key, api_secret, dry_run, |name| std::env::var(name).ok())
    }

    pub fn resolve_with<F>(api_key: Option<String>, api_secret: Option<String>, dry_run: bool, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = api_key.or_else(|| lookup(API_KEY_ENV));
        let api_secret = api_secret.or_else(|| lookup(API_SECRET_ENV));
        ClientConfig::new(api_key, api_secret, dry_run)
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Key and secret, only when live trading is enabled.
    pub fn credentials(&self) -> Option<(&Secret, &Secret)> {
        if self.dry_run {
            return None;
        }
        match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) => Some((key, secret)),
            _ => None,
        }
    }
}
