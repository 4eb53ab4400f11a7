/**
* filename : config
* author : HAMA
* date: 2025. 7. 2.
* description:
**/

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::TradingError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub broker: BrokerConfig,
    pub execution: ExecutionConfig,
    pub aggregator: AggregatorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// 최대 동시 연결 수
    pub max_connections: usize,
    /// 연결당 큐 용량 (우선순위 전체 합산)
    pub queue_capacity: usize,
    /// 채널 히스토리 보존 개수
    pub history_size: usize,
    /// 연결당 초당 메시지 예산 (권고용 슬라이딩 윈도우)
    pub rate_limit_per_sec: usize,
    /// 비활성 연결 정리 기준 (초)
    pub inactive_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// 가격 영향 계수
    pub impact_coefficient: f64,
    /// 시장 노이즈 범위 (bps)
    pub noise_bps: f64,
    /// Iceberg 기본 노출 수량
    pub default_visible_quantity: u64,
    /// POV 기본 참여율
    pub default_participation_rate: f64,
    /// 시장 데이터 부재 시 가정하는 구간당 시장 거래량
    pub assumed_interval_volume: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// 채널당 최대 배치 크기
    pub max_batch_size: usize,
    /// 배치 최대 지연 (밀리초)
    pub max_batch_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
}

impl Config {
    /// Load configuration from a file
    pub fn load() -> Result<Self, TradingError> {
        // Try to load from config.json
        let config_path = Path::new("config.json");

        if config_path.exists() {
            let mut file = File::open(config_path)
                .map_err(|e| TradingError::ConfigError(format!("Failed to open config file: {}", e)))?;

            let mut contents = String::new();
            file.read_to_string(&mut contents)
                .map_err(|e| TradingError::ConfigError(format!("Failed to read config file: {}", e)))?;

            let mut cfg: Config = serde_json::from_str(&contents)
                .map_err(|e| TradingError::ConfigError(format!("Failed to parse config file: {}", e)))?;
            // environment overrides
            cfg.apply_env_overrides();
            Ok(cfg)
        } else {
            // Return default configuration
            let mut cfg = Config::default();
            cfg.apply_env_overrides();
            Ok(cfg)
        }
    }

    /// Apply environment variable overrides for runtime tuning
    fn apply_env_overrides(&mut self) {
        use std::env;
        if let Ok(v) = env::var("MAX_CONNECTIONS") {
            if let Ok(n) = v.parse() { self.broker.max_connections = n; }
        }
        if let Ok(v) = env::var("QUEUE_CAPACITY") {
            if let Ok(n) = v.parse() { self.broker.queue_capacity = n; }
        }
        if let Ok(v) = env::var("RATE_LIMIT_PER_SEC") {
            if let Ok(n) = v.parse() { self.broker.rate_limit_per_sec = n; }
        }
        if let Ok(v) = env::var("IMPACT_COEFFICIENT") {
            if let Ok(n) = v.parse() { self.execution.impact_coefficient = n; }
        }
        if let Ok(v) = env::var("LOG_LEVEL") {
            if !v.is_empty() { self.logging.level = v; }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            broker: BrokerConfig {
                max_connections: 100,
                queue_capacity: 500,
                history_size: 100,
                rate_limit_per_sec: 100,
                inactive_timeout_secs: 300,
            },
            execution: ExecutionConfig {
                impact_coefficient: 0.001,
                noise_bps: 2.0,
                default_visible_quantity: 1000,
                default_participation_rate: 0.1,
                assumed_interval_volume: 10_000.0,
            },
            aggregator: AggregatorConfig {
                max_batch_size: 50,
                max_batch_delay_ms: 200,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
            },
        }
    }
}
