//! 로깅 유틸리티
//!
//! 로그 초기화 함수 제공

use env_logger::Builder;
use log::LevelFilter;
use std::env;

use crate::error::TradingError;

/// 로깅 시스템 초기화
///
/// RUST_LOG 환경변수가 있으면 우선하고, 없으면 설정 파일의 레벨을 사용
pub fn init(default_level: &str) -> Result<(), TradingError> {
    let mut builder = Builder::from_default_env();

    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());

    let level_filter = match log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };

    builder
      .filter_level(level_filter)
      .format_timestamp_millis()
      .init();

    log::info!("로깅 시스템 초기화 완료: 레벨 = {}", log_level);

    Ok(())
}
