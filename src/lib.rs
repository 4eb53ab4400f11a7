//! 실시간 스트림 브로커 및 주문 집행 스케줄러 라이브러리
//!
//! 우선순위 큐 기반의 pub-sub 메시지 브로커와 여섯 가지 슬라이싱
//! 알고리즘(TWAP/VWAP/Iceberg/POV/IS/Adaptive)의 집행 엔진을 제공합니다.

pub mod broker;
pub mod config;
pub mod error;
pub mod execution;
pub mod models;
pub mod utils;

// 핵심 타입 재노출
pub use crate::error::TradingError;
pub use crate::broker::{DataAggregator, StreamBroker};
pub use crate::execution::{ExecutionScheduler, FillModel, ImpactFillModel, PassthroughFillModel};
pub use crate::models::market_data::MarketData;
pub use crate::models::message::{MessagePriority, StreamMessage};
pub use crate::models::order::{
    ExecutionAlgorithm, ExecutionParams, ExecutionRequest, ExecutionResult, OrderId, OrderSide,
    OrderSlice, OrderState,
};

/// 버전 정보
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 결과 타입 별칭
pub type Result<T> = std::result::Result<T, TradingError>;
