use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::TradingError;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, Hash, PartialEq)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// 가격 영향 부호 (매수는 벤치마크 위로, 매도는 아래로)
    pub fn sign(&self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }
}

/// 집행 알고리즘 (닫힌 타입 - 알고리즘 추가는 컴파일 타임에 검증됨)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ExecutionAlgorithm {
    Twap,
    Vwap,
    Iceberg,
    Pov,
    ImplementationShortfall,
    Adaptive,
}

impl ExecutionAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionAlgorithm::Twap => "TWAP",
            ExecutionAlgorithm::Vwap => "VWAP",
            ExecutionAlgorithm::Iceberg => "ICEBERG",
            ExecutionAlgorithm::Pov => "POV",
            ExecutionAlgorithm::ImplementationShortfall => "IMPLEMENTATION_SHORTFALL",
            ExecutionAlgorithm::Adaptive => "ADAPTIVE",
        }
    }
}

impl FromStr for ExecutionAlgorithm {
    type Err = TradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TWAP" => Ok(ExecutionAlgorithm::Twap),
            "VWAP" => Ok(ExecutionAlgorithm::Vwap),
            "ICEBERG" => Ok(ExecutionAlgorithm::Iceberg),
            "POV" => Ok(ExecutionAlgorithm::Pov),
            "IMPLEMENTATION_SHORTFALL" | "IS" => Ok(ExecutionAlgorithm::ImplementationShortfall),
            "ADAPTIVE" => Ok(ExecutionAlgorithm::Adaptive),
            _ => Err(TradingError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for ExecutionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 주문 집행 상태 머신
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum OrderState {
    Pending,
    Scheduled,
    PartiallyExecuted,
    Completed,
    Cancelled,
}

impl OrderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Completed | OrderState::Cancelled)
    }
}

/// 부모 주문에서 분할된 자식 슬라이스
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSlice {
    pub id: String,
    pub parent_order_id: OrderId,
    pub symbol: String,
    pub quantity: u64,
    pub limit_price: Option<f64>,
    pub scheduled_time: i64,
    pub urgency: f64,
    pub algorithm: ExecutionAlgorithm,
    pub metadata: HashMap<String, Value>,
}

impl OrderSlice {
    pub fn new(
        parent_order_id: OrderId,
        symbol: impl Into<String>,
        quantity: u64,
        scheduled_time: i64,
        urgency: f64,
        algorithm: ExecutionAlgorithm,
    ) -> Self {
        OrderSlice {
            id: uuid::Uuid::new_v4().to_string(),
            parent_order_id,
            symbol: symbol.into(),
            quantity,
            limit_price: None,
            scheduled_time,
            urgency,
            algorithm,
            metadata: HashMap::new(),
        }
    }

    pub fn with_limit_price(mut self, limit_price: f64) -> Self {
        self.limit_price = Some(limit_price);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// 알고리즘별 추가 파라미터
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Iceberg 노출 수량
    pub visible_quantity: Option<u64>,
    /// POV 참여율 (0~1)
    pub participation_rate: Option<f64>,
    /// Implementation Shortfall 긴급도 (0~1)
    pub urgency: Option<f64>,
}

/// 주문 집행 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub order_id: OrderId,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: u64,
    pub algorithm: ExecutionAlgorithm,
    pub duration_minutes: u32,
    pub benchmark_price: f64,
    pub params: ExecutionParams,
}

impl ExecutionRequest {
    pub fn new(
        order_id: impl Into<String>,
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: u64,
        algorithm: ExecutionAlgorithm,
        duration_minutes: u32,
        benchmark_price: f64,
    ) -> Self {
        ExecutionRequest {
            order_id: OrderId(order_id.into()),
            symbol: symbol.into(),
            side,
            quantity,
            algorithm,
            duration_minutes,
            benchmark_price,
            params: ExecutionParams::default(),
        }
    }

    pub fn with_params(mut self, params: ExecutionParams) -> Self {
        self.params = params;
        self
    }
}

/// 집행 결과 - execute 호출당 정확히 한 번 생성되며 이후 불변
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub order_id: OrderId,
    pub symbol: String,
    pub requested_quantity: u64,
    pub executed_quantity: u64,
    pub slices_executed: usize,
    pub slices_total: usize,
    pub average_price: f64,
    pub total_cost: f64,
    pub slippage: f64,
    pub slippage_bps: f64,
    pub success: bool,
    pub error_message: Option<String>,
    pub algorithm: String,
}

impl ExecutionResult {
    /// 실패 결과 생성 - 집행 경로는 예외를 던지지 않고 항상 결과 객체를 반환함
    pub fn failure(
        order_id: OrderId,
        symbol: impl Into<String>,
        requested_quantity: u64,
        algorithm: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        ExecutionResult {
            order_id,
            symbol: symbol.into(),
            requested_quantity,
            executed_quantity: 0,
            slices_executed: 0,
            slices_total: 0,
            average_price: 0.0,
            total_cost: 0.0,
            slippage: 0.0,
            slippage_bps: 0.0,
            success: false,
            error_message: Some(error_message.into()),
            algorithm: algorithm.into(),
        }
    }
}
