//! POV 슬라이스 생성기
//!
//! 구간당 시장 거래량의 참여율만큼만 집행하는 수동적 전략

use crate::config::ExecutionConfig;
use crate::models::market_data::MarketData;
use crate::models::order::{ExecutionAlgorithm, ExecutionRequest, OrderSlice};
use crate::utils::math::average;

/// 구간 길이 (밀리초)
const INTERVAL_MS: i64 = 60_000;

const DEFAULT_URGENCY: f64 = 0.4;

/// POV 슬라이스 생성
///
/// 슬라이스 크기 = 구간당 시장 거래량 × 참여율 (잔여 수량으로 상한).
/// 잔여 수량이 없으면 즉시 종료함
pub fn generate(
    request: &ExecutionRequest,
    samples: &[MarketData],
    config: &ExecutionConfig,
    start_ms: i64,
) -> Vec<OrderSlice> {
    let rate = request
        .params
        .participation_rate
        .unwrap_or(config.default_participation_rate)
        .clamp(0.01, 1.0);

    let volumes: Vec<f64> = samples.iter().map(|s| s.volume).collect();
    let interval_volume = average(&volumes)
        .filter(|v| *v > 0.0)
        .unwrap_or(config.assumed_interval_volume);

    let per_slice = ((interval_volume * rate).round() as u64).max(1);
    let urgency = request.params.urgency.unwrap_or(DEFAULT_URGENCY);

    let mut slices = Vec::new();
    let mut remaining = request.quantity;
    let mut index: i64 = 0;

    while remaining > 0 {
        let quantity = per_slice.min(remaining);
        remaining -= quantity;

        slices.push(OrderSlice::new(
            request.order_id.clone(),
            request.symbol.clone(),
            quantity,
            start_ms + index * INTERVAL_MS,
            urgency,
            ExecutionAlgorithm::Pov,
        ));

        index += 1;
    }

    slices
}
