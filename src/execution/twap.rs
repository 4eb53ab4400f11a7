//! TWAP 슬라이스 생성기
//!
//! 시간 가중 - 실행 구간에 균등 크기 슬라이스를 고르게 배치

use crate::models::order::{ExecutionAlgorithm, ExecutionRequest, OrderSlice};
use crate::utils::calculate_time_slices;
use crate::utils::math::split_even;

/// 슬라이스 수 상한
const MAX_SLICES: usize = 20;

/// TWAP 기본 긴급도
const DEFAULT_URGENCY: f64 = 0.5;

/// TWAP 슬라이스 생성
///
/// min(duration_minutes, 20)개의 균등 슬라이스를 구간에 고르게 배치.
/// 나머지 수량은 앞쪽 슬라이스부터 1단위씩 배분되어 합이 정확히
/// 요청 수량과 같음
pub fn generate(request: &ExecutionRequest, start_ms: i64) -> Vec<OrderSlice> {
    let num_slices = (request.duration_minutes as usize).clamp(1, MAX_SLICES);
    let duration_ms = request.duration_minutes as i64 * 60_000;

    let sizes = split_even(request.quantity, num_slices);
    let times = calculate_time_slices(start_ms, start_ms + duration_ms, num_slices);
    let urgency = request.params.urgency.unwrap_or(DEFAULT_URGENCY);

    sizes
        .into_iter()
        .zip(times)
        .map(|(quantity, scheduled_time)| {
            OrderSlice::new(
                request.order_id.clone(),
                request.symbol.clone(),
                quantity,
                scheduled_time,
                urgency,
                ExecutionAlgorithm::Twap,
            )
        })
        .collect()
}
