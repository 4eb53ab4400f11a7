//! Implementation Shortfall 슬라이스 생성기
//!
//! 긴급도에 따라 슬라이스 수와 가중 배분을 조정하는 전략

use crate::models::order::{ExecutionAlgorithm, ExecutionRequest, OrderSlice};
use crate::utils::calculate_time_slices;
use crate::utils::math::allocate_proportional;

const DEFAULT_URGENCY: f64 = 0.5;

/// 긴급도 구간별 슬라이스 수
fn slice_count(urgency: f64) -> usize {
    if urgency > 0.8 {
        5
    } else if urgency > 0.6 {
        10
    } else if urgency > 0.4 {
        15
    } else {
        20
    }
}

/// Implementation Shortfall 슬라이스 생성
///
/// 긴급도가 높으면 앞쪽 슬라이스에 수량을 몰고(조기 집행으로 기회비용
/// 축소), 낮으면 뒤쪽에 몰아 시장 영향을 줄임
pub fn generate(request: &ExecutionRequest, start_ms: i64) -> Vec<OrderSlice> {
    let urgency = request
        .params
        .urgency
        .unwrap_or(DEFAULT_URGENCY)
        .clamp(0.0, 1.0);

    let num_slices = slice_count(urgency);
    let duration_ms = request.duration_minutes as i64 * 60_000;

    let weights: Vec<f64> = (0..num_slices)
        .map(|i| {
            if urgency > 0.5 {
                (num_slices - i) as f64
            } else {
                (i + 1) as f64
            }
        })
        .collect();

    let sizes = allocate_proportional(request.quantity, &weights);
    let times = calculate_time_slices(start_ms, start_ms + duration_ms, num_slices);

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
                ExecutionAlgorithm::ImplementationShortfall,
            )
        })
        .collect()
}
