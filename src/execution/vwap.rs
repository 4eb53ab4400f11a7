//! VWAP 슬라이스 생성기
//!
//! 과거 거래량 프로파일에 비례하는 크기로 슬라이스를 배분

use crate::error::TradingError;
use crate::models::market_data::MarketData;
use crate::models::order::{ExecutionAlgorithm, ExecutionRequest, OrderSlice};
use crate::utils::calculate_time_slices;
use crate::utils::math::allocate_proportional;

/// 프로파일 산출에 필요한 최소 샘플 수
pub const MIN_SAMPLES: usize = 10;

/// TWAP과 동일한 버킷 수 상한
const MAX_SLICES: usize = 20;

const DEFAULT_URGENCY: f64 = 0.5;

/// VWAP 슬라이스 생성
///
/// 샘플이 10개 미만이면 InsufficientMarketData를 반환하고
/// 호출자가 TWAP 스케줄로 강등함 (에러가 아닌 경고 로그로 처리)
pub fn generate(
    request: &ExecutionRequest,
    samples: &[MarketData],
    start_ms: i64,
) -> Result<Vec<OrderSlice>, TradingError> {
    if samples.len() < MIN_SAMPLES {
        return Err(TradingError::InsufficientMarketData {
            required: MIN_SAMPLES,
            available: samples.len(),
        });
    }

    let num_slices = (request.duration_minutes as usize).clamp(1, MAX_SLICES);
    let duration_ms = request.duration_minutes as i64 * 60_000;

    // 샘플을 슬라이스 수만큼의 버킷으로 나눠 거래량 프로파일 산출
    let weights = volume_profile(samples, num_slices);
    let sizes = allocate_proportional(request.quantity, &weights);
    let times = calculate_time_slices(start_ms, start_ms + duration_ms, num_slices);
    let urgency = request.params.urgency.unwrap_or(DEFAULT_URGENCY);

    let window_vwap = volume_weighted_price(samples);

    let slices = sizes
        .into_iter()
        .zip(times)
        .map(|(quantity, scheduled_time)| {
            let slice = OrderSlice::new(
                request.order_id.clone(),
                request.symbol.clone(),
                quantity,
                scheduled_time,
                urgency,
                ExecutionAlgorithm::Vwap,
            );

            match window_vwap {
                Some(price) => slice.with_limit_price(price),
                None => slice,
            }
        })
        .collect();

    Ok(slices)
}

/// 샘플 구간별 거래량 합계를 버킷 가중치로 사용
fn volume_profile(samples: &[MarketData], num_buckets: usize) -> Vec<f64> {
    let mut weights = vec![0.0; num_buckets];
    let bucket_span = (samples.len() as f64 / num_buckets as f64).max(1.0);

    for (i, sample) in samples.iter().enumerate() {
        let bucket = ((i as f64 / bucket_span) as usize).min(num_buckets - 1);
        weights[bucket] += sample.volume.max(0.0);
    }

    weights
}

/// 윈도우 전체의 거래량 가중 평균 가격
fn volume_weighted_price(samples: &[MarketData]) -> Option<f64> {
    let total_volume: f64 = samples.iter().map(|s| s.volume).sum();
    if total_volume <= 0.0 {
        return None;
    }

    let weighted: f64 = samples.iter().map(|s| s.price * s.volume).sum();
    Some(weighted / total_volume)
}
