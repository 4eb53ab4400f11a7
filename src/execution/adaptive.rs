//! Adaptive 슬라이스 생성기
//!
//! 최근 시장 상태를 보고 TWAP/POV/VWAP 중 하나로 위임

use crate::config::ExecutionConfig;
use crate::error::TradingError;
use crate::execution::{pov, twap, vwap};
use crate::models::market_data::MarketData;
use crate::models::order::{ExecutionRequest, OrderSlice};
use crate::utils::math::{average, returns_volatility};

/// 상태 판정에 사용하는 최근 샘플 수
const LOOKBACK: usize = 10;

/// 수익률 변동성 임계값 - 초과 시 단순 시간 분할이 더 안전
const VOLATILITY_THRESHOLD: f64 = 0.02;

/// 직전 거래량이 최근 평균의 이 배수를 넘으면 거래량 급증으로 판정
const VOLUME_SPIKE_RATIO: f64 = 2.0;

/// Adaptive 슬라이스 생성
///
/// 변동성 급등 → TWAP, 거래량 급증 → POV, 평상시 → VWAP.
/// 시장 데이터가 없으면 TWAP으로 위임
pub fn generate(
    request: &ExecutionRequest,
    samples: &[MarketData],
    config: &ExecutionConfig,
    start_ms: i64,
) -> Vec<OrderSlice> {
    if samples.len() < 2 {
        log::info!("Adaptive: 시장 데이터 없음 → TWAP 위임 ({})", request.order_id);
        return twap::generate(request, start_ms);
    }

    let recent = &samples[samples.len().saturating_sub(LOOKBACK)..];
    let prices: Vec<f64> = recent.iter().map(|s| s.price).collect();

    if let Some(volatility) = returns_volatility(&prices) {
        if volatility > VOLATILITY_THRESHOLD {
            log::info!(
                "Adaptive: 변동성 {:.4} > {:.4} → TWAP 위임 ({})",
                volatility,
                VOLATILITY_THRESHOLD,
                request.order_id
            );
            return twap::generate(request, start_ms);
        }
    }

    let last_volume = recent.last().map(|s| s.volume).unwrap_or(0.0);
    let prior_volumes: Vec<f64> = recent[..recent.len() - 1].iter().map(|s| s.volume).collect();

    if let Some(avg_volume) = average(&prior_volumes) {
        if avg_volume > 0.0 && last_volume > avg_volume * VOLUME_SPIKE_RATIO {
            log::info!(
                "Adaptive: 거래량 급증 {:.1} > {:.1}×{} → POV 위임 ({})",
                last_volume,
                avg_volume,
                VOLUME_SPIKE_RATIO,
                request.order_id
            );
            return pov::generate(request, samples, config, start_ms);
        }
    }

    match vwap::generate(request, samples, start_ms) {
        Ok(slices) => {
            log::info!("Adaptive: 평상 상태 → VWAP 위임 ({})", request.order_id);
            slices
        }
        Err(TradingError::InsufficientMarketData { .. }) => {
            log::info!("Adaptive: 샘플 부족 → TWAP 위임 ({})", request.order_id);
            twap::generate(request, start_ms)
        }
        Err(_) => twap::generate(request, start_ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::{ExecutionAlgorithm, OrderSide};

    fn request(quantity: u64) -> ExecutionRequest {
        ExecutionRequest::new(
            "ord-1",
            "BTCUSDT",
            OrderSide::Buy,
            quantity,
            ExecutionAlgorithm::Adaptive,
            30,
            50000.0,
        )
    }

    fn config() -> ExecutionConfig {
        ExecutionConfig {
            impact_coefficient: 0.001,
            noise_bps: 0.0,
            default_visible_quantity: 1000,
            default_participation_rate: 0.1,
            assumed_interval_volume: 10_000.0,
        }
    }

    fn sample(i: i64, price: f64, volume: f64) -> MarketData {
        MarketData::new("BTCUSDT", i * 60_000, price, volume, price - 1.0, price + 1.0)
    }

    #[test]
    fn test_no_data_delegates_to_twap() {
        let slices = generate(&request(10000), &[], &config(), 0);
        assert_eq!(slices.len(), 20);
        assert!(slices.iter().all(|s| s.algorithm == ExecutionAlgorithm::Twap));
    }

    #[test]
    fn test_high_volatility_delegates_to_twap() {
        let samples: Vec<MarketData> = (0..12)
            .map(|i| {
                let price = if i % 2 == 0 { 50000.0 } else { 53000.0 };
                sample(i, price, 10.0)
            })
            .collect();

        let slices = generate(&request(10000), &samples, &config(), 0);
        assert!(slices.iter().all(|s| s.algorithm == ExecutionAlgorithm::Twap));
    }

    #[test]
    fn test_volume_spike_delegates_to_pov() {
        let mut samples: Vec<MarketData> = (0..11).map(|i| sample(i, 50000.0, 10.0)).collect();
        samples.push(sample(11, 50000.0, 100.0));

        let slices = generate(&request(5000), &samples, &config(), 0);
        assert!(slices.iter().all(|s| s.algorithm == ExecutionAlgorithm::Pov));
    }

    #[test]
    fn test_calm_market_delegates_to_vwap() {
        let samples: Vec<MarketData> = (0..15)
            .map(|i| sample(i, 50000.0 + i as f64, 10.0 + i as f64 * 0.1))
            .collect();

        let slices = generate(&request(10000), &samples, &config(), 0);
        assert!(slices.iter().all(|s| s.algorithm == ExecutionAlgorithm::Vwap));
    }
}
