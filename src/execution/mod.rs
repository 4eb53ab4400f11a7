//! 알고리즘 주문 집행의 핵심 구현체

pub mod adaptive;
pub mod iceberg;
pub mod pov;
pub mod scheduler;
pub mod shortfall;
pub mod simulator;
pub mod twap;
pub mod vwap;

pub use scheduler::ExecutionScheduler;
pub use simulator::{FillModel, ImpactFillModel, PassthroughFillModel};

use crate::config::ExecutionConfig;
use crate::error::TradingError;
use crate::models::market_data::MarketData;
use crate::models::order::{ExecutionAlgorithm, ExecutionRequest, OrderSlice};

/// 알고리즘별 슬라이스 생성 디스패치
///
/// 닫힌 타입에 대한 완전 매칭이므로 알고리즘 추가 시 컴파일 에러로
/// 누락이 드러남. VWAP의 샘플 부족은 경고 로그와 함께 TWAP 스케줄로
/// 강등됨 - 주문 제출자에게는 에러로 노출되지 않음
pub fn generate_slices(
    request: &ExecutionRequest,
    samples: &[MarketData],
    config: &ExecutionConfig,
    start_ms: i64,
) -> Result<Vec<OrderSlice>, TradingError> {
    match request.algorithm {
        ExecutionAlgorithm::Twap => Ok(twap::generate(request, start_ms)),
        ExecutionAlgorithm::Vwap => match vwap::generate(request, samples, start_ms) {
            Ok(slices) => Ok(slices),
            Err(TradingError::InsufficientMarketData { required, available }) => {
                log::warn!(
                    "VWAP 강등: 샘플 {}개 < 필요 {}개, TWAP 스케줄 사용 ({})",
                    available,
                    required,
                    request.order_id
                );
                Ok(twap::generate(request, start_ms))
            }
            Err(e) => Err(e),
        },
        ExecutionAlgorithm::Iceberg => iceberg::generate(request, config, start_ms),
        ExecutionAlgorithm::Pov => Ok(pov::generate(request, samples, config, start_ms)),
        ExecutionAlgorithm::ImplementationShortfall => Ok(shortfall::generate(request, start_ms)),
        ExecutionAlgorithm::Adaptive => Ok(adaptive::generate(request, samples, config, start_ms)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::OrderSide;

    #[test]
    fn test_vwap_degrades_to_twap_schedule() {
        let request = ExecutionRequest::new(
            "ord-1",
            "BTCUSDT",
            OrderSide::Buy,
            10000,
            ExecutionAlgorithm::Vwap,
            30,
            50000.0,
        );
        let config = ExecutionConfig {
            impact_coefficient: 0.001,
            noise_bps: 0.0,
            default_visible_quantity: 1000,
            default_participation_rate: 0.1,
            assumed_interval_volume: 10_000.0,
        };

        // 샘플 부족 - TWAP과 동일한 크기/스케줄이어야 함
        let degraded = generate_slices(&request, &[], &config, 1000).unwrap();
        let twap_slices = twap::generate(&request, 1000);

        assert_eq!(degraded.len(), twap_slices.len());
        for (a, b) in degraded.iter().zip(twap_slices.iter()) {
            assert_eq!(a.quantity, b.quantity);
            assert_eq!(a.scheduled_time, b.scheduled_time);
        }
    }
}
