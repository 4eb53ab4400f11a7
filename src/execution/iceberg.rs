//! Iceberg 슬라이스 생성기
//!
//! 고정 노출 수량으로 잘게 쪼개고 잔여 수량은 메타데이터로 추적

use serde_json::json;

use crate::config::ExecutionConfig;
use crate::error::TradingError;
use crate::models::order::{ExecutionAlgorithm, ExecutionRequest, OrderSlice};

/// 클립 간 간격 (밀리초)
const CLIP_SPACING_MS: i64 = 5000;

/// 노출 클립은 일반 슬라이스보다 긴급도를 높게 태깅
const DEFAULT_URGENCY: f64 = 0.7;

/// Iceberg 슬라이스 생성
///
/// 슬라이스 수 = max(1, quantity / visible), 나머지는 마지막 클립에 합산
pub fn generate(
    request: &ExecutionRequest,
    config: &ExecutionConfig,
    start_ms: i64,
) -> Result<Vec<OrderSlice>, TradingError> {
    let visible = request
        .params
        .visible_quantity
        .unwrap_or(config.default_visible_quantity);

    if visible == 0 {
        return Err(TradingError::InvalidParameter(
            "visible_quantity must be positive".to_string(),
        ));
    }

    let visible = visible.min(request.quantity.max(1));
    let num_slices = ((request.quantity / visible) as usize).max(1);
    let urgency = request.params.urgency.unwrap_or(DEFAULT_URGENCY);

    let mut slices = Vec::with_capacity(num_slices);
    let mut shown: u64 = 0;

    for i in 0..num_slices {
        // 마지막 클립에 나머지 수량 합산
        let quantity = if i == num_slices - 1 {
            request.quantity - shown
        } else {
            visible
        };
        shown += quantity;

        let hidden_remaining = request.quantity - shown;
        let slice = OrderSlice::new(
            request.order_id.clone(),
            request.symbol.clone(),
            quantity,
            start_ms + i as i64 * CLIP_SPACING_MS,
            urgency,
            ExecutionAlgorithm::Iceberg,
        )
        .with_metadata("visible_quantity", json!(visible))
        .with_metadata("hidden_remaining", json!(hidden_remaining));

        slices.push(slice);
    }

    Ok(slices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::{ExecutionParams, OrderSide};

    fn request(quantity: u64, visible: Option<u64>) -> ExecutionRequest {
        ExecutionRequest::new(
            "ord-1",
            "BTCUSDT",
            OrderSide::Buy,
            quantity,
            ExecutionAlgorithm::Iceberg,
            30,
            50000.0,
        )
        .with_params(ExecutionParams {
            visible_quantity: visible,
            ..Default::default()
        })
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

    #[test]
    fn test_even_clips() {
        let slices = generate(&request(5000, Some(1000)), &config(), 0).unwrap();
        assert_eq!(slices.len(), 5);
        assert!(slices.iter().all(|s| s.quantity == 1000));
    }

    #[test]
    fn test_remainder_folded_into_last_clip() {
        let slices = generate(&request(5500, Some(1000)), &config(), 0).unwrap();
        assert_eq!(slices.len(), 5);
        assert_eq!(slices[4].quantity, 1500);

        let total: u64 = slices.iter().map(|s| s.quantity).sum();
        assert_eq!(total, 5500);
    }

    #[test]
    fn test_small_order_single_clip() {
        let slices = generate(&request(500, Some(1000)), &config(), 0).unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].quantity, 500);
    }

    #[test]
    fn test_hidden_remaining_metadata() {
        let slices = generate(&request(3000, Some(1000)), &config(), 0).unwrap();
        assert_eq!(slices[0].metadata["hidden_remaining"], 2000);
        assert_eq!(slices[2].metadata["hidden_remaining"], 0);
    }

    #[test]
    fn test_clip_spacing_and_urgency() {
        let slices = generate(&request(3000, Some(1000)), &config(), 1000).unwrap();
        assert_eq!(slices[1].scheduled_time - slices[0].scheduled_time, 5000);
        assert!(slices[0].urgency > 0.5);
    }

    #[test]
    fn test_zero_visible_rejected() {
        let result = generate(&request(3000, Some(0)), &config(), 0);
        assert!(matches!(result, Err(TradingError::InvalidParameter(_))));
    }
}
