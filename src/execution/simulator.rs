/**
* filename : simulator
* author : HAMA
* date: 2025. 7. 2.
* description:
**/

use mockall::automock;
use rand::Rng;

use crate::config::ExecutionConfig;
use crate::models::order::{OrderSide, OrderSlice};

/// 슬라이스 체결 기록
#[derive(Debug, Clone)]
pub struct SliceFill {
  pub slice_id: String,
  pub quantity: u64,
  pub price: f64,
}

/// 체결 가격 모델 - 교체 가능한 심플 모델
///
/// 운영에서는 이 단계가 실주문 채널 제출로 대체됨. 모델 요건은
/// 정밀도가 아니라 재현 가능한 형태임: 슬라이스 크기에 단조 증가,
/// 크기 0이면 영향 0
#[automock]
pub trait FillModel: Send + Sync {
  fn fill_price(
    &self,
    slice: &OrderSlice,
    total_quantity: u64,
    benchmark_price: f64,
    side: &OrderSide,
  ) -> f64;
}

/// 가격 영향 모델
///
/// 체결가 = 벤치마크 + 부호(방향) × 영향계수 × 벤치마크 ×
/// sqrt(슬라이스 수량 / 총 수량) + 무작위 시장 노이즈
pub struct ImpactFillModel {
  impact_coefficient: f64,
  noise_bps: f64,
}

impl ImpactFillModel {
  pub fn new(config: &ExecutionConfig) -> Self {
    ImpactFillModel {
      impact_coefficient: config.impact_coefficient,
      noise_bps: config.noise_bps,
    }
  }
}

impl FillModel for ImpactFillModel {
  fn fill_price(
    &self,
    slice: &OrderSlice,
    total_quantity: u64,
    benchmark_price: f64,
    side: &OrderSide,
  ) -> f64 {
    let share = if total_quantity > 0 {
      slice.quantity as f64 / total_quantity as f64
    } else {
      0.0
    };

    let impact = self.impact_coefficient * benchmark_price * share.sqrt() * side.sign();

    let noise = if self.noise_bps > 0.0 {
      let bps = rand::thread_rng().gen_range(-self.noise_bps..=self.noise_bps);
      benchmark_price * bps / 10_000.0
    } else {
      0.0
    };

    benchmark_price + impact + noise
  }
}

/// 노이즈/영향 없는 통과 모델 - 테스트와 드라이런에 주입
///
/// 수치 의존성이 빠져도 출력 형태가 달라지지 않도록 동일 인터페이스의
/// no-op 구현을 명시적으로 제공함
pub struct PassthroughFillModel;

impl FillModel for PassthroughFillModel {
  fn fill_price(
    &self,
    _slice: &OrderSlice,
    _total_quantity: u64,
    benchmark_price: f64,
    _side: &OrderSide,
  ) -> f64 {
    benchmark_price
  }
}
