//! 집행 알고리즘 통합 테스트
//!
//! 슬라이스 생성기 공통 성질과 스케줄러 집행 시나리오

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use xStream::config::ExecutionConfig;
use xStream::execution::{generate_slices, ExecutionScheduler, FillModel, PassthroughFillModel};
use xStream::models::market_data::MarketData;
use xStream::models::order::{
  ExecutionAlgorithm, ExecutionParams, ExecutionRequest, OrderId, OrderSide, OrderSlice,
  OrderState,
};
use xStream::ImpactFillModel;

fn config() -> ExecutionConfig {
  ExecutionConfig {
    impact_coefficient: 0.001,
    noise_bps: 0.0,
    default_visible_quantity: 1000,
    default_participation_rate: 0.1,
    assumed_interval_volume: 10_000.0,
  }
}

fn request(algorithm: ExecutionAlgorithm, quantity: u64, duration: u32) -> ExecutionRequest {
  ExecutionRequest::new(
    "ord-1",
    "BTCUSDT",
    OrderSide::Buy,
    quantity,
    algorithm,
    duration,
    50000.0,
  )
}

fn samples(count: usize) -> Vec<MarketData> {
  (0..count)
    .map(|i| {
      MarketData::new(
        "BTCUSDT",
        i as i64 * 60_000,
        50000.0 + (i % 5) as f64,
        10.0 + i as f64,
        49999.0,
        50001.0,
      )
    })
    .collect()
}

#[test]
fn test_all_algorithms_preserve_total_quantity() {
  let config = config();
  let samples = samples(40);
  let quantity = 10_007;

  for algorithm in [
    ExecutionAlgorithm::Twap,
    ExecutionAlgorithm::Vwap,
    ExecutionAlgorithm::Iceberg,
    ExecutionAlgorithm::Pov,
    ExecutionAlgorithm::ImplementationShortfall,
    ExecutionAlgorithm::Adaptive,
  ] {
    let slices = generate_slices(&request(algorithm, quantity, 30), &samples, &config, 0)
      .unwrap_or_else(|e| panic!("{}: {}", algorithm, e));

    let total: u64 = slices.iter().map(|s| s.quantity).sum();
    assert_eq!(total, quantity, "{}", algorithm);
    assert!(!slices.is_empty(), "{}", algorithm);
    assert!(slices.iter().all(|s| s.quantity > 0), "{}", algorithm);
  }
}

#[test]
fn test_twap_even_split_scenario() {
  // 10000 수량 / 30분 → 20개 슬라이스 × 500
  let slices =
    generate_slices(&request(ExecutionAlgorithm::Twap, 10_000, 30), &[], &config(), 0).unwrap();

  assert_eq!(slices.len(), 20);
  assert!(slices.iter().all(|s| s.quantity == 500));

  // 90초 간격 등분 스케줄
  for pair in slices.windows(2) {
    assert_eq!(pair[1].scheduled_time - pair[0].scheduled_time, 90_000);
  }
}

#[test]
fn test_twap_uneven_within_one_unit() {
  let slices =
    generate_slices(&request(ExecutionAlgorithm::Twap, 10_003, 30), &[], &config(), 0).unwrap();

  let min = slices.iter().map(|s| s.quantity).min().unwrap();
  let max = slices.iter().map(|s| s.quantity).max().unwrap();
  assert!(max - min <= 1);
}

#[test]
fn test_iceberg_clip_count_scenario() {
  // 5500 수량, 노출 1000 → 클립 5개, 마지막에 나머지 합산
  let request = request(ExecutionAlgorithm::Iceberg, 5_500, 30).with_params(ExecutionParams {
    visible_quantity: Some(1000),
    ..Default::default()
  });

  let slices = generate_slices(&request, &[], &config(), 0).unwrap();
  assert_eq!(slices.len(), 5);
  assert_eq!(slices[4].quantity, 1500);
  assert_eq!(slices[0].metadata["visible_quantity"], 1000);
}

#[test]
fn test_vwap_without_samples_degrades_to_twap() {
  let vwap = generate_slices(&request(ExecutionAlgorithm::Vwap, 10_000, 30), &[], &config(), 0)
    .unwrap();
  let twap = generate_slices(&request(ExecutionAlgorithm::Twap, 10_000, 30), &[], &config(), 0)
    .unwrap();

  assert_eq!(vwap.len(), twap.len());
  for (a, b) in vwap.iter().zip(twap.iter()) {
    assert_eq!(a.quantity, b.quantity);
    assert_eq!(a.scheduled_time, b.scheduled_time);
  }
}

#[tokio::test]
async fn test_scheduler_end_to_end_with_impact_model() {
  let config = config();
  let scheduler = ExecutionScheduler::new(config.clone(), Box::new(ImpactFillModel::new(&config)));

  let result = scheduler
    .execute(request(ExecutionAlgorithm::Twap, 10_000, 30))
    .await;

  assert!(result.success);
  assert_eq!(result.executed_quantity, 10_000);
  assert_eq!(result.slices_executed, result.slices_total);

  // 매수 주문이므로 영향 모델에서 평균가는 벤치마크 위
  assert!(result.average_price > 50000.0);
  assert!(result.slippage > 0.0);
  assert!((result.slippage_bps - result.slippage / 50000.0 * 10_000.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_scheduler_vwap_uses_recorded_market_data() {
  let scheduler = ExecutionScheduler::new(config(), Box::new(PassthroughFillModel));

  for sample in samples(30) {
    scheduler.record_market_data(sample).await;
  }

  let result = scheduler
    .execute(request(ExecutionAlgorithm::Vwap, 5_000, 15))
    .await;

  assert!(result.success);
  assert_eq!(result.executed_quantity, 5_000);
  assert_eq!(result.algorithm, "VWAP");
}

#[tokio::test]
async fn test_scheduler_rejects_live_duplicate_but_allows_reuse() {
  let scheduler = Arc::new(ExecutionScheduler::new(config(), Box::new(PassthroughFillModel)));

  let first = scheduler
    .execute(request(ExecutionAlgorithm::Twap, 1_000, 5))
    .await;
  assert!(first.success);
  assert_eq!(
    scheduler.order_state(&OrderId("ord-1".to_string())).await,
    Some(OrderState::Completed)
  );

  // 종결된 주문 ID는 재사용 가능
  let second = scheduler
    .execute(request(ExecutionAlgorithm::Twap, 1_000, 5))
    .await;
  assert!(second.success);
}

#[tokio::test]
async fn test_scheduler_unknown_algorithm_fails_without_panic() {
  let scheduler = ExecutionScheduler::new(config(), Box::new(PassthroughFillModel));

  let result = scheduler
    .execute_named(
      "ord-x",
      "BTCUSDT",
      OrderSide::Buy,
      1_000,
      "MAGIC",
      10,
      50000.0,
      ExecutionParams::default(),
    )
    .await;

  assert!(!result.success);
  assert_eq!(result.executed_quantity, 0);
  assert_eq!(result.slices_total, 0);

  let stats = scheduler.stats();
  assert_eq!(stats.orders_failed, 1);
  assert_eq!(stats.orders_executed, 0);
}

/// 슬라이스마다 허가를 기다리는 체결 모델 - 집행 중간에 취소를
/// 끼워 넣기 위한 테스트 전용 게이트
struct GatedFillModel {
  permits: Mutex<mpsc::Receiver<()>>,
}

impl FillModel for GatedFillModel {
  fn fill_price(
    &self,
    _slice: &OrderSlice,
    _total_quantity: u64,
    benchmark_price: f64,
    _side: &OrderSide,
  ) -> f64 {
    if let Ok(permits) = self.permits.lock() {
      let _ = permits.recv();
    }
    benchmark_price
  }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_mid_execution_stops_remaining_slices() {
  let (permit_tx, permit_rx) = mpsc::channel();
  let scheduler = Arc::new(ExecutionScheduler::new(
    config(),
    Box::new(GatedFillModel {
      permits: Mutex::new(permit_rx),
    }),
  ));

  let handle = {
    let scheduler = scheduler.clone();
    tokio::spawn(async move {
      scheduler
        .execute(request(ExecutionAlgorithm::Twap, 10_000, 30))
        .await
    })
  };

  // 슬라이스 3개만 체결시키고 취소
  for _ in 0..3 {
    permit_tx.send(()).unwrap();
  }
  tokio::time::sleep(Duration::from_millis(100)).await;

  assert!(scheduler.cancel(&OrderId("ord-1".to_string())).await);

  // 남은 허가를 풀어도 취소 플래그가 나머지 슬라이스를 막아야 함
  drop(permit_tx);

  let result = handle.await.unwrap();
  assert!(!result.success);
  assert!(result.slices_executed < result.slices_total);
  assert_eq!(result.executed_quantity, result.slices_executed as u64 * 500);
  assert!(result.error_message.is_some());

  assert_eq!(
    scheduler.order_state(&OrderId("ord-1".to_string())).await,
    Some(OrderState::Cancelled)
  );
  assert_eq!(scheduler.stats().orders_cancelled, 1);
}

#[tokio::test]
async fn test_cancel_before_and_after_execution() {
  let scheduler = ExecutionScheduler::new(config(), Box::new(PassthroughFillModel));
  let order_id = OrderId("ord-1".to_string());

  // 미지 주문 취소는 false
  assert!(!scheduler.cancel(&order_id).await);

  let result = scheduler
    .execute(request(ExecutionAlgorithm::Twap, 1_000, 5))
    .await;
  assert!(result.success);

  // 완료 주문 취소도 false (멱등)
  assert!(!scheduler.cancel(&order_id).await);
  assert_eq!(scheduler.stats().orders_cancelled, 0);
}
