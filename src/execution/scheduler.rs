/**
* filename : scheduler
* author : HAMA
* date: 2025. 7. 2.
* description:
**/

use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use serde_json::json;
use tokio::sync::RwLock;

use crate::broker::stream_broker::StreamBroker;
use crate::config::ExecutionConfig;
use crate::error::TradingError;
use crate::execution::generate_slices;
use crate::execution::simulator::FillModel;
use crate::models::market_data::MarketData;
use crate::models::message::MessagePriority;
use crate::models::order::{
  ExecutionAlgorithm, ExecutionParams, ExecutionRequest, ExecutionResult, OrderId, OrderSide,
  OrderSlice, OrderState,
};
use crate::models::stats::SchedulerStats;
use crate::utils::current_timestamp_ms;

/// 집행 진행 상황이 발행되는 채널
pub const EXECUTIONS_CHANNEL: &str = "executions";

/// 심볼당 보존하는 시장 데이터 샘플 수
const MARKET_WINDOW: usize = 100;

/// 진행 메시지 TTL (초)
const PROGRESS_TTL_SECS: u64 = 60;

/// 주문별 집행 추적
#[derive(Debug)]
struct ActiveOrder {
  state: OrderState,
  cancel_requested: bool,
}

#[derive(Debug, Default)]
struct SchedulerCounters {
  orders_executed: AtomicU64,
  orders_completed: AtomicU64,
  orders_cancelled: AtomicU64,
  orders_failed: AtomicU64,
  slices_simulated: AtomicU64,
  total_executed_quantity: AtomicU64,
}

/// 집행 스케줄러 - 슬라이스 생성기와 시뮬레이터의 조합
///
/// 주문별 상태 머신: Pending → Scheduled → (PartiallyExecuted)* →
/// Completed, 완료 전 어느 시점에든 → Cancelled.
/// 슬라이스 생성은 순수/동기이며 공유 가변 상태가 없음. 브로커와는
/// 느슨하게 결합됨 - 핸들이 주입된 경우에만 진행 상황을 발행하고
/// 없어도 동작은 동일함
pub struct ExecutionScheduler {
  config: ExecutionConfig,
  fill_model: Box<dyn FillModel>,
  orders: RwLock<HashMap<OrderId, ActiveOrder>>,
  market_data: RwLock<HashMap<String, VecDeque<MarketData>>>,
  broker: Option<Arc<StreamBroker>>,
  counters: SchedulerCounters,
}

impl ExecutionScheduler {
  pub fn new(config: ExecutionConfig, fill_model: Box<dyn FillModel>) -> Self {
    ExecutionScheduler {
      config,
      fill_model,
      orders: RwLock::new(HashMap::new()),
      market_data: RwLock::new(HashMap::new()),
      broker: None,
      counters: SchedulerCounters::default(),
    }
  }

  /// 진행 상황 발행용 브로커 핸들 주입
  pub fn with_broker(mut self, broker: Arc<StreamBroker>) -> Self {
    self.broker = Some(broker);
    self
  }

  /// 시장 데이터 샘플 기록 - 브로커가 분산하는 것과 같은 피드
  pub async fn record_market_data(&self, sample: MarketData) {
    let mut market_data = self.market_data.write().await;
    let window = market_data.entry(sample.symbol.clone()).or_default();

    window.push_back(sample);
    while window.len() > MARKET_WINDOW {
      window.pop_front();
    }
  }

  /// 문자열 알고리즘 선택자를 받는 접수 경로
  ///
  /// 알 수 없는 알고리즘은 예외 없이 실패 결과로 반환됨 - 호출자는
  /// 주문 배치를 균일하게 처리할 수 있음
  #[allow(clippy::too_many_arguments)]
  pub async fn execute_named(
    &self,
    order_id: &str,
    symbol: &str,
    side: OrderSide,
    quantity: u64,
    algorithm: &str,
    duration_minutes: u32,
    benchmark_price: f64,
    params: ExecutionParams,
  ) -> ExecutionResult {
    match ExecutionAlgorithm::from_str(algorithm) {
      Ok(parsed) => {
        let request = ExecutionRequest::new(
          order_id,
          symbol,
          side,
          quantity,
          parsed,
          duration_minutes,
          benchmark_price,
        )
        .with_params(params);

        self.execute(request).await
      }
      Err(e) => {
        self.counters.orders_failed.fetch_add(1, Ordering::Relaxed);
        log::error!("집행 요청 거부: {} - {}", order_id, e);

        ExecutionResult::failure(
          OrderId(order_id.to_string()),
          symbol,
          quantity,
          algorithm,
          e.to_string(),
        )
      }
    }
  }

  /// 주문 집행
  ///
  /// 슬라이스 0개 생성을 포함한 모든 실패는 success=false 결과로
  /// 반환되며 이 경로는 절대 패닉하지 않음
  pub async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
    let order_id = request.order_id.clone();

    // 동일 ID의 진행 중 주문은 거부 (멱등 검사)
    {
      let mut orders = self.orders.write().await;

      if let Some(existing) = orders.get(&order_id) {
        if !existing.state.is_terminal() {
          self.counters.orders_failed.fetch_add(1, Ordering::Relaxed);
          return ExecutionResult::failure(
            order_id.clone(),
            request.symbol.clone(),
            request.quantity,
            request.algorithm.as_str(),
            TradingError::AlreadyRunning(order_id.to_string()).to_string(),
          );
        }
      }

      orders.insert(
        order_id.clone(),
        ActiveOrder {
          state: OrderState::Pending,
          cancel_requested: false,
        },
      );
    }

    let samples: Vec<MarketData> = {
      let market_data = self.market_data.read().await;
      market_data
        .get(&request.symbol)
        .map(|window| window.iter().cloned().collect())
        .unwrap_or_default()
    };

    let start_ms = current_timestamp_ms();
    let slices = match generate_slices(&request, &samples, &self.config, start_ms) {
      Ok(slices) if !slices.is_empty() => slices,
      Ok(_) => {
        let err = TradingError::GenerationFailure("no slices generated".to_string());
        return self.fail_order(&order_id, &request, err.to_string()).await;
      }
      Err(e) => {
        return self.fail_order(&order_id, &request, e.to_string()).await;
      }
    };

    {
      let mut orders = self.orders.write().await;
      if let Some(order) = orders.get_mut(&order_id) {
        order.state = OrderState::Scheduled;
      }
    }
    self.counters.orders_executed.fetch_add(1, Ordering::Relaxed);

    log::info!(
      "집행 시작: {} - {} {}개 슬라이스 ({})",
      order_id,
      request.algorithm,
      slices.len(),
      request.symbol
    );

    let result = self.simulate(&request, &slices).await;

    if let Some(broker) = &self.broker {
      broker
        .broadcast(
          EXECUTIONS_CHANNEL,
          json!({
            "order_id": result.order_id.to_string(),
            "completed": true,
            "success": result.success,
            "executed_quantity": result.executed_quantity,
            "average_price": result.average_price,
            "slippage_bps": result.slippage_bps,
          }),
          MessagePriority::High,
          Some(PROGRESS_TTL_SECS),
        )
        .await;
    }

    result
  }

  /// 슬라이스 시뮬레이션 - 운영에서는 scheduled_time에 맞춰 실주문
  /// 채널로 제출하는 단계
  async fn simulate(&self, request: &ExecutionRequest, slices: &[OrderSlice]) -> ExecutionResult {
    let order_id = &request.order_id;
    let total_quantity = request.quantity;

    let mut executed_quantity: u64 = 0;
    let mut total_cost: f64 = 0.0;
    let mut slices_executed: usize = 0;
    let mut cancelled = false;

    for slice in slices {
      // 취소는 매 슬라이스 전에 확인 - 아직 시뮬레이션되지 않은
      // 슬라이스만 제거됨
      {
        let orders = self.orders.read().await;
        if orders.get(order_id).map(|o| o.cancel_requested).unwrap_or(false) {
          cancelled = true;
        }
      }
      if cancelled {
        break;
      }

      let price =
        self
          .fill_model
          .fill_price(slice, total_quantity, request.benchmark_price, &request.side);

      executed_quantity += slice.quantity;
      total_cost += price * slice.quantity as f64;
      slices_executed += 1;
      self.counters.slices_simulated.fetch_add(1, Ordering::Relaxed);

      if slices_executed == 1 && slices.len() > 1 {
        let mut orders = self.orders.write().await;
        if let Some(order) = orders.get_mut(order_id) {
          order.state = OrderState::PartiallyExecuted;
        }
      }

      if let Some(broker) = &self.broker {
        broker
          .broadcast(
            EXECUTIONS_CHANNEL,
            json!({
              "order_id": order_id.to_string(),
              "slice_id": slice.id,
              "slice_quantity": slice.quantity,
              "fill_price": price,
              "executed_quantity": executed_quantity,
              "total_quantity": total_quantity,
            }),
            MessagePriority::High,
            Some(PROGRESS_TTL_SECS),
          )
          .await;
      }
    }

    let final_state = if cancelled {
      self.counters.orders_cancelled.fetch_add(1, Ordering::Relaxed);
      OrderState::Cancelled
    } else {
      self.counters.orders_completed.fetch_add(1, Ordering::Relaxed);
      OrderState::Completed
    };

    {
      let mut orders = self.orders.write().await;
      if let Some(order) = orders.get_mut(order_id) {
        order.state = final_state;
      }
    }

    self
      .counters
      .total_executed_quantity
      .fetch_add(executed_quantity, Ordering::Relaxed);

    let average_price = if executed_quantity > 0 {
      total_cost / executed_quantity as f64
    } else {
      0.0
    };
    let slippage = if executed_quantity > 0 {
      average_price - request.benchmark_price
    } else {
      0.0
    };
    let slippage_bps = if request.benchmark_price > 0.0 {
      slippage / request.benchmark_price * 10_000.0
    } else {
      0.0
    };

    let success = !cancelled && executed_quantity == total_quantity;

    ExecutionResult {
      order_id: order_id.clone(),
      symbol: request.symbol.clone(),
      requested_quantity: total_quantity,
      executed_quantity,
      slices_executed,
      slices_total: slices.len(),
      average_price,
      total_cost,
      slippage,
      slippage_bps,
      success,
      error_message: if cancelled {
        Some("cancelled before completion".to_string())
      } else {
        None
      },
      algorithm: request.algorithm.as_str().to_string(),
    }
  }

  /// 주문 취소 (멱등)
  ///
  /// 아직 시뮬레이션되지 않은 슬라이스만 제거됨. 두 번 취소하거나
  /// 미지/완료 주문을 취소하면 false
  pub async fn cancel(&self, order_id: &OrderId) -> bool {
    let mut orders = self.orders.write().await;

    match orders.get_mut(order_id) {
      Some(order) if !order.state.is_terminal() && !order.cancel_requested => {
        order.cancel_requested = true;
        log::info!("주문 취소 요청: {}", order_id);
        true
      }
      _ => false,
    }
  }

  /// 주문 상태 조회
  pub async fn order_state(&self, order_id: &OrderId) -> Option<OrderState> {
    let orders = self.orders.read().await;
    orders.get(order_id).map(|o| o.state)
  }

  /// 스케줄러 통계
  pub fn stats(&self) -> SchedulerStats {
    SchedulerStats {
      orders_executed: self.counters.orders_executed.load(Ordering::Relaxed),
      orders_completed: self.counters.orders_completed.load(Ordering::Relaxed),
      orders_cancelled: self.counters.orders_cancelled.load(Ordering::Relaxed),
      orders_failed: self.counters.orders_failed.load(Ordering::Relaxed),
      slices_simulated: self.counters.slices_simulated.load(Ordering::Relaxed),
      total_executed_quantity: self.counters.total_executed_quantity.load(Ordering::Relaxed),
    }
  }

  async fn fail_order(
    &self,
    order_id: &OrderId,
    request: &ExecutionRequest,
    message: String,
  ) -> ExecutionResult {
    {
      let mut orders = self.orders.write().await;
      orders.remove(order_id);
    }
    self.counters.orders_failed.fetch_add(1, Ordering::Relaxed);
    log::error!("집행 실패: {} - {}", order_id, message);

    ExecutionResult::failure(
      order_id.clone(),
      request.symbol.clone(),
      request.quantity,
      request.algorithm.as_str(),
      message,
    )
  }
}

/// 배차 드라이버 - scheduled_time이 지난 슬라이스를 꺼내 제출하는
/// 주기 태스크의 재료
///
/// 코어는 슬라이스의 순서와 크기만 보장하고 벽시계 제출 정밀도는
/// 드라이버의 타이머 해상도에 위임됨
#[derive(Debug, Default)]
pub struct SliceDispatcher {
  pending: VecDeque<OrderSlice>,
}

impl SliceDispatcher {
  pub fn new(mut slices: Vec<OrderSlice>) -> Self {
    slices.sort_by_key(|s| s.scheduled_time);

    SliceDispatcher {
      pending: slices.into(),
    }
  }

  /// 예정 시각이 지난 슬라이스를 순서대로 추출
  pub fn pop_due(&mut self, now_ms: i64) -> Vec<OrderSlice> {
    let mut due = Vec::new();

    while let Some(front) = self.pending.front() {
      if front.scheduled_time > now_ms {
        break;
      }
      if let Some(slice) = self.pending.pop_front() {
        due.push(slice);
      }
    }

    due
  }

  /// 취소된 주문의 미제출 슬라이스 제거
  pub fn remove_order(&mut self, order_id: &OrderId) -> usize {
    let before = self.pending.len();
    self.pending.retain(|s| &s.parent_order_id != order_id);
    before - self.pending.len()
  }

  pub fn pending_len(&self) -> usize {
    self.pending.len()
  }
}
