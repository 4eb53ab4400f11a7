/**
* filename : aggregator
* author : HAMA
* date: 2025. 7. 2.
* description:
**/

use std::collections::HashMap;
use std::sync::Arc;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};

use crate::broker::stream_broker::StreamBroker;
use crate::config::AggregatorConfig;
use crate::models::message::MessagePriority;
use crate::utils::current_timestamp_ms;

/// 채널별 대기 배치
#[derive(Debug)]
struct PendingBatch {
  items: Vec<Value>,
  created_at: i64,
}

impl PendingBatch {
  fn new(now_ms: i64) -> Self {
    PendingBatch {
      items: Vec::new(),
      created_at: now_ms,
    }
  }

  fn age_ms(&self, now_ms: i64) -> u64 {
    (now_ms - self.created_at).max(0) as u64
  }
}

/// 데이터 집계기 - 폴링 사이에 몰리는 동일 채널 업데이트를 병합
///
/// 배치는 크기 도달 또는 최대 지연 경과 시 하나의 broadcast로 방출됨
pub struct DataAggregator {
  broker: Arc<StreamBroker>,
  pending: Mutex<HashMap<String, PendingBatch>>,
  config: AggregatorConfig,
}

impl DataAggregator {
  pub fn new(broker: Arc<StreamBroker>, config: AggregatorConfig) -> Self {
    DataAggregator {
      broker,
      pending: Mutex::new(HashMap::new()),
      config,
    }
  }

  /// 업데이트 추가 - 배치 크기에 도달하면 즉시 방출
  ///
  /// 방출이 일어난 경우 적재된 구독자 수를 반환
  pub async fn push(&self, channel: &str, payload: Value) -> Option<usize> {
    let now_ms = current_timestamp_ms();

    let batch = {
      let mut pending = self.pending.lock().await;
      let entry = pending
        .entry(channel.to_string())
        .or_insert_with(|| PendingBatch::new(now_ms));
      entry.items.push(payload);

      if entry.items.len() >= self.config.max_batch_size {
        pending.remove(channel)
      } else {
        None
      }
    };

    match batch {
      Some(batch) => Some(self.emit(channel, batch).await),
      None => None,
    }
  }

  /// 최대 지연을 넘긴 배치 방출 - 주기 태스크가 호출
  pub async fn flush_due(&self) -> usize {
    let now_ms = current_timestamp_ms();

    let due: Vec<(String, PendingBatch)> = {
      let mut pending = self.pending.lock().await;
      let channels: Vec<String> = pending
        .iter()
        .filter(|(_, batch)| batch.age_ms(now_ms) >= self.config.max_batch_delay_ms)
        .map(|(name, _)| name.clone())
        .collect();

      channels
        .into_iter()
        .filter_map(|name| pending.remove(&name).map(|batch| (name, batch)))
        .collect()
    };

    let mut flushed = 0;
    for (channel, batch) in due {
      self.emit(&channel, batch).await;
      flushed += 1;
    }

    flushed
  }

  /// 모든 대기 배치 강제 방출
  pub async fn flush_all(&self) -> usize {
    let drained: Vec<(String, PendingBatch)> = {
      let mut pending = self.pending.lock().await;
      pending.drain().collect()
    };

    let mut flushed = 0;
    for (channel, batch) in drained {
      self.emit(&channel, batch).await;
      flushed += 1;
    }

    flushed
  }

  /// 대기 중인 업데이트 수 (채널 전체 합산)
  pub async fn pending_count(&self) -> usize {
    let pending = self.pending.lock().await;
    pending.values().map(|batch| batch.items.len()).sum()
  }

  /// 주기 방출 루프 시작
  pub fn run(self: Arc<Self>) -> JoinHandle<()> {
    let period = Duration::from_millis(self.config.max_batch_delay_ms.max(10));

    tokio::spawn(async move {
      let mut flush_timer = interval(period);

      loop {
        flush_timer.tick().await;
        self.flush_due().await;
      }
    })
  }

  async fn emit(&self, channel: &str, batch: PendingBatch) -> usize {
    let size = batch.items.len();
    let payload = json!({
      "batch_size": size,
      "items": batch.items,
    });

    let enqueued = self
      .broker
      .broadcast(channel, payload, MessagePriority::Normal, None)
      .await;

    log::debug!("배치 방출: {} - {}건 → 구독자 {}명", channel, size, enqueued);
    enqueued
  }
}
