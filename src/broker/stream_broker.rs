/**
* filename : stream_broker
* author : HAMA
* date: 2025. 7. 2.
* description:
**/

use serde_json::Value;
use tokio::sync::RwLock;

use crate::broker::channel::ChannelIndex;
use crate::broker::connection::{ConnectionRegistry, ConnectionState};
use crate::config::BrokerConfig;
use crate::models::message::{MessagePriority, StreamMessage};
use crate::models::stats::{BrokerStats, GlobalStats};
use crate::utils::current_timestamp_ms;

/// 스트림 브로커 - 연결 레지스트리와 채널 인덱스의 조합
///
/// 연결 테이블과 채널 인덱스는 독립된 락으로 보호되어 한 채널의
/// 구독 변경이 다른 채널의 broadcast와 직렬화되지 않음. 전달은
/// pull 방식(poll)이므로 broadcast는 느린 구독자에 의해 블록되지
/// 않고, 오버플로우는 퇴출로 해소됨.
///
/// 공개 연산은 예외 대신 불리언/카운트를 반환함 - 핫패스에서
/// 에러 타입 할당을 피하기 위한 계약 (내부는 Result 기반)
pub struct StreamBroker {
  connections: RwLock<ConnectionRegistry>,
  channels: RwLock<ChannelIndex>,
  stats: GlobalStats,
  config: BrokerConfig,
}

impl StreamBroker {
  pub fn new(config: BrokerConfig) -> Self {
    StreamBroker {
      connections: RwLock::new(ConnectionRegistry::new(
        config.max_connections,
        config.queue_capacity,
      )),
      channels: RwLock::new(ChannelIndex::new(config.history_size)),
      stats: GlobalStats::new(),
      config,
    }
  }

  /// 클라이언트 등록
  ///
  /// 용량 초과 또는 중복 ID면 false (예외 없음)
  pub async fn register(&self, client_id: &str) -> bool {
    let mut connections = self.connections.write().await;

    match connections.register(client_id, current_timestamp_ms()) {
      Ok(()) => {
        log::debug!("클라이언트 등록: {}", client_id);
        true
      }
      Err(e) => {
        log::debug!("클라이언트 등록 거부: {} - {}", client_id, e);
        false
      }
    }
  }

  /// 클라이언트 해제 (멱등) - 구독 중이던 모든 채널에서 제거
  pub async fn unregister(&self, client_id: &str) -> bool {
    let removed = {
      let mut connections = self.connections.write().await;
      connections.unregister(client_id)
    };

    match removed {
      Ok(connection) => {
        let mut channels = self.channels.write().await;
        channels.remove_subscriber_everywhere(client_id, &connection.subscriptions);
        log::debug!("클라이언트 해제: {}", client_id);
        true
      }
      Err(_) => false,
    }
  }

  /// 채널 구독 - 채널이 없으면 생성
  ///
  /// replay_history가 true면 보존된 히스토리를 일회성으로 큐에 적재
  /// (라이브 메시지와 동일한 백프레셔 규칙 적용)
  pub async fn subscribe(&self, client_id: &str, channel: &str, replay_history: bool) -> bool {
    {
      let mut connections = self.connections.write().await;

      match connections.get_mut(client_id) {
        Some(connection) => {
          connection.subscriptions.insert(channel.to_string());
          connection.touch(current_timestamp_ms());
        }
        None => return false,
      }
    }

    let replay = {
      let mut channels = self.channels.write().await;
      let entry = channels.get_or_create(channel);
      entry.add_subscriber(client_id);

      if replay_history {
        entry.history().cloned().collect()
      } else {
        Vec::new()
      }
    };

    if !replay.is_empty() {
      let mut connections = self.connections.write().await;

      if let Some(connection) = connections.get_mut(client_id) {
        for message in replay {
          let outcome = connection.enqueue(message);
          if outcome.evicted > 0 || !outcome.enqueued {
            self.record_backpressure(&outcome);
          }
        }
      }
    }

    true
  }

  /// 구독 해제 - 구독자가 모두 떠난 채널은 제거
  pub async fn unsubscribe(&self, client_id: &str, channel: &str) -> bool {
    let removed = {
      let mut connections = self.connections.write().await;

      match connections.get_mut(client_id) {
        Some(connection) => connection.subscriptions.remove(channel),
        None => return false,
      }
    };

    if removed {
      let mut channels = self.channels.write().await;

      if let Some(entry) = channels.get_mut(channel) {
        entry.remove_subscriber(client_id);
      }
      channels.remove_if_empty(channel);
    }

    removed
  }

  /// 채널 전체에 메시지 발행
  ///
  /// 호출 시점의 구독자 스냅샷에 적재하며 적재된 구독자 수를 반환
  /// (전달 완료 수가 아님). 구독자 없는 채널은 0 반환 - 에러 아님
  pub async fn broadcast(
    &self,
    channel: &str,
    payload: Value,
    priority: MessagePriority,
    ttl_seconds: Option<u64>,
  ) -> usize {
    let message = StreamMessage::new(channel, payload, priority, ttl_seconds);
    let payload_bytes = message.payload_bytes();

    let subscribers = {
      let mut channels = self.channels.write().await;

      match channels.get_mut(channel) {
        Some(entry) if !entry.is_empty() => {
          let snapshot = entry.subscriber_snapshot();
          entry.record(message.clone());
          snapshot
        }
        _ => return 0,
      }
    };

    let mut enqueued = 0;
    {
      let mut connections = self.connections.write().await;

      for client_id in &subscribers {
        if let Some(connection) = connections.get_mut(client_id) {
          let outcome = connection.enqueue(message.clone());

          if outcome.enqueued {
            enqueued += 1;
          }
          if outcome.evicted > 0 || !outcome.enqueued {
            self.record_backpressure(&outcome);
          }
        }
      }
    }

    self.stats.add_bytes_sent(payload_bytes * enqueued as u64);
    enqueued
  }

  /// 특정 클라이언트에 직접 전송 (구독 무관, 확인 응답용)
  pub async fn send_direct(
    &self,
    client_id: &str,
    channel: &str,
    payload: Value,
    priority: MessagePriority,
  ) -> bool {
    let message = StreamMessage::new(channel, payload, priority, None);
    let payload_bytes = message.payload_bytes();

    let mut connections = self.connections.write().await;

    match connections.get_mut(client_id) {
      Some(connection) => {
        let outcome = connection.enqueue(message);

        if outcome.evicted > 0 || !outcome.enqueued {
          self.record_backpressure(&outcome);
        }
        if outcome.enqueued {
          self.stats.add_bytes_sent(payload_bytes);
        }

        outcome.enqueued
      }
      None => false,
    }
  }

  /// 클라이언트 큐에서 메시지 추출
  ///
  /// CRITICAL → HIGH → NORMAL → LOW 순서, 같은 우선순위는 도착 순서.
  /// 만료된 메시지는 드랍으로 집계되고 반환되지 않음
  pub async fn poll(&self, client_id: &str, max_messages: usize) -> Vec<StreamMessage> {
    let mut connections = self.connections.write().await;

    match connections.get_mut(client_id) {
      Some(connection) => {
        let (messages, expired) = connection.poll(max_messages, current_timestamp_ms());

        self.stats.add_sent(messages.len() as u64);
        if expired > 0 {
          self.stats.add_dropped(expired);
        }

        messages
      }
      None => Vec::new(),
    }
  }

  /// 레이트 리밋 체크 (권고용)
  ///
  /// 브로커는 broadcast/poll을 스스로 제한하지 않음 - 거부/지연
  /// 결정은 호출자(트랜스포트) 책임
  pub async fn check_rate_limit(&self, client_id: &str) -> bool {
    let budget = self.config.rate_limit_per_sec;
    let mut connections = self.connections.write().await;

    match connections.get_mut(client_id) {
      Some(connection) => connection.check_rate_limit(budget, current_timestamp_ms()),
      None => false,
    }
  }

  /// 비활성 연결 정리 - unregister와 동일한 경로로 제거
  pub async fn cleanup_inactive(&self, timeout_secs: u64) -> usize {
    let stale = {
      let connections = self.connections.read().await;
      connections.stale_ids(timeout_secs, current_timestamp_ms())
    };

    let mut evicted = 0;
    for client_id in stale {
      if self.unregister(&client_id).await {
        log::info!("비활성 연결 정리: {}", client_id);
        evicted += 1;
      }
    }

    evicted
  }

  /// 재연결 진입 표시
  pub async fn mark_reconnecting(&self, client_id: &str) -> bool {
    let mut connections = self.connections.write().await;

    match connections.get_mut(client_id) {
      Some(connection) => {
        connection.state = ConnectionState::Reconnecting;
        true
      }
      None => false,
    }
  }

  /// 재연결 완료 표시 - 재연결 카운터 반영
  pub async fn mark_connected(&self, client_id: &str) -> bool {
    let mut connections = self.connections.write().await;

    match connections.get_mut(client_id) {
      Some(connection) => {
        if connection.state == ConnectionState::Reconnecting {
          self.stats.add_reconnection();
        }
        connection.state = ConnectionState::Connected;
        connection.touch(current_timestamp_ms());
        true
      }
      None => false,
    }
  }

  /// 통계 집계
  pub async fn stats(&self) -> BrokerStats {
    let connections = self.connections.read().await;
    let connection_stats: Vec<_> = connections.iter().map(|c| c.stats()).collect();
    let active_connections = connections.len();
    drop(connections);

    let channels = self.channels.read().await;
    let channel_stats: Vec<_> = channels.iter().map(|c| c.stats()).collect();
    let active_channels = channels.len();
    drop(channels);

    BrokerStats {
      global: self.stats.snapshot(),
      active_connections,
      active_channels,
      connections: connection_stats,
      channels: channel_stats,
    }
  }

  fn record_backpressure(&self, outcome: &crate::broker::connection::EnqueueOutcome) {
    let dropped = outcome.evicted as u64 + if outcome.enqueued { 0 } else { 1 };
    self.stats.add_dropped(dropped);
    self.stats.add_backpressure_events(dropped);
    log::debug!("백프레셔: 퇴출 {} 드랍 {}", outcome.evicted, !outcome.enqueued as u8);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn test_config(queue_capacity: usize) -> BrokerConfig {
    BrokerConfig {
      max_connections: 100,
      queue_capacity,
      history_size: 100,
      rate_limit_per_sec: 10,
      inactive_timeout_secs: 300,
    }
  }

  #[tokio::test]
  async fn test_register_unregister_idempotent() {
    let broker = StreamBroker::new(test_config(10));

    assert!(broker.register("c1").await);
    assert!(!broker.register("c1").await);
    assert!(broker.unregister("c1").await);
    assert!(!broker.unregister("c1").await);
  }

  #[tokio::test]
  async fn test_broadcast_returns_subscriber_count() {
    let broker = StreamBroker::new(test_config(10));

    for id in ["a", "b", "c"] {
      broker.register(id).await;
      broker.subscribe(id, "prices", false).await;
    }

    let count = broker
      .broadcast("prices", json!({"px": 100.0}), MessagePriority::High, None)
      .await;
    assert_eq!(count, 3);

    // 구독자마다 HIGH 메시지 정확히 한 건씩 수신
    for id in ["a", "b", "c"] {
      let messages = broker.poll(id, 10).await;
      assert_eq!(messages.len(), 1);
      assert_eq!(messages[0].priority, MessagePriority::High);
      assert_eq!(messages[0].payload["px"], 100.0);
    }

    // 구독자 없는 채널은 0 - 에러 아님
    let none = broker
      .broadcast("unknown", json!({}), MessagePriority::Normal, None)
      .await;
    assert_eq!(none, 0);
  }

  #[tokio::test]
  async fn test_subscribe_with_history_replay() {
    let broker = StreamBroker::new(test_config(10));

    broker.register("pub").await;
    broker.subscribe("pub", "prices", false).await;

    for i in 0..3 {
      broker
        .broadcast("prices", json!({"seq": i}), MessagePriority::Normal, None)
        .await;
    }

    broker.register("late").await;
    assert!(broker.subscribe("late", "prices", true).await);

    let messages = broker.poll("late", 10).await;
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].payload["seq"], 0);
  }

  #[tokio::test]
  async fn test_channel_gc_on_unsubscribe() {
    let broker = StreamBroker::new(test_config(10));

    broker.register("c1").await;
    broker.subscribe("c1", "prices", false).await;
    assert!(broker.unsubscribe("c1", "prices").await);

    // 빈 채널로의 발행은 0
    let count = broker
      .broadcast("prices", json!({}), MessagePriority::Normal, None)
      .await;
    assert_eq!(count, 0);
  }

  #[tokio::test]
  async fn test_send_direct_bypasses_subscription() {
    let broker = StreamBroker::new(test_config(10));

    broker.register("c1").await;
    assert!(
      broker
        .send_direct("c1", "ack", json!({"ok": true}), MessagePriority::Critical)
        .await
    );
    assert!(
      !broker
        .send_direct("ghost", "ack", json!({}), MessagePriority::Critical)
        .await
    );

    let messages = broker.poll("c1", 10).await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].channel, "ack");
  }

  #[tokio::test]
  async fn test_cleanup_inactive_only_evicts_stale() {
    let broker = StreamBroker::new(test_config(10));

    broker.register("fresh").await;
    broker.register("stale").await;

    // stale 연결의 활동 시각을 과거로 이동
    {
      let mut connections = broker.connections.write().await;
      connections.get_mut("stale").unwrap().last_activity -= 120_000;
    }

    let evicted = broker.cleanup_inactive(60).await;
    assert_eq!(evicted, 1);

    let stats = broker.stats().await;
    assert_eq!(stats.active_connections, 1);
    assert_eq!(stats.connections[0].client_id, "fresh");
  }

  #[tokio::test]
  async fn test_reconnection_counter() {
    let broker = StreamBroker::new(test_config(10));

    broker.register("c1").await;
    assert!(broker.mark_reconnecting("c1").await);
    assert!(broker.mark_connected("c1").await);

    let stats = broker.stats().await;
    assert_eq!(stats.global.reconnections, 1);
  }
}
