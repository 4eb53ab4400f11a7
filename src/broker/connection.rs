/**
* filename : connection
* author : HAMA
* date: 2025. 7. 2.
* description:
**/

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::TradingError;
use crate::models::message::{MessagePriority, StreamMessage};
use crate::models::stats::ConnectionStats;

/// 한 번의 오버플로우 이벤트에서 퇴출하는 최대 메시지 수
const EVICTION_BATCH: usize = 5;

/// 슬라이딩 레이트 윈도우 길이 (밀리초)
const RATE_WINDOW_MS: i64 = 1000;

/// 연결 생명주기 상태
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectionState {
  Connected,
  Reconnecting,
  Disconnected,
}

impl ConnectionState {
  pub fn as_str(&self) -> &'static str {
    match self {
      ConnectionState::Connected => "connected",
      ConnectionState::Reconnecting => "reconnecting",
      ConnectionState::Disconnected => "disconnected",
    }
  }
}

/// enqueue 결과 - 퇴출/드랍 수는 호출자가 전역 카운터에 반영
#[derive(Debug, Clone, Copy)]
pub struct EnqueueOutcome {
  /// 새 메시지가 큐에 들어갔는지 여부
  pub enqueued: bool,
  /// 백프레셔로 퇴출된 기존 메시지 수
  pub evicted: usize,
}

/// 클라이언트 연결 - 우선순위별 유한 FIFO 큐 보유
#[derive(Debug)]
pub struct ClientConnection {
  pub id: String,
  pub state: ConnectionState,
  pub subscriptions: HashSet<String>,
  /// 우선순위 인덱스별 큐 (CRITICAL=0 .. LOW=3)
  queues: [VecDeque<StreamMessage>; 4],
  capacity: usize,
  pub last_activity: i64,
  pub messages_sent: u64,
  pub messages_dropped: u64,
  rate_window: VecDeque<i64>,
}

impl ClientConnection {
  pub fn new(id: impl Into<String>, capacity: usize, now_ms: i64) -> Self {
    ClientConnection {
      id: id.into(),
      state: ConnectionState::Connected,
      subscriptions: HashSet::new(),
      queues: [VecDeque::new(), VecDeque::new(), VecDeque::new(), VecDeque::new()],
      capacity: capacity.max(1),
      last_activity: now_ms,
      messages_sent: 0,
      messages_dropped: 0,
      rate_window: VecDeque::new(),
    }
  }

  /// 큐에 적재된 전체 메시지 수
  pub fn queued_len(&self) -> usize {
    self.queues.iter().map(|q| q.len()).sum()
  }

  /// 메시지 적재 - 가득 찬 경우 백프레셔 퇴출 수행
  ///
  /// 퇴출 순서: 가장 오래된 LOW 먼저, 없으면 NORMAL.
  /// CRITICAL/HIGH는 절대 퇴출하지 않으며, 자리를 만들지 못하면
  /// 새 메시지를 버린다. 큐 길이는 어떤 경우에도 용량을 넘지 않음.
  pub fn enqueue(&mut self, message: StreamMessage) -> EnqueueOutcome {
    let mut evicted = 0;

    while self.queued_len() >= self.capacity && evicted < EVICTION_BATCH {
      let low = MessagePriority::Low.index();
      let normal = MessagePriority::Normal.index();

      if self.queues[low].pop_front().is_some() {
        evicted += 1;
      } else if self.queues[normal].pop_front().is_some() {
        evicted += 1;
      } else {
        break;
      }
    }

    let enqueued = if self.queued_len() < self.capacity {
      let idx = message.priority.index();
      self.queues[idx].push_back(message);
      true
    } else {
      false
    };

    let dropped = evicted as u64 + if enqueued { 0 } else { 1 };
    self.messages_dropped += dropped;

    EnqueueOutcome { enqueued, evicted }
  }

  /// 우선순위 순서로 최대 max개 메시지 추출
  ///
  /// TTL이 지난 메시지는 반환하지 않고 드랍 카운트만 올림.
  /// 반환값: (전달 메시지, 만료로 드랍된 수)
  pub fn poll(&mut self, max_messages: usize, now_ms: i64) -> (Vec<StreamMessage>, u64) {
    let mut delivered = Vec::new();
    let mut expired: u64 = 0;

    'outer: for priority in MessagePriority::DELIVERY_ORDER {
      let queue = &mut self.queues[priority.index()];

      while let Some(message) = queue.pop_front() {
        if message.is_expired(now_ms) {
          expired += 1;
          continue;
        }

        delivered.push(message);

        if delivered.len() >= max_messages {
          break 'outer;
        }
      }
    }

    self.messages_sent += delivered.len() as u64;
    self.messages_dropped += expired;
    self.touch(now_ms);

    (delivered, expired)
  }

  /// 슬라이딩 1초 윈도우 레이트 체크 (권고용)
  ///
  /// 허용된 호출만 예산을 소비하며, 예산 초과 시 false
  pub fn check_rate_limit(&mut self, budget: usize, now_ms: i64) -> bool {
    while let Some(&oldest) = self.rate_window.front() {
      if now_ms - oldest >= RATE_WINDOW_MS {
        self.rate_window.pop_front();
      } else {
        break;
      }
    }

    if self.rate_window.len() < budget {
      self.rate_window.push_back(now_ms);
      true
    } else {
      false
    }
  }

  /// 활동 시각 갱신
  pub fn touch(&mut self, now_ms: i64) {
    self.last_activity = now_ms;
  }

  pub fn stats(&self) -> ConnectionStats {
    ConnectionStats {
      client_id: self.id.clone(),
      state: self.state.as_str().to_string(),
      subscriptions: self.subscriptions.len(),
      queued_messages: self.queued_len(),
      messages_sent: self.messages_sent,
      messages_dropped: self.messages_dropped,
      last_activity: self.last_activity,
    }
  }
}

/// 연결 레지스트리 - 클라이언트 생명주기 관리
#[derive(Debug)]
pub struct ConnectionRegistry {
  connections: HashMap<String, ClientConnection>,
  max_connections: usize,
  queue_capacity: usize,
}

impl ConnectionRegistry {
  pub fn new(max_connections: usize, queue_capacity: usize) -> Self {
    ConnectionRegistry {
      connections: HashMap::new(),
      max_connections,
      queue_capacity,
    }
  }

  /// 새 연결 등록
  pub fn register(&mut self, client_id: &str, now_ms: i64) -> Result<(), TradingError> {
    if self.connections.contains_key(client_id) {
      return Err(TradingError::DuplicateClient(client_id.to_string()));
    }

    if self.connections.len() >= self.max_connections {
      return Err(TradingError::CapacityExceeded(self.connections.len()));
    }

    self.connections.insert(
      client_id.to_string(),
      ClientConnection::new(client_id, self.queue_capacity, now_ms),
    );

    Ok(())
  }

  /// 연결 해제 - 해제된 연결을 반환하여 호출자가 채널 구독을 정리하도록 함
  pub fn unregister(&mut self, client_id: &str) -> Result<ClientConnection, TradingError> {
    self.connections
      .remove(client_id)
      .ok_or_else(|| TradingError::UnknownClient(client_id.to_string()))
  }

  pub fn get(&self, client_id: &str) -> Option<&ClientConnection> {
    self.connections.get(client_id)
  }

  pub fn get_mut(&mut self, client_id: &str) -> Option<&mut ClientConnection> {
    self.connections.get_mut(client_id)
  }

  pub fn contains(&self, client_id: &str) -> bool {
    self.connections.contains_key(client_id)
  }

  pub fn len(&self) -> usize {
    self.connections.len()
  }

  pub fn is_empty(&self) -> bool {
    self.connections.is_empty()
  }

  /// 비활성 연결 ID 수집
  pub fn stale_ids(&self, timeout_secs: u64, now_ms: i64) -> Vec<String> {
    let cutoff = now_ms - timeout_secs as i64 * 1000;

    self.connections
      .values()
      .filter(|conn| conn.last_activity < cutoff)
      .map(|conn| conn.id.clone())
      .collect()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ClientConnection> {
    self.connections.values()
  }
}
