/**
* filename : channel
* author : HAMA
* date: 2025. 7. 2.
* description:
**/

use std::collections::{HashMap, HashSet, VecDeque};

use crate::models::message::StreamMessage;
use crate::models::stats::ChannelStats;

/// 발행-구독 채널 - 구독자 집합과 히스토리 링 보유
///
/// 연결 소유권은 레지스트리에 있고 채널은 ID만 역참조함
#[derive(Debug)]
pub struct Channel {
  pub name: String,
  subscribers: HashSet<String>,
  history: VecDeque<StreamMessage>,
  history_limit: usize,
  messages_total: u64,
}

impl Channel {
  pub fn new(name: impl Into<String>, history_limit: usize) -> Self {
    Channel {
      name: name.into(),
      subscribers: HashSet::new(),
      history: VecDeque::new(),
      history_limit,
      messages_total: 0,
    }
  }

  pub fn add_subscriber(&mut self, client_id: &str) -> bool {
    self.subscribers.insert(client_id.to_string())
  }

  pub fn remove_subscriber(&mut self, client_id: &str) -> bool {
    self.subscribers.remove(client_id)
  }

  pub fn has_subscriber(&self, client_id: &str) -> bool {
    self.subscribers.contains(client_id)
  }

  pub fn is_empty(&self) -> bool {
    self.subscribers.is_empty()
  }

  pub fn subscriber_count(&self) -> usize {
    self.subscribers.len()
  }

  /// 호출 시점의 구독자 스냅샷
  pub fn subscriber_snapshot(&self) -> Vec<String> {
    self.subscribers.iter().cloned().collect()
  }

  /// 히스토리에 메시지 기록 (단일 기록자 - broadcast에서만 추가)
  pub fn record(&mut self, message: StreamMessage) {
    self.messages_total += 1;
    self.history.push_back(message);

    while self.history.len() > self.history_limit {
      self.history.pop_front();
    }
  }

  /// 보존된 히스토리 (재생용, 오래된 것부터)
  pub fn history(&self) -> impl Iterator<Item = &StreamMessage> {
    self.history.iter()
  }

  pub fn history_len(&self) -> usize {
    self.history.len()
  }

  pub fn stats(&self) -> ChannelStats {
    ChannelStats {
      name: self.name.clone(),
      subscribers: self.subscribers.len(),
      history_size: self.history.len(),
      messages_total: self.messages_total,
    }
  }
}

/// 채널 인덱스 - 채널명 → 채널 매핑
///
/// 채널은 첫 구독 시 생성되고 구독자가 모두 떠나면 제거됨
#[derive(Debug)]
pub struct ChannelIndex {
  channels: HashMap<String, Channel>,
  history_limit: usize,
}

impl ChannelIndex {
  pub fn new(history_limit: usize) -> Self {
    ChannelIndex {
      channels: HashMap::new(),
      history_limit,
    }
  }

  /// 채널 생성 또는 가져오기
  pub fn get_or_create(&mut self, name: &str) -> &mut Channel {
    let history_limit = self.history_limit;

    self.channels
      .entry(name.to_string())
      .or_insert_with(|| Channel::new(name, history_limit))
  }

  pub fn get(&self, name: &str) -> Option<&Channel> {
    self.channels.get(name)
  }

  pub fn get_mut(&mut self, name: &str) -> Option<&mut Channel> {
    self.channels.get_mut(name)
  }

  /// 구독자가 없는 채널 제거
  pub fn remove_if_empty(&mut self, name: &str) -> bool {
    if self.channels.get(name).map(|c| c.is_empty()).unwrap_or(false) {
      self.channels.remove(name);
      true
    } else {
      false
    }
  }

  /// 연결 해제 시 모든 채널에서 구독자 제거
  pub fn remove_subscriber_everywhere(&mut self, client_id: &str, channels: &HashSet<String>) {
    for name in channels {
      if let Some(channel) = self.channels.get_mut(name) {
        channel.remove_subscriber(client_id);
      }
      self.remove_if_empty(name);
    }
  }

  pub fn len(&self) -> usize {
    self.channels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.channels.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Channel> {
    self.channels.values()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::message::MessagePriority;
  use serde_json::json;

  #[test]
  fn test_lazy_creation_and_gc() {
    let mut index = ChannelIndex::new(10);
    assert!(index.get("prices").is_none());

    index.get_or_create("prices").add_subscriber("c1");
    assert_eq!(index.len(), 1);

    index.get_mut("prices").unwrap().remove_subscriber("c1");
    assert!(index.remove_if_empty("prices"));
    assert!(index.get("prices").is_none());
  }

  #[test]
  fn test_history_ring_bounded() {
    let mut channel = Channel::new("prices", 3);

    for i in 0..5 {
      channel.record(StreamMessage::new(
        "prices",
        json!({"seq": i}),
        MessagePriority::Normal,
        None,
      ));
    }

    assert_eq!(channel.history_len(), 3);
    let first = channel.history().next().unwrap();
    assert_eq!(first.payload["seq"], 2);
    assert_eq!(channel.stats().messages_total, 5);
  }
}
