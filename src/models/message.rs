use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::utils::current_timestamp_ms;

/// 메시지 우선순위 (CRITICAL이 가장 높음)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessagePriority {
    Critical,
    High,
    Normal,
    Low,
}

impl MessagePriority {
    /// 전달 순서 (CRITICAL → HIGH → NORMAL → LOW)
    pub const DELIVERY_ORDER: [MessagePriority; 4] = [
        MessagePriority::Critical,
        MessagePriority::High,
        MessagePriority::Normal,
        MessagePriority::Low,
    ];

    /// 큐 인덱스
    pub fn index(&self) -> usize {
        match self {
            MessagePriority::Critical => 0,
            MessagePriority::High => 1,
            MessagePriority::Normal => 2,
            MessagePriority::Low => 3,
        }
    }

    /// 백프레셔 퇴출 대상 여부 (CRITICAL/HIGH는 절대 퇴출되지 않음)
    pub fn is_evictable(&self) -> bool {
        matches!(self, MessagePriority::Normal | MessagePriority::Low)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamMessage {
    pub id: String,
    pub channel: String,
    pub payload: Value,
    pub priority: MessagePriority,
    pub created_at: i64,
    pub expires_at: Option<i64>,
}

impl StreamMessage {
    pub fn new(
        channel: impl Into<String>,
        payload: Value,
        priority: MessagePriority,
        ttl_seconds: Option<u64>,
    ) -> Self {
        let created_at = current_timestamp_ms();

        StreamMessage {
            id: Uuid::new_v4().to_string(),
            channel: channel.into(),
            payload,
            priority,
            created_at,
            expires_at: ttl_seconds.map(|ttl| created_at + ttl as i64 * 1000),
        }
    }

    /// TTL 만료 여부 (poll 시점에 지연 평가)
    pub fn is_expired(&self, now_ms: i64) -> bool {
        match self.expires_at {
            Some(expiry) => now_ms >= expiry,
            None => false,
        }
    }

    /// 직렬화된 페이로드 크기 (통계용)
    pub fn payload_bytes(&self) -> u64 {
        self.payload.to_string().len() as u64
    }
}
