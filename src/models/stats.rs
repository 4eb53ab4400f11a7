use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// 브로커 전역 카운터 - 단조 증가, 프로세스 재시작 시에만 초기화
#[derive(Debug)]
pub struct GlobalStats {
    messages_sent: AtomicU64,
    messages_dropped: AtomicU64,
    bytes_sent: AtomicU64,
    backpressure_events: AtomicU64,
    reconnections: AtomicU64,
    started_at: Instant,
}

impl GlobalStats {
    pub fn new() -> Self {
        GlobalStats {
            messages_sent: AtomicU64::new(0),
            messages_dropped: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            backpressure_events: AtomicU64::new(0),
            reconnections: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn add_sent(&self, count: u64) {
        self.messages_sent.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_dropped(&self, count: u64) {
        self.messages_dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_bytes_sent(&self, bytes: u64) {
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn add_backpressure_events(&self, count: u64) {
        self.backpressure_events.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_reconnection(&self) {
        self.reconnections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> GlobalStatsSnapshot {
        GlobalStatsSnapshot {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            backpressure_events: self.backpressure_events.load(Ordering::Relaxed),
            reconnections: self.reconnections.load(Ordering::Relaxed),
            uptime_seconds: self.started_at.elapsed().as_secs(),
        }
    }
}

impl Default for GlobalStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalStatsSnapshot {
    pub messages_sent: u64,
    pub messages_dropped: u64,
    pub bytes_sent: u64,
    pub backpressure_events: u64,
    pub reconnections: u64,
    pub uptime_seconds: u64,
}

/// 연결별 통계 스냅샷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStats {
    pub client_id: String,
    pub state: String,
    pub subscriptions: usize,
    pub queued_messages: usize,
    pub messages_sent: u64,
    pub messages_dropped: u64,
    pub last_activity: i64,
}

/// 채널별 통계 스냅샷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelStats {
    pub name: String,
    pub subscribers: usize,
    pub history_size: usize,
    pub messages_total: u64,
}

/// 브로커 통계 집계
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerStats {
    pub global: GlobalStatsSnapshot,
    pub active_connections: usize,
    pub active_channels: usize,
    pub connections: Vec<ConnectionStats>,
    pub channels: Vec<ChannelStats>,
}

/// 스케줄러 통계
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub orders_executed: u64,
    pub orders_completed: u64,
    pub orders_cancelled: u64,
    pub orders_failed: u64,
    pub slices_simulated: u64,
    pub total_executed_quantity: u64,
}
