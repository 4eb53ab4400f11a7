//! 시간 관련 유틸리티
//!
//! 시간 변환 및 슬라이스 스케줄 계산 함수 제공

pub mod logging;
pub mod math;

use chrono::{DateTime, TimeZone, Utc};

/// 현재 시간을 타임스탬프(밀리초)로 반환
pub fn current_timestamp_ms() -> i64 {
  Utc::now().timestamp_millis()
}

/// 타임스탬프(밀리초)를 DateTime<Utc>로 변환
pub fn timestamp_to_datetime(timestamp_ms: i64) -> DateTime<Utc> {
  Utc.timestamp_millis_opt(timestamp_ms).single().unwrap_or_default()
}

/// 시간 간격 계산 (초 단위)
pub fn time_diff_seconds(start_ts: i64, end_ts: i64) -> f64 {
  (end_ts - start_ts) as f64 / 1000.0
}

/// 시간 구간에 균등 분할점 계산 (슬라이스 스케줄용)
pub fn calculate_time_slices(start_ts: i64, end_ts: i64, num_slices: usize) -> Vec<i64> {
  if num_slices == 0 {
    return Vec::new();
  }

  let interval = (end_ts - start_ts) as f64 / num_slices as f64;
  let mut result = Vec::with_capacity(num_slices);

  for i in 0..num_slices {
    let point = start_ts + (interval * i as f64) as i64;
    result.push(point);
  }

  result
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_timestamp_conversion() {
    let now = Utc::now();
    let ts = now.timestamp_millis();
    let dt = timestamp_to_datetime(ts);

    let diff = (now - dt).num_milliseconds().abs();
    assert!(diff < 1000);
  }

  #[test]
  fn test_time_slices() {
    let start = 1000;
    let end = 11000;
    let slices = calculate_time_slices(start, end, 5);

    assert_eq!(slices.len(), 5);
    assert_eq!(slices[0], 1000);
    assert_eq!(slices[4], 9000);
  }

  #[test]
  fn test_time_diff() {
    assert_eq!(time_diff_seconds(1000, 3500), 2.5);
  }
}
