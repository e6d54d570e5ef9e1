//! 시간 관련 유틸리티
//!
//! 타임스탬프 변환 함수 제공

pub mod logging;

use chrono::{DateTime, Utc};

/// DateTime<Utc>를 타임스탬프(밀리초)로 변환
pub fn datetime_to_timestamp(dt: DateTime<Utc>) -> i64 {
  dt.timestamp() * 1000 + dt.timestamp_subsec_millis() as i64
}

/// 현재 시간을 타임스탬프(밀리초)로 반환
pub fn current_timestamp_ms() -> i64 {
  datetime_to_timestamp(Utc::now())
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn test_timestamp_conversion() {
    let dt = Utc.with_ymd_and_hms(2017, 7, 12, 2, 41, 59).unwrap() + chrono::Duration::milliseconds(559);
    assert_eq!(datetime_to_timestamp(dt), 1499827319559);
  }

  #[test]
  fn test_current_timestamp_is_recent() {
    let a = current_timestamp_ms();
    let b = current_timestamp_ms();
    assert!(b >= a);
    assert!(a > 1_600_000_000_000);
  }
}
