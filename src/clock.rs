//! Wall-clock helpers pinned to UTC+8.
//!
//! All persisted rows carry Asia/Shanghai wall-clock timestamps, so
//! every cutoff comparison has to be computed against the same offset.

use chrono::{DateTime, FixedOffset, Utc};

const UTC8_OFFSET_SECS: i32 = 8 * 3600;

/// The fixed +08:00 offset used for all stored timestamps.
pub fn utc8() -> FixedOffset {
    FixedOffset::east_opt(UTC8_OFFSET_SECS).expect("+08:00 is a valid offset")
}

/// Current time in UTC+8.
pub fn now_utc8() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&utc8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_eight_hours() {
        assert_eq!(utc8().local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn test_now_carries_offset() {
        let now = now_utc8();
        assert_eq!(now.offset().local_minus_utc(), UTC8_OFFSET_SECS);
    }
}
