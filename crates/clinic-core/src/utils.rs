//! 通用工具函数
//!
//! 所有时间都是本地无时区时间，精确到分钟；系统假定所有参与者处于同一时区。

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};

/// 截断到分钟精度
pub fn truncate_to_minute(instant: NaiveDateTime) -> NaiveDateTime {
    instant
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(instant)
}

/// 覆盖 `minutes` 所需的时间单元数（向上取整）
pub fn units_for(minutes: u32, granularity_minutes: u32) -> usize {
    if granularity_minutes == 0 {
        return 0;
    }
    minutes.div_ceil(granularity_minutes) as usize
}

/// `from` 之后（不含当天）的下一个指定星期几
pub fn next_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (7 + weekday.num_days_from_monday() as i64
        - from.weekday().num_days_from_monday() as i64)
        % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    from + Duration::days(ahead)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_to_minute() {
        let instant = NaiveDate::from_ymd_opt(2026, 10, 19)
            .and_then(|d| d.and_hms_milli_opt(9, 15, 42, 500))
            .unwrap();
        let truncated = truncate_to_minute(instant);
        assert_eq!(truncated.second(), 0);
        assert_eq!(truncated.nanosecond(), 0);
        assert_eq!(truncated.minute(), 15);
    }

    #[test]
    fn test_units_for() {
        assert_eq!(units_for(60, 30), 2);
        assert_eq!(units_for(45, 30), 2);
        assert_eq!(units_for(30, 30), 1);
        assert_eq!(units_for(0, 30), 0);
        assert_eq!(units_for(60, 0), 0);
    }

    #[test]
    fn test_next_weekday() {
        // 2026-10-16 是周五
        let friday = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(next_weekday(friday, Weekday::Mon), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert_eq!(next_weekday(friday, Weekday::Fri), NaiveDate::from_ymd_opt(2026, 10, 23).unwrap());
    }
}
