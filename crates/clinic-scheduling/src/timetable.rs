//! 机构课表
//!
//! 定义营业时间、时段粒度、上课时间和休息时间。所有学生共用同一张课表。

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use clinic_core::{ClinicError, Result};
use serde::{Deserialize, Serialize};

const WEEKDAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// 每周重复的时间窗口 `[start, end)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringWindow {
    pub days: Vec<Weekday>,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl RecurringWindow {
    pub fn new(days: &[Weekday], start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            days: days.to_vec(),
            start,
            end,
        }
    }

    /// 窗口在该日期是否生效，且与区间 `[start, end)` 相交
    pub fn blocks(&self, date: NaiveDate, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        if !self.days.contains(&date.weekday()) {
            return false;
        }
        let window_start = date.and_time(self.start);
        let window_end = date.and_time(self.end);
        start < window_end && window_start < end
    }
}

/// 机构课表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timetable {
    pub opening: NaiveTime,
    pub closing: NaiveTime,
    pub granularity_minutes: u32,
    pub classes: Vec<RecurringWindow>,
    pub breaks: Vec<RecurringWindow>,
}

impl Timetable {
    /// 校验课表
    pub fn validate(&self) -> Result<()> {
        if self.granularity_minutes == 0 {
            return Err(ClinicError::Validation(
                "Slot granularity must be greater than zero".to_string(),
            ));
        }
        if self.closing <= self.opening {
            return Err(ClinicError::Validation(format!(
                "Closing time {} must be after opening time {}",
                self.closing, self.opening
            )));
        }
        for window in self.classes.iter().chain(self.breaks.iter()) {
            if window.end <= window.start {
                return Err(ClinicError::Validation(format!(
                    "Window {}-{} is empty",
                    window.start, window.end
                )));
            }
        }
        Ok(())
    }

    /// 营业时间内的时段数量
    pub fn slots_per_day(&self) -> usize {
        let minutes = (self.closing - self.opening).num_minutes().max(0) as u32;
        if self.granularity_minutes == 0 {
            0
        } else {
            (minutes / self.granularity_minutes) as usize
        }
    }

    pub fn is_class_time(&self, date: NaiveDate, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.classes.iter().any(|w| w.blocks(date, start, end))
    }

    pub fn is_break_time(&self, date: NaiveDate, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.breaks.iter().any(|w| w.blocks(date, start, end))
    }
}

impl Default for Timetable {
    fn default() -> Self {
        Self {
            opening: hm(8, 0),
            closing: hm(18, 0),
            granularity_minutes: 30,
            classes: vec![
                RecurringWindow::new(&WEEKDAYS, hm(8, 0), hm(12, 0)),
                RecurringWindow::new(&WEEKDAYS, hm(14, 0), hm(16, 0)),
            ],
            breaks: vec![RecurringWindow::new(&ALL_DAYS, hm(12, 0), hm(14, 0))],
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_default_timetable() {
        let timetable = Timetable::default();
        assert!(timetable.validate().is_ok());
        assert_eq!(timetable.slots_per_day(), 20);
    }

    #[test]
    fn test_class_windows_only_on_weekdays() {
        let timetable = Timetable::default();
        let saturday = NaiveDate::from_ymd_opt(2026, 10, 24).unwrap();

        let nine = |d: NaiveDate| (d.and_time(hm(9, 0)), d.and_time(hm(9, 30)));
        let (s, e) = nine(monday());
        assert!(timetable.is_class_time(monday(), s, e));
        let (s, e) = nine(saturday);
        assert!(!timetable.is_class_time(saturday, s, e));
    }

    #[test]
    fn test_break_every_day() {
        let timetable = Timetable::default();
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 25).unwrap();
        let start = sunday.and_time(hm(12, 30));
        let end = sunday.and_time(hm(13, 0));
        assert!(timetable.is_break_time(sunday, start, end));
        assert!(!timetable.is_break_time(sunday, sunday.and_time(hm(14, 0)), sunday.and_time(hm(14, 30))));
    }

    #[test]
    fn test_invalid_timetable() {
        let timetable = Timetable {
            granularity_minutes: 0,
            ..Timetable::default()
        };
        assert!(timetable.validate().is_err());

        let timetable = Timetable {
            opening: hm(18, 0),
            closing: hm(8, 0),
            ..Timetable::default()
        };
        assert!(timetable.validate().is_err());
    }
}
