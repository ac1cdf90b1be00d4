//! 学生可预约时段解析
//!
//! 不依赖任何存储的日历：可用性由课表规则和预约冲突查询确定性地合成。
//! 所有函数都是纯函数，重复调用得到相同结果，"没有可用时段"是正常结果而不是错误。

use chrono::{Days, Duration, NaiveDate, NaiveDateTime};
use clinic_core::utils::{truncate_to_minute, units_for};
use clinic_core::{AppointmentType, SlotKind, TimeSlot};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::booking::{BookingLookup, InMemoryBookingStore};
use crate::timetable::Timetable;

/// 解析器选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverOptions {
    /// 向后查找替代时段的天数
    pub suggestion_days: u32,
    /// 每天最多给出的替代时段数
    pub max_suggestions_per_day: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            suggestion_days: 7,
            max_suggestions_per_day: 3,
        }
    }
}

/// 某天的替代时段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySuggestion {
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
}

/// 某天的可用概况，用于日历视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub available_slots: usize,
}

/// 预约时段校验结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<DaySuggestion>,
}

impl SlotValidation {
    fn accepted() -> Self {
        Self {
            valid: true,
            message: None,
            alternatives: Vec::new(),
        }
    }
}

/// 可用时段解析器
pub struct AvailabilityResolver {
    timetable: Timetable,
    bookings: Arc<dyn BookingLookup>,
    options: ResolverOptions,
}

impl AvailabilityResolver {
    pub fn new(timetable: Timetable, bookings: Arc<dyn BookingLookup>) -> Self {
        Self {
            timetable,
            bookings,
            options: ResolverOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn timetable(&self) -> &Timetable {
        &self.timetable
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// 把营业时间按固定粒度切分，并标注每个时段是否可预约
    ///
    /// 时段类型的优先级：上课 > 休息 > 已有预约 > 自由时间。
    pub fn generate_student_schedule(&self, student_id: &str, date: NaiveDate) -> Vec<TimeSlot> {
        let step = Duration::minutes(i64::from(self.timetable.granularity_minutes));
        let opening = date.and_time(self.timetable.opening);

        (0..self.timetable.slots_per_day())
            .map_while(|i| {
                let start = opening.checked_add_signed(step * i as i32)?;
                let end = start.checked_add_signed(step)?;

                let kind = if self.timetable.is_class_time(date, start, end) {
                    SlotKind::Class
                } else if self.timetable.is_break_time(date, start, end) {
                    SlotKind::Break
                } else if self.bookings.has_conflict(student_id, start, end) {
                    SlotKind::Appointment
                } else {
                    SlotKind::Study
                };

                Some(TimeSlot::new(start, end, kind == SlotKind::Study, kind))
            })
            .collect()
    }

    /// 找出能容纳 `duration_minutes` 的所有开始时间
    ///
    /// 某个可用时段之后（含自身）需要有足够多的连续可用时段，才会输出
    /// `[start, start + duration)`。
    pub fn available_slots(
        &self,
        student_id: &str,
        date: NaiveDate,
        duration_minutes: u32,
    ) -> Vec<TimeSlot> {
        let units = units_for(duration_minutes, self.timetable.granularity_minutes);
        if units == 0 {
            return Vec::new();
        }

        let schedule = self.generate_student_schedule(student_id, date);
        let duration = Duration::minutes(i64::from(duration_minutes));

        let slots: Vec<TimeSlot> = schedule
            .windows(units)
            .filter(|window| window.iter().all(|slot| slot.available))
            .filter_map(|window| {
                let start = window[0].start;
                let end = start.checked_add_signed(duration)?;
                Some(TimeSlot::new(start, end, true, SlotKind::Study))
            })
            .collect();

        tracing::debug!(
            "Student {} has {} slots of {} minutes on {}",
            student_id,
            slots.len(),
            duration_minutes,
            date
        );
        slots
    }

    /// 按诊疗项目时长查询可用时段
    pub fn available_slots_for_type(
        &self,
        student_id: &str,
        date: NaiveDate,
        appointment_type: &AppointmentType,
    ) -> Vec<TimeSlot> {
        self.available_slots(student_id, date, appointment_type.duration_minutes)
    }

    /// 校验请求的开始时间和时长是否可预约
    ///
    /// 只做检查，不做保留；不可用时附带后续几天的替代时段。
    pub fn validate_appointment_slot(
        &self,
        student_id: &str,
        start: NaiveDateTime,
        duration_minutes: u32,
    ) -> SlotValidation {
        let start = truncate_to_minute(start);
        let date = start.date();

        let valid = self
            .available_slots(student_id, date, duration_minutes)
            .iter()
            .any(|slot| slot.start == start);

        if valid {
            return SlotValidation::accepted();
        }

        let alternatives = self.suggest_alternative_slots(
            student_id,
            date,
            duration_minutes,
            self.options.suggestion_days,
        );

        tracing::info!(
            "Slot {} ({} min) unavailable for student {}, {} alternative days found",
            start.format("%Y-%m-%d %H:%M"),
            duration_minutes,
            student_id,
            alternatives.len()
        );

        let message = if alternatives.is_empty() {
            format!(
                "The slot starting at {} is not available and no alternatives were found in the next {} days",
                start.format("%Y-%m-%d %H:%M"),
                self.options.suggestion_days
            )
        } else {
            format!(
                "The slot starting at {} is not available; see the suggested alternatives",
                start.format("%Y-%m-%d %H:%M")
            )
        };

        SlotValidation {
            valid: false,
            message: Some(message),
            alternatives,
        }
    }

    /// 从 `preferred_date` 的下一天开始逐日查找替代时段
    ///
    /// 按日期先后返回，每天最多 `max_suggestions_per_day` 个；没有可用时段的日期被跳过。
    pub fn suggest_alternative_slots(
        &self,
        student_id: &str,
        preferred_date: NaiveDate,
        duration_minutes: u32,
        days_to_check: u32,
    ) -> Vec<DaySuggestion> {
        // 日期越界时停止查找
        (1..=u64::from(days_to_check))
            .map_while(|offset| preferred_date.checked_add_days(Days::new(offset)))
            .filter_map(|date| {
                let slots: Vec<TimeSlot> = self
                    .available_slots(student_id, date, duration_minutes)
                    .into_iter()
                    .take(self.options.max_suggestions_per_day)
                    .collect();

                (!slots.is_empty()).then_some(DaySuggestion { date, slots })
            })
            .collect()
    }

    /// 从 `from` 开始连续 `days` 天的可用时段数量
    pub fn daily_availability(
        &self,
        student_id: &str,
        from: NaiveDate,
        days: u32,
        duration_minutes: u32,
    ) -> Vec<DayAvailability> {
        (0..u64::from(days))
            .map_while(|offset| from.checked_add_days(Days::new(offset)))
            .map(|date| {
                DayAvailability {
                    date,
                    available_slots: self.available_slots(student_id, date, duration_minutes).len(),
                }
            })
            .collect()
    }
}

impl Default for AvailabilityResolver {
    fn default() -> Self {
        Self::new(Timetable::default(), Arc::new(InMemoryBookingStore::default()))
    }
}

impl fmt::Debug for AvailabilityResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvailabilityResolver")
            .field("timetable", &self.timetable)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
