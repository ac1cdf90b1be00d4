//! # 学生排班模块
//!
//! 回答"这位学生什么时候可以接诊"，包括：
//! - 机构课表：营业时间、上课时间和午休
//! - 预约冲突查询：可注入的预约存储接口
//! - 可用时段解析：生成时段、校验预约、推荐替代时段

pub mod availability;
pub mod booking;
pub mod timetable;

// 重新导出主要类型
pub use availability::{
    AvailabilityResolver, DayAvailability, DaySuggestion, ResolverOptions, SlotValidation,
};
pub use booking::{BookingLookup, ConflictPolicy, InMemoryBookingStore};
pub use timetable::{RecurringWindow, Timetable};
