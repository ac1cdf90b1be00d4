//! 预约存储接口
//!
//! 可用时段解析器只通过 [`BookingLookup`] 询问冲突，不关心预约如何存储。

use chrono::NaiveDateTime;
use clinic_core::{seed_bookings, Booking};
use serde::{Deserialize, Serialize};

/// 判断预约冲突的策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// 仅当已有预约的开始时间与时段开始时间完全相同时才算冲突
    #[default]
    ExactStart,
    /// 已有预约区间与时段区间相交即算冲突
    Overlap,
}

/// 预约冲突查询
pub trait BookingLookup: Send + Sync {
    /// 学生在区间 `[start, end)` 内是否已有预约
    fn has_conflict(&self, student_id: &str, start: NaiveDateTime, end: NaiveDateTime) -> bool;
}

/// 内存预约存储
#[derive(Debug, Clone)]
pub struct InMemoryBookingStore {
    bookings: Vec<Booking>,
    policy: ConflictPolicy,
}

impl InMemoryBookingStore {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self {
            bookings: Vec::new(),
            policy,
        }
    }

    /// 使用目录中的种子预约
    pub fn seeded(policy: ConflictPolicy) -> Self {
        Self::new(policy).with_bookings(seed_bookings())
    }

    pub fn with_bookings(mut self, bookings: impl IntoIterator<Item = Booking>) -> Self {
        self.bookings.extend(bookings);
        self
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    pub fn bookings_for(&self, student_id: &str) -> Vec<&Booking> {
        self.bookings
            .iter()
            .filter(|b| b.student_id == student_id)
            .collect()
    }
}

impl Default for InMemoryBookingStore {
    fn default() -> Self {
        Self::seeded(ConflictPolicy::default())
    }
}

impl BookingLookup for InMemoryBookingStore {
    fn has_conflict(&self, student_id: &str, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.bookings
            .iter()
            .filter(|b| b.student_id == student_id)
            .any(|b| match self.policy {
                ConflictPolicy::ExactStart => b.start == start,
                ConflictPolicy::Overlap => b.start < end && start < b.end(),
            })
    }
}
