//! 核心数据模型定义

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ClinicError;

/// 临床专科
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Specialty {
    #[serde(rename = "Endodoncia")]
    Endodontics, // 牙髓病学
    #[serde(rename = "Ortodoncia")]
    Orthodontics, // 正畸
    #[serde(rename = "Periodoncia")]
    Periodontics, // 牙周病学
    #[serde(rename = "Cirugía Oral")]
    OralSurgery, // 口腔外科
    #[serde(rename = "Odontopediatría")]
    PediatricDentistry, // 儿童牙科
    #[serde(rename = "Prostodoncia")]
    Prosthodontics, // 修复学
    #[serde(rename = "Operatoria Dental")]
    RestorativeDentistry, // 牙体修复
}

impl Specialty {
    /// 所有专科，按目录顺序
    pub const ALL: [Specialty; 7] = [
        Specialty::Endodontics,
        Specialty::Orthodontics,
        Specialty::Periodontics,
        Specialty::OralSurgery,
        Specialty::PediatricDentistry,
        Specialty::Prosthodontics,
        Specialty::RestorativeDentistry,
    ];

    /// 目录中使用的专科名称
    pub fn name(&self) -> &'static str {
        match self {
            Specialty::Endodontics => "Endodoncia",
            Specialty::Orthodontics => "Ortodoncia",
            Specialty::Periodontics => "Periodoncia",
            Specialty::OralSurgery => "Cirugía Oral",
            Specialty::PediatricDentistry => "Odontopediatría",
            Specialty::Prosthodontics => "Prostodoncia",
            Specialty::RestorativeDentistry => "Operatoria Dental",
        }
    }
}

impl fmt::Display for Specialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Specialty {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Specialty::ALL
            .iter()
            .find(|specialty| specialty.name().to_lowercase() == needle)
            .copied()
            .ok_or_else(|| ClinicError::Validation(format!("Unknown specialty: {}", s)))
    }
}

/// 学生经验等级
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

/// 学生（实习医生）档案
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: String,
    pub name: String,
    pub specialty: Specialty,
    pub semester: u8,
    pub experience: ExperienceLevel,
    pub rating: f32,
    pub completed_cases: u32,
    pub bio: String,
    pub languages: Vec<String>,
    pub certifications: Vec<String>,
}

/// 可预约的诊疗项目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentType {
    pub id: String,
    pub name: String,
    pub duration_minutes: u32,
    pub specialty: Specialty,
    pub description: String,
    pub requirements: Vec<String>,
    pub estimated_cost: f64,
}

/// 时段类型，说明时段为何可用或不可用
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Class,       // 上课
    Appointment, // 已有预约
    Break,       // 休息
    Study,       // 自由时间
}

/// 半开时间区间 `[start, end)`，时间均为本地无时区时间
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub available: bool,
    pub kind: Option<SlotKind>,
}

impl TimeSlot {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, available: bool, kind: SlotKind) -> Self {
        Self {
            start,
            end,
            available,
            kind: Some(kind),
        }
    }

    /// 时长（分钟）
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// 两个半开区间是否相交
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start < end && start < self.end
    }
}

/// 已存在的预约
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub student_id: String,
    pub start: NaiveDateTime,
    pub duration_minutes: u32,
}

impl Booking {
    pub fn new(student_id: impl Into<String>, start: NaiveDateTime, duration_minutes: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            student_id: student_id.into(),
            start,
            duration_minutes,
        }
    }

    pub fn end(&self) -> NaiveDateTime {
        self.start + Duration::minutes(i64::from(self.duration_minutes))
    }
}
