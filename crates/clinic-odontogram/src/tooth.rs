//! 单颗牙齿的临床状态

use chrono::NaiveDateTime;
use clinic_core::ClinicError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// FDI 牙位编号（如 11、48、55）
pub type ToothNumber = u8;

/// 牙齿状况；未记录的牙齿即为 `Healthy`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DentalCondition {
    #[default]
    Healthy,   // 健康
    Caries,    // 龋坏
    Filled,    // 已充填
    Crown,     // 牙冠
    Missing,   // 缺失
    RootCanal, // 根管治疗
    Implant,   // 种植体
    Erupting,  // 萌出中
    Extracted, // 已拔除
}

impl DentalCondition {
    pub const ALL: [DentalCondition; 9] = [
        DentalCondition::Healthy,
        DentalCondition::Caries,
        DentalCondition::Filled,
        DentalCondition::Crown,
        DentalCondition::Missing,
        DentalCondition::RootCanal,
        DentalCondition::Implant,
        DentalCondition::Erupting,
        DentalCondition::Extracted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DentalCondition::Healthy => "healthy",
            DentalCondition::Caries => "caries",
            DentalCondition::Filled => "filled",
            DentalCondition::Crown => "crown",
            DentalCondition::Missing => "missing",
            DentalCondition::RootCanal => "root_canal",
            DentalCondition::Implant => "implant",
            DentalCondition::Erupting => "erupting",
            DentalCondition::Extracted => "extracted",
        }
    }
}

impl fmt::Display for DentalCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DentalCondition {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        DentalCondition::ALL
            .iter()
            .find(|c| c.as_str() == needle)
            .copied()
            .ok_or_else(|| ClinicError::Validation(format!("Unknown tooth condition: {}", s)))
    }
}

/// 牙面
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Surface {
    #[serde(rename = "O")]
    Occlusal, // 咬合面
    #[serde(rename = "M")]
    Mesial, // 近中面
    #[serde(rename = "D")]
    Distal, // 远中面
    #[serde(rename = "V")]
    Vestibular, // 唇颊面
    #[serde(rename = "L")]
    Lingual, // 舌腭面
    #[serde(rename = "I")]
    Incisal, // 切缘
}

impl Surface {
    pub fn code(&self) -> char {
        match self {
            Surface::Occlusal => 'O',
            Surface::Mesial => 'M',
            Surface::Distal => 'D',
            Surface::Vestibular => 'V',
            Surface::Lingual => 'L',
            Surface::Incisal => 'I',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'O' => Some(Surface::Occlusal),
            'M' => Some(Surface::Mesial),
            'D' => Some(Surface::Distal),
            'V' => Some(Surface::Vestibular),
            'L' => Some(Surface::Lingual),
            'I' => Some(Surface::Incisal),
            _ => None,
        }
    }

    /// 解析 "OM" 这样的牙面代码串，保持顺序并去重
    pub fn parse_codes(codes: &str) -> Result<Vec<Surface>, ClinicError> {
        let mut surfaces = Vec::new();
        for code in codes.chars().filter(|c| !c.is_whitespace()) {
            let surface = Surface::from_code(code)
                .ok_or_else(|| ClinicError::Validation(format!("Unknown surface code: {}", code)))?;
            if !surfaces.contains(&surface) {
                surfaces.push(surface);
            }
        }
        Ok(surfaces)
    }
}

/// 严重程度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

/// 单颗牙齿的记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToothCondition {
    pub id: ToothNumber,
    pub condition: DentalCondition,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub surfaces: Vec<Surface>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<NaiveDateTime>,
}

impl ToothCondition {
    /// 未记录牙齿的默认状态
    pub fn healthy(id: ToothNumber) -> Self {
        Self {
            id,
            condition: DentalCondition::Healthy,
            surfaces: Vec::new(),
            notes: None,
            treatment: None,
            severity: None,
            last_modified: None,
        }
    }

    /// 把更新中给出的字段合并到当前记录
    pub fn merged(&self, update: &ToothConditionUpdate, modified_at: NaiveDateTime) -> Self {
        let mut next = self.clone();
        if let Some(condition) = update.condition {
            next.condition = condition;
        }
        if let Some(surfaces) = &update.surfaces {
            next.surfaces = surfaces.clone();
        }
        if let Some(notes) = &update.notes {
            next.notes = non_empty(notes);
        }
        if let Some(treatment) = &update.treatment {
            next.treatment = non_empty(treatment);
        }
        if let Some(severity) = update.severity {
            next.severity = Some(severity);
        }
        next.last_modified = Some(modified_at);
        next
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// 部分更新；`None` 表示保持原值，空字符串清除备注/治疗描述
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToothConditionUpdate {
    pub condition: Option<DentalCondition>,
    pub surfaces: Option<Vec<Surface>>,
    pub notes: Option<String>,
    pub treatment: Option<String>,
    pub severity: Option<Severity>,
}

impl ToothConditionUpdate {
    pub fn condition(condition: DentalCondition) -> Self {
        Self {
            condition: Some(condition),
            ..Default::default()
        }
    }

    pub fn with_surfaces(mut self, surfaces: impl IntoIterator<Item = Surface>) -> Self {
        self.surfaces = Some(surfaces.into_iter().collect());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_treatment(mut self, treatment: impl Into<String>) -> Self {
        self.treatment = Some(treatment.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }
}
