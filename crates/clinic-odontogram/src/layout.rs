//! 牙列布局
//!
//! 按 FDI 编号给出每种牙列的有效牙位及其象限分组。布局在编辑器创建时确定，之后不再改变。

use clinic_core::ClinicError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::tooth::ToothNumber;

/// 牙列类型
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DentitionType {
    #[default]
    Adult, // 恒牙列
    Pediatric, // 乳牙列
    Mixed,     // 混合牙列
}

impl fmt::Display for DentitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DentitionType::Adult => write!(f, "adult"),
            DentitionType::Pediatric => write!(f, "pediatric"),
            DentitionType::Mixed => write!(f, "mixed"),
        }
    }
}

impl FromStr for DentitionType {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "adult" => Ok(DentitionType::Adult),
            "pediatric" => Ok(DentitionType::Pediatric),
            "mixed" => Ok(DentitionType::Mixed),
            other => Err(ClinicError::Validation(format!("Unknown dentition type: {}", other))),
        }
    }
}

/// 象限
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuadrantPosition {
    MaxillaryRight,  // 右上
    MaxillaryLeft,   // 左上
    MandibularLeft,  // 左下
    MandibularRight, // 右下
}

/// 一个象限中按显示顺序排列的牙位
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quadrant {
    pub position: QuadrantPosition,
    pub teeth: Vec<ToothNumber>,
}

/// 牙列布局
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DentalLayout {
    dentition: DentitionType,
    quadrants: Vec<Quadrant>,
}

// 显示顺序：上颌从患者右侧到左侧，下颌从左侧到右侧
const ADULT: [(QuadrantPosition, [ToothNumber; 8]); 4] = [
    (QuadrantPosition::MaxillaryRight, [18, 17, 16, 15, 14, 13, 12, 11]),
    (QuadrantPosition::MaxillaryLeft, [21, 22, 23, 24, 25, 26, 27, 28]),
    (QuadrantPosition::MandibularLeft, [31, 32, 33, 34, 35, 36, 37, 38]),
    (QuadrantPosition::MandibularRight, [48, 47, 46, 45, 44, 43, 42, 41]),
];

const PEDIATRIC: [(QuadrantPosition, [ToothNumber; 5]); 4] = [
    (QuadrantPosition::MaxillaryRight, [55, 54, 53, 52, 51]),
    (QuadrantPosition::MaxillaryLeft, [61, 62, 63, 64, 65]),
    (QuadrantPosition::MandibularLeft, [71, 72, 73, 74, 75]),
    (QuadrantPosition::MandibularRight, [85, 84, 83, 82, 81]),
];

impl DentalLayout {
    pub fn for_dentition(dentition: DentitionType) -> Self {
        let quadrants = (0..4)
            .map(|i| {
                let (position, adult) = ADULT[i];
                let (_, pediatric) = PEDIATRIC[i];
                let teeth = match dentition {
                    DentitionType::Adult => adult.to_vec(),
                    DentitionType::Pediatric => pediatric.to_vec(),
                    DentitionType::Mixed => adult.iter().chain(pediatric.iter()).copied().collect(),
                };
                Quadrant { position, teeth }
            })
            .collect();

        Self {
            dentition,
            quadrants,
        }
    }

    pub fn dentition(&self) -> DentitionType {
        self.dentition
    }

    pub fn quadrants(&self) -> &[Quadrant] {
        &self.quadrants
    }

    pub fn quadrant(&self, position: QuadrantPosition) -> Option<&Quadrant> {
        self.quadrants.iter().find(|q| q.position == position)
    }

    /// 按显示顺序遍历所有牙位
    pub fn teeth(&self) -> impl Iterator<Item = ToothNumber> + '_ {
        self.quadrants.iter().flat_map(|q| q.teeth.iter().copied())
    }

    pub fn tooth_count(&self) -> usize {
        self.quadrants.iter().map(|q| q.teeth.len()).sum()
    }

    pub fn contains(&self, tooth: ToothNumber) -> bool {
        self.quadrants.iter().any(|q| q.teeth.contains(&tooth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adult_layout() {
        let layout = DentalLayout::for_dentition(DentitionType::Adult);
        assert_eq!(layout.tooth_count(), 32);
        assert!(layout.contains(11));
        assert!(layout.contains(48));
        assert!(!layout.contains(55));
        assert!(!layout.contains(19));
        assert_eq!(
            layout.quadrant(QuadrantPosition::MaxillaryRight).unwrap().teeth[0],
            18
        );
    }

    #[test]
    fn test_pediatric_layout() {
        let layout = DentalLayout::for_dentition(DentitionType::Pediatric);
        assert_eq!(layout.tooth_count(), 20);
        assert!(layout.contains(55));
        assert!(layout.contains(81));
        assert!(!layout.contains(11));
    }

    #[test]
    fn test_mixed_layout_is_union() {
        let layout = DentalLayout::for_dentition(DentitionType::Mixed);
        assert_eq!(layout.tooth_count(), 52);
        assert!(layout.contains(16));
        assert!(layout.contains(64));
        let mut teeth: Vec<ToothNumber> = layout.teeth().collect();
        teeth.sort_unstable();
        teeth.dedup();
        assert_eq!(teeth.len(), 52);
    }

    #[test]
    fn test_dentition_parsing() {
        assert_eq!("Mixed".parse::<DentitionType>().unwrap(), DentitionType::Mixed);
        assert!("senior".parse::<DentitionType>().is_err());
        assert_eq!(DentitionType::Pediatric.to_string(), "pediatric");
    }
}
