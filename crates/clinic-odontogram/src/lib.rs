//! # 牙位图模块
//!
//! 管理患者的逐牙临床状态，包括：
//! - 牙齿状态：状况、牙面、严重程度和治疗描述
//! - 牙列布局：恒牙、乳牙和混合牙列的 FDI 牙位
//! - 状态机：已保存 / 未保存 / 保存中
//! - 编辑器：单牙编辑协议与整体保存
//! - 持久化接口：带版本号的整体替换存储

pub mod editor;
pub mod layout;
pub mod persistence;
pub mod state_machine;
pub mod tooth;

// 重新导出主要类型
pub use editor::{Notification, NotificationLevel, OdontogramEditor};
pub use layout::{DentalLayout, DentitionType, Quadrant, QuadrantPosition};
pub use persistence::{InMemoryOdontogramStore, OdontogramData, OdontogramStore};
pub use state_machine::{ChartEvent, ChartState, ChartStateMachine};
pub use tooth::{
    DentalCondition, Severity, Surface, ToothCondition, ToothConditionUpdate, ToothNumber,
};
