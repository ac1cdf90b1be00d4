//! 牙位图状态机
//!
//! 管理牙位图的保存状态：已保存、有未保存修改、保存中

use clinic_core::{ClinicError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 牙位图状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ChartState {
    Clean,  // 无未保存修改
    Dirty,  // 有未保存修改
    Saving, // 保存中
}

/// 状态转换事件
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ChartEvent {
    Edited,
    Reset,
    SaveStarted,
    SaveSucceeded,
    SaveFailed,
}

/// 牙位图状态机
#[derive(Debug)]
pub struct ChartStateMachine {
    transitions: HashMap<(ChartState, ChartEvent), ChartState>,
}

impl ChartStateMachine {
    /// 创建新的状态机实例
    pub fn new() -> Self {
        let mut transitions = HashMap::new();

        for from in [ChartState::Clean, ChartState::Dirty] {
            transitions.insert((from, ChartEvent::Edited), ChartState::Dirty);
            transitions.insert((from, ChartEvent::Reset), ChartState::Dirty);
            transitions.insert((from, ChartEvent::SaveStarted), ChartState::Saving);
        }
        transitions.insert((ChartState::Saving, ChartEvent::SaveSucceeded), ChartState::Clean);
        transitions.insert((ChartState::Saving, ChartEvent::SaveFailed), ChartState::Dirty);

        Self { transitions }
    }

    /// 检查状态转换是否有效
    pub fn can_transition(&self, from: ChartState, event: ChartEvent) -> bool {
        self.transitions.contains_key(&(from, event))
    }

    /// 执行状态转换；保存中的任何编辑或重复保存都会被拒绝
    pub fn transition(&self, from: ChartState, event: ChartEvent) -> Result<ChartState> {
        match self.transitions.get(&(from, event)) {
            Some(to) => Ok(*to),
            None if from == ChartState::Saving => Err(ClinicError::SaveInProgress),
            None => Err(ClinicError::InvalidStateTransition {
                from: format!("{:?}", from),
                event: format!("{:?}", event),
            }),
        }
    }

    /// 获取状态的所有可能事件
    pub fn possible_events(&self, current: ChartState) -> Vec<ChartEvent> {
        self.transitions
            .keys()
            .filter(|(state, _)| *state == current)
            .map(|(_, event)| *event)
            .collect()
    }
}

impl Default for ChartStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
