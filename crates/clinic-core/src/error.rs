//! 错误定义模块

use thiserror::Error;

/// 诊所系统统一错误类型
#[derive(Error, Debug)]
pub enum ClinicError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("持久化失败: {0}")]
    Persistence(String),

    #[error("版本冲突: 期望版本 {expected}，实际版本 {found}")]
    Conflict { expected: u64, found: u64 },

    #[error("保存正在进行中")]
    SaveInProgress,

    #[error("牙齿 {tooth} 正在编辑中")]
    EditInProgress { tooth: u8 },

    #[error("无效状态转换: 从 {from} 到 {event}")]
    InvalidStateTransition { from: String, event: String },

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("系统内部错误: {0}")]
    Internal(String),
}

/// 诊所系统统一结果类型
pub type Result<T> = std::result::Result<T, ClinicError>;
