//! # Dental Clinic
//!
//! 牙科诊所门户核心的统一入口，重新导出各子模块：
//! - [`domain`]：错误、领域模型与参考目录
//! - [`scheduling`]：学生可预约时段解析
//! - [`odontogram`]：牙位图状态模型
//! - [`admin`]：配置与日志

pub use clinic_admin as admin;
pub use clinic_core as domain;
pub use clinic_odontogram as odontogram;
pub use clinic_scheduling as scheduling;
