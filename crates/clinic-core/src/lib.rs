//! # Clinic Core
//!
//! 牙科诊所系统的核心模块，提供基础数据结构、错误定义、参考目录和通用工具。

pub mod catalog;
pub mod error;
pub mod models;
pub mod utils;

pub use catalog::{seed_bookings, Catalog};
pub use error::{ClinicError, Result};
pub use models::*;
