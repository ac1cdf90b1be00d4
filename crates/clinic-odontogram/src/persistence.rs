//! 牙位图持久化接口
//!
//! 核心只做整体替换，不做局部更新。`version` 作为乐观并发令牌：
//! 保存时携带编辑开始时读到的版本，存储端版本不一致则拒绝。

use async_trait::async_trait;
use chrono::NaiveDateTime;
use clinic_core::{ClinicError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::layout::DentitionType;
use crate::tooth::{ToothCondition, ToothNumber};

/// 患者牙位图聚合
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OdontogramData {
    pub patient_id: String,
    pub patient_name: String,
    pub dentition: DentitionType,
    pub teeth: BTreeMap<ToothNumber, ToothCondition>,
    pub general_notes: String,
    pub last_updated: NaiveDateTime,
    pub updated_by: String,
    pub version: u64,
}

/// 牙位图存储服务
#[async_trait]
pub trait OdontogramStore: Send + Sync {
    /// 整体保存，返回新版本号
    async fn save(&self, data: &OdontogramData) -> Result<u64>;

    /// 读取患者当前的牙位图
    async fn load(&self, patient_id: &str) -> Result<Option<OdontogramData>>;
}

/// 内存存储，可模拟网络延迟
#[derive(Debug, Default)]
pub struct InMemoryOdontogramStore {
    records: RwLock<HashMap<String, OdontogramData>>,
    latency: Option<Duration>,
}

impl InMemoryOdontogramStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            latency: Some(latency),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl OdontogramStore for InMemoryOdontogramStore {
    async fn save(&self, data: &OdontogramData) -> Result<u64> {
        self.simulate_latency().await;

        let mut records = self.records.write().await;
        let stored_version = records.get(&data.patient_id).map(|r| r.version).unwrap_or(0);

        if data.version != stored_version {
            tracing::warn!(
                "Rejected stale odontogram for patient {}: based on version {}, stored version {}",
                data.patient_id,
                data.version,
                stored_version
            );
            return Err(ClinicError::Conflict {
                expected: data.version,
                found: stored_version,
            });
        }

        let version = stored_version + 1;
        let mut record = data.clone();
        record.version = version;
        records.insert(record.patient_id.clone(), record);

        tracing::debug!("Stored odontogram for patient {} at version {}", data.patient_id, version);
        Ok(version)
    }

    async fn load(&self, patient_id: &str) -> Result<Option<OdontogramData>> {
        self.simulate_latency().await;
        Ok(self.records.read().await.get(patient_id).cloned())
    }
}
