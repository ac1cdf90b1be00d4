//! 牙位图编辑器
//!
//! 维护一个患者会话中的牙位状态表，一次只允许编辑一颗牙齿，并跟踪是否有未保存的修改。

use chrono::{Local, NaiveDateTime};
use clinic_core::utils::truncate_to_minute;
use clinic_core::{ClinicError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::layout::{DentalLayout, DentitionType};
use crate::persistence::{OdontogramData, OdontogramStore};
use crate::state_machine::{ChartEvent, ChartState, ChartStateMachine};
use crate::tooth::{DentalCondition, ToothCondition, ToothConditionUpdate, ToothNumber};

/// 通知级别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// 展示给用户的通知
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: NaiveDateTime,
}

impl Notification {
    fn new(level: NotificationLevel, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            message,
            created_at: now(),
        }
    }
}

fn now() -> NaiveDateTime {
    truncate_to_minute(Local::now().naive_local())
}

/// 保存期间把状态置为 `Saving`；保存未完成就被丢弃时退回 `Dirty`
struct SaveGuard<'a> {
    state: &'a mut ChartState,
    completed: bool,
}

impl<'a> SaveGuard<'a> {
    fn enter(state: &'a mut ChartState) -> Self {
        *state = ChartState::Saving;
        Self {
            state,
            completed: false,
        }
    }

    fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            *self.state = ChartState::Dirty;
        }
    }
}

/// 牙位图编辑器
pub struct OdontogramEditor {
    patient_id: String,
    patient_name: String,
    layout: DentalLayout,
    teeth: BTreeMap<ToothNumber, ToothCondition>,
    general_notes: String,
    last_updated: Option<NaiveDateTime>,
    author: String,
    version: u64,
    state: ChartState,
    state_machine: ChartStateMachine,
    selected: Option<ToothNumber>,
    notifications: Vec<Notification>,
    store: Arc<dyn OdontogramStore>,
}

impl OdontogramEditor {
    /// 为尚无记录的患者创建空白牙位图
    pub fn new(
        patient_id: impl Into<String>,
        patient_name: impl Into<String>,
        dentition: DentitionType,
        author: impl Into<String>,
        store: Arc<dyn OdontogramStore>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            patient_name: patient_name.into(),
            layout: DentalLayout::for_dentition(dentition),
            teeth: BTreeMap::new(),
            general_notes: String::new(),
            last_updated: None,
            author: author.into(),
            version: 0,
            state: ChartState::Clean,
            state_machine: ChartStateMachine::new(),
            selected: None,
            notifications: Vec::new(),
            store,
        }
    }

    /// 基于已保存的数据打开编辑器
    pub fn from_data(
        data: OdontogramData,
        author: impl Into<String>,
        store: Arc<dyn OdontogramStore>,
    ) -> Self {
        let mut editor = Self::new(data.patient_id, data.patient_name, data.dentition, author, store);
        editor.teeth = data.teeth;
        editor.general_notes = data.general_notes;
        editor.last_updated = Some(data.last_updated);
        editor.version = data.version;
        editor
    }

    /// 从存储读取患者牙位图；没有记录时创建空白牙位图
    pub async fn open(
        patient_id: impl Into<String>,
        patient_name: impl Into<String>,
        dentition: DentitionType,
        author: impl Into<String>,
        store: Arc<dyn OdontogramStore>,
    ) -> Result<Self> {
        let patient_id = patient_id.into();
        match store.load(&patient_id).await? {
            Some(data) => {
                tracing::info!(
                    "Opened odontogram for patient {} at version {}",
                    patient_id,
                    data.version
                );
                Ok(Self::from_data(data, author, store))
            }
            None => Ok(Self::new(patient_id, patient_name, dentition, author, store)),
        }
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn patient_name(&self) -> &str {
        &self.patient_name
    }

    pub fn dentition(&self) -> DentitionType {
        self.layout.dentition()
    }

    pub fn layout(&self) -> &DentalLayout {
        &self.layout
    }

    pub fn state(&self) -> ChartState {
        self.state
    }

    /// 是否有未保存的修改
    pub fn has_changes(&self) -> bool {
        self.state != ChartState::Clean
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn last_updated(&self) -> Option<NaiveDateTime> {
        self.last_updated
    }

    pub fn general_notes(&self) -> &str {
        &self.general_notes
    }

    pub fn selected_tooth(&self) -> Option<ToothNumber> {
        self.selected
    }

    /// 显式记录过的牙齿
    pub fn recorded_teeth(&self) -> &BTreeMap<ToothNumber, ToothCondition> {
        &self.teeth
    }

    /// 牙齿当前状态；未记录的牙齿视为健康
    pub fn tooth_condition(&self, tooth: ToothNumber) -> ToothCondition {
        self.teeth
            .get(&tooth)
            .cloned()
            .unwrap_or_else(|| ToothCondition::healthy(tooth))
    }

    /// 按布局顺序列出所有牙齿的状态
    pub fn chart(&self) -> Vec<ToothCondition> {
        self.layout.teeth().map(|t| self.tooth_condition(t)).collect()
    }

    /// 各状况的牙齿数量（包括隐含的健康牙齿）
    pub fn condition_counts(&self) -> BTreeMap<DentalCondition, usize> {
        let mut counts = BTreeMap::new();
        for tooth in self.layout.teeth() {
            *counts.entry(self.tooth_condition(tooth).condition).or_insert(0) += 1;
        }
        counts
    }

    fn ensure_in_layout(&self, tooth: ToothNumber) -> Result<()> {
        if self.layout.contains(tooth) {
            Ok(())
        } else {
            Err(ClinicError::Validation(format!(
                "Tooth {} is not part of the {} dentition",
                tooth,
                self.layout.dentition()
            )))
        }
    }

    fn apply_event(&mut self, event: ChartEvent) -> Result<()> {
        self.state = self.state_machine.transition(self.state, event)?;
        Ok(())
    }

    /// 合并更新到牙齿记录并标记为未保存
    ///
    /// 记录整体替换，不保留历史；另一颗牙齿正在编辑时拒绝，
    /// 更新的正是选中牙齿时清除选中状态。
    pub fn update_tooth_condition(
        &mut self,
        tooth: ToothNumber,
        update: ToothConditionUpdate,
    ) -> Result<ToothCondition> {
        self.ensure_in_layout(tooth)?;
        if let Some(selected) = self.selected {
            if selected != tooth {
                return Err(ClinicError::EditInProgress { tooth: selected });
            }
        }
        self.apply_event(ChartEvent::Edited)?;
        // 直接更新选中的牙齿等同于提交编辑
        if self.selected == Some(tooth) {
            self.selected = None;
        }

        let record = self.tooth_condition(tooth).merged(&update, now());
        tracing::debug!(
            "Tooth {} of patient {} set to {}",
            tooth,
            self.patient_id,
            record.condition
        );
        self.teeth.insert(tooth, record.clone());
        Ok(record)
    }

    pub fn set_general_notes(&mut self, notes: impl Into<String>) -> Result<()> {
        self.apply_event(ChartEvent::Edited)?;
        self.general_notes = notes.into();
        Ok(())
    }

    /// 清空所有牙齿记录和备注；重置本身也需要保存
    pub fn reset(&mut self) -> Result<()> {
        self.apply_event(ChartEvent::Reset)?;
        self.teeth.clear();
        self.general_notes.clear();
        self.selected = None;
        tracing::info!("Odontogram of patient {} reset", self.patient_id);
        Ok(())
    }

    /// 选中一颗牙齿开始编辑
    pub fn select_tooth(&mut self, tooth: ToothNumber) -> Result<ToothCondition> {
        self.ensure_in_layout(tooth)?;
        match self.selected {
            Some(selected) if selected != tooth => Err(ClinicError::EditInProgress { tooth: selected }),
            _ => {
                self.selected = Some(tooth);
                Ok(self.tooth_condition(tooth))
            }
        }
    }

    /// 提交对选中牙齿的修改，并清除选中状态
    pub fn commit_edit(&mut self, update: ToothConditionUpdate) -> Result<ToothCondition> {
        let tooth = self
            .selected
            .take()
            .ok_or_else(|| ClinicError::Validation("No tooth is selected".to_string()))?;
        self.update_tooth_condition(tooth, update)
    }

    /// 放弃编辑，返回之前选中的牙齿
    pub fn cancel_edit(&mut self) -> Option<ToothNumber> {
        self.selected.take()
    }

    /// 当前内容打包成聚合，版本为编辑所基于的版本
    pub fn snapshot(&self) -> OdontogramData {
        OdontogramData {
            patient_id: self.patient_id.clone(),
            patient_name: self.patient_name.clone(),
            dentition: self.layout.dentition(),
            teeth: self.teeth.clone(),
            general_notes: self.general_notes.clone(),
            last_updated: now(),
            updated_by: self.author.clone(),
            version: self.version,
        }
    }

    /// 整体保存牙位图
    ///
    /// 成功后回到已保存状态；失败时保持未保存状态，由用户决定是否重试。
    pub async fn save(&mut self) -> Result<u64> {
        // 保存中再次保存会在这里被拒绝
        self.state_machine.transition(self.state, ChartEvent::SaveStarted)?;

        let snapshot = self.snapshot();
        let store = Arc::clone(&self.store);
        let result = {
            let guard = SaveGuard::enter(&mut self.state);
            let result = store.save(&snapshot).await;
            guard.complete();
            result
        };

        match result {
            Ok(version) => {
                self.apply_event(ChartEvent::SaveSucceeded)?;
                self.version = version;
                self.last_updated = Some(snapshot.last_updated);
                tracing::info!(
                    "Saved odontogram for patient {} (version {}, {} teeth recorded)",
                    self.patient_id,
                    version,
                    snapshot.teeth.len()
                );
                self.notifications.push(Notification::new(
                    NotificationLevel::Success,
                    format!("Odontogram for {} saved", self.patient_name),
                ));
                Ok(version)
            }
            Err(e) => {
                self.apply_event(ChartEvent::SaveFailed)?;
                tracing::warn!("Failed to save odontogram for patient {}: {}", self.patient_id, e);
                self.notifications.push(Notification::new(
                    NotificationLevel::Error,
                    format!("Could not save odontogram for {}: {}", self.patient_name, e),
                ));
                Err(e)
            }
        }
    }

    /// 取出待展示的通知
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}

impl fmt::Debug for OdontogramEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OdontogramEditor")
            .field("patient_id", &self.patient_id)
            .field("dentition", &self.layout.dentition())
            .field("state", &self.state)
            .field("version", &self.version)
            .field("selected", &self.selected)
            .field("recorded_teeth", &self.teeth.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryOdontogramStore;
    use crate::tooth::{Severity, Surface};
    use async_trait::async_trait;
    use std::time::Duration;

    #[derive(Debug)]
    struct FailingStore;

    #[async_trait]
    impl OdontogramStore for FailingStore {
        async fn save(&self, _data: &OdontogramData) -> Result<u64> {
            Err(ClinicError::Persistence("storage unavailable".to_string()))
        }

        async fn load(&self, _patient_id: &str) -> Result<Option<OdontogramData>> {
            Ok(None)
        }
    }

    fn editor_with(store: Arc<dyn OdontogramStore>) -> OdontogramEditor {
        OdontogramEditor::new("p1", "Juan Pérez", DentitionType::Adult, "s1", store)
    }

    fn editor() -> OdontogramEditor {
        editor_with(Arc::new(InMemoryOdontogramStore::new()))
    }

    fn caries_om() -> ToothConditionUpdate {
        ToothConditionUpdate::condition(DentalCondition::Caries)
            .with_surfaces([Surface::Occlusal, Surface::Mesial])
    }

    #[test]
    fn test_fresh_chart_is_healthy() {
        for dentition in [DentitionType::Adult, DentitionType::Pediatric, DentitionType::Mixed] {
            let editor = OdontogramEditor::new(
                "p1",
                "Juan Pérez",
                dentition,
                "s1",
                Arc::new(InMemoryOdontogramStore::new()),
            );
            for tooth in editor.layout().teeth() {
                let record = editor.tooth_condition(tooth);
                assert_eq!(record.id, tooth);
                assert_eq!(record.condition, DentalCondition::Healthy);
            }
            assert!(!editor.has_changes());
        }
    }

    #[test]
    fn test_update_marks_dirty() {
        let mut editor = editor();
        editor.update_tooth_condition(11, caries_om()).unwrap();

        let record = editor.tooth_condition(11);
        assert_eq!(record.condition, DentalCondition::Caries);
        assert_eq!(record.surfaces, vec![Surface::Occlusal, Surface::Mesial]);
        assert!(record.last_modified.is_some());
        assert!(editor.has_changes());
        assert_eq!(editor.state(), ChartState::Dirty);
    }

    #[test]
    fn test_update_outside_layout_is_rejected() {
        let mut editor = editor();
        let result = editor.update_tooth_condition(55, caries_om());
        assert!(matches!(result, Err(ClinicError::Validation(_))));
        assert!(!editor.has_changes());
    }

    #[test]
    fn test_last_write_wins() {
        let mut editor = editor();
        editor.update_tooth_condition(26, caries_om().with_severity(Severity::Severe)).unwrap();
        editor
            .update_tooth_condition(
                26,
                ToothConditionUpdate::condition(DentalCondition::RootCanal).with_treatment("Endodoncia"),
            )
            .unwrap();

        let record = editor.tooth_condition(26);
        assert_eq!(record.condition, DentalCondition::RootCanal);
        assert_eq!(record.treatment.as_deref(), Some("Endodoncia"));
        assert_eq!(editor.recorded_teeth().len(), 1);
    }

    #[test]
    fn test_condition_counts() {
        let mut editor = editor();
        editor.update_tooth_condition(11, caries_om()).unwrap();
        editor
            .update_tooth_condition(46, ToothConditionUpdate::condition(DentalCondition::Missing))
            .unwrap();

        let counts = editor.condition_counts();
        assert_eq!(counts[&DentalCondition::Healthy], 30);
        assert_eq!(counts[&DentalCondition::Caries], 1);
        assert_eq!(counts[&DentalCondition::Missing], 1);
        assert_eq!(editor.chart().len(), 32);
    }

    #[test]
    fn test_single_tooth_edit_protocol() {
        let mut editor = editor();
        editor.select_tooth(11).unwrap();
        assert_eq!(editor.selected_tooth(), Some(11));

        assert!(matches!(
            editor.select_tooth(21),
            Err(ClinicError::EditInProgress { tooth: 11 })
        ));
        assert!(matches!(
            editor.update_tooth_condition(21, caries_om()),
            Err(ClinicError::EditInProgress { tooth: 11 })
        ));

        let record = editor.commit_edit(caries_om()).unwrap();
        assert_eq!(record.id, 11);
        assert_eq!(editor.selected_tooth(), None);

        editor.select_tooth(21).unwrap();
        assert_eq!(editor.cancel_edit(), Some(21));
        assert_eq!(editor.selected_tooth(), None);
        assert_eq!(editor.tooth_condition(21).condition, DentalCondition::Healthy);
    }

    #[test]
    fn test_direct_update_of_selected_tooth_ends_edit() {
        let mut editor = editor();
        editor.select_tooth(11).unwrap();

        editor.update_tooth_condition(11, caries_om()).unwrap();
        assert_eq!(editor.selected_tooth(), None);
        assert_eq!(editor.tooth_condition(11).condition, DentalCondition::Caries);

        // 其他牙齿可以立即开始编辑
        editor.select_tooth(21).unwrap();
        assert_eq!(editor.selected_tooth(), Some(21));
    }

    #[test]
    fn test_commit_without_selection() {
        let mut editor = editor();
        assert!(matches!(editor.commit_edit(caries_om()), Err(ClinicError::Validation(_))));
    }

    #[test]
    fn test_reset_clears_and_marks_dirty() {
        let mut editor = editor();
        editor.update_tooth_condition(11, caries_om()).unwrap();
        editor.set_general_notes("Paciente con bruxismo").unwrap();
        editor.reset().unwrap();

        assert!(editor.recorded_teeth().is_empty());
        assert!(editor.general_notes().is_empty());
        assert_eq!(editor.tooth_condition(11).condition, DentalCondition::Healthy);
        assert!(editor.has_changes());
    }

    #[test]
    fn test_reset_on_clean_chart_is_dirty() {
        let mut editor = editor();
        editor.reset().unwrap();
        assert!(editor.has_changes());
    }

    #[tokio::test]
    async fn test_successful_save() {
        let store = Arc::new(InMemoryOdontogramStore::new());
        let mut editor = editor_with(store.clone());
        editor.update_tooth_condition(11, caries_om()).unwrap();
        editor.set_general_notes("Control en 6 meses").unwrap();

        let version = editor.save().await.unwrap();
        assert_eq!(version, 1);
        assert!(!editor.has_changes());
        assert_eq!(editor.version(), 1);

        let stored = store.load("p1").await.unwrap().unwrap();
        assert_eq!(stored.teeth[&11].condition, DentalCondition::Caries);
        assert_eq!(stored.general_notes, "Control en 6 meses");
        assert_eq!(stored.updated_by, "s1");

        let notifications = editor.take_notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].level, NotificationLevel::Success);
        assert!(editor.take_notifications().is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_stays_dirty() {
        let mut editor = editor_with(Arc::new(FailingStore));
        editor.update_tooth_condition(11, caries_om()).unwrap();

        let result = editor.save().await;
        assert!(matches!(result, Err(ClinicError::Persistence(_))));
        assert!(editor.has_changes());
        assert_eq!(editor.state(), ChartState::Dirty);
        assert_eq!(editor.tooth_condition(11).condition, DentalCondition::Caries);

        let notifications = editor.take_notifications();
        assert_eq!(notifications[0].level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn test_stale_editor_gets_conflict() {
        let store: Arc<dyn OdontogramStore> = Arc::new(InMemoryOdontogramStore::new());
        let mut first = editor_with(store.clone());
        let mut second = editor_with(store.clone());

        first.update_tooth_condition(11, caries_om()).unwrap();
        second
            .update_tooth_condition(11, ToothConditionUpdate::condition(DentalCondition::Crown))
            .unwrap();

        first.save().await.unwrap();
        let result = second.save().await;
        assert!(matches!(result, Err(ClinicError::Conflict { expected: 0, found: 1 })));
        assert!(second.has_changes());
    }

    #[tokio::test]
    async fn test_reopen_saved_chart() {
        let store: Arc<dyn OdontogramStore> = Arc::new(InMemoryOdontogramStore::new());
        let mut editor = editor_with(store.clone());
        editor.update_tooth_condition(36, caries_om()).unwrap();
        editor.save().await.unwrap();

        let mut reopened =
            OdontogramEditor::open("p1", "Juan Pérez", DentitionType::Pediatric, "prof-1", store.clone())
                .await
                .unwrap();
        // 已保存的牙列类型优先
        assert_eq!(reopened.dentition(), DentitionType::Adult);
        assert_eq!(reopened.version(), 1);
        assert!(!reopened.has_changes());
        assert_eq!(reopened.tooth_condition(36).condition, DentalCondition::Caries);

        reopened
            .update_tooth_condition(36, ToothConditionUpdate::condition(DentalCondition::Filled))
            .unwrap();
        assert_eq!(reopened.save().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_interrupted_save_leaves_chart_dirty() {
        let store = Arc::new(InMemoryOdontogramStore::with_latency(Duration::from_millis(200)));
        let mut editor = editor_with(store.clone());
        editor.update_tooth_condition(11, caries_om()).unwrap();

        let timed_out = tokio::time::timeout(Duration::from_millis(10), editor.save()).await;
        assert!(timed_out.is_err());
        assert_eq!(editor.state(), ChartState::Dirty);

        // 被中断的保存没有写入，可以重新保存
        assert_eq!(editor.save().await.unwrap(), 1);
        assert!(!editor.has_changes());
    }

    #[tokio::test]
    async fn test_save_clean_chart() {
        let mut editor = editor();
        assert_eq!(editor.save().await.unwrap(), 1);
        assert!(!editor.has_changes());
    }
}
