//! 内存存储
//!
//! 同时实现两份存储契约，供演示程序与测试使用。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StoreError;
use crate::infrastructure::clock::{Clock, SystemClock};
use crate::infrastructure::store::{DailyCounterStore, SubmissionRepository};
use crate::models::{
    HistoryEntry, QuotaRecord, RubricScores, SubmissionId, SubmissionStatus, TaskType, UserId,
};

/// 内存中的提交记录
#[derive(Debug, Clone)]
pub struct StoredSubmission {
    pub id: SubmissionId,
    pub user_id: UserId,
    pub text: String,
    pub task_type: TaskType,
    pub word_count: usize,
    pub status: SubmissionStatus,
    pub submitted_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    next_id: SubmissionId,
    submissions: Vec<StoredSubmission>,
    assessments: HashMap<SubmissionId, RubricScores>,
    quotas: HashMap<UserId, QuotaRecord>,
}

/// 提交时间取自注入的时钟，与配额的自然日保持一致
pub struct MemoryStore {
    tables: Mutex<Tables>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            clock,
        }
    }

    /// 直接写入某用户的配额记录（用于预置数据）
    pub async fn put_quota_record(&self, record: QuotaRecord) {
        let mut tables = self.tables.lock().await;
        tables.quotas.insert(record.user_id, record);
    }

    pub async fn quota_record(&self, user_id: UserId) -> Option<QuotaRecord> {
        self.tables.lock().await.quotas.get(&user_id).cloned()
    }

    pub async fn submission(&self, id: SubmissionId) -> Option<StoredSubmission> {
        let tables = self.tables.lock().await;
        tables.submissions.iter().find(|s| s.id == id).cloned()
    }

    pub async fn submissions(&self) -> Vec<StoredSubmission> {
        self.tables.lock().await.submissions.clone()
    }

    pub async fn assessment(&self, id: SubmissionId) -> Option<RubricScores> {
        self.tables.lock().await.assessments.get(&id).cloned()
    }
}

#[async_trait]
impl SubmissionRepository for MemoryStore {
    async fn create_pending_submission(
        &self,
        user_id: UserId,
        text: &str,
        task_type: TaskType,
        word_count: usize,
    ) -> Result<SubmissionId, StoreError> {
        let submitted_at = self.clock.now();
        let mut tables = self.tables.lock().await;
        tables.next_id += 1;
        let id = tables.next_id;
        tables.submissions.push(StoredSubmission {
            id,
            user_id,
            text: text.to_string(),
            task_type,
            word_count,
            status: SubmissionStatus::Pending,
            submitted_at,
        });
        debug!("创建提交记录 #{} (用户 {})", id, user_id);
        Ok(id)
    }

    async fn mark_submission_status(
        &self,
        submission_id: SubmissionId,
        status: SubmissionStatus,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let submission = tables
            .submissions
            .iter_mut()
            .find(|s| s.id == submission_id)
            .ok_or_else(|| StoreError::NotFound(format!("submission #{}", submission_id)))?;
        submission.status = status;
        Ok(())
    }

    async fn save_assessment(
        &self,
        submission_id: SubmissionId,
        scores: &RubricScores,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.submissions.iter().any(|s| s.id == submission_id) {
            return Err(StoreError::NotFound(format!(
                "submission #{}",
                submission_id
            )));
        }
        if tables.assessments.contains_key(&submission_id) {
            return Err(StoreError::Conflict(format!(
                "submission #{} 已有评分",
                submission_id
            )));
        }
        tables.assessments.insert(submission_id, scores.clone());
        Ok(())
    }

    async fn recent_assessments(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let tables = self.tables.lock().await;
        let entries = tables
            .submissions
            .iter()
            .rev()
            .filter(|s| s.user_id == user_id)
            .filter_map(|s| {
                tables.assessments.get(&s.id).map(|scores| HistoryEntry {
                    submission_id: s.id,
                    task_type: s.task_type,
                    overall_band: scores.overall_band,
                    word_count: s.word_count,
                    submitted_at: s.submitted_at,
                })
            })
            .take(limit)
            .collect();
        Ok(entries)
    }
}

#[async_trait]
impl DailyCounterStore for MemoryStore {
    async fn get_daily_count(&self, user_id: UserId, date: NaiveDate) -> Result<u32, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .quotas
            .get(&user_id)
            .map(|record| record.count_on(date))
            .unwrap_or(0))
    }

    async fn increment_daily_count(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<u32, StoreError> {
        let mut tables = self.tables.lock().await;
        let record = tables
            .quotas
            .entry(user_id)
            .or_insert_with(|| QuotaRecord::new(user_id, date));
        // 旧日期的记录原地重置
        if record.calendar_date != date {
            *record = QuotaRecord::new(user_id, date);
        }
        record.count += 1;
        Ok(record.count)
    }
}
