//! 存储协作方契约
//!
//! 编排核心只依赖这两个窄接口，不关心具体存储引擎。

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StoreError;
use crate::models::{
    HistoryEntry, RubricScores, SubmissionId, SubmissionStatus, TaskType, UserId,
};

/// 提交与评分记录
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// 创建一条 Pending 状态的提交记录
    async fn create_pending_submission(
        &self,
        user_id: UserId,
        text: &str,
        task_type: TaskType,
        word_count: usize,
    ) -> Result<SubmissionId, StoreError>;

    async fn mark_submission_status(
        &self,
        submission_id: SubmissionId,
        status: SubmissionStatus,
    ) -> Result<(), StoreError>;

    async fn save_assessment(
        &self,
        submission_id: SubmissionId,
        scores: &RubricScores,
    ) -> Result<(), StoreError>;

    /// 最近的评分记录，新的在前
    async fn recent_assessments(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, StoreError>;
}

/// 每日提交计数
///
/// `increment_daily_count` 必须是原子的“加一并返回新值”；
/// 先查后加之间的竞态由调用方接受。
#[async_trait]
pub trait DailyCounterStore: Send + Sync {
    async fn get_daily_count(&self, user_id: UserId, date: NaiveDate) -> Result<u32, StoreError>;

    async fn increment_daily_count(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<u32, StoreError>;
}
