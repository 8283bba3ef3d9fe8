use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::quota::QuotaTier;
use crate::models::task::TaskType;

/// 用户ID（来自聊天平台）
pub type UserId = i64;

/// 提交记录ID（由存储协作方分配）
pub type SubmissionId = i64;

/// 一次评估请求
///
/// 每条消息构造一次，之后不再修改。
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub user_id: UserId,
    pub text: String,
    /// 用户已明确选择题型时跳过自动识别
    pub forced_task_type: Option<TaskType>,
    pub tier: QuotaTier,
}

impl SubmissionRequest {
    pub fn new(user_id: UserId, text: impl Into<String>) -> Self {
        Self {
            user_id,
            text: text.into(),
            forced_task_type: None,
            tier: QuotaTier::Standard,
        }
    }

    pub fn with_task_type(mut self, task_type: TaskType) -> Self {
        self.forced_task_type = Some(task_type);
        self
    }

    pub fn with_tier(mut self, tier: QuotaTier) -> Self {
        self.tier = tier;
        self
    }
}

/// 提交记录的处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Pending,
    Completed,
    Failed,
}

/// 历史记录条目
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub submission_id: SubmissionId,
    pub task_type: TaskType,
    pub overall_band: f64,
    pub word_count: usize,
    pub submitted_at: DateTime<Utc>,
}
