use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::AssessmentErrorKind;
use crate::models::assessment::RubricScores;
use crate::models::submission::SubmissionId;
use crate::models::task::{TaskDetectionOutcome, TaskType};
use crate::services::text_validator::ValidationErrorKind;

/// 一次评估的最终结果
#[derive(Debug, Clone)]
pub enum EvaluationOutcome {
    Success(EvaluationSuccess),
    NeedsClarification(ClarificationRequest),
    Failed(EvaluationFailure),
}

impl EvaluationOutcome {
    pub fn as_success(&self) -> Option<&EvaluationSuccess> {
        match self {
            EvaluationOutcome::Success(success) => Some(success),
            _ => None,
        }
    }

    pub fn as_failure(&self) -> Option<&EvaluationFailure> {
        match self {
            EvaluationOutcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EvaluationSuccess {
    pub scores: RubricScores,
    pub word_count: usize,
    pub task_type: TaskType,
    /// 提交记录没写进去时为 None
    pub submission_id: Option<SubmissionId>,
    /// 校验器给出的非致命提示
    pub warnings: Vec<String>,
    /// 降级处理过的存储问题，调用方据此提示“历史记录可能缺失”
    pub persistence_issues: Vec<PersistenceIssue>,
    /// 本次之后今天还剩几次；配额未能查询时为 None
    pub remaining_today: Option<u32>,
}

impl EvaluationSuccess {
    pub fn history_recorded(&self) -> bool {
        self.persistence_issues.is_empty()
    }
}

/// 被降级处理的存储失败
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceIssue {
    /// 待处理提交记录创建失败
    SubmissionNotRecorded,
    /// 评分结果保存失败
    AssessmentNotSaved,
    /// 提交状态更新失败
    StatusNotUpdated,
    /// 当日计数未能递增
    QuotaNotCounted,
}

/// 需要用户指定题型；原文随结果带回，重试时不必重新输入
#[derive(Debug, Clone)]
pub struct ClarificationRequest {
    pub text: String,
    pub detection: TaskDetectionOutcome,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EvaluationFailure {
    pub kind: FailureKind,
    /// 面向用户的提示
    pub message: String,
    pub retryable: bool,
    pub retry_after: Option<Duration>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FailureKind {
    /// 文本未通过校验，修改后可重试
    Validation(Vec<ValidationErrorKind>),
    /// 今日配额已用完
    RateLimited {
        limit: u32,
        resets_at: DateTime<Utc>,
    },
    /// 评分服务失败（内部重试之后）
    Assessment(AssessmentErrorKind),
    /// 调用方放弃了请求
    Cancelled,
}
