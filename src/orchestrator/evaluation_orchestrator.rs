//! 评估编排 - 流程层
//!
//! 核心职责：定义“一次提交”的完整处理流程
//!
//! 流程顺序：
//! 1. 配额检查（存储不可用时放行）
//! 2. 文本校验（不通过则不花模型调用）
//! 3. 题型识别（或使用用户指定的题型）
//! 4. 创建待处理提交记录（失败继续）
//! 5. 模型评分 + 解析 + 分数闸门
//! 6. 保存评分、更新状态、配额计数（均为尽力而为）
//!
//! 是否继续往下走，只在这里决定。

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::clients::{AssessmentClient, CircuitBreaker, CompletionTransport};
use crate::config::Config;
use crate::error::AssessmentError;
use crate::infrastructure::{Clock, DailyCounterStore, SubmissionRepository};
use crate::models::{
    ClarificationRequest, EvaluationFailure, EvaluationOutcome, EvaluationSuccess, FailureKind,
    HistoryEntry, PersistenceIssue, QuotaDecision, SubmissionId, SubmissionRequest,
    SubmissionStatus, TaskType, UserId,
};
use crate::orchestrator::messages;
use crate::orchestrator::request_ctx::EvaluationCtx;
use crate::services::{QuotaGuard, TaskTypeDetector, TextValidator};
use crate::utils::logging::truncate_text;

/// 评估编排器
///
/// - 每个请求独立执行，不持有请求级的可变状态
/// - 只依赖业务能力（services / clients）和存储契约
pub struct EvaluationOrchestrator {
    validator: TextValidator,
    detector: TaskTypeDetector,
    client: AssessmentClient,
    quota: QuotaGuard,
    submissions: Arc<dyn SubmissionRepository>,
    request_seq: AtomicU64,
}

impl EvaluationOrchestrator {
    pub fn new(
        validator: TextValidator,
        detector: TaskTypeDetector,
        client: AssessmentClient,
        quota: QuotaGuard,
        submissions: Arc<dyn SubmissionRepository>,
    ) -> Self {
        Self {
            validator,
            detector,
            client,
            quota,
            submissions,
            request_seq: AtomicU64::new(0),
        }
    }

    /// 按配置组装全部组件
    pub fn from_config(
        config: &Config,
        transport: Arc<dyn CompletionTransport>,
        submissions: Arc<dyn SubmissionRepository>,
        counters: Arc<dyn DailyCounterStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let breaker = Arc::new(CircuitBreaker::new(config.circuit_breaker_config()));
        let client = AssessmentClient::new(transport, breaker, config.retry_policy())
            .with_sampling(config.temperature, config.max_tokens);
        Self::new(
            TextValidator::new(config.validator_settings()),
            TaskTypeDetector::default(),
            client,
            QuotaGuard::new(counters, clock, config.quota_limits()),
            submissions,
        )
    }

    pub fn client(&self) -> &AssessmentClient {
        &self.client
    }

    /// 处理一次提交
    ///
    /// 丢弃返回的 future 即取消，停在下一个 await 点。
    pub async fn evaluate(&self, request: SubmissionRequest) -> EvaluationOutcome {
        let seq = self.request_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let ctx = EvaluationCtx::new(seq, request.user_id);
        info!("{} 📝 收到评估请求", ctx);
        debug!("{} 原文预览: {}", ctx, truncate_text(&request.text, 80));

        // ========== 1. 配额 ==========
        let remaining = match self
            .quota
            .check_and_reserve(request.user_id, request.tier)
            .await
        {
            Ok(QuotaDecision::Allowed { remaining }) => Some(remaining),
            Ok(QuotaDecision::Denied { limit, resets_at }) => {
                info!("{} 🚫 今日配额已用完", ctx);
                return EvaluationOutcome::Failed(EvaluationFailure {
                    kind: FailureKind::RateLimited { limit, resets_at },
                    message: messages::quota_denied_message(request.tier, limit),
                    retryable: false,
                    retry_after: Some(self.quota.until_reset(resets_at)),
                    suggestions: Vec::new(),
                });
            }
            Err(e) => {
                warn!("{} ⚠️ 配额查询失败，按允许处理: {}", ctx, e);
                None
            }
        };

        // ========== 2. 文本校验 ==========
        let validation = self.validator.validate(&request.text);
        if !validation.is_valid {
            let min_words = self.validator.settings().min_word_count;
            info!("{} ❌ 文本未通过校验: {:?}", ctx, validation.errors);
            return EvaluationOutcome::Failed(EvaluationFailure {
                message: messages::validation_message(&validation, min_words),
                suggestions: messages::validation_suggestions(&validation.errors, min_words),
                kind: FailureKind::Validation(validation.errors),
                retryable: true,
                retry_after: None,
            });
        }

        // ========== 3. 题型 ==========
        let task_type = match request.forced_task_type {
            Some(task_type) => {
                debug!("{} 使用指定题型 {}", ctx, task_type);
                task_type
            }
            None => {
                let detection = self.detector.detect(&request.text);
                match detection.detected_type {
                    Some(task_type) if !detection.requires_clarification => {
                        info!(
                            "{} 🔍 识别为 {} (置信度 {:.2})",
                            ctx, task_type, detection.confidence_score
                        );
                        task_type
                    }
                    _ => {
                        info!("{} ❓ 无法确定题型: {}", ctx, detection.reasoning);
                        return EvaluationOutcome::NeedsClarification(ClarificationRequest {
                            text: request.text,
                            detection,
                            message: messages::CLARIFICATION_MESSAGE.to_string(),
                            suggestions: messages::clarification_suggestions(),
                        });
                    }
                }
            }
        };

        // ========== 4. 待处理记录 ==========
        let mut issues = Vec::new();
        let submission_id = match self
            .submissions
            .create_pending_submission(
                request.user_id,
                &request.text,
                task_type,
                validation.word_count,
            )
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("{} ⚠️ 提交记录创建失败，继续评分: {}", ctx, e);
                issues.push(PersistenceIssue::SubmissionNotRecorded);
                None
            }
        };

        // ========== 5. 评分 ==========
        let scores = match self.client.assess_scored(&request.text, task_type).await {
            Ok((scores, raw)) => {
                debug!(
                    "{} 模型 {} 用量 {:?} tokens，共 {} 次调用",
                    ctx, raw.model_used, raw.usage_tokens, raw.attempts
                );
                scores
            }
            Err(e) => {
                error!("{} ❌ 评分失败: {}", ctx, e);
                if let Some(id) = submission_id {
                    self.mark_status(&ctx, id, SubmissionStatus::Failed).await;
                }
                return EvaluationOutcome::Failed(assessment_failure(e));
            }
        };

        // ========== 6. 落库与计数 ==========
        if let Some(id) = submission_id {
            if let Err(e) = self.submissions.save_assessment(id, &scores).await {
                warn!("{} ⚠️ 评分结果保存失败: {}", ctx, e);
                issues.push(PersistenceIssue::AssessmentNotSaved);
            }
            if !self.mark_status(&ctx, id, SubmissionStatus::Completed).await {
                issues.push(PersistenceIssue::StatusNotUpdated);
            }
        }
        if let Err(e) = self.quota.increment(request.user_id).await {
            warn!("{} ⚠️ 配额计数失败: {}", ctx, e);
            issues.push(PersistenceIssue::QuotaNotCounted);
        }

        info!(
            "{} ✅ 评估完成: {} 总分 {:.1}",
            ctx, task_type, scores.overall_band
        );

        EvaluationOutcome::Success(EvaluationSuccess {
            scores,
            word_count: validation.word_count,
            task_type,
            submission_id,
            warnings: validation.warnings,
            persistence_issues: issues,
            remaining_today: remaining.map(|r| r.saturating_sub(1)),
        })
    }

    /// 与调用方的取消信号赛跑
    ///
    /// `cancel` 先完成时返回 `Cancelled`，已创建的提交记录保持 Pending。
    pub async fn evaluate_until<F>(
        &self,
        request: SubmissionRequest,
        cancel: F,
    ) -> EvaluationOutcome
    where
        F: Future<Output = ()>,
    {
        let user_id = request.user_id;
        tokio::select! {
            outcome = self.evaluate(request) => outcome,
            _ = cancel => {
                info!("⏹️ 用户 #{} 的评估请求已取消", user_id);
                EvaluationOutcome::Failed(EvaluationFailure {
                    kind: FailureKind::Cancelled,
                    message: messages::CANCELLED_MESSAGE.to_string(),
                    retryable: true,
                    retry_after: None,
                    suggestions: Vec::new(),
                })
            }
        }
    }

    /// 用户指定题型后重新评估
    pub async fn evaluate_with_task(
        &self,
        clarification: ClarificationRequest,
        user_id: UserId,
        task_type: TaskType,
    ) -> EvaluationOutcome {
        let request =
            SubmissionRequest::new(user_id, clarification.text).with_task_type(task_type);
        self.evaluate(request).await
    }

    /// 最近的评分历史；存储不可用时返回空列表
    pub async fn history(&self, user_id: UserId, limit: usize) -> Vec<HistoryEntry> {
        match self.submissions.recent_assessments(user_id, limit).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("⚠️ 用户 #{} 历史记录查询失败: {}", user_id, e);
                Vec::new()
            }
        }
    }

    /// 尽力更新提交状态，返回是否成功
    async fn mark_status(
        &self,
        ctx: &EvaluationCtx,
        id: SubmissionId,
        status: SubmissionStatus,
    ) -> bool {
        match self.submissions.mark_submission_status(id, status).await {
            Ok(()) => true,
            Err(e) => {
                warn!("{} ⚠️ 提交 #{} 状态更新为 {:?} 失败: {}", ctx, id, status, e);
                false
            }
        }
    }
}

fn assessment_failure(err: AssessmentError) -> EvaluationFailure {
    EvaluationFailure {
        kind: FailureKind::Assessment(err.kind),
        message: messages::assessment_failure_message(err.kind, err.retry_after),
        retryable: err.retryable(),
        retry_after: err.retry_after,
        suggestions: messages::assessment_failure_suggestions(err.kind),
    }
}
