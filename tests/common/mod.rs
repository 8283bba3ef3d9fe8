//! 集成测试公用的替身实现
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use ielts_writing_eval::clients::{
    CompletionRequest, CompletionResponse, CompletionTransport, TransportError,
};
use ielts_writing_eval::error::{AssessmentErrorKind, StoreError};
use ielts_writing_eval::infrastructure::{
    Clock, DailyCounterStore, ManualClock, MemoryStore, SubmissionRepository,
};
use ielts_writing_eval::models::{
    HistoryEntry, RubricScores, SubmissionId, SubmissionStatus, TaskType, UserId,
};
use ielts_writing_eval::{Config, EvaluationOrchestrator};

pub const TASK1_ESSAY: &str = include_str!("../fixtures/task1_line_graph.txt");
pub const TASK2_ESSAY: &str = include_str!("../fixtures/task2_opinion.txt");
pub const AMBIGUOUS_ESSAY: &str = include_str!("../fixtures/ambiguous_hobby.txt");

/// 一份能通过分数闸门的模型回复
pub fn valid_assessment_json() -> String {
    serde_json::json!({
        "task_achievement_score": 6.5,
        "coherence_cohesion_score": 7.0,
        "lexical_resource_score": 6.0,
        "grammatical_accuracy_score": 6.5,
        "overall_band_score": 6.5,
        "detailed_feedback": "A clear overview supported by accurate figures.",
        "improvement_suggestions": [
            "Group similar trends together",
            "Use a wider range of comparative structures"
        ],
        "score_justifications": {
            "task_achievement": "Main features are selected and compared.",
            "coherence_cohesion": "Paragraphs follow a logical order.",
            "lexical_resource": "Adequate range with some repetition.",
            "grammatical_accuracy": "Mostly accurate complex sentences."
        }
    })
    .to_string()
}

/// 脚本化的一次回复
pub enum Reply {
    Respond(Result<CompletionResponse, TransportError>),
    /// 永不返回（用于超时 / 取消）
    Hang,
}

pub fn ok(content: impl Into<String>) -> Reply {
    Reply::Respond(Ok(CompletionResponse {
        content: content.into(),
        model: "scripted-model".to_string(),
        total_tokens: Some(812),
    }))
}

pub fn valid() -> Reply {
    ok(format!("Here is the assessment:\n{}", valid_assessment_json()))
}

pub fn fail(kind: AssessmentErrorKind) -> Reply {
    Reply::Respond(Err(TransportError::new(kind, format!("scripted {}", kind))))
}

/// 按顺序返回预设回复的传输层
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        })
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionTransport for ScriptedTransport {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Respond(result)) => result,
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
                Err(TransportError::new(AssessmentErrorKind::Unknown, "hung call returned"))
            }
            None => Err(TransportError::new(
                AssessmentErrorKind::ApiError,
                "no scripted reply left",
            )),
        }
    }
}

/// 记录每个存储调用的包装，可注入失败
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    pub creates: AtomicUsize,
    pub saves: AtomicUsize,
    pub increments: AtomicUsize,
    pub count_reads: AtomicUsize,
    pub statuses: Mutex<Vec<SubmissionStatus>>,
    pub fail_create: AtomicBool,
    pub fail_save: AtomicBool,
    pub fail_mark: AtomicBool,
    pub fail_increment: AtomicBool,
    pub fail_count_read: AtomicBool,
    pub fail_history: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::with_clock(clock),
            ..Self::default()
        })
    }

    pub fn statuses(&self) -> Vec<SubmissionStatus> {
        self.statuses.lock().unwrap().clone()
    }

    fn check(flag: &AtomicBool, operation: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::unavailable(operation, "injected failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SubmissionRepository for RecordingStore {
    async fn create_pending_submission(
        &self,
        user_id: UserId,
        text: &str,
        task_type: TaskType,
        word_count: usize,
    ) -> Result<SubmissionId, StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_create, "create_pending_submission")?;
        self.inner
            .create_pending_submission(user_id, text, task_type, word_count)
            .await
    }

    async fn mark_submission_status(
        &self,
        submission_id: SubmissionId,
        status: SubmissionStatus,
    ) -> Result<(), StoreError> {
        self.statuses.lock().unwrap().push(status);
        Self::check(&self.fail_mark, "mark_submission_status")?;
        self.inner.mark_submission_status(submission_id, status).await
    }

    async fn save_assessment(
        &self,
        submission_id: SubmissionId,
        scores: &RubricScores,
    ) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_save, "save_assessment")?;
        self.inner.save_assessment(submission_id, scores).await
    }

    async fn recent_assessments(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        Self::check(&self.fail_history, "recent_assessments")?;
        self.inner.recent_assessments(user_id, limit).await
    }
}

#[async_trait]
impl DailyCounterStore for RecordingStore {
    async fn get_daily_count(&self, user_id: UserId, date: NaiveDate) -> Result<u32, StoreError> {
        self.count_reads.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_count_read, "get_daily_count")?;
        self.inner.get_daily_count(user_id, date).await
    }

    async fn increment_daily_count(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<u32, StoreError> {
        self.increments.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_increment, "increment_daily_count")?;
        self.inner.increment_daily_count(user_id, date).await
    }
}

/// 一套完整的编排器测试环境
pub struct Harness {
    pub orchestrator: EvaluationOrchestrator,
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<RecordingStore>,
    pub clock: Arc<ManualClock>,
}

pub fn test_config() -> Config {
    Config {
        llm_api_key: "sk-test".to_string(),
        ..Config::default()
    }
}

pub fn harness(replies: Vec<Reply>) -> Harness {
    harness_with_config(test_config(), replies)
}

pub fn harness_with_config(config: Config, replies: Vec<Reply>) -> Harness {
    let transport = ScriptedTransport::new(replies);
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 9, 14, 10, 30, 0).unwrap(),
    ));
    let store = RecordingStore::with_clock(clock.clone());
    let orchestrator = EvaluationOrchestrator::from_config(
        &config,
        transport.clone(),
        store.clone(),
        store.clone(),
        clock.clone(),
    );
    Harness {
        orchestrator,
        transport,
        store,
        clock,
    }
}
