mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use common::{fail, harness, harness_with_config, ok, test_config, valid, Reply};
use ielts_writing_eval::error::AssessmentErrorKind;
use ielts_writing_eval::infrastructure::Clock;
use ielts_writing_eval::models::{
    EvaluationOutcome, FailureKind, PersistenceIssue, QuotaRecord, QuotaTier, SubmissionRequest,
    SubmissionStatus, TaskType,
};
use ielts_writing_eval::services::ValidationErrorKind;

fn long_essay() -> String {
    let paragraph = include_str!("fixtures/general_paragraph.txt").trim();
    let mut text = std::iter::repeat(paragraph).take(10).collect::<Vec<_>>().join(" ");
    text.push_str(" Music remains one of the most rewarding hobbies for everyone.");
    text
}

#[tokio::test]
async fn test_short_submission_fails_validation_without_spending_a_call() {
    let h = harness(vec![valid()]);
    let request = SubmissionRequest::new(7, "My essay is far too short to assess today.");

    let outcome = h.orchestrator.evaluate(request).await;
    let failure = outcome.as_failure().expect("应当失败");
    match &failure.kind {
        FailureKind::Validation(errors) => assert!(errors.contains(&ValidationErrorKind::TooShort)),
        other => panic!("意外的失败种类: {:?}", other),
    }
    assert!(failure.retryable);
    assert!(failure.message.contains("too short"));
    assert!(!failure.suggestions.is_empty());
    assert_eq!(h.transport.calls(), 0);
    assert_eq!(h.store.increments.load(Ordering::SeqCst), 0);
    assert_eq!(h.store.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_minimum_length_comes_from_config() {
    let config = ielts_writing_eval::Config {
        min_word_count: 300,
        ..test_config()
    };
    let h = harness_with_config(config, vec![valid()]);

    let outcome = h
        .orchestrator
        .evaluate(SubmissionRequest::new(7, common::TASK1_ESSAY))
        .await;
    let failure = outcome.as_failure().expect("225 词低于 300 的下限");
    assert_eq!(
        failure.kind,
        FailureKind::Validation(vec![ValidationErrorKind::TooShort])
    );
    assert!(failure.message.contains("(225 words)"));
    assert!(failure.message.contains("at least 300 words"));
    assert!(failure.suggestions[0].contains("at least 300 words"));
    assert_eq!(h.transport.calls(), 0);
}

#[tokio::test]
async fn test_data_description_success_persists_once() {
    let h = harness(vec![valid()]);
    let request = SubmissionRequest::new(7, common::TASK1_ESSAY);

    let outcome = h.orchestrator.evaluate(request).await;
    let success = outcome.as_success().expect("应当成功");

    assert_eq!(success.task_type, TaskType::DataDescription);
    assert_eq!(success.scores.overall_band, success.scores.expected_overall());
    assert_eq!(success.word_count, 225);
    assert_eq!(success.remaining_today, Some(2));
    assert!(success.history_recorded());
    assert!(success.submission_id.is_some());

    assert_eq!(h.transport.calls(), 1);
    assert_eq!(h.store.creates.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.saves.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.increments.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.statuses(), vec![SubmissionStatus::Completed]);

    let history = h.orchestrator.history(7, 10).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].overall_band, 6.5);
    assert_eq!(history[0].task_type, TaskType::DataDescription);
    assert_eq!(history[0].submitted_at, h.clock.now());
    assert_eq!(history[0].submitted_at.date_naive(), h.clock.today());
}

#[tokio::test]
async fn test_malformed_json_fails_after_single_call() {
    let h = harness(vec![ok("The essay is decent, maybe a 6."), valid(), valid()]);
    let request = SubmissionRequest::new(7, common::TASK2_ESSAY);

    let outcome = h.orchestrator.evaluate(request).await;
    let failure = outcome.as_failure().expect("应当失败");
    assert_eq!(
        failure.kind,
        FailureKind::Assessment(AssessmentErrorKind::ParseError)
    );
    assert!(failure.retryable);
    assert_eq!(h.transport.calls(), 1);
    assert_eq!(h.store.statuses(), vec![SubmissionStatus::Failed]);
    assert_eq!(h.store.saves.load(Ordering::SeqCst), 0);
    assert_eq!(h.store.increments.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_inconsistent_scores_are_not_persisted() {
    let mut reply: serde_json::Value =
        serde_json::from_str(&common::valid_assessment_json()).unwrap();
    reply["overall_band_score"] = serde_json::json!(8.5);
    let h = harness(vec![ok(reply.to_string())]);

    let outcome = h
        .orchestrator
        .evaluate(SubmissionRequest::new(7, common::TASK1_ESSAY))
        .await;
    let failure = outcome.as_failure().expect("应当失败");
    assert_eq!(
        failure.kind,
        FailureKind::Assessment(AssessmentErrorKind::FormatError)
    );
    assert!(failure.retryable);
    assert_eq!(h.store.saves.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_auth_failure_is_reported_as_configuration_problem() {
    let h = harness(vec![fail(AssessmentErrorKind::AuthFailed)]);

    let outcome = h
        .orchestrator
        .evaluate(SubmissionRequest::new(7, common::TASK1_ESSAY))
        .await;
    let failure = outcome.as_failure().expect("应当失败");
    assert_eq!(
        failure.kind,
        FailureKind::Assessment(AssessmentErrorKind::AuthFailed)
    );
    assert!(!failure.retryable);
    assert!(failure.message.contains("configuration"));
    assert_eq!(h.transport.calls(), 1);
}

#[tokio::test]
async fn test_quota_denied_before_any_work() {
    let h = harness(vec![valid()]);
    h.store
        .inner
        .put_quota_record(QuotaRecord {
            user_id: 7,
            calendar_date: h.clock.today(),
            count: 3,
        })
        .await;

    let outcome = h
        .orchestrator
        .evaluate(SubmissionRequest::new(7, common::TASK1_ESSAY))
        .await;
    let failure = outcome.as_failure().expect("应当失败");
    assert_eq!(
        failure.kind,
        FailureKind::RateLimited {
            limit: 3,
            resets_at: Utc.with_ymd_and_hms(2026, 9, 15, 0, 0, 0).unwrap(),
        }
    );
    assert!(!failure.retryable);
    assert_eq!(failure.retry_after, Some(Duration::from_secs(13 * 3600 + 30 * 60)));
    assert!(failure.message.contains("Upgrade"));
    assert_eq!(h.transport.calls(), 0);
}

#[tokio::test]
async fn test_quota_resets_on_next_day() {
    let h = harness(vec![valid()]);
    h.store
        .inner
        .put_quota_record(QuotaRecord {
            user_id: 7,
            calendar_date: h.clock.today(),
            count: 3,
        })
        .await;
    h.clock.advance(chrono::Duration::days(1));

    let outcome = h
        .orchestrator
        .evaluate(SubmissionRequest::new(7, common::TASK1_ESSAY))
        .await;
    let success = outcome.as_success().expect("应当成功");
    assert_eq!(success.remaining_today, Some(2));

    let record = h.store.inner.quota_record(7).await.unwrap();
    assert_eq!(record.calendar_date, h.clock.today());
    assert_eq!(record.count, 1);
}

#[tokio::test]
async fn test_elevated_tier_is_not_blocked_at_standard_limit() {
    let h = harness(vec![valid()]);
    h.store
        .inner
        .put_quota_record(QuotaRecord {
            user_id: 8,
            calendar_date: h.clock.today(),
            count: 3,
        })
        .await;

    let request = SubmissionRequest::new(8, common::TASK1_ESSAY).with_tier(QuotaTier::Elevated);
    let outcome = h.orchestrator.evaluate(request).await;
    assert_eq!(outcome.as_success().unwrap().remaining_today, Some(46));
}

#[tokio::test]
async fn test_store_outages_degrade_gracefully() {
    let h = harness(vec![valid()]);
    h.store.fail_count_read.store(true, Ordering::SeqCst);
    h.store.fail_create.store(true, Ordering::SeqCst);
    h.store.fail_increment.store(true, Ordering::SeqCst);

    let outcome = h
        .orchestrator
        .evaluate(SubmissionRequest::new(7, common::TASK1_ESSAY))
        .await;
    let success = outcome.as_success().expect("存储故障不应影响评分");
    assert_eq!(success.submission_id, None);
    assert_eq!(success.remaining_today, None);
    assert_eq!(
        success.persistence_issues,
        vec![
            PersistenceIssue::SubmissionNotRecorded,
            PersistenceIssue::QuotaNotCounted
        ]
    );
    assert!(!success.history_recorded());
    // 没有提交记录就不保存评分、不更新状态
    assert_eq!(h.store.saves.load(Ordering::SeqCst), 0);
    assert!(h.store.statuses().is_empty());
}

#[tokio::test]
async fn test_save_failure_keeps_success() {
    let h = harness(vec![valid()]);
    h.store.fail_save.store(true, Ordering::SeqCst);
    h.store.fail_mark.store(true, Ordering::SeqCst);

    let outcome = h
        .orchestrator
        .evaluate(SubmissionRequest::new(7, common::TASK1_ESSAY))
        .await;
    let success = outcome.as_success().expect("应当成功");
    assert_eq!(
        success.persistence_issues,
        vec![
            PersistenceIssue::AssessmentNotSaved,
            PersistenceIssue::StatusNotUpdated
        ]
    );
    assert_eq!(h.store.increments.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_history_outage_returns_empty_list() {
    let h = harness(vec![]);
    h.store.fail_history.store(true, Ordering::SeqCst);
    assert!(h.orchestrator.history(7, 5).await.is_empty());
}

#[tokio::test]
async fn test_clarification_carries_text_for_forced_retry() {
    let h = harness(vec![valid()]);

    let outcome = h
        .orchestrator
        .evaluate(SubmissionRequest::new(7, common::AMBIGUOUS_ESSAY))
        .await;
    let clarification = match outcome {
        EvaluationOutcome::NeedsClarification(request) => request,
        other => panic!("应当要求确认题型: {:?}", other),
    };
    assert_eq!(clarification.text, common::AMBIGUOUS_ESSAY);
    assert!(clarification.detection.requires_clarification);
    assert!(clarification.message.contains("Task 1"));
    assert_eq!(clarification.suggestions.len(), 2);
    assert_eq!(h.transport.calls(), 0);
    assert_eq!(h.store.creates.load(Ordering::SeqCst), 0);

    let outcome = h
        .orchestrator
        .evaluate_with_task(clarification, 7, TaskType::Argumentative)
        .await;
    let success = outcome.as_success().expect("指定题型后应当成功");
    assert_eq!(success.task_type, TaskType::Argumentative);
    assert!(h
        .transport
        .last_request()
        .unwrap()
        .user_message
        .contains("Writing Task 2"));
}

#[tokio::test]
async fn test_long_text_warning_travels_with_success() {
    let h = harness(vec![valid()]);
    let request = SubmissionRequest::new(7, long_essay()).with_task_type(TaskType::Argumentative);

    let outcome = h.orchestrator.evaluate(request).await;
    let success = outcome.as_success().expect("应当成功");
    assert_eq!(success.word_count, 1200);
    assert!(!success.warnings.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_stops_waiting_for_the_model() {
    let h = harness(vec![Reply::Hang]);

    let outcome = h
        .orchestrator
        .evaluate_until(
            SubmissionRequest::new(7, common::TASK1_ESSAY),
            tokio::time::sleep(Duration::from_secs(5)),
        )
        .await;
    let failure = outcome.as_failure().expect("应当被取消");
    assert_eq!(failure.kind, FailureKind::Cancelled);
    assert!(failure.retryable);
    assert_eq!(h.transport.calls(), 1);
    assert_eq!(h.store.increments.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_open_circuit_is_surfaced_with_wait_hint() {
    let h = harness((0..5).map(|_| fail(AssessmentErrorKind::BadRequest)).collect());
    for _ in 0..5 {
        h.orchestrator
            .evaluate(SubmissionRequest::new(7, common::TASK1_ESSAY))
            .await;
    }

    let outcome = h
        .orchestrator
        .evaluate(SubmissionRequest::new(7, common::TASK1_ESSAY))
        .await;
    let failure = outcome.as_failure().expect("应当失败");
    assert_eq!(
        failure.kind,
        FailureKind::Assessment(AssessmentErrorKind::CircuitOpen)
    );
    assert!(failure.retryable);
    assert_eq!(failure.retry_after, Some(Duration::from_secs(300)));
    assert_eq!(h.transport.calls(), 5);
}
