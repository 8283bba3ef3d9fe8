//! 面向用户的提示文案
//!
//! 文案是英文的，会原样展示给考生。

use std::time::Duration;

use crate::error::AssessmentErrorKind;
use crate::models::QuotaTier;
use crate::services::{ValidationErrorKind, ValidationOutcome};

/// 校验失败的提示（错误说明 + 质量提示）
pub fn validation_message(outcome: &ValidationOutcome, min_words: usize) -> String {
    let mut parts: Vec<String> = outcome
        .errors
        .iter()
        .map(|kind| match kind {
            ValidationErrorKind::EmptyText => "Please provide some text to evaluate.".to_string(),
            ValidationErrorKind::TooShort => format!(
                "Text is too short ({} words). Please provide at least {} words.",
                outcome.word_count, min_words
            ),
            ValidationErrorKind::NotEnglish => {
                "Please submit your writing in English for IELTS evaluation.".to_string()
            }
            ValidationErrorKind::InvalidContent => {
                "Text quality issues detected. Please check your submission.".to_string()
            }
        })
        .collect();
    parts.extend(outcome.warnings.iter().cloned());
    parts.join(" ")
}

/// 每种校验错误对应的修改建议
pub fn validation_suggestions(errors: &[ValidationErrorKind], min_words: usize) -> Vec<String> {
    let mut suggestions = Vec::new();
    for kind in errors {
        match kind {
            ValidationErrorKind::EmptyText => {
                suggestions.push("Please provide your IELTS writing text".to_string());
            }
            ValidationErrorKind::TooShort => {
                suggestions.push(format!(
                    "Write at least {} words for meaningful evaluation",
                    min_words
                ));
                suggestions
                    .push("Task 1: aim for 150+ words, Task 2: aim for 250+ words".to_string());
            }
            ValidationErrorKind::NotEnglish => {
                suggestions.push("Submit your writing in English for IELTS evaluation".to_string());
            }
            ValidationErrorKind::InvalidContent => {
                suggestions.push("Check for proper sentence structure and grammar".to_string());
                suggestions.push("Ensure your text is readable and well-formatted".to_string());
            }
        }
    }
    suggestions
}

/// 配额用完的提示，普通用户会看到升级说明
pub fn quota_denied_message(tier: QuotaTier, limit: u32) -> String {
    let mut message = format!(
        "Daily submission limit reached ({} evaluations). \
         Your quota resets tomorrow at midnight (UTC).",
        limit
    );
    if tier == QuotaTier::Standard {
        message.push_str(" Upgrade to Pro for a much higher daily limit!");
    }
    message
}

pub const CLARIFICATION_MESSAGE: &str = "Please specify whether this is Task 1 \
    (describing a chart, graph or process) or Task 2 (an essay).";

pub fn clarification_suggestions() -> Vec<String> {
    vec![
        "Use the task selection buttons".to_string(),
        "Include clear task indicators in your text".to_string(),
    ]
}

pub const CANCELLED_MESSAGE: &str =
    "Evaluation was cancelled. Send your text again when you are ready.";

/// 评分失败的提示
pub fn assessment_failure_message(
    kind: AssessmentErrorKind,
    retry_after: Option<Duration>,
) -> String {
    use AssessmentErrorKind::*;

    let base = match kind {
        AuthFailed | PermissionDenied | BadRequest => {
            return "Service temporarily unavailable due to configuration issues.".to_string();
        }
        Timeout => "Request timed out. The service might be busy.",
        ConnectionFailed => "Connection issue detected while contacting the assessment service.",
        RateLimited => "The assessment service is receiving too many requests right now.",
        CircuitOpen => "The assessment service is cooling down after repeated failures.",
        ParseError | FormatError => "The assessment came back in an unexpected format.",
        ApiError | Unknown => "Assessment service temporarily unavailable.",
    };

    match retry_after {
        Some(wait) if wait.as_secs() >= 60 => format!(
            "{} Please try again in about {} minute(s).",
            base,
            (wait.as_secs() + 59) / 60
        ),
        Some(wait) => format!(
            "{} Please try again in {} seconds.",
            base,
            wait.as_secs().max(1)
        ),
        None => format!("{} Please try again.", base),
    }
}

pub fn assessment_failure_suggestions(kind: AssessmentErrorKind) -> Vec<String> {
    if kind.is_retryable() {
        vec!["Your text was not lost: send it again to retry".to_string()]
    } else {
        vec!["Please contact support if this keeps happening".to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_short_suggestions() {
        let suggestions = validation_suggestions(&[ValidationErrorKind::TooShort], 80);
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions[0].contains("at least 80 words"));
        assert!(suggestions[1].contains("150+"));
    }

    #[test]
    fn test_too_short_message_uses_configured_minimum() {
        let outcome = ValidationOutcome {
            is_valid: false,
            errors: vec![ValidationErrorKind::TooShort],
            warnings: Vec::new(),
            word_count: 40,
            detected_language: "en".to_string(),
            language_confidence: 0.99,
        };
        let message = validation_message(&outcome, 120);
        assert!(message.contains("(40 words)"));
        assert!(message.contains("at least 120 words"));
    }

    #[test]
    fn test_quota_message_by_tier() {
        assert!(quota_denied_message(QuotaTier::Standard, 3).contains("Upgrade"));
        assert!(!quota_denied_message(QuotaTier::Elevated, 50).contains("Upgrade"));
    }

    #[test]
    fn test_assessment_messages() {
        let config = assessment_failure_message(AssessmentErrorKind::AuthFailed, None);
        assert!(config.contains("configuration"));

        let timeout = assessment_failure_message(
            AssessmentErrorKind::Timeout,
            Some(Duration::from_secs(60)),
        );
        assert!(timeout.contains("1 minute"));

        let circuit = assessment_failure_message(
            AssessmentErrorKind::CircuitOpen,
            Some(Duration::from_secs(5)),
        );
        assert!(circuit.contains("5 seconds"));
    }
}
