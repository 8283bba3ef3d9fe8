//! 评分响应解析与分数校验
//!
//! 两个纯函数：先把模型回复解析成 [`RubricScores`]，再用分数闸门判断能否信任。

use std::collections::BTreeMap;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::error::{AssessmentError, ScoreIssue};
use crate::models::{Criterion, RubricScores};

/// 必须出现的八个字段
pub const REQUIRED_FIELDS: [&str; 8] = [
    "task_achievement_score",
    "coherence_cohesion_score",
    "lexical_resource_score",
    "grammatical_accuracy_score",
    "overall_band_score",
    "detailed_feedback",
    "improvement_suggestions",
    "score_justifications",
];

pub const MAX_SUGGESTIONS: usize = 5;
pub const MIN_SUGGESTIONS: usize = 2;
const OVERALL_TOLERANCE: f64 = 0.1;

#[derive(Debug, Deserialize)]
struct WireAssessment {
    #[serde(deserialize_with = "deserialize_score")]
    task_achievement_score: f64,
    #[serde(deserialize_with = "deserialize_score")]
    coherence_cohesion_score: f64,
    #[serde(deserialize_with = "deserialize_score")]
    lexical_resource_score: f64,
    #[serde(deserialize_with = "deserialize_score")]
    grammatical_accuracy_score: f64,
    #[serde(deserialize_with = "deserialize_score")]
    overall_band_score: f64,
    detailed_feedback: String,
    improvement_suggestions: Vec<String>,
    score_justifications: BTreeMap<String, String>,
}

/// 分数可能是数字，也可能是 "6.5" 这样的字符串
fn deserialize_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use std::fmt;

    struct ScoreVisitor;

    impl<'de> Visitor<'de> for ScoreVisitor {
        type Value = f64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or numeric string representing a band score")
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value as f64)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value as f64)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            value
                .trim()
                .parse::<f64>()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_any(ScoreVisitor)
}

/// 解析模型回复
///
/// 取第一个 `{` 到最后一个 `}` 之间的内容；找不到或不是合法 JSON 为
/// `ParseError`，缺字段或类型不对为 `FormatError`。
pub fn parse_response(content: &str) -> Result<RubricScores, AssessmentError> {
    let (start, end) = match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => return Err(AssessmentError::parse("回复中找不到 JSON 对象")),
    };

    let value: serde_json::Value = serde_json::from_str(&content[start..=end])
        .map_err(|e| AssessmentError::parse(format!("JSON 不合法: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| AssessmentError::format("回复不是 JSON 对象"))?;
    if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !object.contains_key(**f)) {
        return Err(AssessmentError::format(format!("缺少必填字段: {}", missing)));
    }

    let wire: WireAssessment = serde_json::from_value(value)
        .map_err(|e| AssessmentError::format(format!("字段类型不正确: {}", e)))?;

    let mut suggestions = wire.improvement_suggestions;
    if suggestions.len() > MAX_SUGGESTIONS {
        suggestions.truncate(MAX_SUGGESTIONS);
    }

    Ok(RubricScores {
        task_achievement: wire.task_achievement_score,
        coherence_cohesion: wire.coherence_cohesion_score,
        lexical_resource: wire.lexical_resource_score,
        grammatical_accuracy: wire.grammatical_accuracy_score,
        overall_band: wire.overall_band_score,
        detailed_feedback: wire.detailed_feedback,
        improvement_suggestions: suggestions,
        score_justifications: wire.score_justifications,
    })
}

fn check_band(field: &'static str, value: f64) -> Result<(), ScoreIssue> {
    if !(0.0..=9.0).contains(&value) {
        return Err(ScoreIssue::OutOfRange { field, value });
    }
    if (value * 2.0).fract() != 0.0 {
        return Err(ScoreIssue::NotHalfStep { field, value });
    }
    Ok(())
}

/// 分数闸门
pub fn validate_scores(scores: &RubricScores) -> Result<(), ScoreIssue> {
    for criterion in Criterion::ALL {
        check_band(criterion.score_field(), scores.score(criterion))?;
    }
    check_band("overall_band_score", scores.overall_band)?;

    let expected = scores.expected_overall();
    if (scores.overall_band - expected).abs() > OVERALL_TOLERANCE {
        return Err(ScoreIssue::OverallMismatch {
            expected,
            actual: scores.overall_band,
        });
    }

    if scores.detailed_feedback.trim().is_empty() {
        return Err(ScoreIssue::EmptyFeedback);
    }
    if scores.improvement_suggestions.len() < MIN_SUGGESTIONS {
        return Err(ScoreIssue::TooFewSuggestions(
            scores.improvement_suggestions.len(),
        ));
    }
    for criterion in Criterion::ALL {
        match scores.justification(criterion) {
            Some(text) if !text.trim().is_empty() => {}
            _ => return Err(ScoreIssue::MissingJustification(criterion.key())),
        }
    }
    Ok(())
}

/// 解析并通过分数闸门
pub fn parse_and_validate(content: &str) -> Result<RubricScores, AssessmentError> {
    let scores = parse_response(content)?;
    validate_scores(&scores).map_err(|issue| {
        warn!("⚠️ 评分未通过校验: {}", issue);
        AssessmentError::from(issue)
    })?;
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssessmentErrorKind;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "task_achievement_score": 6.5,
            "coherence_cohesion_score": 7.0,
            "lexical_resource_score": 6.0,
            "grammatical_accuracy_score": 6.5,
            "overall_band_score": 6.5,
            "detailed_feedback": "A clear overview with accurate data.",
            "improvement_suggestions": ["Group similar trends", "Vary sentence openings"],
            "score_justifications": {
                "task_achievement": "Key features covered.",
                "coherence_cohesion": "Logical paragraphs.",
                "lexical_resource": "Adequate range.",
                "grammatical_accuracy": "Mostly accurate."
            }
        })
    }

    #[test]
    fn test_parses_json_wrapped_in_prose() {
        let content = format!("Here is my assessment:\n```json\n{}\n```\nGood luck!", sample());
        let scores = parse_and_validate(&content).unwrap();
        assert_eq!(scores.task_achievement, 6.5);
        assert_eq!(scores.overall_band, 6.5);
        assert_eq!(scores.justification(Criterion::LexicalResource), Some("Adequate range."));
    }

    #[test]
    fn test_no_braces_is_parse_error() {
        let err = parse_response("I cannot grade this essay.").unwrap_err();
        assert_eq!(err.kind, AssessmentErrorKind::ParseError);
        let err = parse_response("} backwards {").unwrap_err();
        assert_eq!(err.kind, AssessmentErrorKind::ParseError);
    }

    #[test]
    fn test_broken_json_is_parse_error() {
        let err = parse_response("{\"task_achievement_score\": 6.5,, }").unwrap_err();
        assert_eq!(err.kind, AssessmentErrorKind::ParseError);
    }

    #[test]
    fn test_missing_field_is_format_error() {
        let mut value = sample();
        value.as_object_mut().unwrap().remove("score_justifications");
        let err = parse_response(&value.to_string()).unwrap_err();
        assert_eq!(err.kind, AssessmentErrorKind::FormatError);
        assert!(err.message.contains("score_justifications"));
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let mut value = sample();
        value["lexical_resource_score"] = json!("6.0");
        value["overall_band_score"] = json!(" 6.5 ");
        let scores = parse_response(&value.to_string()).unwrap();
        assert_eq!(scores.lexical_resource, 6.0);
        assert_eq!(scores.overall_band, 6.5);

        value["overall_band_score"] = json!("six");
        let err = parse_response(&value.to_string()).unwrap_err();
        assert_eq!(err.kind, AssessmentErrorKind::FormatError);
    }

    #[test]
    fn test_extra_suggestions_truncated() {
        let mut value = sample();
        value["improvement_suggestions"] = json!(["a", "b", "c", "d", "e", "f", "g"]);
        let scores = parse_response(&value.to_string()).unwrap();
        assert_eq!(scores.improvement_suggestions.len(), MAX_SUGGESTIONS);
    }

    #[test]
    fn test_score_gate() {
        let base = parse_response(&sample().to_string()).unwrap();
        assert_eq!(validate_scores(&base), Ok(()));

        let mut s = base.clone();
        s.lexical_resource = 9.5;
        assert!(matches!(validate_scores(&s), Err(ScoreIssue::OutOfRange { .. })));

        let mut s = base.clone();
        s.task_achievement = 6.3;
        assert!(matches!(validate_scores(&s), Err(ScoreIssue::NotHalfStep { .. })));

        let mut s = base.clone();
        s.overall_band = 7.5;
        assert_eq!(
            validate_scores(&s),
            Err(ScoreIssue::OverallMismatch {
                expected: 6.5,
                actual: 7.5
            })
        );

        let mut s = base.clone();
        s.detailed_feedback = "  ".to_string();
        assert_eq!(validate_scores(&s), Err(ScoreIssue::EmptyFeedback));

        let mut s = base.clone();
        s.improvement_suggestions.truncate(1);
        assert_eq!(validate_scores(&s), Err(ScoreIssue::TooFewSuggestions(1)));

        let mut s = base;
        s.score_justifications.insert("grammatical_accuracy".to_string(), String::new());
        assert_eq!(
            validate_scores(&s),
            Err(ScoreIssue::MissingJustification("grammatical_accuracy"))
        );
    }

    #[test]
    fn test_overall_rounds_half_up() {
        // 均分 6.125 → 6.0；均分 6.25 → 6.5
        let mut s = parse_response(&sample().to_string()).unwrap();
        s.task_achievement = 6.0;
        s.coherence_cohesion = 6.0;
        s.lexical_resource = 6.0;
        s.grammatical_accuracy = 6.5;
        assert_eq!(s.expected_overall(), 6.0);
        s.grammatical_accuracy = 7.0;
        assert_eq!(s.expected_overall(), 6.5);
    }

    #[test]
    fn test_score_gate_failure_maps_to_format_error() {
        let mut value = sample();
        value["overall_band_score"] = json!(8.0);
        let err = parse_and_validate(&value.to_string()).unwrap_err();
        assert_eq!(err.kind, AssessmentErrorKind::FormatError);
        assert!(err.retryable());
    }
}
