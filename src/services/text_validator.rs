//! 文本校验服务
//!
//! 只负责判断“这段文字能不能拿去评分”，不关心题型和评分流程。
//! 校验从不失败，所有问题都写进 [`ValidationOutcome::errors`]。

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::services::language::detect_language;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("合法的正则"));
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").expect("合法的正则"));

/// 校验错误种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// 空文本或只有空白
    EmptyText,
    /// 字数不足
    TooShort,
    /// 不是英文（或置信度不够）
    NotEnglish,
    /// 内容质量问题（重复、句子结构、标点）
    InvalidContent,
}

impl ValidationErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmptyText => "empty_text",
            Self::TooShort => "too_short",
            Self::NotEnglish => "not_english",
            Self::InvalidContent => "invalid_content",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 校验结果，每个请求生成一次
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    /// 每种错误最多出现一次，按发现顺序排列
    pub errors: Vec<ValidationErrorKind>,
    pub warnings: Vec<String>,
    pub word_count: usize,
    pub detected_language: String,
    pub language_confidence: f64,
}

impl ValidationOutcome {
    pub fn has_error(&self, kind: ValidationErrorKind) -> bool {
        self.errors.contains(&kind)
    }
}

/// 校验阈值
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorSettings {
    pub min_word_count: usize,
    /// 超过只给提示，不算错误
    pub max_word_count: usize,
    pub english_confidence_threshold: f64,
    /// 单个长词占总词数的比例上限
    pub repetition_ratio: f64,
    pub min_sentences: usize,
    pub min_words_per_sentence: usize,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            min_word_count: 50,
            max_word_count: 1000,
            english_confidence_threshold: 0.8,
            repetition_ratio: 0.1,
            min_sentences: 3,
            min_words_per_sentence: 3,
        }
    }
}

/// 文本校验器
#[derive(Debug, Clone, Default)]
pub struct TextValidator {
    settings: ValidatorSettings,
}

impl TextValidator {
    pub fn new(settings: ValidatorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    /// 校验一段提交文本
    pub fn validate(&self, text: &str) -> ValidationOutcome {
        if text.trim().is_empty() {
            return ValidationOutcome {
                is_valid: false,
                errors: vec![ValidationErrorKind::EmptyText],
                warnings: Vec::new(),
                word_count: 0,
                detected_language: "und".to_string(),
                language_confidence: 0.0,
            };
        }

        let cleaned = normalize_whitespace(text);
        let word_count = count_words(&cleaned);
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if word_count < self.settings.min_word_count {
            errors.push(ValidationErrorKind::TooShort);
        } else if word_count > self.settings.max_word_count {
            warnings.push(format!(
                "Text is {} words. IELTS tasks typically require 150-250 words (Task 1) or 250+ words (Task 2)",
                word_count
            ));
        }

        let language = detect_language(&cleaned);
        if !language.is_english()
            || language.confidence < self.settings.english_confidence_threshold
        {
            errors.push(ValidationErrorKind::NotEnglish);
        }

        let issues = self.content_issues(&cleaned);
        if !issues.is_empty() {
            errors.push(ValidationErrorKind::InvalidContent);
            warnings.extend(issues);
        }

        debug!(
            "文本校验完成: {} 词, 语言 {} ({:.2}), 错误 {:?}",
            word_count, language.code, language.confidence, errors
        );

        ValidationOutcome {
            is_valid: errors.is_empty(),
            errors,
            warnings,
            word_count,
            detected_language: language.code,
            language_confidence: language.confidence,
        }
    }

    /// 内容质量检查，三项互相独立
    fn content_issues(&self, text: &str) -> Vec<String> {
        let mut issues = Vec::new();

        // 过度重复：只看长度大于 3 的词
        let words: Vec<String> = text
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .collect();
        if words.len() > 10 {
            let mut freq: HashMap<&str, usize> = HashMap::new();
            for word in words.iter().filter(|w| w.chars().count() > 3) {
                *freq.entry(word.as_str()).or_insert(0) += 1;
            }
            let mut repeated: Vec<&str> = freq
                .iter()
                .filter(|(_, count)| {
                    **count as f64 / words.len() as f64 > self.settings.repetition_ratio
                })
                .map(|(word, _)| *word)
                .collect();
            repeated.sort_unstable();
            for word in repeated {
                issues.push(format!("Excessive repetition of word '{}'", word));
            }
        }

        let sentences = SENTENCE_END
            .split(text)
            .filter(|s| s.split_whitespace().count() >= self.settings.min_words_per_sentence)
            .count();
        if sentences < self.settings.min_sentences {
            issues.push("Text appears to lack proper sentence structure".to_string());
        }

        if !text.contains(['.', '!', '?']) {
            issues.push("Text lacks proper punctuation".to_string());
        }

        issues
    }
}

/// 压缩连续空白并去掉首尾空白
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
