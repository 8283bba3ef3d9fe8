//! 语言识别
//!
//! 基于 whatlang 的三元组统计，只给出最可能的语言和置信度。

use whatlang::{detect, Lang};

/// 语言识别结果
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedLanguage {
    /// ISO 639-1 代码，识别失败时为 "und"
    pub code: String,
    pub confidence: f64,
}

impl DetectedLanguage {
    pub fn unknown() -> Self {
        Self {
            code: "und".to_string(),
            confidence: 0.0,
        }
    }

    pub fn is_english(&self) -> bool {
        self.code == "en"
    }
}

/// 识别文本语言
pub fn detect_language(text: &str) -> DetectedLanguage {
    if text.trim().is_empty() {
        return DetectedLanguage::unknown();
    }

    match detect(text) {
        Some(info) => DetectedLanguage {
            code: language_code(info.lang()).to_string(),
            confidence: info.confidence(),
        },
        None => DetectedLanguage::unknown(),
    }
}

fn language_code(lang: Lang) -> &'static str {
    match lang {
        Lang::Eng => "en",
        Lang::Spa => "es",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Ita => "it",
        Lang::Por => "pt",
        Lang::Rus => "ru",
        Lang::Cmn => "zh",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Ara => "ar",
        Lang::Hin => "hi",
        Lang::Nld => "nl",
        Lang::Tur => "tr",
        Lang::Vie => "vi",
        _ => lang.code(),
    }
}
