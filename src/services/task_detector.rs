//! 题型识别服务
//!
//! 用两套带权重的关键词表给文本打分，判断是 Task 1（图表描述）
//! 还是 Task 2（议论文）。纯函数，只依赖小写后的文本。

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::models::{TaskDetectionOutcome, TaskType};

/// 一个关键词类别
struct KeywordCategory {
    name: &'static str,
    weight: f64,
    keywords: &'static [&'static str],
}

const DATA_DESCRIPTION_CATEGORIES: &[KeywordCategory] = &[
    KeywordCategory {
        name: "data_description",
        weight: 3.0,
        keywords: &[
            "chart", "graph", "table", "diagram", "figure", "data", "statistics",
            "percentage", "proportion", "shows", "illustrates", "depicts", "presents",
            "according to", "as shown", "as can be seen", "the chart shows",
            "the graph illustrates", "the table presents", "the diagram depicts",
        ],
    },
    KeywordCategory {
        name: "trends",
        weight: 2.5,
        keywords: &[
            "increase", "decrease", "rise", "fall", "grew", "declined", "dropped",
            "climbed", "soared", "plummeted", "fluctuated", "remained stable",
            "peaked", "reached a peak", "hit a low", "trend", "pattern",
        ],
    },
    KeywordCategory {
        name: "comparisons",
        weight: 2.0,
        keywords: &[
            "higher than", "lower than", "compared to", "in comparison",
            "whereas", "while", "however", "on the other hand", "similarly",
            "likewise", "in contrast", "difference", "similar",
        ],
    },
    KeywordCategory {
        name: "time_periods",
        weight: 1.5,
        keywords: &[
            "from", "to", "between", "during", "over the period", "throughout",
            "initially", "finally", "at the beginning", "at the end",
        ],
    },
    KeywordCategory {
        name: "process_description",
        weight: 2.0,
        keywords: &[
            "process", "stage", "step", "phase", "procedure", "method",
            "first", "second", "third", "next", "then", "after that",
            "finally", "lastly", "subsequently",
        ],
    },
];

const ARGUMENTATIVE_CATEGORIES: &[KeywordCategory] = &[
    KeywordCategory {
        name: "opinion",
        weight: 3.0,
        keywords: &[
            "i think", "i believe", "in my opinion", "from my perspective",
            "i agree", "i disagree", "personally", "i feel that",
            "it seems to me", "i would argue", "my view is",
        ],
    },
    KeywordCategory {
        name: "argument",
        weight: 2.5,
        keywords: &[
            "because", "since", "therefore", "thus", "consequently",
            "as a result", "due to", "owing to", "for this reason",
            "evidence", "proof", "example", "instance", "case",
        ],
    },
    KeywordCategory {
        name: "discussion",
        weight: 2.0,
        keywords: &[
            "on one hand", "on the other hand", "some people think",
            "others believe", "it is argued", "supporters claim",
            "critics argue", "proponents suggest", "opponents contend",
        ],
    },
    KeywordCategory {
        name: "conclusion",
        weight: 1.5,
        keywords: &[
            "in conclusion", "to conclude", "in summary", "to summarize",
            "overall", "all things considered", "taking everything into account",
        ],
    },
    KeywordCategory {
        name: "social_issues",
        weight: 1.0,
        keywords: &[
            "society", "government", "education", "environment", "technology",
            "health", "economy", "culture", "family", "work", "lifestyle",
            "development", "progress", "change", "impact", "effect",
        ],
    },
];

/// 单词用词边界匹配，短语用子串匹配
enum KeywordMatcher {
    Word(Regex),
    Phrase(&'static str),
}

impl KeywordMatcher {
    fn compile(keyword: &'static str) -> Self {
        if keyword.split_whitespace().count() == 1 {
            let pattern = format!(r"\b{}\b", regex::escape(keyword));
            KeywordMatcher::Word(Regex::new(&pattern).expect("关键词正则必然合法"))
        } else {
            KeywordMatcher::Phrase(keyword)
        }
    }

    fn is_match(&self, text: &str) -> bool {
        match self {
            KeywordMatcher::Word(re) => re.is_match(text),
            KeywordMatcher::Phrase(phrase) => text.contains(phrase),
        }
    }
}

struct CompiledCategory {
    name: &'static str,
    weight: f64,
    matchers: Vec<KeywordMatcher>,
}

impl CompiledCategory {
    /// 命中数 / 类别大小 × 权重
    fn score(&self, text: &str) -> f64 {
        let hits = self.matchers.iter().filter(|m| m.is_match(text)).count();
        hits as f64 / self.matchers.len() as f64 * self.weight
    }
}

fn compile(categories: &'static [KeywordCategory]) -> Vec<CompiledCategory> {
    categories
        .iter()
        .map(|category| CompiledCategory {
            name: category.name,
            weight: category.weight,
            matchers: category
                .keywords
                .iter()
                .map(|kw| KeywordMatcher::compile(*kw))
                .collect(),
        })
        .collect()
}

static DATA_DESCRIPTION: Lazy<Vec<CompiledCategory>> =
    Lazy::new(|| compile(DATA_DESCRIPTION_CATEGORIES));
static ARGUMENTATIVE: Lazy<Vec<CompiledCategory>> =
    Lazy::new(|| compile(ARGUMENTATIVE_CATEGORIES));

fn taxonomy_score(categories: &[CompiledCategory], text: &str) -> f64 {
    categories
        .iter()
        .map(|category| {
            let score = category.score(text);
            if score > 0.0 {
                debug!("  类别 {} 得分 {:.3}", category.name, score);
            }
            score
        })
        .sum()
}

/// 判定阈值
///
/// 关键词打分本身就是近似的，这几个数可以按需要调整。
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionThresholds {
    /// 达到即直接判定
    pub high: f64,
    /// 达到即倾向判定
    pub medium: f64,
    /// 倾向判定时低于此值仍需用户确认
    pub clarify_below: f64,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            high: 0.65,
            medium: 0.55,
            clarify_below: 0.6,
        }
    }
}

/// 题型识别器
#[derive(Debug, Clone, Default)]
pub struct TaskTypeDetector {
    thresholds: DetectionThresholds,
}

impl TaskTypeDetector {
    pub fn new(thresholds: DetectionThresholds) -> Self {
        Self { thresholds }
    }

    /// 识别题型
    pub fn detect(&self, text: &str) -> TaskDetectionOutcome {
        if text.trim().is_empty() {
            return TaskDetectionOutcome::undetermined(0.0, "Empty text provided");
        }

        let lower = text.to_lowercase();
        let task1 = taxonomy_score(&DATA_DESCRIPTION, &lower);
        let task2 = taxonomy_score(&ARGUMENTATIVE, &lower);
        let total = task1 + task2;
        debug!("题型得分: Task 1 = {:.3}, Task 2 = {:.3}", task1, task2);

        if total == 0.0 {
            return TaskDetectionOutcome::undetermined(
                0.0,
                "No clear indicators found for either task type",
            );
        }

        let p1 = task1 / total;
        let p2 = task2 / total;
        let t = &self.thresholds;

        if p1 >= t.high {
            self.decided(
                TaskType::DataDescription,
                p1,
                false,
                "Strong Task 1 indicators detected (data description, trends, comparisons)",
            )
        } else if p2 >= t.high {
            self.decided(
                TaskType::Argumentative,
                p2,
                false,
                "Strong Task 2 indicators detected (opinions, arguments, discussions)",
            )
        } else if p1 >= t.medium {
            self.decided(
                TaskType::DataDescription,
                p1,
                p1 < t.clarify_below,
                "Moderate Task 1 indicators detected",
            )
        } else if p2 >= t.medium {
            self.decided(
                TaskType::Argumentative,
                p2,
                p2 < t.clarify_below,
                "Moderate Task 2 indicators detected",
            )
        } else {
            TaskDetectionOutcome::undetermined(
                p1.max(p2),
                "Ambiguous content - could be either task type",
            )
        }
    }

    fn decided(
        &self,
        task_type: TaskType,
        confidence: f64,
        requires_clarification: bool,
        reasoning: &str,
    ) -> TaskDetectionOutcome {
        TaskDetectionOutcome {
            detected_type: Some(task_type),
            confidence_score: confidence,
            requires_clarification,
            reasoning: reasoning.to_string(),
        }
    }
}
