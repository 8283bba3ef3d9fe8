use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 四项评分标准
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Criterion {
    TaskAchievement,
    CoherenceCohesion,
    LexicalResource,
    GrammaticalAccuracy,
}

impl Criterion {
    pub const ALL: [Criterion; 4] = [
        Criterion::TaskAchievement,
        Criterion::CoherenceCohesion,
        Criterion::LexicalResource,
        Criterion::GrammaticalAccuracy,
    ];

    /// `score_justifications` 中使用的键名
    pub fn key(self) -> &'static str {
        match self {
            Criterion::TaskAchievement => "task_achievement",
            Criterion::CoherenceCohesion => "coherence_cohesion",
            Criterion::LexicalResource => "lexical_resource",
            Criterion::GrammaticalAccuracy => "grammatical_accuracy",
        }
    }

    /// 分数字段名
    pub fn score_field(self) -> &'static str {
        match self {
            Criterion::TaskAchievement => "task_achievement_score",
            Criterion::CoherenceCohesion => "coherence_cohesion_score",
            Criterion::LexicalResource => "lexical_resource_score",
            Criterion::GrammaticalAccuracy => "grammatical_accuracy_score",
        }
    }
}

/// 解析后的评分结果
///
/// 只有通过分数校验的结果才会交给下游持久化。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricScores {
    pub task_achievement: f64,
    pub coherence_cohesion: f64,
    pub lexical_resource: f64,
    pub grammatical_accuracy: f64,
    pub overall_band: f64,
    pub detailed_feedback: String,
    pub improvement_suggestions: Vec<String>,
    /// 键为 [`Criterion::key`]
    pub score_justifications: BTreeMap<String, String>,
}

impl RubricScores {
    pub fn score(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::TaskAchievement => self.task_achievement,
            Criterion::CoherenceCohesion => self.coherence_cohesion,
            Criterion::LexicalResource => self.lexical_resource,
            Criterion::GrammaticalAccuracy => self.grammatical_accuracy,
        }
    }

    pub fn justification(&self, criterion: Criterion) -> Option<&str> {
        self.score_justifications
            .get(criterion.key())
            .map(String::as_str)
    }

    /// 四项平均分按 0.5 取整（四舍五入）
    pub fn expected_overall(&self) -> f64 {
        let mean = Criterion::ALL.iter().map(|c| self.score(*c)).sum::<f64>() / 4.0;
        (mean * 2.0).round() / 2.0
    }
}

/// 模型原始响应（尚未解析）
#[derive(Debug, Clone, PartialEq)]
pub struct RawAssessment {
    pub content: String,
    pub usage_tokens: Option<u32>,
    pub model_used: String,
    /// 成功前一共调用了几次传输层
    pub attempts: u32,
}
