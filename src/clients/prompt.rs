//! 评分提示词
//!
//! 两种题型共用同一个 JSON 输出格式，只有评分要点不同。

use crate::clients::transport::CompletionRequest;
use crate::models::TaskType;

pub const SYSTEM_MESSAGE: &str = "You are an expert IELTS examiner with years of experience \
evaluating writing tasks according to the official IELTS band descriptors.";

pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 1500;

/// 要求模型返回的 JSON 样例（八个键）
const RESPONSE_SHAPE: &str = r#"{
    "task_achievement_score": 0.0,
    "coherence_cohesion_score": 0.0,
    "lexical_resource_score": 0.0,
    "grammatical_accuracy_score": 0.0,
    "overall_band_score": 0.0,
    "detailed_feedback": "Overall assessment of the writing...",
    "improvement_suggestions": [
        "Specific suggestion 1",
        "Specific suggestion 2",
        "Specific suggestion 3"
    ],
    "score_justifications": {
        "task_achievement": "Justification for the first criterion score...",
        "coherence_cohesion": "Justification for Coherence and Cohesion score...",
        "lexical_resource": "Justification for Lexical Resource score...",
        "grammatical_accuracy": "Justification for Grammatical Range and Accuracy score..."
    }
}"#;

const TASK1_CRITERIA: &str = "\
TASK 1 EVALUATION CRITERIA:
- Task Achievement: Does the response cover the task requirements? Is there a clear overview of the main trends, differences or stages? Are the key features selected and reported appropriately?
- Coherence and Cohesion: Is the information organised logically? Are cohesive devices used appropriately?
- Lexical Resource: Is there a range of vocabulary, used accurately and appropriately?
- Grammatical Range and Accuracy: Is there a variety of sentence structures, used accurately?";

const TASK2_CRITERIA: &str = "\
TASK 2 EVALUATION CRITERIA:
- Task Response: Are all parts of the task addressed? Is a clear position kept throughout? Are ideas developed with relevant examples?
- Coherence and Cohesion: Is the writing organised with clear progression? Are cohesive devices used effectively?
- Lexical Resource: Is a wide range of vocabulary used naturally and flexibly, including less common items?
- Grammatical Range and Accuracy: Is a wide range of structures used accurately? Are complex sentences attempted?";

const SCORING_RULES: &str = "Scores must be between 0.0 and 9.0 in 0.5 increments. \
The overall band score must be the average of the four criteria scores, rounded to the nearest 0.5. \
Return exactly one JSON object.";

/// 生成题型对应的用户消息，原文原样嵌入
pub fn build_prompt(text: &str, task_type: TaskType) -> String {
    let criteria = match task_type {
        TaskType::DataDescription => TASK1_CRITERIA,
        TaskType::Argumentative => TASK2_CRITERIA,
    };

    format!(
        "Please evaluate this IELTS Writing {} response according to the official IELTS band descriptors.\n\n\
         TEXT TO EVALUATE:\n{}\n\n\
         Provide your assessment in the following JSON format:\n{}\n\n\
         {}\n\n\
         {}\n",
        task_type.name(),
        text,
        RESPONSE_SHAPE,
        criteria,
        SCORING_RULES
    )
}

/// 组装完整的补全请求
pub fn build_request(
    text: &str,
    task_type: TaskType,
    temperature: f32,
    max_tokens: u32,
) -> CompletionRequest {
    CompletionRequest {
        system_message: SYSTEM_MESSAGE.to_string(),
        user_message: build_prompt(text, task_type),
        temperature,
        max_tokens,
    }
}
