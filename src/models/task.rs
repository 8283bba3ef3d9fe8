use serde::{Deserialize, Serialize};

/// 写作题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    /// Task 1：图表 / 流程描述
    DataDescription,
    /// Task 2：议论文
    Argumentative,
}

impl TaskType {
    /// 获取题型编号（1 或 2）
    pub fn number(self) -> u8 {
        match self {
            TaskType::DataDescription => 1,
            TaskType::Argumentative => 2,
        }
    }

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            TaskType::DataDescription => "Task 1",
            TaskType::Argumentative => "Task 2",
        }
    }

    /// 从编号解析题型
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(TaskType::DataDescription),
            2 => Some(TaskType::Argumentative),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 题型识别结果
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDetectionOutcome {
    pub detected_type: Option<TaskType>,
    /// 取值 [0, 1]
    pub confidence_score: f64,
    pub requires_clarification: bool,
    pub reasoning: String,
}

impl TaskDetectionOutcome {
    /// 无法判断题型，需要用户指定
    pub fn undetermined(confidence_score: f64, reasoning: impl Into<String>) -> Self {
        Self {
            detected_type: None,
            confidence_score,
            requires_clarification: true,
            reasoning: reasoning.into(),
        }
    }
}
