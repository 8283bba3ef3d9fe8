//! # IELTS Writing Eval
//!
//! 雅思写作自动评估的编排核心
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 时间来源与存储契约，只暴露能力
//! - `SubmissionRepository` / `DailyCounterStore` - 编排核心依赖的两个窄接口
//! - `MemoryStore` - 内存实现，供演示程序与测试使用
//!
//! ### ② 业务能力层（Services / Clients）
//! - `services/` - 描述“我能做什么”，每个能力都是独立的
//! - `TextValidator` - 空文本、字数、语言、内容质量
//! - `TaskTypeDetector` - 关键词加权打分判断 Task 1 / Task 2
//! - `QuotaGuard` - 每日配额检查与计数
//! - `clients/` - 评分客户端：超时、重试、熔断、解析、分数闸门
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/` - 定义“一次提交”的完整处理流程
//! - `EvaluationCtx` - 请求上下文（日志前缀）
//! - `EvaluationOrchestrator` - 配额 → 校验 → 题型 → 评分 → 落库
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use clients::{AssessmentClient, CircuitBreaker, CompletionTransport, OpenAiTransport};
pub use config::Config;
pub use error::{AppError, AppResult, AssessmentError, AssessmentErrorKind};
pub use infrastructure::{Clock, MemoryStore, SystemClock};
pub use models::{EvaluationOutcome, SubmissionRequest, TaskType};
pub use orchestrator::{EvaluationCtx, EvaluationOrchestrator};
