pub mod evaluation_orchestrator;
pub mod messages;
pub mod request_ctx;

pub use evaluation_orchestrator::EvaluationOrchestrator;
pub use request_ctx::EvaluationCtx;
