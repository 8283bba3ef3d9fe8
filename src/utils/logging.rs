//! 日志工具模块
//!
//! 提供日志格式化和输出的辅助函数

use tracing::{info, warn};

use crate::config::Config;
use crate::models::{EvaluationOutcome, HistoryEntry};

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 雅思写作评估服务启动");
    info!("🤖 模型: {} ({})", config.llm_model_name, config.llm_api_base_url);
    info!(
        "🔁 最多尝试 {} 次，单次超时 {}s",
        config.max_attempts, config.request_timeout_secs
    );
    info!(
        "📊 每日配额: 普通 {} 次 / 高级 {} 次",
        config.standard_daily_limit, config.elevated_daily_limit
    );
    info!("{}", "=".repeat(60));
}

/// 记录一次评估的最终结果
pub fn log_outcome(outcome: &EvaluationOutcome) {
    match outcome {
        EvaluationOutcome::Success(success) => {
            info!("\n{}", "─".repeat(60));
            info!(
                "✅ 评估完成: {} 总分 {:.1} ({} 词)",
                success.task_type, success.scores.overall_band, success.word_count
            );
            if !success.history_recorded() {
                warn!("⚠️ 历史记录可能缺失: {:?}", success.persistence_issues);
            }
            info!("{}", "─".repeat(60));
        }
        EvaluationOutcome::NeedsClarification(request) => {
            info!(
                "❓ 需要用户确认题型 (置信度 {:.2})",
                request.detection.confidence_score
            );
        }
        EvaluationOutcome::Failed(failure) => {
            warn!(
                "❌ 评估失败: {:?} (可重试: {})",
                failure.kind, failure.retryable
            );
        }
    }
}

/// 记录历史评分
pub fn log_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        info!("📭 暂无历史评分");
        return;
    }
    info!("📚 最近 {} 次评分:", entries.len());
    for entry in entries {
        info!(
            "  #{} {} {:.1} 分 ({} 词, {})",
            entry.submission_id,
            entry.task_type,
            entry.overall_band,
            entry.word_count,
            entry.submitted_at.format("%Y-%m-%d %H:%M")
        );
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
