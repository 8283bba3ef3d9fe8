use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ielts_writing_eval::models::QuotaTier;
use ielts_writing_eval::utils::logging::{log_history, log_outcome, log_startup};
use ielts_writing_eval::{
    logger, Config, EvaluationOrchestrator, EvaluationOutcome, MemoryStore, OpenAiTransport,
    SubmissionRequest, SystemClock, TaskType,
};

/// 雅思写作评分
#[derive(Debug, Parser)]
#[command(name = "ielts-eval", about = "雅思写作评分：读取作文，输出四项评分与反馈")]
struct Args {
    /// 作文文件路径，省略时从标准输入读取
    #[arg(value_name = "ESSAY")]
    essay: Option<PathBuf>,

    /// TOML 配置文件
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// 指定题型（1 或 2），跳过自动识别
    #[arg(long, value_name = "1|2", value_parser = parse_task)]
    task: Option<TaskType>,

    /// 用户ID
    #[arg(long = "user", value_name = "USER_ID", default_value_t = 1)]
    user_id: i64,

    /// 配额等级（standard 或 elevated）
    #[arg(long, value_name = "TIER", value_parser = parse_tier, default_value = "standard")]
    tier: QuotaTier,
}

fn parse_task(value: &str) -> Result<TaskType, String> {
    value
        .parse::<u8>()
        .ok()
        .and_then(TaskType::from_number)
        .ok_or_else(|| format!("题型必须是 1 或 2，收到 '{}'", value))
}

fn parse_tier(value: &str) -> Result<QuotaTier, String> {
    match value.to_ascii_lowercase().as_str() {
        "standard" => Ok(QuotaTier::Standard),
        "elevated" => Ok(QuotaTier::Elevated),
        other => Err(format!("配额等级必须是 standard 或 elevated，收到 '{}'", other)),
    }
}

fn read_essay(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("读取作文失败: {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("从标准输入读取作文失败")?;
            Ok(text)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 加载配置
    let config = Config::load(args.config.as_deref())?;

    // 初始化日志
    logger::init(config.verbose_logging);
    config.validate()?;
    log_startup(&config);

    let essay = read_essay(args.essay.as_ref())?;

    let clock = Arc::new(SystemClock);
    let store = Arc::new(MemoryStore::with_clock(clock.clone()));
    let orchestrator = EvaluationOrchestrator::from_config(
        &config,
        Arc::new(OpenAiTransport::new(&config)),
        store.clone(),
        store,
        clock,
    );

    let mut request = SubmissionRequest::new(args.user_id, essay).with_tier(args.tier);
    if let Some(task) = args.task {
        request = request.with_task_type(task);
    }

    // Ctrl-C 取消评估
    let outcome = orchestrator
        .evaluate_until(request, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;
    log_outcome(&outcome);

    match &outcome {
        EvaluationOutcome::Success(success) => {
            println!("{}", serde_json::to_string_pretty(&success.scores)?);
            for warning in &success.warnings {
                println!("note: {}", warning);
            }
            if let Some(remaining) = success.remaining_today {
                println!("Evaluations left today: {}", remaining);
            }
            log_history(&orchestrator.history(args.user_id, 5).await);
        }
        EvaluationOutcome::NeedsClarification(request) => {
            println!("{}", request.message);
            for suggestion in &request.suggestions {
                println!("  - {}", suggestion);
            }
            println!("Re-run with --task 1 or --task 2.");
        }
        EvaluationOutcome::Failed(failure) => {
            println!("{}", failure.message);
            for suggestion in &failure.suggestions {
                println!("  - {}", suggestion);
            }
            std::process::exit(if failure.retryable { 2 } else { 1 });
        }
    }

    Ok(())
}
