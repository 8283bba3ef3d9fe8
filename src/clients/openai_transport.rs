//! OpenAI 兼容接口的补全传输
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型（OpenRouter、Azure、Doubao 等兼容服务）

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::clients::transport::{
    CompletionRequest, CompletionResponse, CompletionTransport, TransportError,
};
use crate::config::Config;
use crate::error::AssessmentErrorKind;

pub struct OpenAiTransport {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl OpenAiTransport {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn build_messages(
        request: &CompletionRequest,
    ) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system_message.as_str())
            .build()?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(request.user_message.as_str())
            .build()?;

        Ok(vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ])
    }
}

#[async_trait]
impl CompletionTransport for OpenAiTransport {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, TransportError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", request.user_message.len());

        let messages = Self::build_messages(&request).map_err(|e| {
            TransportError::new(
                AssessmentErrorKind::BadRequest,
                format!("构建消息失败: {}", e),
            )
        })?;

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens)
            .build()
            .map_err(|e| {
                TransportError::new(
                    AssessmentErrorKind::BadRequest,
                    format!("构建请求失败: {}", e),
                )
            })?;

        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            map_openai_error(&e)
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                TransportError::new(AssessmentErrorKind::ApiError, "LLM 返回内容为空")
            })?;

        Ok(CompletionResponse {
            content: content.trim().to_string(),
            model: response.model,
            total_tokens: response.usage.map(|usage| usage.total_tokens),
        })
    }
}

/// 限流消息里的等待提示，如 "Please try again in 20s" / "try again in 1m30s" / "in 450ms"
static RETRY_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)try again in (?:(\d+)m)?(\d+(?:\.\d+)?)(ms|s)\b").expect("Invalid regex")
});

/// 把 async-openai 的错误归类
fn map_openai_error(err: &OpenAIError) -> TransportError {
    match err {
        OpenAIError::ApiError(api) => {
            let signature = format!("{} {:?} {:?}", api.message, api.r#type, api.code);
            let kind = classify_api_error(&signature);
            let error = TransportError::new(kind, err.to_string());
            match parse_retry_after(&api.message) {
                Some(wait) if kind == AssessmentErrorKind::RateLimited => {
                    error.with_retry_after(wait)
                }
                _ => error,
            }
        }
        other => TransportError::new(
            classify_transport_failure(&other.to_string()),
            err.to_string(),
        ),
    }
}

/// 从服务端消息中提取建议等待时间
pub fn parse_retry_after(message: &str) -> Option<Duration> {
    let caps = RETRY_HINT.captures(message)?;
    let minutes: f64 = caps
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0);
    let amount: f64 = caps.get(2)?.as_str().parse().ok()?;
    let millis = match caps.get(3)?.as_str().to_lowercase().as_str() {
        "ms" => amount,
        _ => amount * 1000.0,
    };
    Some(Duration::from_millis((minutes * 60_000.0 + millis).round() as u64))
}

/// 按服务端错误信息判断种类
pub fn classify_api_error(signature: &str) -> AssessmentErrorKind {
    let lower = signature.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if has(&["rate_limit", "rate limit", "too many requests"]) {
        AssessmentErrorKind::RateLimited
    } else if has(&[
        "invalid_api_key",
        "incorrect api key",
        "authentication",
        "unauthorized",
    ]) {
        AssessmentErrorKind::AuthFailed
    } else if has(&["permission", "forbidden"]) {
        AssessmentErrorKind::PermissionDenied
    } else if has(&["invalid_request_error", "bad request"]) {
        AssessmentErrorKind::BadRequest
    } else {
        AssessmentErrorKind::ApiError
    }
}

/// 网络层失败（没拿到服务端的错误体）
pub fn classify_transport_failure(message: &str) -> AssessmentErrorKind {
    let lower = message.to_lowercase();
    if lower.contains("timed out") || lower.contains("timeout") {
        AssessmentErrorKind::Timeout
    } else if lower.contains("connect") || lower.contains("dns") || lower.contains("http error") {
        AssessmentErrorKind::ConnectionFailed
    } else {
        AssessmentErrorKind::Unknown
    }
}
