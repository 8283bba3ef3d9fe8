//! 补全传输层契约
//!
//! 评分客户端只通过这个接口访问大模型，测试里换成脚本化实现。

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::AssessmentErrorKind;

/// 一次补全请求
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_message: String,
    pub user_message: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// 补全响应（未解析的原始文本）
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub total_tokens: Option<u32>,
}

/// 传输层错误，已归类到评分错误种类
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[{kind}] {message}")]
pub struct TransportError {
    pub kind: AssessmentErrorKind,
    pub message: String,
    /// 服务端建议的等待时间（限流时）
    pub retry_after: Option<Duration>,
}

impl TransportError {
    pub fn new(kind: AssessmentErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }
}

#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, TransportError>;
}
