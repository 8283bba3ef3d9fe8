//! 评分客户端 - 弹性调用核心
//!
//! 负责超时、重试、熔断，只返回模型的原始文本；
//! 解析与分数校验交给 [`response_parser`](crate::clients::response_parser)。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::clients::circuit_breaker::CircuitBreaker;
use crate::clients::prompt::{build_request, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::clients::response_parser::parse_and_validate;
use crate::clients::transport::{CompletionTransport, TransportError};
use crate::error::{AssessmentError, AssessmentErrorKind};
use crate::models::{RawAssessment, RubricScores, TaskType};

/// 限流时服务端没给建议等待时间，按 60s 计
const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 总尝试次数（含第一次）
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// 单次请求超时
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// 第 `attempt` 次（从 0 开始）失败后的退避时间
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// 瞬时错误后的等待时间；限流取服务端建议与退避的较小值
    pub fn delay_for(&self, error: &TransportError, attempt: u32) -> Duration {
        let backoff = self.backoff(attempt);
        match error.kind {
            AssessmentErrorKind::RateLimited => error
                .retry_after
                .unwrap_or(DEFAULT_RATE_LIMIT_WAIT)
                .min(backoff),
            _ => backoff,
        }
    }
}

/// 评分客户端
///
/// 熔断器从外部注入，多个客户端可以共享同一个。
pub struct AssessmentClient {
    transport: Arc<dyn CompletionTransport>,
    breaker: Arc<CircuitBreaker>,
    policy: RetryPolicy,
    temperature: f32,
    max_tokens: u32,
}

impl AssessmentClient {
    pub fn new(
        transport: Arc<dyn CompletionTransport>,
        breaker: Arc<CircuitBreaker>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            breaker,
            policy,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// 调整采样参数
    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// 请求模型评分，返回未解析的原始回复
    pub async fn assess(
        &self,
        text: &str,
        task_type: TaskType,
    ) -> Result<RawAssessment, AssessmentError> {
        if let Err(remaining) = self.breaker.try_acquire() {
            warn!("⚡ 熔断器打开中，跳过请求（剩余 {}s）", remaining.as_secs());
            return Err(AssessmentError::circuit_open(remaining));
        }

        let request = build_request(text, task_type, self.temperature, self.max_tokens);
        let mut last_error: Option<TransportError> = None;

        for attempt in 0..self.policy.max_attempts {
            debug!(
                "发起评分请求 ({}), 第 {}/{} 次",
                task_type,
                attempt + 1,
                self.policy.max_attempts
            );

            let call = self.transport.complete(request.clone());
            let result = match tokio::time::timeout(self.policy.request_timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::new(
                    AssessmentErrorKind::Timeout,
                    format!("请求超过 {}s 未返回", self.policy.request_timeout.as_secs()),
                )),
            };

            match result {
                Ok(response) => {
                    self.breaker.record_success();
                    info!(
                        "✅ 模型已返回评分 (模型 {}, tokens {:?}, 第 {} 次)",
                        response.model,
                        response.total_tokens,
                        attempt + 1
                    );
                    return Ok(RawAssessment {
                        content: response.content,
                        usage_tokens: response.total_tokens,
                        model_used: response.model,
                        attempts: attempt + 1,
                    });
                }
                Err(err) if !err.kind.is_transient() => {
                    self.breaker.record_failure();
                    error!("❌ 评分请求失败且不可重试: {}", err);
                    return Err(AssessmentError::new(err.kind, err.message)
                        .with_attempts(attempt + 1));
                }
                Err(err) => {
                    if attempt + 1 < self.policy.max_attempts {
                        let delay = self.policy.delay_for(&err, attempt);
                        warn!(
                            "⚠️ 评分请求失败 ({})，{}ms 后重试",
                            err,
                            delay.as_millis()
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(err);
                }
            }
        }

        self.breaker.record_failure();
        let Some(err) = last_error else {
            return Err(AssessmentError::new(
                AssessmentErrorKind::Unknown,
                "重试次数配置为 0，未发起请求",
            ));
        };
        error!(
            "❌ 评分请求重试 {} 次后仍失败: {}",
            self.policy.max_attempts, err
        );
        let retry_after = match err.kind {
            AssessmentErrorKind::RateLimited => err.retry_after.or(Some(DEFAULT_RATE_LIMIT_WAIT)),
            kind => kind.default_retry_after(),
        };
        Err(AssessmentError::new(err.kind, err.message)
            .with_retry_after(retry_after)
            .with_attempts(self.policy.max_attempts))
    }

    /// 请求评分并通过解析和分数闸门
    ///
    /// 解析失败不计入熔断，也不在本次调用内重试。
    pub async fn assess_scored(
        &self,
        text: &str,
        task_type: TaskType,
    ) -> Result<(RubricScores, RawAssessment), AssessmentError> {
        let raw = self.assess(text, task_type).await?;
        let scores = parse_and_validate(&raw.content).map_err(|e| e.with_attempts(raw.attempts))?;
        Ok((scores, raw))
    }
}
