use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 评分服务错误
    #[error("评分服务错误: {0}")]
    Assessment(#[from] AssessmentError),
    /// 存储协作方错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
}

// ========== 评分服务错误 ==========

/// 评分调用失败的种类
///
/// 所有失败都归入这一个枚举，只在编排层做一次穷尽匹配。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssessmentErrorKind {
    /// 单次请求超时
    Timeout,
    /// 服务端限流
    RateLimited,
    /// 无法建立连接
    ConnectionFailed,
    /// 认证失败（密钥错误）
    AuthFailed,
    /// 权限不足
    PermissionDenied,
    /// 请求本身不合法
    BadRequest,
    /// 服务端通用错误
    ApiError,
    /// 熔断器打开，未发起请求
    CircuitOpen,
    /// 响应中找不到可解析的 JSON
    ParseError,
    /// JSON 缺字段或分数不可信
    FormatError,
    /// 其他未知错误
    Unknown,
}

impl AssessmentErrorKind {
    /// 是否属于客户端内部会自动重试的瞬时错误
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Timeout
                | Self::RateLimited
                | Self::ConnectionFailed
                | Self::ApiError
                | Self::Unknown
        )
    }

    /// 调用方是否可以稍后重试
    pub fn is_retryable(self) -> bool {
        !matches!(
            self,
            Self::AuthFailed | Self::PermissionDenied | Self::BadRequest
        )
    }

    /// 重试耗尽后给调用方的等待建议
    pub fn default_retry_after(self) -> Option<Duration> {
        match self {
            Self::Timeout => Some(Duration::from_secs(60)),
            Self::RateLimited => Some(Duration::from_secs(60)),
            Self::ConnectionFailed => Some(Duration::from_secs(120)),
            Self::ApiError => Some(Duration::from_secs(180)),
            Self::Unknown => Some(Duration::from_secs(300)),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::ConnectionFailed => "connection_failed",
            Self::AuthFailed => "auth_failed",
            Self::PermissionDenied => "permission_denied",
            Self::BadRequest => "bad_request",
            Self::ApiError => "api_error",
            Self::CircuitOpen => "circuit_open",
            Self::ParseError => "parse_error",
            Self::FormatError => "format_error",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AssessmentErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 评分客户端返回的错误
#[derive(Debug, Clone, Error)]
#[error("[{kind}] {message}")]
pub struct AssessmentError {
    pub kind: AssessmentErrorKind,
    pub message: String,
    /// 建议调用方等待多久再试
    pub retry_after: Option<Duration>,
    /// 实际发起的传输调用次数
    pub attempts: u32,
}

impl AssessmentError {
    pub fn new(kind: AssessmentErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
            attempts: 0,
        }
    }

    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// 创建解析错误
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(AssessmentErrorKind::ParseError, message)
    }

    /// 创建格式错误
    pub fn format(message: impl Into<String>) -> Self {
        Self::new(AssessmentErrorKind::FormatError, message)
    }

    /// 创建熔断错误
    pub fn circuit_open(remaining: Duration) -> Self {
        Self::new(
            AssessmentErrorKind::CircuitOpen,
            format!("熔断器已打开，剩余冷却 {}s", remaining.as_secs()),
        )
        .with_retry_after(Some(remaining))
    }
}

/// 分数校验失败的原因
///
/// 任何一项不通过，整份评分都视为模型编造，不落库。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreIssue {
    #[error("{field} = {value} 超出 0-9 范围")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("{field} = {value} 不是 0.5 的整数倍")]
    NotHalfStep { field: &'static str, value: f64 },
    #[error("总分 {actual} 与四项均分取整 {expected} 不一致")]
    OverallMismatch { expected: f64, actual: f64 },
    #[error("详细反馈为空")]
    EmptyFeedback,
    #[error("改进建议只有 {0} 条，至少需要 2 条")]
    TooFewSuggestions(usize),
    #[error("缺少 {0} 的评分说明")]
    MissingJustification(&'static str),
}

impl From<ScoreIssue> for AssessmentError {
    fn from(issue: ScoreIssue) -> Self {
        AssessmentError::format(format!("分数校验未通过: {}", issue))
    }
}

// ========== 存储错误 ==========

/// 持久化协作方错误
///
/// 编排层从不因为它判定评估失败，只做降级。
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// 存储不可用（连接断开、超时等）
    #[error("存储不可用 ({operation}): {message}")]
    Unavailable { operation: String, message: String },
    /// 记录不存在
    #[error("记录不存在: {0}")]
    NotFound(String),
    /// 写入冲突
    #[error("写入冲突: {0}")]
    Conflict(String),
}

impl StoreError {
    pub fn unavailable(operation: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

// ========== 配置 / 文件错误 ==========

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必填配置缺失
    #[error("缺少必填配置 {key}")]
    MissingValue { key: String },
    /// 配置值不合法
    #[error("配置 {key} 的值 '{value}' 不合法: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
