//! 评估请求上下文
//!
//! 封装“这是第几个请求、谁提交的”，只用于日志前缀。

use std::fmt::Display;

use crate::models::UserId;

#[derive(Debug, Clone, Copy)]
pub struct EvaluationCtx {
    /// 进程内递增的请求序号
    pub request_seq: u64,
    pub user_id: UserId,
}

impl EvaluationCtx {
    pub fn new(request_seq: u64, user_id: UserId) -> Self {
        Self {
            request_seq,
            user_id,
        }
    }
}

impl Display for EvaluationCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[评估 #{} 用户 #{}]", self.request_seq, self.user_id)
    }
}
