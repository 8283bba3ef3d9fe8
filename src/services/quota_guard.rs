//! 每日配额服务
//!
//! 检查和计数是分开的两步：检查只是建议性的，计数在评估成功后才做。
//! 同一用户并发提交时可能多放过一次，这是接受的代价。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use tracing::{debug, info};

use crate::error::StoreError;
use crate::infrastructure::{Clock, DailyCounterStore};
use crate::models::{QuotaDecision, QuotaTier, UserId};

/// 各等级的每日上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    pub standard: u32,
    pub elevated: u32,
}

impl QuotaLimits {
    pub fn limit_for(&self, tier: QuotaTier) -> u32 {
        match tier {
            QuotaTier::Standard => self.standard,
            QuotaTier::Elevated => self.elevated,
        }
    }
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            standard: 3,
            elevated: 50,
        }
    }
}

pub struct QuotaGuard {
    store: Arc<dyn DailyCounterStore>,
    clock: Arc<dyn Clock>,
    limits: QuotaLimits,
}

impl QuotaGuard {
    pub fn new(
        store: Arc<dyn DailyCounterStore>,
        clock: Arc<dyn Clock>,
        limits: QuotaLimits,
    ) -> Self {
        Self {
            store,
            clock,
            limits,
        }
    }

    pub fn limits(&self) -> QuotaLimits {
        self.limits
    }

    /// 检查今天是否还能提交
    ///
    /// 不修改计数。记录日期不是今天时按 0 计算。
    pub async fn check_and_reserve(
        &self,
        user_id: UserId,
        tier: QuotaTier,
    ) -> Result<QuotaDecision, StoreError> {
        let today = self.clock.today();
        let limit = self.limits.limit_for(tier);
        let count = self.store.get_daily_count(user_id, today).await?;

        if count < limit {
            debug!("用户 {} 今日已用 {}/{}", user_id, count, limit);
            Ok(QuotaDecision::Allowed {
                remaining: limit - count,
            })
        } else {
            info!("🚫 用户 {} 今日配额已用完 ({}/{})", user_id, count, limit);
            Ok(QuotaDecision::Denied {
                limit,
                resets_at: self.clock.next_midnight(),
            })
        }
    }

    /// 距离重置时间还有多久
    pub fn until_reset(&self, resets_at: DateTime<Utc>) -> Duration {
        (resets_at - self.clock.now()).to_std().unwrap_or_default()
    }

    /// 今日计数加一，返回新值
    pub async fn increment(&self, user_id: UserId) -> Result<u32, StoreError> {
        let today = self.clock.today();
        let count = self.store.increment_daily_count(user_id, today).await?;
        debug!("用户 {} 今日计数更新为 {}", user_id, count);
        Ok(count)
    }
}
