use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::submission::UserId;

/// 配额等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum QuotaTier {
    /// 免费用户
    #[default]
    Standard,
    /// 高级用户（上限很高但不是无限）
    Elevated,
}

/// 某用户某一天的提交计数
///
/// 每个用户只有一条逻辑记录，日期不是今天就视为 0（惰性重置）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaRecord {
    pub user_id: UserId,
    pub calendar_date: NaiveDate,
    pub count: u32,
}

impl QuotaRecord {
    pub fn new(user_id: UserId, calendar_date: NaiveDate) -> Self {
        Self {
            user_id,
            calendar_date,
            count: 0,
        }
    }

    /// 给定日期下的有效计数
    pub fn count_on(&self, date: NaiveDate) -> u32 {
        if self.calendar_date == date {
            self.count
        } else {
            0
        }
    }
}

/// 配额检查结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    Allowed {
        remaining: u32,
    },
    Denied {
        limit: u32,
        resets_at: DateTime<Utc>,
    },
}
