//! 熔断器
//!
//! 进程内共享的失败计数。整个状态转换都在一把锁里完成，
//! 并发失败不会少计，也不会重复打开。

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

/// 冷却时间上限，超出的配置按上限处理
pub const MAX_COOLDOWN: Duration = Duration::from_secs(24 * 60 * 60);

/// 熔断器配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// 连续失败多少次后打开
    pub failure_threshold: u32,
    /// 打开后的冷却时间
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Default)]
struct CircuitState {
    consecutive_failures: u32,
    open_until: Option<Instant>,
}

/// 熔断器状态快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitSnapshot {
    pub consecutive_failures: u32,
    pub is_open: bool,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: Mutex<CircuitState>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CircuitState::default()),
        }
    }

    pub fn config(&self) -> CircuitBreakerConfig {
        self.config
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CircuitState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 请求前检查
    ///
    /// 打开状态返回剩余冷却时间；冷却结束则关闭并清零计数。
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let mut state = self.lock();
        match state.open_until {
            Some(until) => {
                let now = Instant::now();
                if now >= until {
                    state.open_until = None;
                    state.consecutive_failures = 0;
                    info!("🔌 熔断冷却结束，恢复请求");
                    Ok(())
                } else {
                    Err(until - now)
                }
            }
            None => Ok(()),
        }
    }

    pub fn record_success(&self) {
        let mut state = self.lock();
        state.consecutive_failures = 0;
    }

    /// 记录一次失败，达到阈值时打开
    ///
    /// 已打开时不再累加。
    pub fn record_failure(&self) {
        let mut state = self.lock();
        if state.open_until.is_some() {
            return;
        }
        state.consecutive_failures += 1;
        if state.consecutive_failures >= self.config.failure_threshold {
            let cooldown = self.config.cooldown.min(MAX_COOLDOWN);
            state.open_until = Some(Instant::now() + cooldown);
            warn!(
                "⚡ 连续失败 {} 次，熔断器打开 {}s",
                state.consecutive_failures,
                cooldown.as_secs()
            );
        }
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let state = self.lock();
        CircuitSnapshot {
            consecutive_failures: state.consecutive_failures,
            is_open: state.open_until.is_some(),
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
