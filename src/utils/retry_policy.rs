// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::FetchError;
use std::time::Duration;

/// 重试策略配置
///
/// 按失败类别区分退避曲线：网络类失败（不可达、超时、5xx）走
/// 标准指数退避；被封锁（挑战页、403/429）走更长的封锁曲线，
/// 给对端足够的冷却窗口。提取失败不在此处处理，重放同样的
/// 内容只会再次失败。
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大尝试次数（含首次）
    pub max_attempts: u32,
    /// 初始退避时间
    pub initial_backoff: Duration,
    /// 最大退避时间
    pub max_backoff: Duration,
    /// 封锁场景的初始退避时间
    pub blocked_initial_backoff: Duration,
    /// 封锁场景的最大退避时间
    pub blocked_max_backoff: Duration,
    /// 退避乘数
    pub backoff_multiplier: f64,
    /// 抖动因子 (0.0-1.0)
    pub jitter_factor: f64,
    /// 是否启用抖动
    pub enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(120),
            blocked_initial_backoff: Duration::from_secs(30),
            blocked_max_backoff: Duration::from_secs(900),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            enable_jitter: true,
        }
    }
}

impl RetryPolicy {
    /// 创建标准重试策略
    pub fn standard() -> Self {
        Self::default()
    }

    /// 判断该次失败是否还应重试
    ///
    /// 同时要求错误本身可重试且尝试次数未达上限。4xx 协议错误
    /// 属于确定性失败，重试同样的请求不会有不同结果。
    pub fn should_retry(&self, error: &FetchError, attempt: u32) -> bool {
        error.is_retryable() && attempt < self.max_attempts
    }

    /// 根据失败类别计算下次重试的退避时间
    pub fn delay_for(&self, error: &FetchError, attempt: u32) -> Duration {
        match error {
            FetchError::Blocked { .. } => {
                self.backoff(attempt, self.blocked_initial_backoff, self.blocked_max_backoff)
            }
            _ => self.backoff(attempt, self.initial_backoff, self.max_backoff),
        }
    }

    /// 存储暂时不可用时的重试退避，走标准网络曲线
    pub fn storage_delay(&self, attempt: u32) -> Duration {
        self.backoff(attempt, self.initial_backoff, self.max_backoff)
    }

    fn backoff(&self, attempt: u32, initial: Duration, max: Duration) -> Duration {
        let exp = initial.as_secs_f64()
            * self
                .backoff_multiplier
                .powi(attempt.saturating_sub(1) as i32);
        let capped = exp.min(max.as_secs_f64());

        let final_backoff = if self.enable_jitter {
            let jitter_range = capped * self.jitter_factor;
            let jitter = rand::random_range(-jitter_range..=jitter_range);
            (capped + jitter).max(0.0)
        } else {
            capped
        };

        Duration::from_secs_f64(final_backoff)
    }
}
