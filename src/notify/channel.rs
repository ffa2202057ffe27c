// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::change::ChangeSummary;
use async_trait::async_trait;
use thiserror::Error;

/// 通知错误类型
///
/// 渠道失败只记录、不升级：检查本身已经成功，退化的只是
/// 投递。失败绝不会触发已提交快照的回滚或变更的重新检测。
#[derive(Error, Debug, Clone)]
pub enum NotifyError {
    /// 渠道投递失败
    #[error("channel '{channel}' delivery failed: {reason}")]
    DeliveryFailed { channel: String, reason: String },
}

/// 单渠道投递结果
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelOutcome {
    /// 已投递
    Delivered,
    /// 投递失败
    Failed(String),
}

impl ChannelOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, ChannelOutcome::Delivered)
    }
}

/// 通知渠道特质
///
/// 所有渠道实现统一的发送契约，具体线协议对核心不可见。
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// 发送变更摘要
    async fn send(&self, summary: &ChangeSummary) -> Result<(), NotifyError>;

    /// 渠道名称，用于结果映射与日志
    fn name(&self) -> String;
}
