// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::check_task::CheckTask;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 回执未知或已过期（可见性超时后任务已被重投递）
    #[error("unknown or expired receipt {0}")]
    UnknownReceipt(Uuid),

    /// 队列不可用
    #[error("queue unavailable: {0}")]
    Unavailable(String),
}

/// 一次投递
///
/// 回执标识单次投递而非任务本身：可见性超时后同一
/// 任务会以新回执重投递，迟到的确认因回执失效而被拒绝。
#[derive(Debug, Clone)]
pub struct Delivery {
    pub task: CheckTask,
    pub receipt: Uuid,
}

/// 工作队列接口
///
/// 至少一次投递语义：消息交付后进入不可见期，确认删除
/// 消息，未确认则在可见性超时后带着递增的尝试计数重投递。
/// 超过最大尝试次数的任务进入死信，绝不静默丢弃。
/// 可见性租约只是建议性互斥，硬性正确性边界在状态存储的
/// 条件写入上。
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// 入队检查任务
    async fn enqueue(&self, task: CheckTask) -> Result<(), QueueError>;

    /// 长轮询获取下一次投递，等待上限内无任务返回None
    async fn receive(&self, wait: Duration) -> Result<Option<Delivery>, QueueError>;

    /// 确认投递，删除消息
    async fn ack(&self, receipt: Uuid) -> Result<(), QueueError>;

    /// 释放投递并延迟重试（退避延迟后重新可见，尝试计数+1）
    ///
    /// 调用方回传任务本体，可在回传前修改任务（如升级规避
    /// 档位），修改随重投递一起生效。
    async fn release(
        &self,
        receipt: Uuid,
        task: CheckTask,
        delay: Duration,
    ) -> Result<(), QueueError>;

    /// 将投递移入死信
    async fn dead_letter(&self, receipt: Uuid, reason: String) -> Result<(), QueueError>;
}
