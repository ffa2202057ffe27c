// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::state_store::StoreError;
use crate::queue::work_queue::QueueError;
use async_trait::async_trait;
use thiserror::Error;

/// 工作器错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    /// 队列错误
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// 存储错误
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Worker trait定义
///
/// 所有后台工作器都必须实现此trait
#[async_trait]
pub trait Worker: Send + Sync {
    /// 运行工作器
    async fn run(&self) -> Result<(), WorkerError>;

    /// 获取工作器名称
    fn name(&self) -> &str;
}
