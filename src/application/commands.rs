// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::target_request::RegisterTargetDto;
use crate::application::dto::target_response::TargetStatusDto;
use crate::domain::models::check_task::CheckTask;
use crate::domain::models::run_record::RunRecord;
use crate::domain::models::target::Target;
use crate::domain::repositories::state_store::{StateStore, StoreError};
use crate::domain::repositories::target_repository::TargetRepository;
use crate::queue::work_queue::{QueueError, WorkQueue};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// 命令服务错误类型
#[derive(Error, Debug)]
pub enum CommandError {
    /// 请求校验失败
    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// 目标不存在
    #[error("target {0} not found")]
    NotFound(Uuid),

    /// 存储错误
    #[error(transparent)]
    Store(#[from] StoreError),

    /// 队列错误
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// 命令服务
///
/// 管理面的进程内入口：HTTP处理器与YAML引导文件都通过
/// 它注册目标、触发强制检查、读取状态。检查执行本身永远
/// 不走这里，Worker只消费队列。
pub struct CommandService<R, S, Q>
where
    R: TargetRepository,
    S: StateStore,
    Q: WorkQueue,
{
    targets: Arc<R>,
    store: Arc<S>,
    queue: Arc<Q>,
}

impl<R, S, Q> CommandService<R, S, Q>
where
    R: TargetRepository,
    S: StateStore,
    Q: WorkQueue,
{
    pub fn new(targets: Arc<R>, store: Arc<S>, queue: Arc<Q>) -> Self {
        Self {
            targets,
            store,
            queue,
        }
    }

    /// 注册监控目标
    ///
    /// 新目标的下次检查时间立即到期，基线快照由调度器在
    /// 下一个节拍建立。
    pub async fn register_target(&self, dto: RegisterTargetDto) -> Result<Uuid, CommandError> {
        dto.validate()?;

        let target = Target::new(
            dto.name,
            dto.url,
            dto.rules,
            dto.evasion,
            Duration::from_secs(dto.poll_interval_secs),
            dto.channels,
        );
        let created = self.targets.create(&target).await?;
        info!(target_id = %created.id, name = %created.name, "target registered");
        Ok(created.id)
    }

    /// 强制检查
    ///
    /// 独立于周期调度的入队来源，不改动目标的下次检查时间。
    pub async fn force_check(&self, target_id: Uuid) -> Result<(), CommandError> {
        let target = self
            .targets
            .find_by_id(target_id)
            .await?
            .ok_or(CommandError::NotFound(target_id))?;

        self.queue.enqueue(CheckTask::new(target.id)).await?;
        info!(target_id = %target.id, "forced check enqueued");
        Ok(())
    }

    /// 读取目标状态
    pub async fn get_status(&self, target_id: Uuid) -> Result<TargetStatusDto, CommandError> {
        let target = self
            .targets
            .find_by_id(target_id)
            .await?
            .ok_or(CommandError::NotFound(target_id))?;

        let last_run = self.store.last_run(target_id).await?;
        let snapshot = self.store.get_snapshot(target_id).await?;

        Ok(TargetStatusDto {
            target_id: target.id,
            name: target.name,
            active: target.active,
            last_checked: last_run.as_ref().map(|r| r.recorded_at),
            last_snapshot_version: snapshot.map(|s| s.version),
            last_outcome: last_run.map(|r| r.outcome.to_string()),
            next_check_at: target.next_check_at,
        })
    }

    /// 读取目标最近的运行记录，新记录在前
    pub async fn list_runs(
        &self,
        target_id: Uuid,
        limit: usize,
    ) -> Result<Vec<RunRecord>, CommandError> {
        self.targets
            .find_by_id(target_id)
            .await?
            .ok_or(CommandError::NotFound(target_id))?;

        Ok(self.store.list_run_records(target_id, limit).await?)
    }
}
