// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::target::Target;
use crate::domain::repositories::state_store::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 目标仓库接口
///
/// 目标描述符只由管理命令创建和修改。Worker侧仅允许
/// 通过`reschedule`推进每目标的下次检查时间，该字段是
/// 调度状态而非描述符本身。
#[async_trait]
pub trait TargetRepository: Send + Sync {
    /// 注册新目标
    async fn create(&self, target: &Target) -> Result<Target, StoreError>;

    /// 按ID查找目标
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Target>, StoreError>;

    /// 列出所有启用的目标
    async fn list_active(&self) -> Result<Vec<Target>, StoreError>;

    /// 列出下次检查时间已到期的启用目标
    async fn due_targets(&self, now: DateTime<Utc>) -> Result<Vec<Target>, StoreError>;

    /// 推进目标的下次检查时间
    async fn reschedule(&self, id: Uuid, next_check_at: DateTime<Utc>) -> Result<(), StoreError>;
}
