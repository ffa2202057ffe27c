// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::run_record::RunRecord;
use crate::domain::models::snapshot::Snapshot;
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// 状态存储错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    /// 版本冲突：条件写入时存储中的版本与期望不符。
    /// 该错误在本地恢复（重读并与当前快照比对），绝不向调用方上抛。
    #[error("version conflict: expected {expected:?}, stored {stored:?}")]
    VersionConflict {
        expected: Option<u64>,
        stored: Option<u64>,
    },

    /// 存储不可用，按退避策略重试
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// 状态存储接口
///
/// 面向文档的外部存储契约，按目标ID作键。条件写入
/// （compare-and-swap）是系统唯一的并发控制原语：
/// 两个Worker在同一目标上竞争时恰有一个提交成功，
/// 失败方观察到`VersionConflict`并将自身结果视为过期。
#[async_trait]
pub trait StateStore: Send + Sync {
    /// 读取目标的当前快照
    async fn get_snapshot(&self, target_id: Uuid) -> Result<Option<Snapshot>, StoreError>;

    /// 条件写入快照
    ///
    /// `expected_version`为`None`表示期望目标尚无快照（首次观测）。
    /// 写入成功后旧快照被取代但仍保留一份，支持幂等重投递。
    async fn compare_and_swap_snapshot(
        &self,
        target_id: Uuid,
        expected_version: Option<u64>,
        snapshot: Snapshot,
    ) -> Result<(), StoreError>;

    /// 追加运行记录（只追加子集合，按目标ID+时间作键）
    async fn append_run_record(&self, record: RunRecord) -> Result<(), StoreError>;

    /// 读取目标最近的若干条运行记录，新记录在前
    async fn list_run_records(
        &self,
        target_id: Uuid,
        limit: usize,
    ) -> Result<Vec<RunRecord>, StoreError>;

    /// 读取目标的最近一条运行记录
    async fn last_run(&self, target_id: Uuid) -> Result<Option<RunRecord>, StoreError>;
}
