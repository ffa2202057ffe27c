// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::run_record::RunRecord;
use crate::domain::models::snapshot::Snapshot;
use crate::domain::repositories::state_store::{StateStore, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

/// 快照槽位
///
/// 当前快照之外保留上一份，支持幂等重投递的比对。
#[derive(Debug, Clone)]
struct SnapshotCell {
    current: Snapshot,
    previous: Option<Snapshot>,
}

/// 状态存储的进程内实现
///
/// 以DashMap分片锁模拟文档存储的按键原子性：条件写入在
/// 单个键的entry持锁期间完成校验与替换，两个竞争者中恰有
/// 一个成功。
#[derive(Default)]
pub struct InMemoryStateStore {
    snapshots: DashMap<Uuid, SnapshotCell>,
    runs: DashMap<Uuid, Vec<RunRecord>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 目标的上一份快照（诊断用）
    pub fn previous_snapshot(&self, target_id: Uuid) -> Option<Snapshot> {
        self.snapshots
            .get(&target_id)
            .and_then(|cell| cell.previous.clone())
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get_snapshot(&self, target_id: Uuid) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.snapshots.get(&target_id).map(|c| c.current.clone()))
    }

    async fn compare_and_swap_snapshot(
        &self,
        target_id: Uuid,
        expected_version: Option<u64>,
        snapshot: Snapshot,
    ) -> Result<(), StoreError> {
        match self.snapshots.entry(target_id) {
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                if expected_version.is_some() {
                    return Err(StoreError::VersionConflict {
                        expected: expected_version,
                        stored: None,
                    });
                }
                entry.insert(SnapshotCell {
                    current: snapshot,
                    previous: None,
                });
                Ok(())
            }
            dashmap::mapref::entry::Entry::Occupied(mut entry) => {
                let stored = entry.get().current.version;
                if expected_version != Some(stored) {
                    return Err(StoreError::VersionConflict {
                        expected: expected_version,
                        stored: Some(stored),
                    });
                }
                let cell = entry.get_mut();
                cell.previous = Some(cell.current.clone());
                cell.current = snapshot;
                Ok(())
            }
        }
    }

    async fn append_run_record(&self, record: RunRecord) -> Result<(), StoreError> {
        self.runs.entry(record.target_id).or_default().push(record);
        Ok(())
    }

    async fn list_run_records(
        &self,
        target_id: Uuid,
        limit: usize,
    ) -> Result<Vec<RunRecord>, StoreError> {
        Ok(self
            .runs
            .get(&target_id)
            .map(|records| records.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn last_run(&self, target_id: Uuid) -> Result<Option<RunRecord>, StoreError> {
        Ok(self
            .runs
            .get(&target_id)
            .and_then(|records| records.last().cloned()))
    }
}
