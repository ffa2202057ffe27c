// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::target::Target;
use crate::domain::repositories::state_store::StoreError;
use crate::domain::repositories::target_repository::TargetRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

/// 目标仓库的进程内实现
#[derive(Default)]
pub struct InMemoryTargetRepository {
    targets: DashMap<Uuid, Target>,
}

impl InMemoryTargetRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TargetRepository for InMemoryTargetRepository {
    async fn create(&self, target: &Target) -> Result<Target, StoreError> {
        self.targets.insert(target.id, target.clone());
        Ok(target.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Target>, StoreError> {
        Ok(self.targets.get(&id).map(|t| t.clone()))
    }

    async fn list_active(&self) -> Result<Vec<Target>, StoreError> {
        Ok(self
            .targets
            .iter()
            .filter(|t| t.active)
            .map(|t| t.clone())
            .collect())
    }

    async fn due_targets(&self, now: DateTime<Utc>) -> Result<Vec<Target>, StoreError> {
        Ok(self
            .targets
            .iter()
            .filter(|t| t.active && t.next_check_at <= now)
            .map(|t| t.clone())
            .collect())
    }

    async fn reschedule(&self, id: Uuid, next_check_at: DateTime<Utc>) -> Result<(), StoreError> {
        match self.targets.get_mut(&id) {
            Some(mut target) => {
                target.next_check_at = next_check_at;
                Ok(())
            }
            None => Err(StoreError::Unavailable(format!("target {} not found", id))),
        }
    }
}
