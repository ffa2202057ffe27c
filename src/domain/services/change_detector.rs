// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::change::Detection;
use crate::domain::models::snapshot::{FieldMapping, Snapshot};
use crate::domain::models::target::Target;
use crate::domain::repositories::state_store::{StateStore, StoreError};
use crate::domain::services::fingerprint::fingerprint;
use std::sync::Arc;
use tracing::debug;

/// 变更检测器
///
/// 将新提取的字段映射与目标的当前快照比对。比较只发生在
/// 规范化指纹之间，从不比较原始内容：指纹相等当且仅当
/// 无变更。检测本身无副作用，快照取代由Worker在提交阶段
/// 通过条件写入完成。
pub struct ChangeDetector<S: StateStore> {
    store: Arc<S>,
}

impl<S: StateStore> ChangeDetector<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// 检测变更
    ///
    /// # 返回值
    ///
    /// * `FirstObservation` - 目标尚无快照，携带待提交的版本1快照
    /// * `Unchanged` - 指纹一致，只应更新最近检查元数据
    /// * `Changed` - 指纹不同，携带新旧快照
    pub async fn detect(
        &self,
        target: &Target,
        fields: FieldMapping,
    ) -> Result<Detection, StoreError> {
        let new_fingerprint = fingerprint(&fields, target.rules_revision);

        match self.store.get_snapshot(target.id).await? {
            None => {
                debug!(target_id = %target.id, "no prior snapshot, first observation");
                let snapshot = Snapshot::new(target.id, 1, fields, new_fingerprint);
                Ok(Detection::FirstObservation {
                    current: Box::new(snapshot),
                })
            }
            Some(previous) if previous.fingerprint == new_fingerprint => {
                debug!(target_id = %target.id, version = previous.version, "fingerprint unchanged");
                Ok(Detection::Unchanged)
            }
            Some(previous) => {
                let next = Snapshot::new(target.id, previous.version + 1, fields, new_fingerprint);
                Ok(Detection::Changed {
                    previous: Box::new(previous),
                    current: Box::new(next),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::field_value::FieldValue;
    use crate::domain::models::run_record::RunRecord;
    use crate::domain::models::target::EvasionProfile;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;
    use uuid::Uuid;

    struct FixedSnapshotStore {
        snapshot: Mutex<Option<Snapshot>>,
    }

    #[async_trait]
    impl StateStore for FixedSnapshotStore {
        async fn get_snapshot(&self, _target_id: Uuid) -> Result<Option<Snapshot>, StoreError> {
            Ok(self.snapshot.lock().clone())
        }
        async fn compare_and_swap_snapshot(
            &self,
            _target_id: Uuid,
            _expected_version: Option<u64>,
            snapshot: Snapshot,
        ) -> Result<(), StoreError> {
            *self.snapshot.lock() = Some(snapshot);
            Ok(())
        }
        async fn append_run_record(&self, _record: RunRecord) -> Result<(), StoreError> {
            Ok(())
        }
        async fn list_run_records(
            &self,
            _target_id: Uuid,
            _limit: usize,
        ) -> Result<Vec<RunRecord>, StoreError> {
            Ok(vec![])
        }
        async fn last_run(&self, _target_id: Uuid) -> Result<Option<RunRecord>, StoreError> {
            Ok(None)
        }
    }

    fn target() -> Target {
        Target::new(
            "flat".into(),
            "https://example.com".into(),
            vec![],
            EvasionProfile::None,
            Duration::from_secs(60),
            vec![],
        )
    }

    fn price_fields(price: f64) -> FieldMapping {
        let mut fields = FieldMapping::new();
        fields.insert("price".into(), FieldValue::Number(price));
        fields
    }

    #[tokio::test]
    async fn test_detect_walks_first_unchanged_changed() {
        let store = Arc::new(FixedSnapshotStore {
            snapshot: Mutex::new(None),
        });
        let detector = ChangeDetector::new(store.clone());
        let target = target();

        // 首次观测
        let detection = detector.detect(&target, price_fields(19.99)).await.unwrap();
        let first = match detection {
            Detection::FirstObservation { current } => current,
            other => panic!("expected first observation, got {:?}", other),
        };
        assert_eq!(first.version, 1);
        store
            .compare_and_swap_snapshot(target.id, None, *first)
            .await
            .unwrap();

        // 相同字段 → 无变更
        let detection = detector.detect(&target, price_fields(19.99)).await.unwrap();
        assert!(matches!(detection, Detection::Unchanged));

        // 价格变化 → 变更，版本递增
        let detection = detector.detect(&target, price_fields(24.99)).await.unwrap();
        match detection {
            Detection::Changed { previous, current } => {
                assert_eq!(previous.version, 1);
                assert_eq!(current.version, 2);
                assert_ne!(previous.fingerprint, current.fingerprint);
            }
            other => panic!("expected change, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rules_revision_bump_forces_changed_even_for_same_values() {
        let store = Arc::new(FixedSnapshotStore {
            snapshot: Mutex::new(None),
        });
        let detector = ChangeDetector::new(store.clone());
        let mut target = target();

        let detection = detector.detect(&target, price_fields(19.99)).await.unwrap();
        if let Detection::FirstObservation { current } = detection {
            store
                .compare_and_swap_snapshot(target.id, None, *current)
                .await
                .unwrap();
        }

        target.rules_revision += 1;
        let detection = detector.detect(&target, price_fields(19.99)).await.unwrap();
        assert!(matches!(detection, Detection::Changed { .. }));
    }
}
