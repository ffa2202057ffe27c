// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::field_value::FieldValue;
use crate::domain::models::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// 变更检测结果
#[derive(Debug, Clone)]
pub enum Detection {
    /// 首次观测，尚无历史快照，携带待提交的版本1快照
    FirstObservation { current: Box<Snapshot> },
    /// 指纹一致，无变更
    Unchanged,
    /// 检测到变更
    Changed {
        previous: Box<Snapshot>,
        current: Box<Snapshot>,
    },
}

/// 变更摘要
///
/// 通知渠道接收的统一载荷。对渠道而言这是唯一契约，
/// 渠道的具体线协议对核心不可见。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// 目标ID
    pub target_id: Uuid,
    /// 目标名称
    pub target_name: String,
    /// 目标地址
    pub url: String,
    /// 新快照版本
    pub version: u64,
    /// 新快照指纹，与版本一起构成幂等通知的去重键
    pub fingerprint: String,
    /// 首次观测时为空
    pub is_first_observation: bool,
    /// 逐字段差异：字段名 → (旧值, 新值)
    pub diff: BTreeMap<String, FieldDiff>,
    /// 检测时间
    pub detected_at: DateTime<Utc>,
}

/// 单字段差异
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDiff {
    pub previous: Option<FieldValue>,
    pub current: FieldValue,
}

impl ChangeSummary {
    /// 从首次观测快照构建摘要
    pub fn first_observation(name: &str, url: &str, snapshot: &Snapshot) -> Self {
        let diff = snapshot
            .fields
            .iter()
            .map(|(k, v)| {
                (
                    k.clone(),
                    FieldDiff {
                        previous: None,
                        current: v.clone(),
                    },
                )
            })
            .collect();
        Self {
            target_id: snapshot.target_id,
            target_name: name.to_string(),
            url: url.to_string(),
            version: snapshot.version,
            fingerprint: snapshot.fingerprint.clone(),
            is_first_observation: true,
            diff,
            detected_at: Utc::now(),
        }
    }

    /// 从新旧快照构建差异摘要，只收录值变化的字段
    pub fn from_change(name: &str, url: &str, previous: &Snapshot, current: &Snapshot) -> Self {
        let mut diff = BTreeMap::new();
        for (field, value) in &current.fields {
            let old = previous.fields.get(field);
            if old != Some(value) {
                diff.insert(
                    field.clone(),
                    FieldDiff {
                        previous: old.cloned(),
                        current: value.clone(),
                    },
                );
            }
        }
        Self {
            target_id: current.target_id,
            target_name: name.to_string(),
            url: url.to_string(),
            version: current.version,
            fingerprint: current.fingerprint.clone(),
            is_first_observation: false,
            diff,
            detected_at: Utc::now(),
        }
    }
}
