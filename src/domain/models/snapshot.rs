// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::field_value::FieldValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// 字段映射
///
/// BTreeMap保证键序稳定，是指纹顺序无关性的基础。
pub type FieldMapping = BTreeMap<String, FieldValue>;

/// 目标快照
///
/// 一个目标最近一次成功检查所观测到的字段状态。
/// 快照只被取代、不被删除，仓库至少保留当前与上一份
/// 快照以支持幂等重投递。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// 所属目标ID
    pub target_id: Uuid,
    /// 版本号，目标内单调递增，两次提交不会共享同一版本
    pub version: u64,
    /// 规范化字段映射，所有规则名都出现，未命中为显式Null
    pub fields: FieldMapping,
    /// 内容指纹（规范化字段映射的sha256十六进制）
    pub fingerprint: String,
    /// 采集时间
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(target_id: Uuid, version: u64, fields: FieldMapping, fingerprint: String) -> Self {
        Self {
            target_id,
            version,
            fields,
            fingerprint,
            captured_at: Utc::now(),
        }
    }
}
