// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::snapshot::FieldMapping;
use sha2::{Digest, Sha256};

/// 计算字段映射的内容指纹
///
/// 指纹是规范化序列化串的sha256十六进制。字段映射存放在
/// BTreeMap中，键序与插入顺序无关，因此指纹对字段插入顺序
/// 不敏感，且在反复序列化之间保持稳定。
///
/// `rules_revision`被折叠进指纹：提取规则变更后即使字段值
/// 表面相同也会触发一次完整的重新建帧，而不是做差异比较。
pub fn fingerprint(fields: &FieldMapping, rules_revision: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("rev:{}\n", rules_revision).as_bytes());
    for (name, value) in fields {
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(value.canonical().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
