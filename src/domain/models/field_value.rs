// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 提取字段值
///
/// 提取引擎产出的类型化字段值。`Null` 表示可选规则未命中，
/// 与"字段缺失"严格区分：快照中的字段映射总是包含全部规则名。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// 文本值
    Text(String),
    /// 数值
    Number(f64),
    /// 日期值
    Date(DateTime<Utc>),
    /// 布尔值
    Bool(bool),
    /// 空值（可选规则未命中或显式默认）
    Null,
}

impl FieldValue {
    /// 生成指纹计算使用的规范化表示
    ///
    /// 同一逻辑值无论来源如何都必须产生相同的字节序列，
    /// 否则指纹比较会产生假阳性变更。
    pub fn canonical(&self) -> String {
        match self {
            FieldValue::Text(s) => format!("t:{}", s),
            // Ryu-style float printing is stable for the same bit pattern
            FieldValue::Number(n) => format!("n:{}", n),
            FieldValue::Date(d) => format!("d:{}", d.to_rfc3339_opts(SecondsFormat::Secs, true)),
            FieldValue::Bool(b) => format!("b:{}", b),
            FieldValue::Null => "null".to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => write!(f, "null"),
        }
    }
}
