// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 注册目标响应数据传输对象
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterTargetResponseDto {
    pub target_id: Uuid,
}

/// 目标状态响应数据传输对象
#[derive(Debug, Serialize, Deserialize)]
pub struct TargetStatusDto {
    pub target_id: Uuid,
    pub name: String,
    pub active: bool,
    /// 最近一次检查时间，尚未检查过为None
    pub last_checked: Option<DateTime<Utc>>,
    /// 当前快照版本，尚无基线为None
    pub last_snapshot_version: Option<u64>,
    /// 最近一次检查结果
    pub last_outcome: Option<String>,
    /// 下次计划检查时间
    pub next_check_at: DateTime<Utc>,
}
