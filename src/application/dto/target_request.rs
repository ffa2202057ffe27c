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

use crate::domain::models::channel::ChannelConfig;
use crate::domain::models::target::{EvasionProfile, FieldRule};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 注册目标请求数据传输对象
///
/// 声明式目标描述：字段规则与渠道配置直接复用领域模型的
/// 序列化形态，YAML引导文件与HTTP接口共用同一结构。
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RegisterTargetDto {
    /// 目标展示名
    #[validate(length(min = 1, message = "name cannot be empty"))]
    pub name: String,
    /// 要监控的URL
    #[validate(url(message = "url is invalid"))]
    pub url: String,
    /// 字段提取规则，至少一条
    #[validate(length(min = 1, message = "at least one extraction rule is required"))]
    pub rules: Vec<FieldRule>,
    /// 反爬规避档位
    #[serde(default)]
    pub evasion: EvasionProfile,
    /// 检查周期（秒）
    #[validate(range(min = 10, max = 86400))]
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// 通知渠道列表
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

fn default_poll_interval_secs() -> u64 {
    300
}
