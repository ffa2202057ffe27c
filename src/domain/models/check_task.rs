// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::target::EvasionProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 检查任务
///
/// 队列中的临时工作单元。逻辑上恰好消费一次，物理上
/// 至少投递一次；确认后销毁，超过最大尝试次数进入死信。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckTask {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 目标ID
    pub target_id: Uuid,
    /// 尝试次数，从1开始且只增不减
    pub attempt: u32,
    /// 入队时间
    pub enqueued_at: DateTime<Utc>,
    /// 规避档位覆盖，Blocked重试升级规避时设置
    pub evasion_override: Option<EvasionProfile>,
}

impl CheckTask {
    pub fn new(target_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            target_id,
            attempt: 1,
            enqueued_at: Utc::now(),
            evasion_override: None,
        }
    }

    /// 派生下一次尝试的任务
    ///
    /// 保留任务身份，尝试计数加一。
    pub fn next_attempt(&self) -> Self {
        Self {
            id: self.id,
            target_id: self.target_id,
            attempt: self.attempt + 1,
            enqueued_at: self.enqueued_at,
            evasion_override: self.evasion_override,
        }
    }
}
