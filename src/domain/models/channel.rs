// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 通知渠道配置
///
/// 封闭的渠道变体。核心只依赖统一的发送契约，
/// 渠道自身的线协议对核心不可见。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelConfig {
    /// Webhook渠道，向指定URL POST变更摘要JSON
    Webhook { url: String },
    /// Telegram机器人渠道
    Telegram { bot_token: String, chat_id: String },
}

impl ChannelConfig {
    /// 渠道展示名，用于逐渠道结果映射与日志
    pub fn name(&self) -> String {
        match self {
            ChannelConfig::Webhook { url } => format!("webhook:{}", url),
            ChannelConfig::Telegram { chat_id, .. } => format!("telegram:{}", chat_id),
        }
    }
}
