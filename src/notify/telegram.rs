// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::change::ChangeSummary;
use crate::notify::channel::{NotificationChannel, NotifyError};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

/// Telegram机器人通知渠道
pub struct TelegramChannel {
    client: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramChannel {
    pub fn new(client: reqwest::Client, bot_token: String, chat_id: String) -> Self {
        Self {
            client,
            bot_token,
            chat_id,
        }
    }

    /// 将变更摘要排版成消息文本
    fn format_message(summary: &ChangeSummary) -> String {
        let mut lines = Vec::new();
        if summary.is_first_observation {
            lines.push(format!("New: {}", summary.target_name));
        } else {
            lines.push(format!("Changed: {}", summary.target_name));
        }
        for (field, diff) in &summary.diff {
            match &diff.previous {
                Some(previous) => lines.push(format!("{}: {} -> {}", field, previous, diff.current)),
                None => lines.push(format!("{}: {}", field, diff.current)),
            }
        }
        lines.push(summary.url.clone());
        lines.join("\n")
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    async fn send(&self, summary: &ChangeSummary) -> Result<(), NotifyError> {
        let api_url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        debug!(chat_id = %self.chat_id, target_id = %summary.target_id, "sending telegram notification");

        let response = self
            .client
            .post(&api_url)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": Self::format_message(summary),
                "disable_web_page_preview": false,
            }))
            .send()
            .await
            .map_err(|e| NotifyError::DeliveryFailed {
                channel: self.name(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(NotifyError::DeliveryFailed {
                channel: self.name(),
                reason: format!("telegram api responded with status {}", response.status()),
            });
        }
        Ok(())
    }

    fn name(&self) -> String {
        format!("telegram:{}", self.chat_id)
    }
}
