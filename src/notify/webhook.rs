// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::change::ChangeSummary;
use crate::notify::channel::{NotificationChannel, NotifyError};
use async_trait::async_trait;
use tracing::debug;

/// Webhook通知渠道
///
/// 将变更摘要以JSON POST到配置的URL，2xx视为已投递。
pub struct WebhookChannel {
    client: reqwest::Client,
    url: String,
}

impl WebhookChannel {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn send(&self, summary: &ChangeSummary) -> Result<(), NotifyError> {
        debug!(url = %self.url, target_id = %summary.target_id, "posting change summary to webhook");

        let response = self
            .client
            .post(&self.url)
            .json(summary)
            .send()
            .await
            .map_err(|e| NotifyError::DeliveryFailed {
                channel: self.name(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(NotifyError::DeliveryFailed {
                channel: self.name(),
                reason: format!("webhook responded with status {}", response.status()),
            });
        }
        Ok(())
    }

    fn name(&self) -> String {
        format!("webhook:{}", self.url)
    }
}
