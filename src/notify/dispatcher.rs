// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::change::ChangeSummary;
use crate::domain::models::channel::ChannelConfig;
use crate::notify::channel::{ChannelOutcome, NotificationChannel};
use crate::notify::telegram::TelegramChannel;
use crate::notify::webhook::WebhookChannel;
use dashmap::DashMap;
use metrics::counter;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// 通知分发器
///
/// 将一次变更扇出到目标配置的全部渠道。扇出而非流水线：
/// 渠道之间相互独立，单个渠道失败既不阻塞也不影响其余
/// 渠道的尝试。投递为尽力而为，全渠道失败也只体现在运行
/// 记录里。
pub struct Dispatcher {
    client: reqwest::Client,
    // 幂等通知护栏：目标 → 最近一次扇出的(版本, 指纹)。
    // 每个目标恰好占一个槽位，新版本覆盖旧记录，护栏不随
    // 进程运行时间增长。不高于已记录版本且指纹一致的重投递
    // 在这里被拦下，不会对同一变更重复扇出。
    delivered: DashMap<Uuid, (u64, String)>,
}

impl Dispatcher {
    pub fn new(client: reqwest::Client) -> Arc<Self> {
        Arc::new(Self {
            client,
            delivered: DashMap::new(),
        })
    }

    fn build_channel(&self, config: &ChannelConfig) -> Box<dyn NotificationChannel> {
        match config {
            ChannelConfig::Webhook { url } => {
                Box::new(WebhookChannel::new(self.client.clone(), url.clone()))
            }
            ChannelConfig::Telegram { bot_token, chat_id } => Box::new(TelegramChannel::new(
                self.client.clone(),
                bot_token.clone(),
                chat_id.clone(),
            )),
        }
    }

    /// 分发变更摘要
    ///
    /// # 返回值
    ///
    /// 逐渠道结果映射。同一(目标,版本,指纹)的重复分发返回
    /// 空映射且不产生任何网络调用。
    pub async fn dispatch(
        &self,
        summary: &ChangeSummary,
        channels: &[ChannelConfig],
    ) -> BTreeMap<String, ChannelOutcome> {
        if let Some(seen) = self.delivered.get(&summary.target_id) {
            let (seen_version, seen_fingerprint) = seen.value();
            if summary.version <= *seen_version && *seen_fingerprint == summary.fingerprint {
                info!(
                    target_id = %summary.target_id,
                    version = summary.version,
                    "duplicate delivery suppressed by notification guard"
                );
                return BTreeMap::new();
            }
        }
        // 先登记再发送，并发重投递下同一变更只扇出一次；
        // 登记从不回退版本，迟到的旧投递覆盖不了新记录
        self.delivered
            .entry(summary.target_id)
            .and_modify(|entry| {
                if summary.version >= entry.0 {
                    *entry = (summary.version, summary.fingerprint.clone());
                }
            })
            .or_insert_with(|| (summary.version, summary.fingerprint.clone()));

        let sends = channels.iter().map(|config| {
            let channel = self.build_channel(config);
            async move {
                let name = channel.name();
                match channel.send(summary).await {
                    Ok(()) => {
                        counter!("notifications_delivered_total").increment(1);
                        (name, ChannelOutcome::Delivered)
                    }
                    Err(e) => {
                        counter!("notifications_failed_total").increment(1);
                        warn!(channel = %name, "notification delivery failed: {}", e);
                        (name, ChannelOutcome::Failed(e.to_string()))
                    }
                }
            }
        });

        let outcomes: BTreeMap<String, ChannelOutcome> =
            futures::future::join_all(sends).await.into_iter().collect();

        let failed = outcomes.values().filter(|o| !o.is_delivered()).count();
        if failed > 0 {
            warn!(
                target_id = %summary.target_id,
                version = summary.version,
                failed,
                total = outcomes.len(),
                "notification fan-out partially failed"
            );
        }
        outcomes
    }
}
