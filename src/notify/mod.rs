// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 通知模块
///
/// 将变更摘要扇出到目标配置的各个渠道
/// 包括 Webhook、Telegram 以及并发分发器
pub mod channel;
pub mod dispatcher;
pub mod telegram;
pub mod webhook;

pub use channel::{ChannelOutcome, NotificationChannel, NotifyError};
pub use dispatcher::Dispatcher;
