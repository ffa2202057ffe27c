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

use crate::domain::models::target::EvasionProfile;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// 抓取错误类型
///
/// `Blocked`（反爬挑战）与`Unreachable`（DNS/连接失败）严格
/// 区分：两者适用不同的退避策略，Blocked还会触发规避升级。
#[derive(Error, Debug)]
pub enum FetchError {
    /// DNS解析或连接失败
    #[error("unreachable: {0}")]
    Unreachable(String),
    /// 反爬挑战，源站仍在响应但拒绝自动化访问
    #[error("blocked by anti-bot countermeasure (status {status})")]
    Blocked { status: u16 },
    /// 超时
    #[error("timeout after {0:?}")]
    Timeout(Duration),
    /// 协议级失败（非2xx且无挑战特征、响应体解码失败等）
    #[error("protocol error (status {status}): {detail}")]
    ProtocolError { status: u16, detail: String },
}

impl FetchError {
    /// 判断错误是否可重试
    ///
    /// Blocked单独成类：可重试，但使用更长的封顶退避。
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Unreachable(_) | FetchError::Timeout(_) | FetchError::Blocked { .. } => {
                true
            }
            FetchError::ProtocolError { status, .. } => *status >= 500,
        }
    }
}

/// 抓取请求
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// 目标URL
    pub url: String,
    /// 规避档位，策略选择是该档位的纯函数
    pub evasion: EvasionProfile,
    /// 超时时间
    pub timeout: Duration,
    /// 附加请求头
    pub headers: HashMap<String, String>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, evasion: EvasionProfile) -> Self {
        Self {
            url: url.into(),
            evasion,
            timeout: Duration::from_secs(30),
            headers: HashMap::new(),
        }
    }
}

/// 抓取结果
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// HTTP状态码
    pub status: u16,
    /// 响应内容
    pub body: String,
    /// 重定向后的最终URL
    pub final_url: String,
    /// 内容类型
    pub content_type: String,
    /// 抓取耗时（毫秒）
    pub elapsed_ms: u64,
}

/// 抓取策略特质
///
/// 两种可互换的抓取路径实现同一接口：直连HTTP与完整
/// 浏览器渲染。策略除连接池外不持有跨请求可变状态，
/// 每次抓取都可独立重试。
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// 执行抓取
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchError>;

    /// 是否支持指定规避档位
    fn supports(&self, profile: EvasionProfile) -> bool;

    /// 策略名称
    fn name(&self) -> &'static str;
}
