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
use crate::engines::traits::{FetchError, FetchOutcome, FetchRequest, FetchStrategy};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::prelude::IndexedRandom;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Instant;

/// 身份轮换使用的桌面浏览器User-Agent池
pub const IDENTITY_POOL: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
];

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; monitrs/1.0; +http://monitrs.dev)";

// 常见反爬挑战页特征（Cloudflare插页、验证码等）
static CHALLENGE_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)cf-browser-verification|cf-challenge|just a moment|checking your browser|attention required|verify you are (?:a )?human|captcha|ddos.?protection",
    )
    .unwrap()
});

/// 判断响应是否为反爬挑战
///
/// 429/503可能只是过载，403可能只是权限，单看状态码会把
/// 两类失败混为一谈：命中挑战特征即归类Blocked，
/// 403/429搭配极短响应体同样按Blocked处理。
pub fn is_challenge(status: u16, body: &str) -> bool {
    if CHALLENGE_MARKERS.is_match(body) {
        return true;
    }
    matches!(status, 403 | 429) && body.trim().len() < 256
}

/// 直连HTTP抓取策略
///
/// 快速、低开销的抓取路径。规避档位为`RotateIdentity`时
/// 每次请求从身份池随机抽取User-Agent，`None`时使用固定
/// 的爬虫标识。每次请求使用独立客户端以隔离Cookie。
pub struct HttpStrategy;

impl HttpStrategy {
    fn pick_user_agent(evasion: EvasionProfile) -> &'static str {
        match evasion {
            EvasionProfile::None => DEFAULT_USER_AGENT,
            _ => IDENTITY_POOL
                .choose(&mut rand::rng())
                .copied()
                .unwrap_or(DEFAULT_USER_AGENT),
        }
    }

    fn classify_transport_error(e: reqwest::Error, request: &FetchRequest) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(request.timeout)
        } else if e.is_connect() {
            // 涵盖DNS解析失败与TCP连接被拒
            FetchError::Unreachable(e.to_string())
        } else {
            FetchError::ProtocolError {
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                detail: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl FetchStrategy for HttpStrategy {
    /// 执行HTTP抓取
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchOutcome)` - 抓取结果
    /// * `Err(FetchError)` - 分类后的抓取错误
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchError> {
        let mut headers = HeaderMap::new();
        for (k, v) in &request.headers {
            if let (Ok(k), Ok(v)) = (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(v),
            ) {
                headers.insert(k, v);
            }
        }

        // Each request gets a fresh client for cookie isolation
        let client = reqwest::Client::builder()
            .user_agent(Self::pick_user_agent(request.evasion))
            .timeout(request.timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| FetchError::ProtocolError {
                status: 0,
                detail: e.to_string(),
            })?;

        let start = Instant::now();
        let response = client
            .get(&request.url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| Self::classify_transport_error(e, request))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        let body = response
            .text()
            .await
            .map_err(|e| Self::classify_transport_error(e, request))?;

        if !(200..300).contains(&status) {
            if is_challenge(status, &body) {
                return Err(FetchError::Blocked { status });
            }
            return Err(FetchError::ProtocolError {
                status,
                detail: format!("unexpected status {}", status),
            });
        }

        Ok(FetchOutcome {
            status,
            body,
            final_url,
            content_type,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn supports(&self, profile: EvasionProfile) -> bool {
        matches!(
            profile,
            EvasionProfile::None | EvasionProfile::RotateIdentity
        )
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
