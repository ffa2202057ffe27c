// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::target::EvasionProfile;
use crate::engines::http_strategy::{is_challenge, IDENTITY_POOL};
use crate::engines::traits::{FetchError, FetchOutcome, FetchRequest, FetchStrategy};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use rand::prelude::IndexedRandom;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OnceCell, Semaphore};
use tracing::debug;

// Global browser instance to avoid re-launching Chrome on every request.
static BROWSER_INSTANCE: OnceCell<Browser> = OnceCell::const_new();

/// 获取或初始化共享浏览器实例
///
/// 启动参数关闭自动化指纹：没有`AutomationControlled`特征、
/// 没有首次运行提示，尽量贴近真人浏览器的启动面貌。
pub async fn get_browser() -> Result<&'static Browser, FetchError> {
    BROWSER_INSTANCE
        .get_or_try_init(|| async {
            let remote_url = std::env::var("CHROMIUM_REMOTE_DEBUGGING_URL").ok();

            let (browser, mut handler) = if let Some(ref url) = remote_url {
                debug!("connecting to remote Chrome instance at {}", url);
                Browser::connect(url).await.map_err(|e| {
                    FetchError::Unreachable(format!("remote Chrome connect failed: {}", e))
                })?
            } else {
                let config = BrowserConfig::builder()
                    .no_sandbox()
                    .request_timeout(Duration::from_secs(30))
                    .arg("--disable-gpu")
                    .arg("--disable-dev-shm-usage")
                    // Stealth: strip the automation fingerprints bot detectors probe for
                    .arg("--disable-blink-features=AutomationControlled")
                    .arg("--no-first-run")
                    .arg("--disable-infobars")
                    .arg("--window-size=1920,1080")
                    .build()
                    .map_err(|e| FetchError::Unreachable(e))?;

                Browser::launch(config)
                    .await
                    .map_err(|e| FetchError::Unreachable(e.to_string()))?
            };

            // Spawn a handler to process browser events
            tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            Ok(browser)
        })
        .await
}

/// 浏览器渲染抓取策略
///
/// 为`BrowserRender`档位服务的重型路径：完整渲染页面并
/// 应用隐身对抗（随机身份、拟真导航节奏、关闭自动化指纹）。
/// 会话池有界，许可在任何退出路径上随作用域自动归还。
pub struct BrowserStrategy {
    sessions: Arc<Semaphore>,
}

impl BrowserStrategy {
    /// 创建策略实例
    ///
    /// # 参数
    ///
    /// * `max_sessions` - 并发浏览器页面上限
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(Semaphore::new(max_sessions.max(1))),
        }
    }

    async fn render(page: &Page, request: &FetchRequest) -> Result<String, FetchError> {
        let user_agent = IDENTITY_POOL
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(IDENTITY_POOL[0]);
        page.set_user_agent(user_agent)
            .await
            .map_err(|e| FetchError::ProtocolError {
                status: 0,
                detail: format!("set_user_agent failed: {}", e),
            })?;

        // 拟真导航节奏：真人不会在毫秒级连续发起跳转
        let pause = rand::rng().random_range(200..1200);
        tokio::time::sleep(Duration::from_millis(pause)).await;

        page.goto(request.url.as_str())
            .await
            .map_err(|e| FetchError::Unreachable(format!("navigation failed: {}", e)))?;

        page.content().await.map_err(|e| FetchError::ProtocolError {
            status: 0,
            detail: format!("content read failed: {}", e),
        })
    }
}

#[async_trait]
impl FetchStrategy for BrowserStrategy {
    /// 执行浏览器渲染抓取
    ///
    /// 整个渲染过程包在请求超时内；会话许可获取同样受限时，
    /// 避免池耗尽时无限挂起。
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchError> {
        // 会话检出，Drop自动归还，失败路径也不会泄漏许可
        let _permit = tokio::time::timeout(request.timeout, self.sessions.clone().acquire_owned())
            .await
            .map_err(|_| FetchError::Timeout(request.timeout))?
            .map_err(|e| FetchError::ProtocolError {
                status: 0,
                detail: format!("session pool closed: {}", e),
            })?;

        let start = Instant::now();
        let body = tokio::time::timeout(request.timeout, async {
            let browser = get_browser().await?;
            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| FetchError::Unreachable(format!("page open failed: {}", e)))?;

            let result = Self::render(&page, request).await;
            // 页面关闭失败只影响资源回收，不改变抓取结果
            let _ = page.close().await;
            result
        })
        .await
        .map_err(|_| FetchError::Timeout(request.timeout))??;

        // CDP不直接暴露导航响应状态，渲染成功视为200，
        // 挑战页通过内容特征识别
        if is_challenge(200, &body) {
            return Err(FetchError::Blocked { status: 200 });
        }

        Ok(FetchOutcome {
            status: 200,
            body,
            final_url: request.url.clone(),
            content_type: "text/html".to_string(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn supports(&self, profile: EvasionProfile) -> bool {
        profile == EvasionProfile::BrowserRender
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}
