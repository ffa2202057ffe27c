// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::target::EvasionProfile;
use crate::engines::traits::{FetchError, FetchOutcome, FetchRequest, FetchStrategy};
use std::sync::Arc;
use tracing::debug;

/// 抓取策略路由器
///
/// 策略选择是规避档位的纯函数：同一档位总是走同一路径，
/// 保证抓取行为可复现、可在测试中精确预期。不做运行时
/// 启发式评分或负载均衡。
pub struct StrategyRouter {
    http: Arc<dyn FetchStrategy>,
    browser: Arc<dyn FetchStrategy>,
}

impl StrategyRouter {
    pub fn new(http: Arc<dyn FetchStrategy>, browser: Arc<dyn FetchStrategy>) -> Self {
        Self { http, browser }
    }

    /// 按规避档位选择策略
    pub fn select(&self, profile: EvasionProfile) -> Arc<dyn FetchStrategy> {
        match profile {
            EvasionProfile::None | EvasionProfile::RotateIdentity => self.http.clone(),
            EvasionProfile::BrowserRender => self.browser.clone(),
        }
    }

    /// 路由并执行抓取
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchError> {
        let strategy = self.select(request.evasion);
        debug!(url = %request.url, strategy = strategy.name(), evasion = %request.evasion, "routing fetch");
        strategy.fetch(request).await
    }
}
