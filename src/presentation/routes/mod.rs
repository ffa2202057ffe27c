// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::infrastructure::repositories::memory_state_store::InMemoryStateStore;
use crate::infrastructure::repositories::memory_target_repo::InMemoryTargetRepository;
use crate::presentation::handlers::target_handler;
use crate::queue::memory_queue::InMemoryWorkQueue;
use axum::{
    routing::{get, post},
    Router,
};

/// 创建应用路由
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let api_routes = Router::new()
        .route(
            "/v1/targets",
            post(
                target_handler::register_target::<
                    InMemoryTargetRepository,
                    InMemoryStateStore,
                    InMemoryWorkQueue,
                >,
            ),
        )
        .route(
            "/v1/targets/{id}/check",
            post(
                target_handler::force_check::<
                    InMemoryTargetRepository,
                    InMemoryStateStore,
                    InMemoryWorkQueue,
                >,
            ),
        )
        .route(
            "/v1/targets/{id}/status",
            get(target_handler::get_status::<
                InMemoryTargetRepository,
                InMemoryStateStore,
                InMemoryWorkQueue,
            >),
        )
        .route(
            "/v1/targets/{id}/runs",
            get(target_handler::list_runs::<
                InMemoryTargetRepository,
                InMemoryStateStore,
                InMemoryWorkQueue,
            >),
        );

    Router::new().merge(public_routes).merge(api_routes)
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
