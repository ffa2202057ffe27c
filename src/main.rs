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

use axum::Extension;
use monitrs::application::commands::CommandService;
use monitrs::config::settings::Settings;
use monitrs::config::targets_file;
use monitrs::engines::browser_strategy::BrowserStrategy;
use monitrs::engines::http_strategy::HttpStrategy;
use monitrs::engines::router::StrategyRouter;
use monitrs::engines::traits::FetchStrategy;
use monitrs::infrastructure::repositories::memory_state_store::InMemoryStateStore;
use monitrs::infrastructure::repositories::memory_target_repo::InMemoryTargetRepository;
use monitrs::notify::Dispatcher;
use monitrs::presentation::routes;
use monitrs::queue::memory_queue::InMemoryWorkQueue;
use monitrs::queue::scheduler::CadenceScheduler;
use monitrs::utils::retry_policy::RetryPolicy;
use monitrs::utils::telemetry;
use monitrs::workers::manager::WorkerManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting monitrs...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // 3. Initialize Prometheus metrics
    if settings.metrics.enabled {
        match settings.metrics.listen_addr.parse() {
            Ok(addr) => monitrs::infrastructure::metrics::init_metrics(addr),
            Err(e) => warn!("invalid metrics listen address, metrics disabled: {}", e),
        }
    }

    // 4. Initialize adapters
    let targets = Arc::new(InMemoryTargetRepository::new());
    let store = Arc::new(InMemoryStateStore::new());
    let queue = InMemoryWorkQueue::new(
        Duration::from_secs(settings.queue.visibility_timeout_secs),
        settings.queue.max_attempts,
    );

    // 5. Initialize fetch strategies
    let http: Arc<dyn FetchStrategy> = Arc::new(HttpStrategy);
    let browser: Arc<dyn FetchStrategy> =
        Arc::new(BrowserStrategy::new(settings.fetch.browser_max_sessions));
    let router = Arc::new(StrategyRouter::new(http, browser));

    let dispatcher = Dispatcher::new(reqwest::Client::new());
    let commands = Arc::new(CommandService::new(
        targets.clone(),
        store.clone(),
        queue.clone(),
    ));

    // 6. Bootstrap declarative targets
    if let Some(path) = &settings.targets.file {
        let registered = targets_file::bootstrap_targets(path, commands.as_ref()).await?;
        info!("bootstrapped {} targets from {}", registered, path);
    }

    // 7. Start workers and scheduler
    let retry = RetryPolicy {
        max_attempts: settings.queue.max_attempts,
        ..RetryPolicy::standard()
    };
    let mut worker_manager = WorkerManager::new(
        targets.clone(),
        store.clone(),
        queue.clone(),
        router,
        dispatcher,
        retry,
        Duration::from_secs(settings.fetch.timeout_secs),
    );
    worker_manager.start_workers(settings.workers.count);

    let scheduler = CadenceScheduler::new(
        targets.clone(),
        queue.clone(),
        Duration::from_secs(settings.scheduler.tick_secs),
    );
    let scheduler_handle = scheduler.start();

    // 8. Start HTTP server
    let app = routes::routes()
        .layer(Extension(commands))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = worker_manager.wait_for_shutdown() => {}
    }

    scheduler_handle.abort();
    Ok(())
}
