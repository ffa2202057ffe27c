// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::state_store::StateStore;
use crate::domain::repositories::target_repository::TargetRepository;
use crate::engines::router::StrategyRouter;
use crate::notify::Dispatcher;
use crate::queue::work_queue::WorkQueue;
use crate::utils::retry_policy::RetryPolicy;
use crate::workers::check_worker::CheckWorker;
use crate::workers::worker::Worker;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
pub struct WorkerManager<R, S, Q>
where
    R: TargetRepository + 'static,
    S: StateStore + 'static,
    Q: WorkQueue + 'static,
{
    targets: Arc<R>,
    store: Arc<S>,
    queue: Arc<Q>,
    router: Arc<StrategyRouter>,
    dispatcher: Arc<Dispatcher>,
    retry: RetryPolicy,
    fetch_timeout: Duration,
    handles: Vec<JoinHandle<()>>,
}

impl<R, S, Q> WorkerManager<R, S, Q>
where
    R: TargetRepository + Send + Sync,
    S: StateStore + Send + Sync,
    Q: WorkQueue + Send + Sync,
{
    pub fn new(
        targets: Arc<R>,
        store: Arc<S>,
        queue: Arc<Q>,
        router: Arc<StrategyRouter>,
        dispatcher: Arc<Dispatcher>,
        retry: RetryPolicy,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            targets,
            store,
            queue,
            router,
            dispatcher,
            retry,
            fetch_timeout,
            handles: Vec::new(),
        }
    }

    /// 启动工作进程
    ///
    /// 创建并启动指定数量的工作进程
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的工作进程数量
    pub fn start_workers(&mut self, count: usize) {
        for _ in 0..count {
            let worker = CheckWorker::new(
                self.targets.clone(),
                self.store.clone(),
                self.queue.clone(),
                self.router.clone(),
                self.dispatcher.clone(),
                self.retry.clone(),
                self.fetch_timeout,
            );

            let handle = tokio::spawn(async move {
                if let Err(e) = worker.run().await {
                    error!("worker exited with error: {}", e);
                }
            });
            self.handles.push(handle);
        }
        info!("started {} check workers", count);
    }

    /// 等待关闭信号并关闭工作进程
    ///
    /// 监听关闭信号并优雅地关闭所有工作进程
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }

        info!("Shutting down workers...");
        for handle in &self.handles {
            handle.abort();
        }

        info!("Workers shut down successfully");
    }
}
