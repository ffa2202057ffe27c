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

use anyhow::Result;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::models::change::{ChangeSummary, Detection};
use crate::domain::models::check_task::CheckTask;
use crate::domain::models::run_record::{PipelineStage, RunOutcome, RunRecord};
use crate::domain::models::snapshot::Snapshot;
use crate::domain::models::target::Target;
use crate::domain::repositories::state_store::{StateStore, StoreError};
use crate::domain::repositories::target_repository::TargetRepository;
use crate::domain::services::change_detector::ChangeDetector;
use crate::domain::services::extraction_service::ExtractionService;
use crate::engines::router::StrategyRouter;
use crate::engines::traits::{FetchError, FetchRequest};
use crate::notify::Dispatcher;
use crate::queue::work_queue::{Delivery, WorkQueue};
use crate::utils::retry_policy::RetryPolicy;
use crate::workers::worker::{Worker, WorkerError};

/// 检查工作器
///
/// 每个实例独立拉取任务并走完整条流水线：抓取、提取、
/// 变更检测、（变更时）通知、条件提交、确认。抓取到检测
/// 均无副作用，提交是第一个落盘动作，因此提交前的重投递
/// 总是安全的。
pub struct CheckWorker<R, S, Q>
where
    R: TargetRepository + 'static,
    S: StateStore + 'static,
    Q: WorkQueue + 'static,
{
    targets: Arc<R>,
    store: Arc<S>,
    queue: Arc<Q>,
    router: Arc<StrategyRouter>,
    detector: ChangeDetector<S>,
    dispatcher: Arc<Dispatcher>,
    retry: RetryPolicy,
    fetch_timeout: Duration,
    worker_id: Uuid,
}

impl<R, S, Q> CheckWorker<R, S, Q>
where
    R: TargetRepository + Send + Sync,
    S: StateStore + Send + Sync,
    Q: WorkQueue + Send + Sync,
{
    /// 创建新的检查工作器实例
    pub fn new(
        targets: Arc<R>,
        store: Arc<S>,
        queue: Arc<Q>,
        router: Arc<StrategyRouter>,
        dispatcher: Arc<Dispatcher>,
        retry: RetryPolicy,
        fetch_timeout: Duration,
    ) -> Self {
        let detector = ChangeDetector::new(store.clone());
        Self {
            targets,
            store,
            queue,
            router,
            detector,
            dispatcher,
            retry,
            fetch_timeout,
            worker_id: Uuid::new_v4(),
        }
    }

    async fn record_run(&self, record: RunRecord) {
        // 审计记录失败只降级为日志，不能反过来毒化任务处理
        if let Err(e) = self.store.append_run_record(record).await {
            warn!("failed to append run record: {}", e);
        }
    }

    #[instrument(skip(self, delivery), fields(task_id = %delivery.task.id, target_id = %delivery.task.target_id, attempt = delivery.task.attempt))]
    async fn process_delivery(&self, delivery: Delivery) -> Result<()> {
        let task = delivery.task.clone();

        let target = match self.targets.find_by_id(task.target_id).await? {
            Some(t) => t,
            None => {
                warn!("target no longer exists, acknowledging stale task");
                self.queue.ack(delivery.receipt).await?;
                return Ok(());
            }
        };
        if !target.active {
            info!("target is inactive, acknowledging without checking");
            self.queue.ack(delivery.receipt).await?;
            return Ok(());
        }

        let started = Instant::now();
        counter!("checks_started_total").increment(1);

        let evasion = task.evasion_override.unwrap_or(target.evasion);
        let mut request = FetchRequest::new(&target.url, evasion);
        request.timeout = self.fetch_timeout;

        let outcome = match self.router.fetch(&request).await {
            Ok(outcome) => outcome,
            Err(err) => {
                return self
                    .handle_fetch_failure(delivery, &target, err, started)
                    .await;
            }
        };

        let fields =
            match ExtractionService::extract(&outcome.body, &outcome.content_type, &target.rules) {
                Ok(fields) => fields,
                Err(err) => {
                    // 规则与内容不匹配是确定性失败，重放不会有不同结果
                    error!("extraction failed: {}", err);
                    counter!("checks_failed_total", "stage" => "extracting").increment(1);
                    self.record_run(
                        RunRecord::new(
                            target.id,
                            RunOutcome::ExtractionFailed,
                            PipelineStage::Extracting,
                            task.attempt,
                        )
                        .with_duration(started.elapsed().as_millis() as u64)
                        .with_error(err.to_string()),
                    )
                    .await;
                    self.queue
                        .dead_letter(delivery.receipt, err.to_string())
                        .await?;
                    return Ok(());
                }
            };

        let detection = match self.detector.detect(&target, fields).await {
            Ok(detection) => detection,
            Err(err) => {
                return self
                    .handle_storage_failure(delivery, &target, PipelineStage::Detecting, err)
                    .await;
            }
        };

        match detection {
            Detection::Unchanged => {
                counter!("checks_completed_total", "outcome" => "unchanged").increment(1);
                self.record_run(
                    RunRecord::new(
                        target.id,
                        RunOutcome::Unchanged,
                        PipelineStage::Acknowledged,
                        task.attempt,
                    )
                    .with_duration(started.elapsed().as_millis() as u64),
                )
                .await;
                histogram!("check_duration_ms").record(started.elapsed().as_millis() as f64);
                self.queue.ack(delivery.receipt).await?;
                Ok(())
            }
            Detection::FirstObservation { current } => {
                let summary = ChangeSummary::first_observation(&target.name, &target.url, &current);
                self.commit_and_notify(delivery, &target, None, *current, summary, started)
                    .await
            }
            Detection::Changed { previous, current } => {
                let summary =
                    ChangeSummary::from_change(&target.name, &target.url, &previous, &current);
                self.commit_and_notify(
                    delivery,
                    &target,
                    Some(previous.version),
                    *current,
                    summary,
                    started,
                )
                .await
            }
        }
    }

    /// 通知并条件提交
    ///
    /// 通知先于提交，分发器的幂等护栏保证提交后的重投递
    /// 不会重复扇出；提交撞上版本冲突说明本次结果已过期，
    /// 重读当前快照后直接确认。
    ///
    /// 已知窗口：两个工作器从同一基线观察到不同内容时，
    /// 落败方在提交失败前已为一份不会落盘的快照扇出过
    /// 通知（护栏只拦指纹一致的重复）。
    async fn commit_and_notify(
        &self,
        delivery: Delivery,
        target: &Target,
        expected_version: Option<u64>,
        snapshot: Snapshot,
        summary: ChangeSummary,
        started: Instant,
    ) -> Result<()> {
        let task = &delivery.task;
        let outcome = if summary.is_first_observation {
            RunOutcome::FirstObservation
        } else {
            RunOutcome::Changed
        };

        let channel_outcomes = self.dispatcher.dispatch(&summary, &target.channels).await;
        let failed: Vec<String> = channel_outcomes
            .iter()
            .filter(|(_, o)| !o.is_delivered())
            .map(|(name, _)| name.clone())
            .collect();

        match self
            .store
            .compare_and_swap_snapshot(target.id, expected_version, snapshot)
            .await
        {
            Ok(()) => {
                info!(
                    version = summary.version,
                    outcome = %outcome,
                    "snapshot committed"
                );
                counter!("checks_completed_total", "outcome" => outcome.to_string()).increment(1);
                let mut record = RunRecord::new(
                    target.id,
                    outcome,
                    PipelineStage::Acknowledged,
                    task.attempt,
                )
                .with_duration(started.elapsed().as_millis() as u64);
                if !failed.is_empty() {
                    record =
                        record.with_error(format!("channels failed: {}", failed.join(", ")));
                }
                self.record_run(record).await;
                histogram!("check_duration_ms").record(started.elapsed().as_millis() as f64);
                self.queue.ack(delivery.receipt).await?;
                Ok(())
            }
            Err(StoreError::VersionConflict { expected, stored }) => {
                // 并发提交中落败，本次结果过期；当前快照由胜者负责
                info!(
                    ?expected,
                    ?stored,
                    "lost snapshot race, treating own result as stale"
                );
                counter!("checks_completed_total", "outcome" => "stale").increment(1);
                let _ = self.store.get_snapshot(target.id).await;
                self.record_run(
                    RunRecord::new(
                        target.id,
                        RunOutcome::Unchanged,
                        PipelineStage::Committing,
                        task.attempt,
                    )
                    .with_duration(started.elapsed().as_millis() as u64)
                    .with_error("version conflict: superseded by concurrent commit"),
                )
                .await;
                self.queue.ack(delivery.receipt).await?;
                Ok(())
            }
            Err(err) => {
                self.handle_storage_failure(delivery, target, PipelineStage::Committing, err)
                    .await
            }
        }
    }

    async fn handle_fetch_failure(
        &self,
        delivery: Delivery,
        target: &Target,
        err: FetchError,
        started: Instant,
    ) -> Result<()> {
        let task = &delivery.task;
        warn!(error = %err, "fetch failed");
        counter!("checks_failed_total", "stage" => "fetching").increment(1);
        self.record_run(
            RunRecord::new(
                target.id,
                RunOutcome::FetchFailed,
                PipelineStage::Fetching,
                task.attempt,
            )
            .with_duration(started.elapsed().as_millis() as u64)
            .with_error(err.to_string()),
        )
        .await;

        if !self.retry.should_retry(&err, task.attempt) {
            self.queue
                .dead_letter(delivery.receipt, err.to_string())
                .await?;
            return Ok(());
        }

        let delay = self.retry.delay_for(&err, task.attempt);
        let mut retried = task.clone();
        if matches!(err, FetchError::Blocked { .. }) {
            // 封锁后下一次尝试升一级规避档位
            let current = task.evasion_override.unwrap_or(target.evasion);
            let escalated = current.escalate();
            if escalated != current {
                info!(from = %current, to = %escalated, "escalating evasion profile for retry");
                retried.evasion_override = Some(escalated);
            }
        }
        info!(delay_secs = delay.as_secs(), "releasing task for retry");
        self.queue.release(delivery.receipt, retried, delay).await?;
        Ok(())
    }

    async fn handle_storage_failure(
        &self,
        delivery: Delivery,
        target: &Target,
        stage: PipelineStage,
        err: StoreError,
    ) -> Result<()> {
        let task = &delivery.task;
        error!(error = %err, ?stage, "state store unavailable");
        counter!("checks_failed_total", "stage" => "storage").increment(1);
        self.record_run(
            RunRecord::new(target.id, RunOutcome::StorageFailed, stage, task.attempt)
                .with_error(err.to_string()),
        )
        .await;

        if task.attempt >= self.retry.max_attempts {
            self.queue
                .dead_letter(delivery.receipt, err.to_string())
                .await?;
            return Ok(());
        }
        let delay = self.retry.storage_delay(task.attempt);
        self.queue
            .release(delivery.receipt, task.clone(), delay)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl<R, S, Q> Worker for CheckWorker<R, S, Q>
where
    R: TargetRepository + Send + Sync,
    S: StateStore + Send + Sync,
    Q: WorkQueue + Send + Sync,
{
    async fn run(&self) -> Result<(), WorkerError> {
        info!("check worker {} started", self.worker_id);

        loop {
            match self.queue.receive(Duration::from_secs(1)).await {
                Ok(Some(delivery)) => {
                    if let Err(e) = self.process_delivery(delivery).await {
                        error!("error processing delivery: {:#}", e);
                        sleep(Duration::from_secs(1)).await;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    error!("queue receive failed: {}", e);
                    sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    fn name(&self) -> &str {
        "check_worker"
    }
}

#[cfg(test)]
#[path = "check_worker_test.rs"]
mod tests;
