// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::check_task::CheckTask;
use crate::domain::repositories::target_repository::TargetRepository;
use crate::queue::work_queue::WorkQueue;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info};

/// 节奏调度器
///
/// 周期性扫描`next_check_at`已到期的启用目标并入队检查任务。
/// 调度状态是每目标字段而非全局定时器：入队的同时立即按
/// 轮询间隔推进该目标的下次检查时间，避免同一到期被重复
/// 入队。强制检查命令是独立的入队来源，与节奏入队共用同
/// 一条队列。
pub struct CadenceScheduler<R, Q>
where
    R: TargetRepository + 'static,
    Q: WorkQueue + 'static,
{
    targets: Arc<R>,
    queue: Arc<Q>,
    tick: Duration,
}

impl<R, Q> CadenceScheduler<R, Q>
where
    R: TargetRepository,
    Q: WorkQueue,
{
    pub fn new(targets: Arc<R>, queue: Arc<Q>, tick: Duration) -> Self {
        Self {
            targets,
            queue,
            tick,
        }
    }

    /// 启动调度器后台任务
    pub fn start(&self) -> JoinHandle<()> {
        let targets = self.targets.clone();
        let queue = self.queue.clone();
        let tick = self.tick;

        tokio::spawn(async move {
            info!(tick_secs = tick.as_secs(), "cadence scheduler started");
            let mut ticker = interval(tick);
            loop {
                ticker.tick().await;
                if let Err(e) = Self::run_once(targets.as_ref(), queue.as_ref(), Utc::now()).await {
                    error!("scheduler tick failed: {}", e);
                }
            }
        })
    }

    /// 执行一轮调度扫描
    ///
    /// `now`显式注入，调度逻辑无需真实时钟即可测试。
    pub async fn run_once(targets: &R, queue: &Q, now: DateTime<Utc>) -> anyhow::Result<usize> {
        let due = targets.due_targets(now).await?;
        let mut enqueued = 0;

        for target in due {
            let next = now
                + ChronoDuration::from_std(target.poll_interval)
                    .unwrap_or_else(|_| ChronoDuration::seconds(300));
            // 先推进调度时间再入队，同一到期至多入队一次
            targets.reschedule(target.id, next).await?;
            queue.enqueue(CheckTask::new(target.id)).await?;
            debug!(target_id = %target.id, next_check_at = %next, "check task enqueued");
            enqueued += 1;
        }
        Ok(enqueued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::target::{EvasionProfile, Target};
    use crate::infrastructure::repositories::memory_target_repo::InMemoryTargetRepository;
    use crate::queue::memory_queue::InMemoryWorkQueue;

    fn target(poll_secs: u64) -> Target {
        Target::new(
            "flat".into(),
            "https://example.com".into(),
            vec![],
            EvasionProfile::None,
            Duration::from_secs(poll_secs),
            vec![],
        )
    }

    #[tokio::test]
    async fn test_due_target_is_enqueued_once_and_rescheduled() {
        let repo = Arc::new(InMemoryTargetRepository::new());
        let queue = InMemoryWorkQueue::new(Duration::from_secs(30), 3);
        let created = repo.create(&target(300)).await.unwrap();

        let now = Utc::now();
        let enqueued = CadenceScheduler::run_once(repo.as_ref(), queue.as_ref(), now)
            .await
            .unwrap();
        assert_eq!(enqueued, 1);

        // 同一时刻再扫描一轮不会重复入队
        let again = CadenceScheduler::run_once(repo.as_ref(), queue.as_ref(), now)
            .await
            .unwrap();
        assert_eq!(again, 0);

        let stored = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert!(stored.next_check_at > now);
        assert_eq!(queue.ready_len(), 1);
    }

    #[tokio::test]
    async fn test_inactive_targets_are_skipped() {
        let repo = Arc::new(InMemoryTargetRepository::new());
        let queue = InMemoryWorkQueue::new(Duration::from_secs(30), 3);
        let mut t = target(300);
        t.active = false;
        repo.create(&t).await.unwrap();

        let enqueued = CadenceScheduler::run_once(repo.as_ref(), queue.as_ref(), Utc::now())
            .await
            .unwrap();
        assert_eq!(enqueued, 0);
    }
}
