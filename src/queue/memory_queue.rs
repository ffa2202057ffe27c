// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::check_task::CheckTask;
use crate::queue::work_queue::{Delivery, QueueError, WorkQueue};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// 死信条目
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub task: CheckTask,
    pub reason: String,
    pub dead_lettered_at: chrono::DateTime<Utc>,
}

struct Pending {
    task: CheckTask,
    eligible_at: Instant,
}

struct InFlight {
    task: CheckTask,
    deadline: Instant,
}

#[derive(Default)]
struct QueueState {
    ready: Vec<Pending>,
    in_flight: HashMap<Uuid, InFlight>,
    dead: Vec<DeadLetter>,
}

/// 进程内工作队列
///
/// 托管消息队列契约的内存实现：可见性超时、至少一次投递、
/// 尝试上限与死信。到期未确认的在途投递以尝试计数+1重新
/// 变为可见，模拟真实队列的重投递行为。
pub struct InMemoryWorkQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    visibility_timeout: Duration,
    max_attempts: u32,
}

impl InMemoryWorkQueue {
    pub fn new(visibility_timeout: Duration, max_attempts: u32) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            visibility_timeout,
            max_attempts: max_attempts.max(1),
        })
    }

    /// 当前死信内容（诊断用）
    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.state.lock().dead.clone()
    }

    /// 队列中待投递的任务数（不含在途）
    pub fn ready_len(&self) -> usize {
        self.state.lock().ready.len()
    }

    /// 回收到期的在途投递
    ///
    /// 任务在可见性超时内未被确认时按重投递处理；
    /// 超过尝试上限直接移入死信。
    fn reap_expired(state: &mut QueueState, now: Instant, max_attempts: u32) {
        let expired: Vec<Uuid> = state
            .in_flight
            .iter()
            .filter(|(_, f)| f.deadline <= now)
            .map(|(receipt, _)| *receipt)
            .collect();

        for receipt in expired {
            let flight = state.in_flight.remove(&receipt).expect("receipt present");
            let redelivered = flight.task.next_attempt();
            if redelivered.attempt > max_attempts {
                warn!(
                    task_id = %redelivered.id,
                    target_id = %redelivered.target_id,
                    attempt = redelivered.attempt,
                    "visibility timeout exceeded attempt ceiling, dead-lettering"
                );
                state.dead.push(DeadLetter {
                    task: redelivered,
                    reason: "attempt ceiling exceeded after visibility timeout".to_string(),
                    dead_lettered_at: Utc::now(),
                });
            } else {
                warn!(
                    task_id = %redelivered.id,
                    attempt = redelivered.attempt,
                    "visibility timeout expired, redelivering"
                );
                state.ready.push(Pending {
                    task: redelivered,
                    eligible_at: now,
                });
            }
        }
    }

    fn try_pop(&self, now: Instant) -> Option<Delivery> {
        let mut state = self.state.lock();
        Self::reap_expired(&mut state, now, self.max_attempts);

        let index = state.ready.iter().position(|p| p.eligible_at <= now)?;
        let pending = state.ready.swap_remove(index);
        let receipt = Uuid::new_v4();
        state.in_flight.insert(
            receipt,
            InFlight {
                task: pending.task.clone(),
                deadline: now + self.visibility_timeout,
            },
        );
        Some(Delivery {
            task: pending.task,
            receipt,
        })
    }

    fn take_in_flight(&self, receipt: Uuid) -> Result<CheckTask, QueueError> {
        self.state
            .lock()
            .in_flight
            .remove(&receipt)
            .map(|f| f.task)
            .ok_or(QueueError::UnknownReceipt(receipt))
    }
}

#[async_trait]
impl WorkQueue for InMemoryWorkQueue {
    async fn enqueue(&self, task: CheckTask) -> Result<(), QueueError> {
        {
            let mut state = self.state.lock();
            state.ready.push(Pending {
                task,
                eligible_at: Instant::now(),
            });
        }
        self.notify.notify_one();
        Ok(())
    }

    async fn receive(&self, wait: Duration) -> Result<Option<Delivery>, QueueError> {
        let deadline = Instant::now() + wait;
        loop {
            let now = Instant::now();
            if let Some(delivery) = self.try_pop(now) {
                return Ok(Some(delivery));
            }
            if now >= deadline {
                return Ok(None);
            }

            // 被唤醒（新消息）或短暂轮询（延迟消息/在途到期没有唤醒源）
            let poll = Duration::from_millis(100).min(deadline - now);
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = tokio::time::sleep(poll) => {}
            }
        }
    }

    async fn ack(&self, receipt: Uuid) -> Result<(), QueueError> {
        self.take_in_flight(receipt).map(|_| ())
    }

    async fn release(
        &self,
        receipt: Uuid,
        task: CheckTask,
        delay: Duration,
    ) -> Result<(), QueueError> {
        // 回执必须对应在途投递，回传的任务体取代存根
        self.take_in_flight(receipt)?;
        let retried = task.next_attempt();
        if retried.attempt > self.max_attempts {
            info!(
                task_id = %retried.id,
                target_id = %retried.target_id,
                attempt = retried.attempt,
                "attempt ceiling reached, dead-lettering instead of retrying"
            );
            self.state.lock().dead.push(DeadLetter {
                task: retried,
                reason: "attempt ceiling exceeded".to_string(),
                dead_lettered_at: Utc::now(),
            });
            return Ok(());
        }

        self.state.lock().ready.push(Pending {
            task: retried,
            eligible_at: Instant::now() + delay,
        });
        self.notify.notify_one();
        Ok(())
    }

    async fn dead_letter(&self, receipt: Uuid, reason: String) -> Result<(), QueueError> {
        let task = self.take_in_flight(receipt)?;
        info!(task_id = %task.id, target_id = %task.target_id, %reason, "dead-lettering task");
        self.state.lock().dead.push(DeadLetter {
            task,
            reason,
            dead_lettered_at: Utc::now(),
        });
        Ok(())
    }
}
