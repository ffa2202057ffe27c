// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use monitrs::domain::models::channel::ChannelConfig;
use monitrs::domain::models::target::{
    EvasionProfile, FieldRule, FieldType, SelectorKind, Target,
};
use monitrs::engines::router::StrategyRouter;
use monitrs::engines::traits::{FetchError, FetchOutcome, FetchRequest, FetchStrategy};
use monitrs::infrastructure::repositories::memory_state_store::InMemoryStateStore;
use monitrs::infrastructure::repositories::memory_target_repo::InMemoryTargetRepository;
use monitrs::notify::Dispatcher;
use monitrs::queue::memory_queue::InMemoryWorkQueue;
use monitrs::utils::retry_policy::RetryPolicy;
use monitrs::workers::check_worker::CheckWorker;
use monitrs::workers::worker::Worker;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;

/// 按脚本顺序返回预设响应的抓取策略
pub struct ScriptedStrategy {
    responses: Mutex<VecDeque<Result<FetchOutcome, FetchError>>>,
}

impl ScriptedStrategy {
    pub fn new(responses: Vec<Result<FetchOutcome, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
        })
    }

    pub fn html(body: &str) -> Result<FetchOutcome, FetchError> {
        Ok(FetchOutcome {
            status: 200,
            body: body.to_string(),
            final_url: "http://site.test/listing".to_string(),
            content_type: "text/html".to_string(),
            elapsed_ms: 5,
        })
    }
}

#[async_trait]
impl FetchStrategy for ScriptedStrategy {
    async fn fetch(&self, _request: &FetchRequest) -> Result<FetchOutcome, FetchError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Unreachable("script exhausted".to_string())))
    }

    fn supports(&self, _profile: EvasionProfile) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub struct TestApp {
    pub targets: Arc<InMemoryTargetRepository>,
    pub store: Arc<InMemoryStateStore>,
    pub queue: Arc<InMemoryWorkQueue>,
    worker_handle: JoinHandle<()>,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.worker_handle.abort();
    }
}

/// 搭建带单个检查工作器的测试装置
///
/// 退避全部归零，让重试路径在真实时间下即时可观察。
pub fn spawn_app(
    responses: Vec<Result<FetchOutcome, FetchError>>,
    max_attempts: u32,
) -> TestApp {
    let targets = Arc::new(InMemoryTargetRepository::new());
    let store = Arc::new(InMemoryStateStore::new());
    let queue = InMemoryWorkQueue::new(Duration::from_secs(30), max_attempts);
    let strategy: Arc<dyn FetchStrategy> = ScriptedStrategy::new(responses);
    let router = Arc::new(StrategyRouter::new(strategy.clone(), strategy));
    let dispatcher = Dispatcher::new(reqwest::Client::new());

    let retry = RetryPolicy {
        max_attempts,
        initial_backoff: Duration::ZERO,
        max_backoff: Duration::ZERO,
        blocked_initial_backoff: Duration::ZERO,
        blocked_max_backoff: Duration::ZERO,
        enable_jitter: false,
        ..RetryPolicy::standard()
    };

    let worker = CheckWorker::new(
        targets.clone(),
        store.clone(),
        queue.clone(),
        router,
        dispatcher,
        retry,
        Duration::from_secs(5),
    );
    let worker_handle = tokio::spawn(async move {
        let _ = worker.run().await;
    });

    TestApp {
        targets,
        store,
        queue,
        worker_handle,
    }
}

pub fn rule(name: &str, selector: &str, value_type: FieldType, required: bool) -> FieldRule {
    FieldRule {
        name: name.to_string(),
        selector: SelectorKind::Css {
            selector: selector.to_string(),
            attr: None,
        },
        value_type,
        required,
        default: None,
    }
}

pub fn listing_target(channels: Vec<ChannelConfig>) -> Target {
    Target::new(
        "listing".to_string(),
        "http://site.test/listing".to_string(),
        vec![
            rule("price", ".price", FieldType::Number, true),
            rule("title", ".title", FieldType::Text, false),
        ],
        EvasionProfile::None,
        Duration::from_secs(300),
        channels,
    )
}

/// 轮询等待条件成立，超时panic
pub async fn wait_until<F>(description: &str, mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for: {}", description);
}

/// 等待目标快照达到指定版本
pub async fn wait_for_version(store: &InMemoryStateStore, target_id: uuid::Uuid, version: u64) {
    use monitrs::domain::repositories::state_store::StateStore;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if let Ok(Some(snapshot)) = store.get_snapshot(target_id).await {
            if snapshot.version >= version {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for snapshot version {}", version);
}
