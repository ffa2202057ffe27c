// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{listing_target, spawn_app, wait_for_version, wait_until, ScriptedStrategy};
use monitrs::domain::models::channel::ChannelConfig;
use monitrs::domain::models::check_task::CheckTask;
use monitrs::domain::models::run_record::RunOutcome;
use monitrs::domain::models::target::EvasionProfile;
use monitrs::domain::repositories::state_store::StateStore;
use monitrs::domain::repositories::target_repository::TargetRepository;
use monitrs::engines::traits::FetchError;
use monitrs::queue::work_queue::WorkQueue;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BODY_860: &str =
    r#"<span class="price">860 €</span><span class="title">Nice flat</span>"#;
const BODY_890: &str =
    r#"<span class="price">890 €</span><span class="title">Nice flat</span>"#;

async fn webhook_server(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notify"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

fn webhook_channel(server: &MockServer) -> ChannelConfig {
    ChannelConfig::Webhook {
        url: format!("{}/notify", server.uri()),
    }
}

async fn wait_for_requests(server: &MockServer, n: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let count = server
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or(0);
        if count >= n {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {} webhook requests",
            n
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_first_check_establishes_baseline_and_notifies() {
    let server = webhook_server(200).await;
    let app = spawn_app(vec![ScriptedStrategy::html(BODY_860)], 3);
    let target = app
        .targets
        .create(&listing_target(vec![webhook_channel(&server)]))
        .await
        .unwrap();

    app.queue.enqueue(CheckTask::new(target.id)).await.unwrap();
    wait_for_version(&app.store, target.id, 1).await;

    wait_for_requests(&server, 1).await;

    let requests = server.received_requests().await.unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(payload["is_first_observation"], true);
    assert_eq!(payload["version"], 1);
    assert_eq!(payload["diff"]["price"]["current"]["type"], "number");
    assert_eq!(payload["diff"]["price"]["current"]["value"], 860.0);
}

#[tokio::test]
async fn test_unchanged_cycle_does_not_renotify() {
    let server = webhook_server(200).await;
    let app = spawn_app(
        vec![
            ScriptedStrategy::html(BODY_860),
            ScriptedStrategy::html(BODY_860),
        ],
        3,
    );
    let target = app
        .targets
        .create(&listing_target(vec![webhook_channel(&server)]))
        .await
        .unwrap();

    app.queue.enqueue(CheckTask::new(target.id)).await.unwrap();
    wait_for_version(&app.store, target.id, 1).await;

    app.queue.enqueue(CheckTask::new(target.id)).await.unwrap();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let runs = app.store.list_run_records(target.id, 10).await.unwrap();
        if runs.len() == 2 {
            assert_eq!(runs[0].outcome, RunOutcome::Unchanged);
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "second run never recorded"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    // 版本不动，也没有第二次通知
    let snapshot = app.store.get_snapshot(target.id).await.unwrap().unwrap();
    assert_eq!(snapshot.version, 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_change_bumps_version_and_sends_diff() {
    let server = webhook_server(200).await;
    let app = spawn_app(
        vec![
            ScriptedStrategy::html(BODY_860),
            ScriptedStrategy::html(BODY_890),
        ],
        3,
    );
    let target = app
        .targets
        .create(&listing_target(vec![webhook_channel(&server)]))
        .await
        .unwrap();

    app.queue.enqueue(CheckTask::new(target.id)).await.unwrap();
    wait_for_version(&app.store, target.id, 1).await;
    app.queue.enqueue(CheckTask::new(target.id)).await.unwrap();
    wait_for_version(&app.store, target.id, 2).await;

    wait_for_requests(&server, 2).await;

    let requests = server.received_requests().await.unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(payload["is_first_observation"], false);
    assert_eq!(payload["version"], 2);
    assert_eq!(payload["diff"]["price"]["previous"]["value"], 860.0);
    assert_eq!(payload["diff"]["price"]["current"]["value"], 890.0);
    // title未变化，不进差异
    assert!(payload["diff"].get("title").is_none());

    // 上一版快照保留
    assert_eq!(app.store.previous_snapshot(target.id).unwrap().version, 1);
}

#[tokio::test]
async fn test_blocked_fetch_recovers_after_escalated_retry() {
    let app = spawn_app(
        vec![
            Err(FetchError::Blocked { status: 403 }),
            ScriptedStrategy::html(BODY_860),
        ],
        3,
    );
    let target = app.targets.create(&listing_target(vec![])).await.unwrap();

    app.queue.enqueue(CheckTask::new(target.id)).await.unwrap();
    wait_for_version(&app.store, target.id, 1).await;

    let runs = app.store.list_run_records(target.id, 10).await.unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[1].outcome, RunOutcome::FetchFailed);
    assert_eq!(runs[0].outcome, RunOutcome::FirstObservation);
    assert_eq!(runs[0].attempt, 2);
}

#[tokio::test]
async fn test_redelivered_task_after_commit_keeps_version_and_does_not_renotify() {
    let server = webhook_server(200).await;
    let app = spawn_app(
        vec![
            ScriptedStrategy::html(BODY_860),
            ScriptedStrategy::html(BODY_860),
        ],
        3,
    );
    let target = app
        .targets
        .create(&listing_target(vec![webhook_channel(&server)]))
        .await
        .unwrap();

    let task = CheckTask::new(target.id);
    app.queue.enqueue(task.clone()).await.unwrap();
    wait_for_version(&app.store, target.id, 1).await;
    wait_for_requests(&server, 1).await;

    // 同一任务以递增的尝试计数再次投递，等同可见性超时后的重投递
    app.queue.enqueue(task.next_attempt()).await.unwrap();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let runs = app.store.list_run_records(target.id, 10).await.unwrap();
        if runs.len() == 2 {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "redelivered task never processed"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let snapshot = app.store.get_snapshot(target.id).await.unwrap().unwrap();
    assert_eq!(snapshot.version, 1);
    assert!(app.queue.dead_letters().is_empty());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_consecutive_blocks_exhaust_escalation_and_dead_letter() {
    let app = spawn_app(
        vec![
            Err(FetchError::Blocked { status: 403 }),
            Err(FetchError::Blocked { status: 403 }),
            Err(FetchError::Blocked { status: 403 }),
        ],
        3,
    );
    let target = app.targets.create(&listing_target(vec![])).await.unwrap();

    app.queue.enqueue(CheckTask::new(target.id)).await.unwrap();
    wait_until("task dead-lettered after escalation", || {
        app.queue.dead_letters().len() == 1
    })
    .await;

    // 档位逐级升满后在尝试上限处进入死信
    let dead = &app.queue.dead_letters()[0];
    assert_eq!(dead.task.attempt, 3);
    assert_eq!(
        dead.task.evasion_override,
        Some(EvasionProfile::BrowserRender)
    );

    let runs = app.store.list_run_records(target.id, 10).await.unwrap();
    assert_eq!(runs.len(), 3);
    assert!(runs.iter().all(|r| r.outcome == RunOutcome::FetchFailed));
    assert!(app.store.get_snapshot(target.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_persistent_failure_hits_attempt_ceiling_and_dead_letters() {
    let app = spawn_app(
        vec![
            Err(FetchError::Timeout(Duration::from_secs(5))),
            Err(FetchError::Timeout(Duration::from_secs(5))),
        ],
        2,
    );
    let target = app.targets.create(&listing_target(vec![])).await.unwrap();

    app.queue.enqueue(CheckTask::new(target.id)).await.unwrap();

    wait_until("task dead-lettered", || app.queue.dead_letters().len() == 1)
        .await;
    assert!(app
        .store
        .get_snapshot(target.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_fan_out_isolation_one_failing_channel() {
    let ok_a = webhook_server(200).await;
    let ok_b = webhook_server(200).await;
    let failing = webhook_server(500).await;

    let app = spawn_app(vec![ScriptedStrategy::html(BODY_860)], 3);
    let target = app
        .targets
        .create(&listing_target(vec![
            webhook_channel(&ok_a),
            webhook_channel(&failing),
            webhook_channel(&ok_b),
        ]))
        .await
        .unwrap();

    app.queue.enqueue(CheckTask::new(target.id)).await.unwrap();
    wait_for_version(&app.store, target.id, 1).await;

    wait_for_requests(&ok_a, 1).await;
    wait_for_requests(&ok_b, 1).await;
    wait_for_requests(&failing, 1).await;

    // 渠道失败只进运行记录，不回滚已提交的快照
    let last = app.store.last_run(target.id).await.unwrap().unwrap();
    assert_eq!(last.outcome, RunOutcome::FirstObservation);
    assert!(last
        .error
        .as_deref()
        .unwrap_or("")
        .contains("channels failed"));
}
