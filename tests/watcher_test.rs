//! Poll-cycle scenarios against a mock webhook
//!
//! The activity source is scripted so every cycle sees a known sample.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use toggl_notifier::notification::{WebhookChannel, WebhookConfig};
use toggl_notifier::{
    Activity, ActivitySource, ActivityWatcher, Config, EventKind, NotificationDispatcher, Payload,
    SendResult,
};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

struct ScriptedSource {
    samples: VecDeque<Result<Option<Activity>, String>>,
}

#[async_trait]
impl ActivitySource for ScriptedSource {
    async fn current_activity(&mut self) -> Result<Option<Activity>> {
        match self.samples.pop_front() {
            Some(Ok(sample)) => Ok(sample),
            Some(Err(e)) => Err(anyhow!(e)),
            None => Ok(None),
        }
    }
}

fn some(id: u64, user_id: u64, description: &str) -> Result<Option<Activity>, String> {
    Ok(Some(Activity::new(id, user_id, description)))
}

fn none() -> Result<Option<Activity>, String> {
    Ok(None)
}

fn watcher_for(
    server: &MockServer,
    samples: Vec<Result<Option<Activity>, String>>,
) -> ActivityWatcher<ScriptedSource> {
    let mut config = Config::sample();
    config.webhook_url = format!("{}/hook", server.uri());
    config.users.clear();
    config
        .users
        .insert("42".to_string(), Payload::new("#time", "toggl").with_icon_emoji(":stopwatch:"));

    let channel = WebhookChannel::new(WebhookConfig::new(config.webhook_url.clone())).unwrap();
    let dispatcher = NotificationDispatcher::new(&config, Arc::new(channel)).unwrap();
    ActivityWatcher::new(
        ScriptedSource {
            samples: samples.into(),
        },
        dispatcher,
        Duration::from_secs(1),
    )
}

async fn posted_texts(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|req| {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
            body["text"].as_str().unwrap_or_default().to_string()
        })
        .collect()
}

async fn ok_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_start_then_stop_sends_two_notifications() {
    let server = ok_server().await;
    let mut watcher = watcher_for(
        &server,
        vec![none(), some(1, 42, "docs"), some(1, 42, "docs"), none()],
    );

    let mut kinds = Vec::new();
    for _ in 0..4 {
        for (event, result) in watcher.tick().await.unwrap() {
            assert_eq!(result, SendResult::Sent);
            kinds.push((event.kind, event.activity.id));
        }
    }

    assert_eq!(
        kinds,
        vec![(EventKind::Started, Some(1)), (EventKind::Finished, Some(1))]
    );
    assert_eq!(posted_texts(&server).await, vec!["started docs", "finished docs"]);
    assert!(watcher.state().is_idle());
}

#[tokio::test]
async fn test_switching_activity_stops_then_starts() {
    let server = ok_server().await;
    let mut watcher = watcher_for(&server, vec![some(1, 42, "docs"), some(2, 42, "review")]);

    watcher.tick().await.unwrap();
    let results = watcher.tick().await.unwrap();

    let kinds: Vec<_> = results.iter().map(|(e, _)| (e.kind, e.activity.id)).collect();
    assert_eq!(
        kinds,
        vec![(EventKind::Finished, Some(1)), (EventKind::Started, Some(2))]
    );
    assert_eq!(
        posted_texts(&server).await,
        vec!["started docs", "finished docs", "started review"]
    );
}

#[tokio::test]
async fn test_unknown_user_never_posts() {
    let server = ok_server().await;
    let mut watcher = watcher_for(&server, vec![some(1, 7, "someone else"), none()]);

    watcher.tick().await.unwrap();
    watcher.tick().await.unwrap();

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_webhook_500_does_not_disturb_polling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut watcher = watcher_for(&server, vec![some(1, 42, "docs"), some(1, 42, "docs"), none()]);

    let first = watcher.tick().await.unwrap();
    assert!(matches!(first[0].1, SendResult::Failed(_)));
    assert_eq!(watcher.state().current().and_then(|a| a.id), Some(1));

    assert!(watcher.tick().await.unwrap().is_empty());

    let last = watcher.tick().await.unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].0.kind, EventKind::Finished);
    assert_eq!(last[0].1, SendResult::Sent);
}

#[tokio::test]
async fn test_source_outage_resumes_from_last_state() {
    let server = ok_server().await;
    let mut watcher = watcher_for(
        &server,
        vec![
            some(1, 42, "docs"),
            Err("503 from Toggl".to_string()),
            Err("timeout".to_string()),
            none(),
        ],
    );

    for _ in 0..4 {
        watcher.tick().await.unwrap();
    }

    assert_eq!(posted_texts(&server).await, vec!["started docs", "finished docs"]);
}
