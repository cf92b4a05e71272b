// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end pipeline: socket frames in, threaded replies out.
//!
//! A local WebSocket server plays Socket Mode, wiremock plays the Web API, a
//! scripted runner stands in for the agent and history lives in a temp SQLite
//! database.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use secrecy::SecretString;
use serde_json::json;
use tether_agent::{Collaborators, Dispatcher, Executor, LogNotifier, TaskQueue};
use tether_config::TetherConfig;
use tether_core::{HistoryStore, MentionStatus, TaskStatus};
use tether_slack::{MentionRouter, SlackWebClient, SocketModeClient};
use tether_storage::SqliteHistoryStore;
use tether_test_utils::MockRunner;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Send `frames`, then keep reading until the client goes away.
/// Returns every text frame the client sent.
async fn socket_server(frames: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/", listener.local_addr().unwrap());
    let task = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        for frame in frames {
            ws.send(Message::Text(frame.into())).await.unwrap();
        }
        let mut received = Vec::new();
        while let Some(Ok(message)) = ws.next().await {
            match message {
                Message::Text(text) => received.push(text.as_str().to_string()),
                Message::Close(_) => break,
                _ => {}
            }
        }
        received
    });
    (url, task)
}

fn events_api(envelope_id: &str, event: serde_json::Value) -> String {
    json!({
        "envelope_id": envelope_id,
        "type": "events_api",
        "payload": { "type": "event_callback", "event": event }
    })
    .to_string()
}

#[tokio::test]
async fn mention_is_answered_in_thread_and_persisted() {
    let mention = json!({
        "type": "app_mention", "user": "U7", "text": "<@UBOT> status?",
        "channel": "C0123ABCD", "ts": "1700.0001"
    });
    let mut duplicate = mention.clone();
    duplicate["type"] = json!("message");
    let frames = vec![
        json!({ "envelope_id": "h1", "type": "hello" }).to_string(),
        events_api("e1", mention),
        events_api("e2", duplicate),
        events_api(
            "e3",
            json!({
                "type": "app_mention", "user": "U7", "text": "<@UBOT> hi",
                "channel": "C9999ZZZZ", "ts": "1700.0002"
            }),
        ),
    ];
    let (ws_url, server) = socket_server(frames).await;

    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth.test"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "user_id": "UBOT" })),
        )
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/apps.connections.open"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "url": ws_url })))
        .mount(&api)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .and(body_partial_json(json!({
            "channel": "C0123ABCD", "thread_ts": "1700.0001", "text": "all systems nominal"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "ts": "1700.0003" })))
        .expect(1)
        .mount(&api)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = TetherConfig::default();
    config.history.database_path = dir.path().join("tether.db").to_string_lossy().into_owned();
    config.slack.api_base_url = api.uri();
    config.slack.monitored_channels = vec!["#c0123abcd".into()];

    let store = Arc::new(SqliteHistoryStore::open(&config.history).await.unwrap());
    let runner = Arc::new(MockRunner::with_script([Ok("all systems nominal\n".to_string())]));
    let web = Arc::new(SlackWebClient::new(api.uri(), SecretString::from("xoxb-test")).unwrap());

    let executor = Executor::new(
        &config,
        Collaborators {
            runner: runner.clone(),
            reply: web.clone(),
            history: store.clone(),
            notifier: Arc::new(LogNotifier),
        },
    );
    let queue = TaskQueue::start(executor);
    let mut updates = queue.subscribe();

    let (socket, events) = SocketModeClient::from_config(&config.slack).unwrap();
    let identity = web.auth_test().await.unwrap();
    let (_identity_tx, identity_rx) = watch::channel(Some(identity.user_id.clone()));
    let dispatcher = Dispatcher::new(MentionRouter::from_config(&config.slack), queue.handle());
    let dispatch = tokio::spawn(dispatcher.run(events, identity_rx, CancellationToken::new()));

    socket
        .connect(&SecretString::from("xapp-test"), Some(identity.user_id))
        .await
        .unwrap();

    let finished = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let task = updates.recv().await.unwrap();
            if task.status.is_terminal() {
                return task;
            }
        }
    })
    .await
    .expect("task did not finish");
    assert_eq!(finished.status, TaskStatus::Succeeded);
    assert_eq!(finished.response_text.as_deref(), Some("all systems nominal"));

    // Closing the socket ends the event stream; the dispatcher drains it.
    socket.disconnect().await;
    drop(socket);
    dispatch.await.unwrap();
    queue.shutdown().await.unwrap();

    let acks = server.await.unwrap();
    assert_eq!(
        acks,
        [
            r#"{"envelope_id":"h1"}"#,
            r#"{"envelope_id":"e1"}"#,
            r#"{"envelope_id":"e2"}"#,
            r#"{"envelope_id":"e3"}"#,
        ]
    );
    assert_eq!(runner.prompts().await, ["status?"]);

    let tasks = store.load_tasks(10).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, TaskStatus::Succeeded);

    let statuses: Vec<_> = store
        .load_mentions(10)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.status)
        .collect();
    assert_eq!(statuses, [MentionStatus::Queued, MentionStatus::IgnoredChannel]);

    let threads = store.load_threads().await.unwrap();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].turns.len(), 2);
}
