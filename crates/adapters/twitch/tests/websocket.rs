// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Integration tests for the Twitch PubSub client using a mock server.

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use liveupdates_common::{logging::init_tracing_for_testing, testing::wait_until_async};
use liveupdates_pubsub::{DiagnosticsSnapshot, ManagerState};
use liveupdates_twitch::{
    TwitchPubSub, TwitchPubSubConfig, TwitchPubSubProtocol, TwitchTopic, TwitchTopicKind,
};
use rstest::rstest;
use serde_json::{Value, json};
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct TestServerState {
    connection_count: Arc<AtomicUsize>,
    listens: Arc<Mutex<Vec<(usize, String, Option<String>)>>>,
    unlistens: Arc<Mutex<Vec<String>>>,
    pings: Arc<AtomicUsize>,
    ignore_pings: Arc<AtomicBool>,
}

async fn handle_websocket(ws: WebSocketUpgrade, State(state): State<TestServerState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn reward_message(topic: &str) -> Value {
    let inner = json!({
        "type": "reward-redeemed",
        "data": {"redemption": {"id": "redemption-1", "user": {"login": "viewer"}}}
    });
    json!({"type": "MESSAGE", "data": {"topic": topic, "message": inner.to_string()}})
}

async fn handle_socket(mut socket: WebSocket, state: TestServerState) {
    let connection = state.connection_count.fetch_add(1, Ordering::SeqCst) + 1;

    while let Some(Ok(msg)) = socket.recv().await {
        let Message::Text(text) = msg else {
            continue;
        };
        let Ok(request) = serde_json::from_str::<Value>(&text) else {
            continue;
        };

        let nonce = request["nonce"].clone();
        let topic = request["data"]["topics"][0]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let token = request["data"]["auth_token"].as_str().map(str::to_string);

        let replies = match request["type"].as_str() {
            Some("PING") => {
                state.pings.fetch_add(1, Ordering::SeqCst);
                if state.ignore_pings.load(Ordering::SeqCst) {
                    vec![]
                } else {
                    vec![json!({"type": "PONG"})]
                }
            }
            Some("LISTEN") => {
                let error = if token.as_deref() == Some("bad") {
                    "ERR_BADAUTH"
                } else {
                    ""
                };
                state
                    .listens
                    .lock()
                    .await
                    .push((connection, topic.clone(), token));

                let mut replies = vec![json!({"type": "RESPONSE", "nonce": nonce, "error": error})];
                if error.is_empty() && topic.starts_with("community-points-channel-v1.") {
                    replies.push(reward_message(&topic));
                }
                replies
            }
            Some("UNLISTEN") => {
                state.unlistens.lock().await.push(topic);
                vec![json!({"type": "RESPONSE", "nonce": nonce, "error": ""})]
            }
            _ => vec![],
        };

        for reply in replies {
            if socket
                .send(Message::Text(reply.to_string().into()))
                .await
                .is_err()
            {
                return;
            }
        }
    }
}

async fn start_test_server() -> (SocketAddr, TestServerState) {
    init_tracing_for_testing();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = TestServerState::default();
    let router = Router::new()
        .route("/", get(handle_websocket))
        .with_state(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, state)
}

fn test_config(addr: SocketAddr, auth_token: &str) -> TwitchPubSubConfig {
    TwitchPubSubConfig {
        base_url: Some(format!("ws://{addr}/")),
        auth_token: Some(auth_token.to_string()),
        ping_interval_secs: Some(1),
        ..Default::default()
    }
}

async fn wait_for_diagnostics<F>(client: &TwitchPubSub, check: F)
where
    F: Fn(&DiagnosticsSnapshot) -> bool,
{
    wait_until_async(
        || {
            let ready = check(&client.diagnostics());
            async move { ready }
        },
        Duration::from_secs(5),
    )
    .await;
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_channel_points_redemption_is_dispatched() {
    let (addr, state) = start_test_server().await;
    let mut client = TwitchPubSub::new(test_config(addr, "token")).unwrap();
    let mut dispatch_rx = client.take_dispatch_receiver().unwrap();
    client.start().unwrap();

    client.listen_to_channel_points("22").unwrap();

    let dispatch = tokio::time::timeout(Duration::from_secs(5), dispatch_rx.recv())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(dispatch.topic_kind, TwitchTopicKind::CommunityPointsChannel);
    assert_eq!(dispatch.channel_id.as_str(), "22");
    assert_eq!(dispatch.kind.as_str(), "reward-redeemed");
    assert_eq!(dispatch.redemption().unwrap()["id"], "redemption-1");

    wait_for_diagnostics(&client, |d| d.subscribe_acks_ok == 1).await;
    assert_eq!(
        *state.listens.lock().await,
        vec![(1, "community-points-channel-v1.22".to_string(), None)]
    );

    client.stop();
    assert_eq!(client.state(), ManagerState::Stopped);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_user_scoped_listen_sends_token() {
    let (addr, state) = start_test_server().await;
    let mut client = TwitchPubSub::new(test_config(addr, "token")).unwrap();
    client.start().unwrap();

    client.listen_to_automod("11", "22").unwrap();
    wait_for_diagnostics(&client, |d| d.subscribe_acks_ok == 1).await;

    assert_eq!(
        *state.listens.lock().await,
        vec![(
            1,
            "automod-queue.11.22".to_string(),
            Some("token".to_string())
        )]
    );

    client.stop();
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_token_switch_applies_to_later_listens() {
    let (addr, state) = start_test_server().await;
    let mut client = TwitchPubSub::new(test_config(addr, "token")).unwrap();
    client.start().unwrap();

    client.listen_to_automod("11", "22").unwrap();
    wait_for_diagnostics(&client, |d| d.subscribe_acks_ok == 1).await;

    client.set_auth_token(Some("token2".to_string()));
    client.listen_to_low_trust_users("11", "22").unwrap();
    wait_for_diagnostics(&client, |d| d.subscribe_acks_ok == 2).await;

    assert_eq!(
        *state.listens.lock().await,
        vec![
            (
                1,
                "automod-queue.11.22".to_string(),
                Some("token".to_string())
            ),
            (
                1,
                "low-trust-users.11.22".to_string(),
                Some("token2".to_string())
            ),
        ]
    );

    client.stop();
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rejected_listen_counts_failed_ack() {
    let (addr, _state) = start_test_server().await;
    let mut client = TwitchPubSub::new(test_config(addr, "bad")).unwrap();
    client.start().unwrap();

    client.listen_to_low_trust_users("11", "22").unwrap();
    wait_for_diagnostics(&client, |d| d.subscribe_acks_failed == 1).await;

    assert_eq!(client.diagnostics().subscribe_acks_ok, 0);

    client.stop();
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unlisten_round_trip() {
    let (addr, state) = start_test_server().await;
    let mut client = TwitchPubSub::new(test_config(addr, "token")).unwrap();
    client.start().unwrap();

    client.listen_to_channel_moderation_actions("11", "22").unwrap();
    wait_for_diagnostics(&client, |d| d.subscribe_acks_ok == 1).await;

    client.unlisten_channel_moderation_actions().unwrap();
    wait_for_diagnostics(&client, |d| d.unsubscribe_acks_ok == 1).await;

    assert_eq!(
        *state.unlistens.lock().await,
        vec!["chat_moderator_actions.11.22".to_string()]
    );
    assert!(client.listened_topics().is_empty());

    client.stop();
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_topics_are_sharded_across_connections() {
    let (addr, state) = start_test_server().await;
    let config = test_config(addr, "token");
    let protocol =
        TwitchPubSubProtocol::new(config.auth_token.clone(), config.ping_interval())
            .with_max_listens(2);
    let mut client = TwitchPubSub::with_protocol(config, protocol).unwrap();
    client.start().unwrap();

    for channel_id in ["1", "2", "3"] {
        client.listen(TwitchTopic::community_points(channel_id)).unwrap();
    }
    wait_for_diagnostics(&client, |d| d.subscribe_acks_ok == 3).await;

    assert_eq!(state.connection_count.load(Ordering::SeqCst), 2);
    assert_eq!(client.diagnostics().connections_opened, 2);

    client.stop();
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_pong_reconnects_and_relistens() {
    let (addr, state) = start_test_server().await;
    state.ignore_pings.store(true, Ordering::SeqCst);
    let mut client = TwitchPubSub::new(test_config(addr, "token")).unwrap();
    client.start().unwrap();

    client.listen_to_channel_points("22").unwrap();

    wait_until_async(
        || {
            let state = state.clone();
            async move { state.listens.lock().await.len() >= 2 }
        },
        Duration::from_secs(5),
    )
    .await;

    let listens = state.listens.lock().await.clone();
    assert_eq!(listens[0].0, 1);
    assert_eq!(listens[1].0, 2);
    assert_eq!(listens[1].1, "community-points-channel-v1.22");
    assert!(state.pings.load(Ordering::SeqCst) >= 1);
    assert!(client.diagnostics().connections_closed >= 1);

    client.stop();
}
