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

//! Per-connection protocol handling for Twitch PubSub.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use ahash::AHashMap;
use anyhow::Context;
use arc_swap::ArcSwapOption;
use liveupdates_network::{ConnectionHandle, ConnectionId};
use liveupdates_pubsub::{AckKind, ClientHandler, Inbound, Liveness, PubSubProtocol};
use ustr::Ustr;

use crate::{
    common::consts::TWITCH_MAX_LISTENS,
    websocket::{
        enums::TwitchWsMessageType,
        messages::{TwitchDispatch, TwitchInnerMessage, TwitchWsFrame, TwitchWsRequest},
        topic::TwitchTopic,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingRequest {
    kind: AckKind,
    topic: TwitchTopic,
}

/// Handles LISTEN/UNLISTEN correlation and the PING/PONG cycle for one connection.
pub struct TwitchHandler {
    id: ConnectionId,
    auth_token: Arc<ArcSwapOption<String>>,
    ping_interval: Duration,
    awaiting_pong: bool,
    pending: AHashMap<String, PendingRequest>,
}

impl std::fmt::Debug for TwitchHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(TwitchHandler))
            .field("id", &self.id)
            .field("authenticated", &self.auth_token.load().is_some())
            .field("ping_interval", &self.ping_interval)
            .field("awaiting_pong", &self.awaiting_pong)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl TwitchHandler {
    /// Creates a new [`TwitchHandler`] instance.
    ///
    /// The token is read from `auth_token` whenever a request is encoded.
    #[must_use]
    pub fn new(
        id: ConnectionId,
        auth_token: Arc<ArcSwapOption<String>>,
        ping_interval: Duration,
    ) -> Self {
        Self {
            id,
            auth_token,
            ping_interval,
            awaiting_pong: false,
            pending: AHashMap::new(),
        }
    }

    #[must_use]
    pub const fn is_awaiting_pong(&self) -> bool {
        self.awaiting_pong
    }

    /// Returns the number of requests still waiting for a RESPONSE.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn track(&mut self, request: TwitchWsRequest, kind: AckKind, topic: TwitchTopic) -> String {
        let frame = request.to_json();
        if let Some(nonce) = request.nonce {
            self.pending.insert(nonce, PendingRequest { kind, topic });
        }
        frame
    }

    fn ping(&mut self, connection: &ConnectionHandle) {
        tracing::trace!("Sending PING on {}", self.id);
        self.awaiting_pong = true;
        if !connection.send_text(TwitchWsRequest::ping().to_json()) {
            tracing::debug!("PING on {} not delivered, connection closing", self.id);
        }
    }

    fn handle_response(&mut self, frame: TwitchWsFrame) -> Inbound<TwitchDispatch> {
        let Some(nonce) = frame.nonce else {
            tracing::warn!("RESPONSE without nonce on {}", self.id);
            return Inbound::Ignored;
        };

        let Some(request) = self.pending.remove(&nonce) else {
            tracing::warn!("RESPONSE with unknown nonce {nonce} on {}", self.id);
            return Inbound::Ignored;
        };

        let error = frame.error.unwrap_or_default();
        let success = error.is_empty();
        if success {
            tracing::debug!("{} {} acknowledged", request.kind, request.topic);
        } else {
            tracing::warn!("{} {} failed: {error}", request.kind, request.topic);
        }

        Inbound::Ack {
            kind: request.kind,
            success,
        }
    }

    fn handle_message(frame: TwitchWsFrame) -> anyhow::Result<Inbound<TwitchDispatch>> {
        let data = frame.data.context("MESSAGE without data")?;
        let topic = data.topic;

        let (Some(topic_kind), Some(channel_id)) = (topic.kind(), topic.channel_id()) else {
            tracing::warn!("Message on unknown topic {topic}");
            return Ok(Inbound::Ignored);
        };

        let inner: TwitchInnerMessage = serde_json::from_str(&data.message)
            .with_context(|| format!("Invalid inner message on {topic}"))?;

        Ok(Inbound::Dispatch(TwitchDispatch {
            topic,
            topic_kind,
            channel_id: Ustr::from(channel_id),
            kind: inner.kind,
            data: inner.data,
        }))
    }
}

impl ClientHandler for TwitchHandler {
    type Subscription = TwitchTopic;
    type Dispatch = TwitchDispatch;

    fn encode_subscribe(&mut self, topic: &TwitchTopic) -> String {
        let auth_token = self.auth_token.load_full();
        let request = TwitchWsRequest::listen(*topic, auth_token.as_deref().map(String::as_str));
        self.track(request, AckKind::Subscribe, *topic)
    }

    fn encode_unsubscribe(&mut self, topic: &TwitchTopic) -> String {
        let auth_token = self.auth_token.load_full();
        let request = TwitchWsRequest::unlisten(*topic, auth_token.as_deref().map(String::as_str));
        self.track(request, AckKind::Unsubscribe, *topic)
    }

    fn on_start(&mut self, connection: &ConnectionHandle, _now: Instant) -> Option<Duration> {
        self.ping(connection);
        Some(self.ping_interval)
    }

    fn check_liveness(&mut self, connection: &ConnectionHandle, _now: Instant) -> Liveness {
        if self.awaiting_pong {
            return Liveness::Expired {
                reason: format!("no PONG within {:?}", self.ping_interval),
            };
        }

        self.ping(connection);
        Liveness::Alive {
            next_check: self.ping_interval,
        }
    }

    fn decode(&mut self, text: &str, _now: Instant) -> anyhow::Result<Inbound<TwitchDispatch>> {
        let frame: TwitchWsFrame = serde_json::from_str(text)?;

        let inbound = match frame.kind {
            TwitchWsMessageType::Pong => {
                self.awaiting_pong = false;
                Inbound::Heartbeat
            }
            TwitchWsMessageType::Response => self.handle_response(frame),
            TwitchWsMessageType::Message => Self::handle_message(frame)?,
            TwitchWsMessageType::Reconnect => Inbound::Reconnect,
            TwitchWsMessageType::Listen
            | TwitchWsMessageType::Unlisten
            | TwitchWsMessageType::Ping
            | TwitchWsMessageType::Unknown => {
                tracing::debug!("Unhandled frame on {}: {text}", self.id);
                Inbound::Ignored
            }
        };

        Ok(inbound)
    }
}

/// Creates a [`TwitchHandler`] for every connection of the pool.
#[derive(Clone)]
pub struct TwitchPubSubProtocol {
    auth_token: Arc<ArcSwapOption<String>>,
    ping_interval: Duration,
    max_listens: usize,
}

impl std::fmt::Debug for TwitchPubSubProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(TwitchPubSubProtocol))
            .field("authenticated", &self.auth_token.load().is_some())
            .field("ping_interval", &self.ping_interval)
            .field("max_listens", &self.max_listens)
            .finish()
    }
}

impl TwitchPubSubProtocol {
    /// Creates a new [`TwitchPubSubProtocol`] instance.
    #[must_use]
    pub fn new(auth_token: Option<String>, ping_interval: Duration) -> Self {
        Self {
            auth_token: Arc::new(ArcSwapOption::from(auth_token.map(Arc::new))),
            ping_interval,
            max_listens: TWITCH_MAX_LISTENS,
        }
    }

    /// Overrides the per-connection topic limit.
    #[must_use]
    pub const fn with_max_listens(mut self, max_listens: usize) -> Self {
        self.max_listens = max_listens;
        self
    }

    /// Replaces the token used by every later LISTEN and UNLISTEN, on all connections.
    pub fn set_auth_token(&self, auth_token: Option<String>) {
        self.auth_token.store(auth_token.map(Arc::new));
    }

    /// Returns the token cell shared with every connection handler.
    #[must_use]
    pub fn auth_token_handle(&self) -> Arc<ArcSwapOption<String>> {
        Arc::clone(&self.auth_token)
    }
}

impl PubSubProtocol for TwitchPubSubProtocol {
    type Handler = TwitchHandler;

    fn max_subscriptions(&self) -> usize {
        self.max_listens
    }

    fn create_handler(&self, id: ConnectionId) -> Self::Handler {
        TwitchHandler::new(id, Arc::clone(&self.auth_token), self.ping_interval)
    }
}

#[cfg(test)]
mod tests {
    use liveupdates_network::WriterCommand;
    use rstest::rstest;
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::websocket::enums::TwitchTopicKind;

    fn handler() -> TwitchHandler {
        TwitchPubSubProtocol::new(Some("token".to_string()), Duration::from_secs(15))
            .create_handler(ConnectionId::new(1))
    }

    fn connection() -> (ConnectionHandle, UnboundedReceiver<WriterCommand>) {
        ConnectionHandle::channel(ConnectionId::new(1))
    }

    fn nonce_of(frame: &str) -> String {
        let value: serde_json::Value = serde_json::from_str(frame).unwrap();
        value["nonce"].as_str().unwrap().to_string()
    }

    fn token_of(frame: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(frame).unwrap();
        value["data"]["auth_token"].as_str().map(str::to_string)
    }

    fn response(nonce: &str, error: &str) -> String {
        serde_json::json!({"type": "RESPONSE", "nonce": nonce, "error": error}).to_string()
    }

    #[rstest]
    fn test_listen_is_acknowledged_by_nonce() {
        let mut handler = handler();
        let frame = handler.encode_subscribe(&TwitchTopic::automod_queue("1", "2"));
        assert_eq!(handler.pending_count(), 1);

        let inbound = handler
            .decode(&response(&nonce_of(&frame), ""), Instant::now())
            .unwrap();

        assert_eq!(
            inbound,
            Inbound::Ack {
                kind: AckKind::Subscribe,
                success: true
            }
        );
        assert_eq!(handler.pending_count(), 0);
    }

    #[rstest]
    fn test_response_error_is_failed_ack() {
        let mut handler = handler();
        let frame = handler.encode_unsubscribe(&TwitchTopic::automod_queue("1", "2"));

        let inbound = handler
            .decode(&response(&nonce_of(&frame), "ERR_BADAUTH"), Instant::now())
            .unwrap();

        assert_eq!(
            inbound,
            Inbound::Ack {
                kind: AckKind::Unsubscribe,
                success: false
            }
        );
    }

    #[rstest]
    fn test_unknown_nonce_is_ignored() {
        let mut handler = handler();

        let inbound = handler
            .decode(&response("not-a-nonce", ""), Instant::now())
            .unwrap();

        assert_eq!(inbound, Inbound::Ignored);
    }

    #[rstest]
    fn test_ping_pong_cycle() {
        let mut handler = handler();
        let (connection, mut rx) = connection();
        let now = Instant::now();

        assert_eq!(handler.on_start(&connection, now), Some(Duration::from_secs(15)));
        assert!(handler.is_awaiting_pong());
        assert!(matches!(rx.try_recv(), Ok(WriterCommand::Send(_))));

        assert_eq!(
            handler.decode(r#"{"type":"PONG"}"#, now).unwrap(),
            Inbound::Heartbeat
        );
        assert_eq!(
            handler.check_liveness(&connection, now),
            Liveness::Alive {
                next_check: Duration::from_secs(15)
            }
        );
        assert!(matches!(rx.try_recv(), Ok(WriterCommand::Send(_))));

        // No PONG for the second PING
        assert!(matches!(
            handler.check_liveness(&connection, now),
            Liveness::Expired { .. }
        ));
    }

    #[rstest]
    fn test_message_decodes_dispatch() {
        let mut handler = handler();
        let inner = serde_json::json!({
            "type": "moderation_action",
            "data": {"moderation_action": "ban", "target_user_id": "33"}
        });
        let text = serde_json::json!({
            "type": "MESSAGE",
            "data": {"topic": "chat_moderator_actions.1.2", "message": inner.to_string()}
        })
        .to_string();

        let Inbound::Dispatch(dispatch) = handler.decode(&text, Instant::now()).unwrap() else {
            panic!("expected dispatch");
        };

        assert_eq!(dispatch.topic_kind, TwitchTopicKind::ChatModeratorActions);
        assert_eq!(dispatch.channel_id.as_str(), "2");
        assert_eq!(dispatch.kind.as_str(), "moderation_action");
        assert_eq!(dispatch.moderation_action(), Some("ban"));
        assert_eq!(dispatch.redemption(), None);
    }

    #[rstest]
    fn test_message_with_malformed_inner_is_error() {
        let mut handler = handler();
        let text = r#"{"type":"MESSAGE","data":{"topic":"automod-queue.1.2","message":"{oops"}}"#;

        assert!(handler.decode(text, Instant::now()).is_err());
    }

    #[rstest]
    #[case(r#"{"type":"RECONNECT"}"#, Inbound::Reconnect)]
    #[case(r#"{"type":"WHISPER"}"#, Inbound::Ignored)]
    #[case(r#"{"type":"MESSAGE","data":{"topic":"whispers.1","message":"{}"}}"#, Inbound::Ignored)]
    fn test_control_frames(#[case] text: &str, #[case] expected: Inbound<TwitchDispatch>) {
        assert_eq!(handler().decode(text, Instant::now()).unwrap(), expected);
    }

    #[rstest]
    fn test_token_change_applies_to_existing_handlers() {
        let protocol =
            TwitchPubSubProtocol::new(Some("token".to_string()), Duration::from_secs(15));
        let mut first = protocol.create_handler(ConnectionId::new(1));
        let topic = TwitchTopic::automod_queue("1", "2");

        assert_eq!(token_of(&first.encode_subscribe(&topic)), Some("token".to_string()));

        protocol.set_auth_token(Some("token2".to_string()));
        let mut second = protocol.create_handler(ConnectionId::new(2));

        assert_eq!(token_of(&first.encode_subscribe(&topic)), Some("token2".to_string()));
        assert_eq!(token_of(&second.encode_unsubscribe(&topic)), Some("token2".to_string()));

        protocol.set_auth_token(None);
        assert_eq!(token_of(&first.encode_subscribe(&topic)), None);
    }

    #[rstest]
    fn test_protocol_capacity() {
        let protocol = TwitchPubSubProtocol::new(None, Duration::from_secs(15));
        assert_eq!(protocol.max_subscriptions(), TWITCH_MAX_LISTENS);
        assert_eq!(protocol.with_max_listens(2).max_subscriptions(), 2);
    }
}
