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

//! Per-connection subscription bookkeeping.
//!
//! A [`PubSubClient`] owns exactly one live connection and the bounded set of
//! subscriptions assigned to it. Protocol specifics (frame encoding, liveness,
//! decoding inbound frames) are delegated to a [`ClientHandler`].

use std::{
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};

use indexmap::IndexSet;
use liveupdates_common::logging::{RECV, SEND};
use liveupdates_network::{CloseCode, ConnectionHandle, ConnectionId};
use strum::{AsRefStr, Display};

use crate::{diagnostics::PubSubDiagnostics, subscription::Subscription};

/// Which kind of request an acknowledgement answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum AckKind {
    Subscribe,
    Unsubscribe,
}

/// An inbound frame after protocol decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Inbound<D> {
    /// Acknowledgement of an earlier subscribe or unsubscribe request.
    Ack { kind: AckKind, success: bool },
    /// A keep-alive from the server (heartbeat or pong).
    Heartbeat,
    /// A business payload to forward to the application.
    Dispatch(D),
    /// The server asked the client to move to a new connection.
    Reconnect,
    /// A well-formed frame which needs no action.
    Ignored,
}

/// Result of a periodic liveness check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Liveness {
    /// The connection is healthy; check again after `next_check`.
    Alive { next_check: Duration },
    /// The server went quiet for too long; the connection should be closed.
    Expired { reason: String },
}

/// Protocol strategy for a single connection.
pub trait ClientHandler: Send + 'static {
    type Subscription: Subscription;
    type Dispatch: Debug + Send + 'static;

    /// Encodes a subscribe frame; override to attach per-request data such as a nonce.
    fn encode_subscribe(&mut self, subscription: &Self::Subscription) -> String {
        subscription.encode_subscribe()
    }

    /// Encodes an unsubscribe frame; override to attach per-request data such as a nonce.
    fn encode_unsubscribe(&mut self, subscription: &Self::Subscription) -> String {
        subscription.encode_unsubscribe()
    }

    /// Called once when the client starts; returns the delay until the first liveness check.
    fn on_start(&mut self, connection: &ConnectionHandle, now: Instant) -> Option<Duration>;

    /// Periodic liveness check, invoked only while the client is started.
    fn check_liveness(&mut self, connection: &ConnectionHandle, now: Instant) -> Liveness;

    /// Decodes an inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is malformed.
    fn decode(&mut self, text: &str, now: Instant) -> anyhow::Result<Inbound<Self::Dispatch>>;
}

/// Reason sent with close frames initiated by a liveness failure.
pub const LIVENESS_CLOSE_REASON: &str = "Heartbeat timed out";

/// Reason sent with close frames initiated on the server's request.
pub const RECONNECT_CLOSE_REASON: &str = "Server requested reconnect";

/// Owns one live connection and the subscriptions assigned to it.
pub struct PubSubClient<H: ClientHandler> {
    connection: ConnectionHandle,
    handler: H,
    subscriptions: IndexSet<H::Subscription>,
    capacity: usize,
    started: bool,
    diagnostics: Arc<PubSubDiagnostics>,
}

impl<H: ClientHandler> Debug for PubSubClient<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(PubSubClient))
            .field("id", &self.connection.id())
            .field("subscriptions", &self.subscriptions)
            .field("capacity", &self.capacity)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

impl<H: ClientHandler> PubSubClient<H> {
    /// Creates a new [`PubSubClient`] bound to `connection`.
    #[must_use]
    pub fn new(
        connection: ConnectionHandle,
        handler: H,
        capacity: usize,
        diagnostics: Arc<PubSubDiagnostics>,
    ) -> Self {
        Self {
            connection,
            handler,
            subscriptions: IndexSet::new(),
            capacity,
            started: false,
            diagnostics,
        }
    }

    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.connection.id()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    #[must_use]
    pub fn has_capacity(&self) -> bool {
        self.subscriptions.len() < self.capacity
    }

    #[must_use]
    pub fn contains(&self, subscription: &H::Subscription) -> bool {
        self.subscriptions.contains(subscription)
    }

    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    #[must_use]
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    /// Adds `subscription` and sends its subscribe frame.
    ///
    /// Returns `true` if the subscription is now (or already was) held, `false`
    /// only when the client is full and the subscription is new.
    pub fn subscribe(&mut self, subscription: H::Subscription) -> bool {
        if self.subscriptions.contains(&subscription) {
            return true;
        }

        if !self.has_capacity() {
            return false;
        }

        let frame = self.handler.encode_subscribe(&subscription);
        tracing::debug!("Subscribing to {subscription} on {}", self.id());
        tracing::trace!("{SEND} {frame}");
        if !self.connection.send_text(frame) {
            tracing::debug!("Subscribe frame for {subscription} not delivered, connection closing");
        }

        self.subscriptions.insert(subscription);
        self.diagnostics.record_subscribe_sent();
        true
    }

    /// Removes `subscription` and sends its unsubscribe frame.
    ///
    /// Returns `false` without sending anything when it is not held.
    pub fn unsubscribe(&mut self, subscription: &H::Subscription) -> bool {
        if !self.subscriptions.shift_remove(subscription) {
            return false;
        }

        let frame = self.handler.encode_unsubscribe(subscription);
        tracing::debug!("Unsubscribing from {subscription} on {}", self.id());
        tracing::trace!("{SEND} {frame}");
        if !self.connection.send_text(frame) {
            tracing::debug!("Unsubscribe frame for {subscription} not delivered, connection closing");
        }

        self.diagnostics.record_unsubscribe_sent();
        true
    }

    /// Returns a snapshot of the held subscriptions in assignment order.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<H::Subscription> {
        self.subscriptions.iter().cloned().collect()
    }

    /// Consumes the client, returning its subscriptions for redistribution.
    #[must_use]
    pub fn into_subscriptions(self) -> Vec<H::Subscription> {
        self.subscriptions.into_iter().collect()
    }

    /// Starts the client, returning the delay until the first liveness check.
    pub fn start(&mut self, now: Instant) -> Option<Duration> {
        if self.started {
            tracing::error!("Client {} started twice", self.id());
            debug_assert!(!self.started, "client started twice");
            return None;
        }

        self.started = true;
        self.handler.on_start(&self.connection, now)
    }

    /// Stops the client; pending liveness checks become no-ops.
    pub fn stop(&mut self) {
        self.started = false;
    }

    /// Runs the liveness check, returning the delay until the next one.
    ///
    /// Returns `None` once the client is stopped or the connection was closed
    /// for going quiet, which ends the check cycle.
    pub fn check_liveness(&mut self, now: Instant) -> Option<Duration> {
        if !self.started {
            return None;
        }

        match self.handler.check_liveness(&self.connection, now) {
            Liveness::Alive { next_check } => Some(next_check),
            Liveness::Expired { reason } => {
                tracing::warn!("Connection {} is not alive: {reason}", self.id());
                self.close(CloseCode::Away, LIVENESS_CLOSE_REASON);
                None
            }
        }
    }

    /// Decodes an inbound frame, updating counters; returns a business payload if any.
    pub fn handle_message(&mut self, text: &str, now: Instant) -> Option<H::Dispatch> {
        self.diagnostics.record_message_received();
        tracing::trace!("{RECV} {text}");

        let inbound = match self.handler.decode(text, now) {
            Ok(inbound) => inbound,
            Err(e) => {
                self.diagnostics.record_message_failed_to_parse();
                tracing::warn!("Failed to parse message on {}: {e}: {text}", self.id());
                return None;
            }
        };

        match inbound {
            Inbound::Ack {
                kind: AckKind::Subscribe,
                success,
            } => self.diagnostics.record_subscribe_ack(success),
            Inbound::Ack {
                kind: AckKind::Unsubscribe,
                success,
            } => self.diagnostics.record_unsubscribe_ack(success),
            Inbound::Heartbeat => tracing::trace!("Heartbeat on {}", self.id()),
            Inbound::Dispatch(dispatch) => return Some(dispatch),
            Inbound::Reconnect => {
                tracing::debug!("Server requested reconnect on {}", self.id());
                self.close(CloseCode::Normal, RECONNECT_CLOSE_REASON);
            }
            Inbound::Ignored => {}
        }

        None
    }

    /// Actively closes the underlying connection.
    pub fn close(&self, code: CloseCode, reason: &str) -> bool {
        self.connection.close(code, reason)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use liveupdates_network::WriterCommand;
    use rstest::rstest;
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::stubs::{TestHandler, TestTopic};

    fn test_client(capacity: usize) -> (PubSubClient<TestHandler>, UnboundedReceiver<WriterCommand>) {
        let (handle, rx) = ConnectionHandle::channel(ConnectionId::new(1));
        let client = PubSubClient::new(
            handle,
            TestHandler::new(Duration::from_secs(10)),
            capacity,
            Arc::new(PubSubDiagnostics::new()),
        );
        (client, rx)
    }

    fn sent_frames(rx: &mut UnboundedReceiver<WriterCommand>) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(command) = rx.try_recv() {
            if let WriterCommand::Send(msg) = command {
                frames.push(msg.to_text().unwrap().to_string());
            }
        }
        frames
    }

    fn close_count(rx: &mut UnboundedReceiver<WriterCommand>) -> usize {
        let mut count = 0;
        while let Ok(command) = rx.try_recv() {
            if matches!(command, WriterCommand::Close(_)) {
                count += 1;
            }
        }
        count
    }

    #[rstest]
    fn test_subscribe_respects_capacity() {
        let (mut client, mut rx) = test_client(2);

        assert!(client.subscribe(TestTopic::new("a")));
        assert!(client.subscribe(TestTopic::new("b")));
        assert!(!client.subscribe(TestTopic::new("c")));

        assert_eq!(client.len(), 2);
        assert!(!client.has_capacity());
        assert_eq!(
            sent_frames(&mut rx),
            vec![
                TestTopic::new("a").encode_subscribe(),
                TestTopic::new("b").encode_subscribe(),
            ]
        );
    }

    #[rstest]
    fn test_duplicate_subscribe_is_silent_success() {
        let (mut client, mut rx) = test_client(1);

        assert!(client.subscribe(TestTopic::new("a")));
        assert!(client.subscribe(TestTopic::new("a")));

        assert_eq!(sent_frames(&mut rx).len(), 1);
        assert_eq!(client.diagnostics.snapshot().subscribe_frames_sent, 1);
    }

    #[rstest]
    fn test_unsubscribe_only_sends_when_held() {
        let (mut client, mut rx) = test_client(5);
        client.subscribe(TestTopic::new("a"));
        let _ = sent_frames(&mut rx);

        assert!(!client.unsubscribe(&TestTopic::new("missing")));
        assert!(sent_frames(&mut rx).is_empty());

        assert!(client.unsubscribe(&TestTopic::new("a")));
        assert_eq!(
            sent_frames(&mut rx),
            vec![TestTopic::new("a").encode_unsubscribe()]
        );
        assert!(client.is_empty());
    }

    #[rstest]
    fn test_subscriptions_snapshot_keeps_order() {
        let (mut client, _rx) = test_client(5);
        for name in ["c", "a", "b"] {
            client.subscribe(TestTopic::new(name));
        }
        client.unsubscribe(&TestTopic::new("a"));

        assert_eq!(
            client.subscriptions(),
            vec![TestTopic::new("c"), TestTopic::new("b")]
        );
        assert_eq!(
            client.into_subscriptions(),
            vec![TestTopic::new("c"), TestTopic::new("b")]
        );
    }

    #[rstest]
    fn test_liveness_stops_after_stop() {
        let (mut client, mut rx) = test_client(1);
        let now = Instant::now();

        assert_eq!(client.start(now), Some(Duration::from_secs(10)));
        assert_eq!(
            client.check_liveness(now + Duration::from_secs(1)),
            Some(Duration::from_secs(10))
        );

        client.stop();

        // Far past the expiry: a stopped client must neither reschedule nor close
        assert_eq!(client.check_liveness(now + Duration::from_secs(600)), None);
        assert_eq!(close_count(&mut rx), 0);
    }

    #[rstest]
    fn test_liveness_expiry_closes_connection() {
        let (mut client, mut rx) = test_client(1);
        let now = Instant::now();
        client.start(now);

        assert_eq!(client.check_liveness(now + Duration::from_secs(60)), None);
        assert_eq!(close_count(&mut rx), 1);
    }

    #[rstest]
    fn test_heartbeat_extends_liveness() {
        let (mut client, mut rx) = test_client(1);
        let now = Instant::now();
        client.start(now);

        client.handle_message(r#"{"type":"hb"}"#, now + Duration::from_secs(15));

        assert!(client.check_liveness(now + Duration::from_secs(30)).is_some());
        assert_eq!(close_count(&mut rx), 0);
    }

    #[rstest]
    fn test_handle_message_counts_acks_and_dispatches() {
        let (mut client, _rx) = test_client(1);
        let now = Instant::now();

        assert_eq!(
            client.handle_message(r#"{"type":"ack","op":"sub","ok":true}"#, now),
            None
        );
        client.handle_message(r#"{"type":"ack","op":"sub","ok":false}"#, now);
        client.handle_message(r#"{"type":"ack","op":"unsub","ok":true}"#, now);
        let dispatch = client.handle_message(r#"{"type":"data","topic":"a","payload":"x"}"#, now);
        client.handle_message("not json", now);

        assert_eq!(dispatch, Some(("a".to_string(), "x".to_string())));
        let snapshot = client.diagnostics.snapshot();
        assert_eq!(snapshot.messages_received, 5);
        assert_eq!(snapshot.messages_failed_to_parse, 1);
        assert_eq!(snapshot.subscribe_acks_ok, 1);
        assert_eq!(snapshot.subscribe_acks_failed, 1);
        assert_eq!(snapshot.unsubscribe_acks_ok, 1);
    }

    #[rstest]
    fn test_reconnect_request_closes_connection() {
        let (mut client, mut rx) = test_client(1);

        client.handle_message(r#"{"type":"reconnect"}"#, Instant::now());

        assert_eq!(close_count(&mut rx), 1);
    }
}
