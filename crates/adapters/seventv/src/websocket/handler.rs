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

//! Per-connection protocol handling for the 7TV EventAPI.

use std::{
    str::FromStr,
    time::{Duration, Instant},
};

use liveupdates_network::{ConnectionHandle, ConnectionId};
use liveupdates_pubsub::{AckKind, ClientHandler, Inbound, Liveness, PubSubProtocol};

use crate::{
    common::consts::{SEVENTV_HEARTBEAT_TIMEOUT_FACTOR, SEVENTV_MAX_SUBSCRIPTIONS},
    websocket::{
        enums::{SeventvOpcode, SeventvSubscriptionType},
        messages::{
            SeventvAckPayload, SeventvDispatch, SeventvDispatchPayload, SeventvEndOfStreamPayload,
            SeventvErrorPayload, SeventvHelloPayload, SeventvWsFrame,
        },
        subscription::SeventvSubscription,
    },
};

/// Tracks server heartbeats for one EventAPI connection.
#[derive(Debug)]
pub struct SeventvHandler {
    id: ConnectionId,
    heartbeat_interval: Duration,
    last_heartbeat: Instant,
    session_id: Option<String>,
}

impl SeventvHandler {
    /// Creates a new [`SeventvHandler`] instance.
    #[must_use]
    pub fn new(id: ConnectionId, heartbeat_interval: Duration) -> Self {
        Self {
            id,
            heartbeat_interval,
            last_heartbeat: Instant::now(),
            session_id: None,
        }
    }

    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    /// Returns the session id announced by the server's Hello.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn heartbeat_timeout(&self) -> Duration {
        self.heartbeat_interval * SEVENTV_HEARTBEAT_TIMEOUT_FACTOR
    }

    fn handle_hello(&mut self, frame: SeventvWsFrame, now: Instant) -> anyhow::Result<()> {
        let hello: SeventvHelloPayload = serde_json::from_value(frame.d)?;
        tracing::debug!(
            "Hello on {}: heartbeat every {}ms",
            self.id,
            hello.heartbeat_interval
        );

        // A zero interval would reschedule the liveness check in a busy loop
        if hello.heartbeat_interval == 0 {
            tracing::warn!(
                "Ignoring zero heartbeat interval on {}, keeping {:?}",
                self.id,
                self.heartbeat_interval
            );
        } else {
            self.heartbeat_interval = Duration::from_millis(hello.heartbeat_interval);
        }
        self.session_id = hello.session_id;
        self.last_heartbeat = now;
        Ok(())
    }

    fn handle_ack(&self, frame: SeventvWsFrame) -> anyhow::Result<Inbound<SeventvDispatch>> {
        let ack: SeventvAckPayload = serde_json::from_value(frame.d)?;

        let kind = match ack.command.as_str() {
            "SUBSCRIBE" => AckKind::Subscribe,
            "UNSUBSCRIBE" => AckKind::Unsubscribe,
            other => {
                tracing::trace!("Ack for {other} on {}", self.id);
                return Ok(Inbound::Ignored);
            }
        };

        tracing::debug!("{kind} acknowledged on {}: {}", self.id, ack.data);
        Ok(Inbound::Ack {
            kind,
            success: true,
        })
    }

    fn handle_dispatch(&self, frame: SeventvWsFrame) -> anyhow::Result<Inbound<SeventvDispatch>> {
        let payload: SeventvDispatchPayload = serde_json::from_value(frame.d)?;

        let Ok(kind) = SeventvSubscriptionType::from_str(&payload.kind) else {
            tracing::debug!("Unknown dispatch type {} on {}", payload.kind, self.id);
            return Ok(Inbound::Ignored);
        };

        Ok(Inbound::Dispatch(SeventvDispatch::new(kind, payload.body)))
    }
}

impl ClientHandler for SeventvHandler {
    type Subscription = SeventvSubscription;
    type Dispatch = SeventvDispatch;

    fn on_start(&mut self, _connection: &ConnectionHandle, now: Instant) -> Option<Duration> {
        self.last_heartbeat = now;
        Some(self.heartbeat_interval)
    }

    fn check_liveness(&mut self, _connection: &ConnectionHandle, now: Instant) -> Liveness {
        let silence = now.saturating_duration_since(self.last_heartbeat);
        if silence > self.heartbeat_timeout() {
            return Liveness::Expired {
                reason: format!("no heartbeat for {silence:?}"),
            };
        }

        Liveness::Alive {
            next_check: self.heartbeat_interval,
        }
    }

    fn decode(&mut self, text: &str, now: Instant) -> anyhow::Result<Inbound<SeventvDispatch>> {
        let frame: SeventvWsFrame = serde_json::from_str(text)?;

        let inbound = match frame.op {
            SeventvOpcode::Hello => {
                self.handle_hello(frame, now)?;
                Inbound::Heartbeat
            }
            SeventvOpcode::Heartbeat => {
                self.last_heartbeat = now;
                Inbound::Heartbeat
            }
            SeventvOpcode::Ack => self.handle_ack(frame)?,
            SeventvOpcode::Dispatch => self.handle_dispatch(frame)?,
            SeventvOpcode::Reconnect => Inbound::Reconnect,
            SeventvOpcode::EndOfStream => {
                let end: SeventvEndOfStreamPayload =
                    serde_json::from_value(frame.d).unwrap_or_default();
                tracing::debug!("End of stream on {}: {} {}", self.id, end.code, end.message);
                Inbound::Reconnect
            }
            SeventvOpcode::Error => {
                let error: SeventvErrorPayload =
                    serde_json::from_value(frame.d).unwrap_or_default();
                tracing::warn!("Error on {}: {} {}", self.id, error.message, error.fields);
                Inbound::Ignored
            }
            SeventvOpcode::Identify
            | SeventvOpcode::Resume
            | SeventvOpcode::Subscribe
            | SeventvOpcode::Unsubscribe
            | SeventvOpcode::Signal => {
                tracing::debug!("Unhandled op {} on {}", frame.op, self.id);
                Inbound::Ignored
            }
        };

        Ok(inbound)
    }
}

/// Creates a [`SeventvHandler`] for every connection of the pool.
#[derive(Clone, Debug)]
pub struct SeventvEventApiProtocol {
    heartbeat_interval: Duration,
    max_subscriptions: usize,
}

impl SeventvEventApiProtocol {
    /// Creates a new [`SeventvEventApiProtocol`] instance.
    #[must_use]
    pub const fn new(heartbeat_interval: Duration) -> Self {
        Self {
            heartbeat_interval,
            max_subscriptions: SEVENTV_MAX_SUBSCRIPTIONS,
        }
    }

    /// Overrides the per-connection subscription limit.
    #[must_use]
    pub const fn with_max_subscriptions(mut self, max_subscriptions: usize) -> Self {
        self.max_subscriptions = max_subscriptions;
        self
    }
}

impl PubSubProtocol for SeventvEventApiProtocol {
    type Handler = SeventvHandler;

    fn max_subscriptions(&self) -> usize {
        self.max_subscriptions
    }

    fn create_handler(&self, id: ConnectionId) -> Self::Handler {
        SeventvHandler::new(id, self.heartbeat_interval)
    }
}
