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

//! Stub protocol types for unit tests.

use std::{
    fmt::Display,
    time::{Duration, Instant},
};

use anyhow::Context;
use liveupdates_network::{ConnectionHandle, ConnectionId};

use crate::{
    client::{AckKind, ClientHandler, Inbound, Liveness},
    protocol::PubSubProtocol,
    subscription::Subscription,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestTopic(String);

impl TestTopic {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl Display for TestTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Subscription for TestTopic {
    fn encode_subscribe(&self) -> String {
        serde_json::json!({"type": "sub", "topic": self.0}).to_string()
    }

    fn encode_unsubscribe(&self) -> String {
        serde_json::json!({"type": "unsub", "topic": self.0}).to_string()
    }
}

/// Treats the connection as dead once no heartbeat arrived for twice the interval.
#[derive(Debug)]
pub struct TestHandler {
    interval: Duration,
    last_heartbeat: Option<Instant>,
}

impl TestHandler {
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_heartbeat: None,
        }
    }
}

impl ClientHandler for TestHandler {
    type Subscription = TestTopic;
    type Dispatch = (String, String);

    fn on_start(&mut self, _connection: &ConnectionHandle, now: Instant) -> Option<Duration> {
        self.last_heartbeat = Some(now);
        Some(self.interval)
    }

    fn check_liveness(&mut self, _connection: &ConnectionHandle, now: Instant) -> Liveness {
        let last = self.last_heartbeat.unwrap_or(now);
        if now.saturating_duration_since(last) > self.interval * 2 {
            Liveness::Expired {
                reason: "no heartbeat".to_string(),
            }
        } else {
            Liveness::Alive {
                next_check: self.interval,
            }
        }
    }

    fn decode(&mut self, text: &str, now: Instant) -> anyhow::Result<Inbound<Self::Dispatch>> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let kind = value["type"].as_str().context("missing type")?;

        let inbound = match kind {
            "ack" => Inbound::Ack {
                kind: if value["op"] == "unsub" {
                    AckKind::Unsubscribe
                } else {
                    AckKind::Subscribe
                },
                success: value["ok"].as_bool().unwrap_or(false),
            },
            "hb" => {
                self.last_heartbeat = Some(now);
                Inbound::Heartbeat
            }
            "data" => Inbound::Dispatch((
                value["topic"].as_str().unwrap_or_default().to_string(),
                value["payload"].as_str().unwrap_or_default().to_string(),
            )),
            "reconnect" => Inbound::Reconnect,
            _ => Inbound::Ignored,
        };

        Ok(inbound)
    }
}

#[derive(Debug)]
pub struct TestProtocol {
    pub capacity: usize,
    pub interval: Duration,
}

impl TestProtocol {
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            interval: Duration::from_secs(10),
        }
    }
}

impl PubSubProtocol for TestProtocol {
    type Handler = TestHandler;

    fn max_subscriptions(&self) -> usize {
        self.capacity
    }

    fn create_handler(&self, _id: ConnectionId) -> Self::Handler {
        TestHandler::new(self.interval)
    }
}
