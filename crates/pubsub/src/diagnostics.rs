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

//! Operational counters for a pub/sub manager.
//!
//! Counters are updated on the manager's event loop and may be read from any
//! thread, so every field is atomic.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct PubSubDiagnostics {
    connections_opened: AtomicU64,
    connections_closed: AtomicU64,
    connections_failed: AtomicU64,
    messages_received: AtomicU64,
    messages_failed_to_parse: AtomicU64,
    subscribe_frames_sent: AtomicU64,
    unsubscribe_frames_sent: AtomicU64,
    subscribe_acks_ok: AtomicU64,
    subscribe_acks_failed: AtomicU64,
    unsubscribe_acks_ok: AtomicU64,
    unsubscribe_acks_failed: AtomicU64,
    backlog: AtomicU64,
}

/// A point-in-time copy of [`PubSubDiagnostics`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsSnapshot {
    pub connections_opened: u64,
    pub connections_closed: u64,
    pub connections_failed: u64,
    pub messages_received: u64,
    pub messages_failed_to_parse: u64,
    pub subscribe_frames_sent: u64,
    pub unsubscribe_frames_sent: u64,
    pub subscribe_acks_ok: u64,
    pub subscribe_acks_failed: u64,
    pub unsubscribe_acks_ok: u64,
    pub unsubscribe_acks_failed: u64,
    pub backlog: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl PubSubDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connection_opened(&self) {
        bump(&self.connections_opened);
    }

    pub fn record_connection_closed(&self) {
        bump(&self.connections_closed);
    }

    pub fn record_connection_failed(&self) {
        bump(&self.connections_failed);
    }

    pub fn record_message_received(&self) {
        bump(&self.messages_received);
    }

    pub fn record_message_failed_to_parse(&self) {
        bump(&self.messages_failed_to_parse);
    }

    pub fn record_subscribe_sent(&self) {
        bump(&self.subscribe_frames_sent);
    }

    pub fn record_unsubscribe_sent(&self) {
        bump(&self.unsubscribe_frames_sent);
    }

    pub fn record_subscribe_ack(&self, success: bool) {
        if success {
            bump(&self.subscribe_acks_ok);
        } else {
            bump(&self.subscribe_acks_failed);
        }
    }

    pub fn record_unsubscribe_ack(&self, success: bool) {
        if success {
            bump(&self.unsubscribe_acks_ok);
        } else {
            bump(&self.unsubscribe_acks_failed);
        }
    }

    pub fn set_backlog(&self, len: usize) {
        self.backlog.store(len as u64, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        DiagnosticsSnapshot {
            connections_opened: load(&self.connections_opened),
            connections_closed: load(&self.connections_closed),
            connections_failed: load(&self.connections_failed),
            messages_received: load(&self.messages_received),
            messages_failed_to_parse: load(&self.messages_failed_to_parse),
            subscribe_frames_sent: load(&self.subscribe_frames_sent),
            unsubscribe_frames_sent: load(&self.unsubscribe_frames_sent),
            subscribe_acks_ok: load(&self.subscribe_acks_ok),
            subscribe_acks_failed: load(&self.subscribe_acks_failed),
            unsubscribe_acks_ok: load(&self.unsubscribe_acks_ok),
            unsubscribe_acks_failed: load(&self.unsubscribe_acks_failed),
            backlog: load(&self.backlog),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_snapshot_reflects_counters() {
        let diagnostics = PubSubDiagnostics::new();

        diagnostics.record_connection_opened();
        diagnostics.record_connection_opened();
        diagnostics.record_connection_failed();
        diagnostics.record_subscribe_ack(true);
        diagnostics.record_subscribe_ack(false);
        diagnostics.record_unsubscribe_ack(true);
        diagnostics.set_backlog(3);

        assert_eq!(
            diagnostics.snapshot(),
            DiagnosticsSnapshot {
                connections_opened: 2,
                connections_failed: 1,
                subscribe_acks_ok: 1,
                subscribe_acks_failed: 1,
                unsubscribe_acks_ok: 1,
                backlog: 3,
                ..Default::default()
            }
        );
    }

    #[rstest]
    fn test_snapshot_serializes() {
        let diagnostics = PubSubDiagnostics::new();
        diagnostics.record_message_received();

        let json = serde_json::to_value(diagnostics.snapshot()).unwrap();

        assert_eq!(json["messages_received"], 1);
        assert_eq!(json["connections_opened"], 0);
    }
}
