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

//! Type definitions for WebSocket connection plumbing.

use std::{fmt::Display, sync::Arc};

use futures_util::stream::{SplitSink, SplitStream};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
pub use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream,
    tungstenite::{Message, protocol::CloseFrame},
};

use super::error::WebSocketError;

pub(crate) type MessageWriter =
    SplitSink<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>, Message>;

pub(crate) type MessageReader =
    SplitStream<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>>;

/// Identifies a single connection attempt for its whole lifetime.
///
/// Identifiers are allocated by the owner of the pool and never reused, so a
/// stale timer or event carrying an old identifier can be detected with a lookup.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ConnectionId(u64);

impl ConnectionId {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Represents a command for the writer task.
#[derive(Debug)]
pub enum WriterCommand {
    /// Send message to the server.
    Send(Message),
    /// Start the closing handshake with the given frame.
    Close(Option<CloseFrame>),
}

/// A cheap, cloneable handle for writing to one live connection.
///
/// All writes funnel through a single channel, so frames are delivered in the
/// order they were submitted.
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    writer_tx: UnboundedSender<WriterCommand>,
}

impl ConnectionHandle {
    #[must_use]
    pub const fn new(id: ConnectionId, writer_tx: UnboundedSender<WriterCommand>) -> Self {
        Self { id, writer_tx }
    }

    /// Creates a handle backed by a plain channel, for driving clients without a socket.
    #[must_use]
    pub fn channel(id: ConnectionId) -> (Self, UnboundedReceiver<WriterCommand>) {
        let (writer_tx, writer_rx) = unbounded_channel();
        (Self::new(id, writer_tx), writer_rx)
    }

    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues a text frame; returns `false` when the connection has already shut down.
    pub fn send_text(&self, text: String) -> bool {
        tracing::trace!("Queueing text frame for {}: {text}", self.id);
        match self.writer_tx.send(WriterCommand::Send(Message::Text(text.into()))) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Cannot send on {}: {e}", self.id);
                false
            }
        }
    }

    /// Starts the closing handshake; returns `false` when the connection has already shut down.
    pub fn close(&self, code: CloseCode, reason: &str) -> bool {
        tracing::debug!("Closing {} ({code}): {reason}", self.id);
        let frame = CloseFrame {
            code,
            reason: reason.into(),
        };
        self.writer_tx.send(WriterCommand::Close(Some(frame))).is_ok()
    }

    /// Returns true if the writer task is gone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.writer_tx.is_closed()
    }
}

/// Lifecycle and data events emitted by a connection task.
///
/// Each connection emits either a single `Failed`, or `Opened` followed by any
/// number of `Message` events and exactly one `Closed`.
#[derive(Debug)]
pub enum ConnectionEvent {
    Opened(ConnectionHandle),
    Message { id: ConnectionId, text: String },
    Closed { id: ConnectionId },
    Failed { id: ConnectionId, error: WebSocketError },
}

impl ConnectionEvent {
    #[must_use]
    pub fn connection_id(&self) -> ConnectionId {
        match self {
            Self::Opened(handle) => handle.id(),
            Self::Message { id, .. } | Self::Closed { id } | Self::Failed { id, .. } => *id,
        }
    }
}

/// Function type for receiving connection events.
pub type EventHandler = Arc<dyn Fn(ConnectionEvent) + Send + Sync>;

/// Creates a channel-based event handler.
///
/// Returns a tuple containing the event handler and a receiver for events.
#[must_use]
pub fn channel_event_handler() -> (EventHandler, UnboundedReceiver<ConnectionEvent>) {
    let (tx, rx) = unbounded_channel();
    let handler = Arc::new(move |event: ConnectionEvent| {
        if let Err(e) = tx.send(event) {
            tracing::debug!("Failed to send event to channel: {e}");
        }
    });
    (handler, rx)
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
    }

    #[rstest]
    fn test_handle_send_and_close_are_fifo() {
        let (handle, mut rx) = ConnectionHandle::channel(ConnectionId::new(1));

        assert!(handle.send_text("a".to_string()));
        assert!(handle.send_text("b".to_string()));
        assert!(handle.close(CloseCode::Normal, "bye"));

        match rx.try_recv() {
            Ok(WriterCommand::Send(Message::Text(text))) => assert_eq!(text.as_str(), "a"),
            other => panic!("unexpected command {other:?}"),
        }
        match rx.try_recv() {
            Ok(WriterCommand::Send(Message::Text(text))) => assert_eq!(text.as_str(), "b"),
            other => panic!("unexpected command {other:?}"),
        }
        match rx.try_recv() {
            Ok(WriterCommand::Close(Some(frame))) => {
                assert_eq!(frame.code, CloseCode::Normal);
                assert_eq!(frame.reason.as_str(), "bye");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[rstest]
    fn test_handle_reports_closed_writer() {
        let (handle, rx) = ConnectionHandle::channel(ConnectionId::new(2));
        drop(rx);

        assert!(handle.is_closed());
        assert!(!handle.send_text("lost".to_string()));
        assert!(!handle.close(CloseCode::Away, "gone"));
    }

    #[rstest]
    fn test_channel_event_handler_forwards() {
        let (handler, mut rx) = channel_event_handler();

        handler(ConnectionEvent::Closed {
            id: ConnectionId::new(3),
        });

        let event = rx.try_recv().unwrap();
        assert_eq!(event.connection_id(), ConnectionId::new(3));
    }
}
