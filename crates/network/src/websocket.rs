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

//! Single-connection WebSocket tasks feeding a lifecycle event handler.
//!
//! **Design**:
//! - One connection per task; reconnection is the caller's decision
//! - Read half runs in the connection task and emits events
//! - Write half runs in a dedicated task connected with a channel
//! - Client initiated closes wait a bounded time for the closing handshake

pub mod config;
pub mod error;
pub mod types;

use futures_util::{SinkExt, StreamExt};
use http::{HeaderName, HeaderValue};
use tokio::{sync::mpsc::UnboundedReceiver, task::JoinHandle};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Message, client::IntoClientRequest},
};
use tokio_util::sync::CancellationToken;

use self::{
    config::WebSocketConfig,
    error::WebSocketError,
    types::{
        ConnectionEvent, ConnectionHandle, ConnectionId, EventHandler, MessageReader,
        MessageWriter, WriterCommand,
    },
};
use crate::tls::install_cryptographic_provider;

/// Connects with the server creating a split tokio-tungstenite websocket stream.
///
/// # Errors
///
/// Returns an error if a header is invalid or the handshake fails.
pub(crate) async fn connect_with_server(
    url: &str,
    headers: &[(String, String)],
) -> Result<(MessageWriter, MessageReader), WebSocketError> {
    let mut request = url.into_client_request()?;
    let req_headers = request.headers_mut();

    for (key, val) in headers {
        let header_name: HeaderName = key.parse()?;
        let header_value = HeaderValue::from_str(val)?;
        req_headers.insert(header_name, header_value);
    }

    let (stream, _) = connect_async(request).await?;
    Ok(stream.split())
}

/// Spawns a task which opens one connection and reports its lifecycle to `handler`.
///
/// Must be called from within a tokio runtime.
pub fn spawn_connection(
    id: ConnectionId,
    config: WebSocketConfig,
    handler: EventHandler,
) -> JoinHandle<()> {
    tokio::spawn(run_connection(id, config, handler))
}

async fn run_connection(id: ConnectionId, config: WebSocketConfig, handler: EventHandler) {
    install_cryptographic_provider();

    let connect_timeout = config.connect_timeout();
    tracing::debug!("Connecting {id} to {}", config.url);

    let connected = tokio::time::timeout(
        connect_timeout,
        connect_with_server(&config.url, &config.headers),
    )
    .await;

    let (writer, mut reader) = match connected {
        Ok(Ok(halves)) => halves,
        Ok(Err(error)) => {
            tracing::debug!("Connection {id} failed: {error}");
            handler(ConnectionEvent::Failed { id, error });
            return;
        }
        Err(_) => {
            tracing::debug!("Connection {id} timed out");
            handler(ConnectionEvent::Failed {
                id,
                error: WebSocketError::Timeout(connect_timeout),
            });
            return;
        }
    };

    let cancel = CancellationToken::new();
    let (handle, writer_rx) = {
        let (writer_tx, writer_rx) = tokio::sync::mpsc::unbounded_channel();
        (ConnectionHandle::new(id, writer_tx), writer_rx)
    };
    let mut write_task = spawn_write_task(id, writer, writer_rx, &config, cancel.clone());

    tracing::debug!("Connected {id}");
    handler(ConnectionEvent::Opened(handle));

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!("Read loop for {id} cancelled");
                break;
            }
            next = reader.next() => match next {
                Some(Ok(Message::Text(text))) => {
                    handler(ConnectionEvent::Message {
                        id,
                        text: text.as_str().to_owned(),
                    });
                }
                Some(Ok(Message::Binary(data))) => {
                    tracing::trace!("Ignoring binary frame on {id} ({} bytes)", data.len());
                }
                Some(Ok(Message::Close(frame))) => {
                    // Keep polling so the close reply is flushed and the stream ends
                    tracing::debug!("Received close frame on {id}: {frame:?}");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("Read error on {id} - terminating: {e}");
                    break;
                }
                None => {
                    tracing::debug!("Stream ended on {id}");
                    break;
                }
            }
        }
    }

    cancel.cancel();
    if tokio::time::timeout(config.close_timeout(), &mut write_task)
        .await
        .is_err()
    {
        write_task.abort();
        tracing::debug!("Aborted task 'write' for {id}");
    }

    handler(ConnectionEvent::Closed { id });
}

fn spawn_write_task(
    id: ConnectionId,
    mut writer: MessageWriter,
    mut writer_rx: UnboundedReceiver<WriterCommand>,
    config: &WebSocketConfig,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tracing::debug!("Started task 'write' for {id}");

    let close_timeout = config.close_timeout();

    tokio::spawn(async move {
        loop {
            let command = tokio::select! {
                () = cancel.cancelled() => break,
                command = writer_rx.recv() => command,
            };

            match command {
                Some(WriterCommand::Send(msg)) => {
                    if let Err(e) = writer.send(msg).await {
                        tracing::warn!("Failed to send message on {id}: {e}");
                        cancel.cancel();
                        break;
                    }
                }
                Some(WriterCommand::Close(frame)) => {
                    if let Err(e) = writer.send(Message::Close(frame)).await {
                        tracing::debug!("Failed to send close frame on {id}: {e}");
                        cancel.cancel();
                        break;
                    }

                    if tokio::time::timeout(close_timeout, cancel.cancelled())
                        .await
                        .is_err()
                    {
                        tracing::debug!("Closing handshake timed out on {id}");
                        cancel.cancel();
                    }
                    break;
                }
                None => {
                    tracing::debug!("Writer channel closed for {id}, closing connection");
                    _ = writer.send(Message::Close(None)).await;
                    cancel.cancel();
                    break;
                }
            }
        }

        // Attempt to close the writer gracefully before exiting,
        // we ignore any error as the writer may already be closed.
        _ = writer.close().await;

        tracing::debug!("Completed task 'write' for {id}");
    })
}
