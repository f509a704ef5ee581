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

//! Configuration for WebSocket connections.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default timeout (milliseconds) for establishing a connection.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Default timeout (milliseconds) to wait for the server side of a closing handshake.
pub const DEFAULT_CLOSE_TIMEOUT_MS: u64 = 1_000;

/// Configuration for a single WebSocket connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSocketConfig {
    /// The URL to connect to.
    pub url: String,
    /// The default headers.
    pub headers: Vec<(String, String)>,
    /// The timeout (milliseconds) for the TCP, TLS and upgrade handshake.
    pub connect_timeout_ms: Option<u64>,
    /// The timeout (milliseconds) to wait for the server to answer a close frame.
    pub close_timeout_ms: Option<u64>,
}

impl WebSocketConfig {
    /// Creates a new [`WebSocketConfig`] with default timeouts.
    #[must_use]
    pub fn new(url: impl Into<String>, headers: Vec<(String, String)>) -> Self {
        Self {
            url: url.into(),
            headers,
            connect_timeout_ms: None,
            close_timeout_ms: None,
        }
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(
            self.connect_timeout_ms
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
        )
    }

    #[must_use]
    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms.unwrap_or(DEFAULT_CLOSE_TIMEOUT_MS))
    }
}
