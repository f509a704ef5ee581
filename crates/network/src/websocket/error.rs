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

//! Error types produced by WebSocket connections.

use std::time::Duration;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum WebSocketError {
    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    /// WebSocket transport error.
    #[error("Tungstenite error: {0}")]
    Tungstenite(#[from] tungstenite::Error),
}

impl From<http::header::InvalidHeaderName> for WebSocketError {
    fn from(error: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(error.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for WebSocketError {
    fn from(error: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(error.to_string())
    }
}
