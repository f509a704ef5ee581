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

//! Network plumbing for the live-updates engine.
//!
//! The `liveupdates-network` crate provides the low level pieces the pub/sub
//! manager is assembled from:
//!
//! - A bounded, deterministic exponential backoff for reconnect pacing.
//! - A per-connection WebSocket task which reports its lifecycle as typed events.
//! - One-time installation of the rustls crypto provider for `wss://` endpoints.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod backoff;
pub mod tls;
pub mod websocket;

// Re-exports
pub use crate::{
    backoff::ExponentialBackoff,
    websocket::{
        config::WebSocketConfig,
        error::WebSocketError,
        spawn_connection,
        types::{
            CloseCode, ConnectionEvent, ConnectionHandle, ConnectionId, EventHandler,
            WriterCommand, channel_event_handler,
        },
    },
};
