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

//! Pooled WebSocket publish/subscribe manager for the live-updates engine.
//!
//! The `liveupdates-pubsub` crate shards an open-ended set of topic
//! subscriptions across a pool of WebSocket connections, each limited to a
//! protocol-defined capacity:
//!
//! - [`PubSubManager`] runs the pool on a dedicated worker thread and accepts
//!   subscribe/unsubscribe requests from any thread.
//! - [`ManagerCore`] is the synchronous state machine behind it: assignment,
//!   backlog, reconnect backoff and resubscription after disconnects.
//! - [`ClientHandler`] and [`PubSubProtocol`] are the seams a backend adapter
//!   implements to plug its wire format and liveness rules in.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod client;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod manager;
pub mod mode;
pub mod protocol;
pub mod subscription;

#[cfg(test)]
mod stubs;

// Re-exports
pub use crate::{
    client::{AckKind, ClientHandler, Inbound, Liveness, PubSubClient},
    config::PubSubConfig,
    diagnostics::{DiagnosticsSnapshot, PubSubDiagnostics},
    engine::{ManagerCore, TimerEvent, Transport},
    error::PubSubError,
    manager::{ManagerCommand, PubSubManager},
    mode::ManagerState,
    protocol::{DispatchOf, PubSubProtocol, SubscriptionOf},
    subscription::Subscription,
};
