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

//! Adapter for the [Twitch PubSub](https://dev.twitch.tv/docs/pubsub/) service.
//!
//! The `liveupdates-twitch` crate plugs Twitch's LISTEN/UNLISTEN protocol into
//! the pooled manager from `liveupdates-pubsub`: topic construction, nonce
//! correlation of RESPONSE frames, the PING/PONG keep-alive, and decoding of
//! moderation, AutoMod, low trust user and channel point events.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod common;
pub mod config;
pub mod websocket;

// Re-exports
pub use crate::{
    config::TwitchPubSubConfig,
    websocket::{
        client::TwitchPubSub,
        enums::{TwitchTopicKind, TwitchWsMessageType},
        error::TwitchWsError,
        handler::{TwitchHandler, TwitchPubSubProtocol},
        messages::TwitchDispatch,
        topic::TwitchTopic,
    },
};
