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

//! Adapter for the [7TV EventAPI](https://github.com/SevenTV/EventAPI).
//!
//! The `liveupdates-seventv` crate plugs the EventAPI v3 opcode protocol into
//! the pooled manager from `liveupdates-pubsub`: object and channel
//! subscriptions, the Hello/Heartbeat keep-alive, and typed views over emote
//! set, user, cosmetic and entitlement events.

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
    config::SeventvEventApiConfig,
    websocket::{
        client::SeventvEventApi,
        dispatch::{CosmeticCreate, EmoteSetChange, EntitlementChange, UserEmoteSetUpdate},
        enums::{SeventvCosmeticKind, SeventvOpcode, SeventvSubscriptionType},
        error::SeventvWsError,
        handler::{SeventvEventApiProtocol, SeventvHandler},
        messages::SeventvDispatch,
        subscription::{SeventvCondition, SeventvSubscription},
    },
};
