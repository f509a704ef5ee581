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

//! Data structures for 7TV EventAPI frames.

use serde::{Deserialize, Serialize};
use ustr::Ustr;

use crate::websocket::enums::{SeventvOpcode, SeventvSubscriptionType};

/// An outbound frame: an opcode and its payload.
#[derive(Clone, Debug, Serialize)]
pub struct SeventvWsRequest<T: Serialize> {
    pub op: SeventvOpcode,
    pub d: T,
}

impl<T: Serialize> SeventvWsRequest<T> {
    /// Creates a new [`SeventvWsRequest`] instance.
    pub const fn new(op: SeventvOpcode, d: T) -> Self {
        Self { op, d }
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize {} request: {e}", self.op);
            String::new()
        })
    }
}

/// An inbound frame; `d` is decoded according to `op`.
#[derive(Clone, Debug, Deserialize)]
pub struct SeventvWsFrame {
    pub op: SeventvOpcode,
    #[serde(default)]
    pub d: serde_json::Value,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SeventvHelloPayload {
    /// Milliseconds between server heartbeats.
    pub heartbeat_interval: u64,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SeventvAckPayload {
    /// The acknowledged command, e.g. `SUBSCRIBE`.
    pub command: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SeventvErrorPayload {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub fields: serde_json::Value,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SeventvEndOfStreamPayload {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SeventvDispatchPayload {
    #[serde(rename = "type")]
    pub kind: Ustr,
    #[serde(default)]
    pub body: serde_json::Value,
}

/// A business event delivered for a subscription.
#[derive(Clone, Debug, PartialEq)]
pub struct SeventvDispatch {
    pub kind: SeventvSubscriptionType,
    pub body: serde_json::Value,
    /// The id of the object the event is about.
    pub id: Ustr,
    /// Display name of the user who caused the event, if reported.
    pub actor_name: Option<Ustr>,
}

impl SeventvDispatch {
    /// Creates a new [`SeventvDispatch`] from a dispatch body.
    #[must_use]
    pub fn new(kind: SeventvSubscriptionType, body: serde_json::Value) -> Self {
        let id = Ustr::from(body["id"].as_str().unwrap_or_default());
        let actor_name = body["actor"]["display_name"]
            .as_str()
            .filter(|name| !name.is_empty())
            .map(Ustr::from);

        Self {
            kind,
            body,
            id,
            actor_name,
        }
    }
}
