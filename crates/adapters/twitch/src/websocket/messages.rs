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

//! Data structures for Twitch PubSub frames.

use serde::{Deserialize, Serialize};
use ustr::Ustr;

use crate::websocket::{
    enums::{TwitchTopicKind, TwitchWsMessageType},
    topic::TwitchTopic,
};

fn new_nonce() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// An outbound PubSub request (LISTEN, UNLISTEN or PING).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitchWsRequest {
    #[serde(rename = "type")]
    pub kind: TwitchWsMessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<TwitchWsRequestData>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitchWsRequestData {
    pub topics: Vec<TwitchTopic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl TwitchWsRequest {
    #[must_use]
    pub const fn ping() -> Self {
        Self {
            kind: TwitchWsMessageType::Ping,
            nonce: None,
            data: None,
        }
    }

    /// Creates a LISTEN request for `topic` with a fresh nonce.
    #[must_use]
    pub fn listen(topic: TwitchTopic, auth_token: Option<&str>) -> Self {
        Self::with_topic(TwitchWsMessageType::Listen, topic, auth_token, Some(new_nonce()))
    }

    /// Creates an UNLISTEN request for `topic` with a fresh nonce.
    #[must_use]
    pub fn unlisten(topic: TwitchTopic, auth_token: Option<&str>) -> Self {
        Self::with_topic(TwitchWsMessageType::Unlisten, topic, auth_token, Some(new_nonce()))
    }

    /// Creates a LISTEN request for `topic` without a nonce or token.
    #[must_use]
    pub fn untracked_listen(topic: TwitchTopic) -> Self {
        Self::with_topic(TwitchWsMessageType::Listen, topic, None, None)
    }

    /// Creates an UNLISTEN request for `topic` without a nonce or token.
    #[must_use]
    pub fn untracked_unlisten(topic: TwitchTopic) -> Self {
        Self::with_topic(TwitchWsMessageType::Unlisten, topic, None, None)
    }

    fn with_topic(
        kind: TwitchWsMessageType,
        topic: TwitchTopic,
        auth_token: Option<&str>,
        nonce: Option<String>,
    ) -> Self {
        // Reward redemptions are public, every other topic is scoped to the token's user
        let auth_token = auth_token
            .filter(|_| topic.kind().is_none_or(TwitchTopicKind::requires_auth))
            .map(str::to_string);

        Self {
            kind,
            nonce,
            data: Some(TwitchWsRequestData {
                topics: vec![topic],
                auth_token,
            }),
        }
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize {} request: {e}", self.kind);
            String::new()
        })
    }
}

/// An inbound PubSub frame.
#[derive(Clone, Debug, Deserialize)]
pub struct TwitchWsFrame {
    #[serde(rename = "type")]
    pub kind: TwitchWsMessageType,
    #[serde(default)]
    pub nonce: Option<String>,
    /// Set on RESPONSE frames; empty on success.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<TwitchWsMessageData>,
}

/// Payload of a MESSAGE frame; `message` is itself a JSON document.
#[derive(Clone, Debug, Deserialize)]
pub struct TwitchWsMessageData {
    pub topic: TwitchTopic,
    pub message: String,
}

/// The decoded inner document of a MESSAGE frame.
#[derive(Clone, Debug, Deserialize)]
pub struct TwitchInnerMessage {
    #[serde(rename = "type")]
    pub kind: Ustr,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A business event delivered on a listened topic.
#[derive(Clone, Debug, PartialEq)]
pub struct TwitchDispatch {
    pub topic: TwitchTopic,
    pub topic_kind: TwitchTopicKind,
    /// The channel the event happened in.
    pub channel_id: Ustr,
    /// The inner message type, e.g. `moderation_action` or `reward-redeemed`.
    pub kind: Ustr,
    pub data: serde_json::Value,
}

impl TwitchDispatch {
    /// Returns the moderation action name for `chat_moderator_actions` events.
    #[must_use]
    pub fn moderation_action(&self) -> Option<&str> {
        self.data.get("moderation_action")?.as_str()
    }

    /// Returns the redemption object for channel point events.
    #[must_use]
    pub fn redemption(&self) -> Option<&serde_json::Value> {
        (self.topic_kind == TwitchTopicKind::CommunityPointsChannel)
            .then(|| self.data.get("redemption"))
            .flatten()
    }
}
