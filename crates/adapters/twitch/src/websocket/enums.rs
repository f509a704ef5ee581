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

//! Enumerations for Twitch PubSub frame and topic types.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// The `type` field of an outer PubSub frame.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    PartialEq,
    Eq,
    Hash,
    AsRefStr,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TwitchWsMessageType {
    Listen,
    Unlisten,
    Ping,
    Pong,
    /// Acknowledgement of a LISTEN or UNLISTEN, correlated by nonce.
    Response,
    Message,
    /// The server is about to restart; clients should move to a new connection.
    Reconnect,
    #[serde(other)]
    Unknown,
}

/// The families of topics this adapter knows how to listen to.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    PartialEq,
    Eq,
    Hash,
    AsRefStr,
    EnumIter,
    EnumString,
)]
pub enum TwitchTopicKind {
    /// Moderation actions taken in a channel, scoped to the moderating user.
    #[strum(serialize = "chat_moderator_actions")]
    ChatModeratorActions,
    /// Messages held by AutoMod for review.
    #[strum(serialize = "automod-queue")]
    AutomodQueue,
    /// Messages and treatment updates for suspicious users.
    #[strum(serialize = "low-trust-users")]
    LowTrustUsers,
    /// Channel point reward redemptions.
    #[strum(serialize = "community-points-channel-v1")]
    CommunityPointsChannel,
}

impl TwitchTopicKind {
    /// Returns true if LISTEN requests for this topic must carry the auth token.
    #[must_use]
    pub const fn requires_auth(self) -> bool {
        !matches!(self, Self::CommunityPointsChannel)
    }
}
