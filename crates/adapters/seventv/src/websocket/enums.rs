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

//! Enumerations for 7TV EventAPI opcodes and payload types.

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// EventAPI v3 opcodes.
#[derive(
    Clone, Copy, Debug, Display, PartialEq, Eq, Hash, AsRefStr, Serialize_repr, Deserialize_repr,
)]
#[repr(u8)]
pub enum SeventvOpcode {
    Dispatch = 0,
    Hello = 1,
    Heartbeat = 2,
    Reconnect = 4,
    Ack = 5,
    Error = 6,
    EndOfStream = 7,
    Identify = 33,
    Resume = 34,
    Subscribe = 35,
    Unsubscribe = 36,
    Signal = 37,
}

/// Event types a subscription can target.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    AsRefStr,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum SeventvSubscriptionType {
    #[serde(rename = "emote_set.update")]
    #[strum(serialize = "emote_set.update")]
    UpdateEmoteSet,
    #[serde(rename = "emote_set.create")]
    #[strum(serialize = "emote_set.create")]
    CreateEmoteSet,
    #[serde(rename = "user.update")]
    #[strum(serialize = "user.update")]
    UpdateUser,
    #[serde(rename = "cosmetic.create")]
    #[strum(serialize = "cosmetic.create")]
    CreateCosmetic,
    #[serde(rename = "entitlement.create")]
    #[strum(serialize = "entitlement.create")]
    CreateEntitlement,
    #[serde(rename = "entitlement.delete")]
    #[strum(serialize = "entitlement.delete")]
    DeleteEntitlement,
    #[serde(rename = "entitlement.reset")]
    #[strum(serialize = "entitlement.reset")]
    ResetEntitlement,
}

/// Kinds of cosmetics carried by cosmetic and entitlement events.
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
pub enum SeventvCosmeticKind {
    Badge,
    Paint,
    Avatar,
    EmoteSet,
    #[serde(other)]
    Unknown,
}
