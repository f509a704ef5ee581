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

//! 7TV EventAPI subscriptions.

use std::fmt::Display;

use liveupdates_pubsub::Subscription;
use serde::{Serialize, Serializer, ser::SerializeMap};
use ustr::Ustr;

use crate::{
    common::consts::SEVENTV_TWITCH_PLATFORM,
    websocket::{
        enums::{SeventvOpcode, SeventvSubscriptionType},
        messages::SeventvWsRequest,
    },
};

/// Selects the objects a subscription receives events for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeventvCondition {
    /// A 7TV object such as a user or an emote set.
    ObjectId(Ustr),
    /// Every object relevant to a Twitch channel.
    Channel(Ustr),
}

impl Serialize for SeventvCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::ObjectId(object_id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("object_id", object_id)?;
                map.end()
            }
            Self::Channel(id) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("ctx", "channel")?;
                map.serialize_entry("platform", SEVENTV_TWITCH_PLATFORM)?;
                map.serialize_entry("id", id)?;
                map.end()
            }
        }
    }
}

impl Display for SeventvCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ObjectId(object_id) => write!(f, "object_id={object_id}"),
            Self::Channel(id) => write!(f, "channel={id}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SeventvSubscription {
    #[serde(rename = "type")]
    pub kind: SeventvSubscriptionType,
    pub condition: SeventvCondition,
}

impl SeventvSubscription {
    /// Creates a new [`SeventvSubscription`] instance.
    #[must_use]
    pub const fn new(kind: SeventvSubscriptionType, condition: SeventvCondition) -> Self {
        Self { kind, condition }
    }

    #[must_use]
    pub fn object(kind: SeventvSubscriptionType, object_id: &str) -> Self {
        Self::new(kind, SeventvCondition::ObjectId(Ustr::from(object_id)))
    }

    #[must_use]
    pub fn twitch_channel(kind: SeventvSubscriptionType, channel_id: &str) -> Self {
        Self::new(kind, SeventvCondition::Channel(Ustr::from(channel_id)))
    }
}

impl Display for SeventvSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.kind, self.condition)
    }
}

impl Subscription for SeventvSubscription {
    fn encode_subscribe(&self) -> String {
        SeventvWsRequest::new(SeventvOpcode::Subscribe, self).to_json()
    }

    fn encode_unsubscribe(&self) -> String {
        SeventvWsRequest::new(SeventvOpcode::Unsubscribe, self).to_json()
    }
}
