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

//! Twitch PubSub topics.

use std::{fmt::Display, str::FromStr};

use liveupdates_pubsub::Subscription;
use serde::{Deserialize, Serialize};
use ustr::Ustr;

use crate::websocket::{enums::TwitchTopicKind, messages::TwitchWsRequest};

/// A dotted PubSub topic such as `chat_moderator_actions.<user>.<channel>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TwitchTopic(Ustr);

impl TwitchTopic {
    /// Creates a new [`TwitchTopic`] from its raw string form.
    #[must_use]
    pub fn new(topic: &str) -> Self {
        Self(Ustr::from(topic))
    }

    #[must_use]
    pub fn chat_moderator_actions(user_id: &str, channel_id: &str) -> Self {
        Self::scoped(TwitchTopicKind::ChatModeratorActions, user_id, channel_id)
    }

    #[must_use]
    pub fn automod_queue(user_id: &str, channel_id: &str) -> Self {
        Self::scoped(TwitchTopicKind::AutomodQueue, user_id, channel_id)
    }

    #[must_use]
    pub fn low_trust_users(user_id: &str, channel_id: &str) -> Self {
        Self::scoped(TwitchTopicKind::LowTrustUsers, user_id, channel_id)
    }

    #[must_use]
    pub fn community_points(channel_id: &str) -> Self {
        Self::new(&format!(
            "{}.{channel_id}",
            TwitchTopicKind::CommunityPointsChannel.as_ref()
        ))
    }

    fn scoped(kind: TwitchTopicKind, user_id: &str, channel_id: &str) -> Self {
        Self::new(&format!("{}.{user_id}.{channel_id}", kind.as_ref()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub const fn inner(&self) -> Ustr {
        self.0
    }

    /// Returns the topic family, or `None` for topics this adapter does not know.
    #[must_use]
    pub fn kind(&self) -> Option<TwitchTopicKind> {
        let prefix = self.as_str().split('.').next()?;
        TwitchTopicKind::from_str(prefix).ok()
    }

    /// Returns the channel the topic is scoped to (always the last segment).
    #[must_use]
    pub fn channel_id(&self) -> Option<&str> {
        let (_, channel_id) = self.as_str().rsplit_once('.')?;
        (!channel_id.is_empty()).then_some(channel_id)
    }

    #[must_use]
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.as_str().starts_with(prefix)
    }
}

impl Display for TwitchTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TwitchTopic {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Subscription for TwitchTopic {
    // Bare frames; the connection handler attaches the token and a tracked nonce
    fn encode_subscribe(&self) -> String {
        TwitchWsRequest::untracked_listen(*self).to_json()
    }

    fn encode_unsubscribe(&self) -> String {
        TwitchWsRequest::untracked_unlisten(*self).to_json()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_constructors() {
        assert_eq!(
            TwitchTopic::chat_moderator_actions("11", "22").as_str(),
            "chat_moderator_actions.11.22"
        );
        assert_eq!(
            TwitchTopic::automod_queue("11", "22").as_str(),
            "automod-queue.11.22"
        );
        assert_eq!(
            TwitchTopic::low_trust_users("11", "22").as_str(),
            "low-trust-users.11.22"
        );
        assert_eq!(
            TwitchTopic::community_points("22").as_str(),
            "community-points-channel-v1.22"
        );
    }

    #[rstest]
    #[case("chat_moderator_actions.11.22", Some(TwitchTopicKind::ChatModeratorActions), Some("22"))]
    #[case("community-points-channel-v1.22", Some(TwitchTopicKind::CommunityPointsChannel), Some("22"))]
    #[case("whispers.11", None, Some("11"))]
    #[case("garbage", None, None)]
    fn test_kind_and_channel(
        #[case] raw: &str,
        #[case] kind: Option<TwitchTopicKind>,
        #[case] channel_id: Option<&str>,
    ) {
        let topic = TwitchTopic::new(raw);
        assert_eq!(topic.kind(), kind);
        assert_eq!(topic.channel_id(), channel_id);
    }

    #[rstest]
    fn test_subscription_frames_carry_topic() {
        let topic = TwitchTopic::community_points("22");

        let listen: serde_json::Value = serde_json::from_str(&topic.encode_subscribe()).unwrap();
        let unlisten: serde_json::Value =
            serde_json::from_str(&topic.encode_unsubscribe()).unwrap();

        assert_eq!(listen["type"], "LISTEN");
        assert_eq!(listen["data"]["topics"][0], "community-points-channel-v1.22");
        assert_eq!(unlisten["type"], "UNLISTEN");
        assert!(listen["data"].get("auth_token").is_none());
        assert!(listen.get("nonce").is_none());
    }

    #[rstest]
    fn test_subscription_frames_are_stable() {
        let topic = TwitchTopic::community_points("22");

        assert_eq!(topic.encode_subscribe(), topic.encode_subscribe());
        assert_eq!(topic.encode_unsubscribe(), topic.encode_unsubscribe());
    }
}
