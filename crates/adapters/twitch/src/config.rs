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

//! Configuration for the Twitch PubSub client.

use std::time::Duration;

use liveupdates_pubsub::PubSubConfig;
use serde::{Deserialize, Serialize};

use crate::common::consts::{
    TWITCH_DEFAULT_PING_INTERVAL_SECS, TWITCH_PUBSUB_URL, TWITCH_SHORT_NAME,
};

/// Configuration for [`crate::TwitchPubSub`].
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TwitchPubSubConfig {
    /// Overrides the production endpoint.
    pub base_url: Option<String>,
    /// OAuth token attached to user-scoped LISTEN requests.
    pub auth_token: Option<String>,
    pub ping_interval_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub connect_timeout_ms: Option<u64>,
    pub stop_timeout_ms: Option<u64>,
}

impl std::fmt::Debug for TwitchPubSubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(TwitchPubSubConfig))
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("ping_interval_secs", &self.ping_interval_secs)
            .field("user_agent", &self.user_agent)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("stop_timeout_ms", &self.stop_timeout_ms)
            .finish()
    }
}

impl TwitchPubSubConfig {
    #[must_use]
    pub fn url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(TWITCH_PUBSUB_URL)
    }

    #[must_use]
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(
            self.ping_interval_secs
                .unwrap_or(TWITCH_DEFAULT_PING_INTERVAL_SECS),
        )
    }

    /// Builds the manager configuration for this client.
    #[must_use]
    pub fn pubsub_config(&self) -> PubSubConfig {
        let mut config = PubSubConfig::new(self.url(), TWITCH_SHORT_NAME);
        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent.clone());
        }
        config.connect_timeout_ms = self.connect_timeout_ms;
        config.stop_timeout_ms = self.stop_timeout_ms;
        config
    }
}
