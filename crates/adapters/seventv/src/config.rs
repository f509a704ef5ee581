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

//! Configuration for the 7TV EventAPI client.

use std::time::Duration;

use liveupdates_pubsub::PubSubConfig;
use serde::{Deserialize, Serialize};

use crate::common::consts::{
    SEVENTV_DEFAULT_HEARTBEAT_INTERVAL_MS, SEVENTV_EVENTAPI_URL, SEVENTV_SHORT_NAME,
};

/// Configuration for [`crate::SeventvEventApi`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SeventvEventApiConfig {
    /// Overrides the production endpoint.
    pub base_url: Option<String>,
    /// Heartbeat interval assumed until the server's Hello arrives.
    pub heartbeat_interval_ms: Option<u64>,
    pub user_agent: Option<String>,
    pub connect_timeout_ms: Option<u64>,
    pub stop_timeout_ms: Option<u64>,
}

impl SeventvEventApiConfig {
    #[must_use]
    pub fn url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(SEVENTV_EVENTAPI_URL)
    }

    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(
            self.heartbeat_interval_ms
                .unwrap_or(SEVENTV_DEFAULT_HEARTBEAT_INTERVAL_MS),
        )
    }

    /// Builds the manager configuration for this client.
    #[must_use]
    pub fn pubsub_config(&self) -> PubSubConfig {
        let mut config = PubSubConfig::new(self.url(), SEVENTV_SHORT_NAME);
        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent.clone());
        }
        config.connect_timeout_ms = self.connect_timeout_ms;
        config.stop_timeout_ms = self.stop_timeout_ms;
        config
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_defaults() {
        let config = SeventvEventApiConfig::default();

        assert_eq!(config.url(), "wss://events.7tv.io/v3");
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(25));
        assert!(config.pubsub_config().validate().is_ok());
    }

    #[rstest]
    fn test_user_agent_override() {
        let config = SeventvEventApiConfig {
            user_agent: Some("chat/1.0".to_string()),
            ..Default::default()
        };

        let headers = config.pubsub_config().headers;
        assert!(headers.contains(&("User-Agent".to_string(), "chat/1.0".to_string())));
    }
}
