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

//! Configuration for a pub/sub manager instance.

use std::time::Duration;

use liveupdates_network::WebSocketConfig;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::PubSubError;

/// The `User-Agent` sent with every connection unless overridden.
pub const DEFAULT_USER_AGENT: &str = concat!("liveupdates/", env!("CARGO_PKG_VERSION"));

/// Default initial reconnect delay (milliseconds) after a failed connection attempt.
pub const DEFAULT_RECONNECT_DELAY_INITIAL_MS: u64 = 1_000;

/// Default time (milliseconds) `stop` waits for the event loop to drain.
pub const DEFAULT_STOP_TIMEOUT_MS: u64 = 5_000;

/// Configuration for a pub/sub manager.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubSubConfig {
    /// The endpoint every connection of the pool is opened against.
    pub url: String,
    /// A short name identifying the backend, used for the worker thread name.
    pub short_name: String,
    /// Headers sent with every connection request.
    pub headers: Vec<(String, String)>,
    /// The timeout (milliseconds) for establishing a connection.
    pub connect_timeout_ms: Option<u64>,
    /// The timeout (milliseconds) to wait for the server side of a closing handshake.
    pub close_timeout_ms: Option<u64>,
    /// The initial reconnect delay (milliseconds); doubles on consecutive failures.
    pub reconnect_delay_initial_ms: Option<u64>,
    /// The time (milliseconds) `stop` blocks waiting for connections to close.
    pub stop_timeout_ms: Option<u64>,
}

impl PubSubConfig {
    /// Creates a new [`PubSubConfig`] with the default `User-Agent` and timeouts.
    #[must_use]
    pub fn new(url: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            short_name: short_name.into(),
            headers: vec![("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string())],
            connect_timeout_ms: None,
            close_timeout_ms: None,
            reconnect_delay_initial_ms: None,
            stop_timeout_ms: None,
        }
    }

    /// Replaces the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.headers
            .retain(|(key, _)| !key.eq_ignore_ascii_case("user-agent"));
        self.headers
            .push(("User-Agent".to_string(), user_agent.into()));
        self
    }

    /// Validates the endpoint and short name.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed, is not a `ws`/`wss` URL,
    /// or the short name is empty.
    pub fn validate(&self) -> Result<(), PubSubError> {
        let url = Url::parse(&self.url).map_err(|e| PubSubError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(PubSubError::InvalidUrl {
                url: self.url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if self.short_name.trim().is_empty() {
            return Err(PubSubError::InvalidConfig(
                "short_name must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    #[must_use]
    pub fn reconnect_delay_initial(&self) -> Duration {
        Duration::from_millis(
            self.reconnect_delay_initial_ms
                .unwrap_or(DEFAULT_RECONNECT_DELAY_INITIAL_MS),
        )
    }

    #[must_use]
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms.unwrap_or(DEFAULT_STOP_TIMEOUT_MS))
    }

    /// Returns the per-connection configuration derived from this config.
    #[must_use]
    pub fn websocket_config(&self) -> WebSocketConfig {
        WebSocketConfig {
            url: self.url.clone(),
            headers: self.headers.clone(),
            connect_timeout_ms: self.connect_timeout_ms,
            close_timeout_ms: self.close_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("wss://pubsub.example.com")]
    #[case("ws://127.0.0.1:9050/liveupdates")]
    fn test_validate_accepts_websocket_urls(#[case] url: &str) {
        assert!(PubSubConfig::new(url, "test").validate().is_ok());
    }

    #[rstest]
    #[case("https://example.com")]
    #[case("not a url")]
    fn test_validate_rejects_other_urls(#[case] url: &str) {
        let result = PubSubConfig::new(url, "test").validate();
        assert!(matches!(result, Err(PubSubError::InvalidUrl { .. })));
    }

    #[rstest]
    fn test_validate_rejects_empty_short_name() {
        let result = PubSubConfig::new("wss://example.com", " ").validate();
        assert!(matches!(result, Err(PubSubError::InvalidConfig(_))));
    }

    #[rstest]
    fn test_defaults() {
        let config = PubSubConfig::new("wss://example.com", "test");

        assert_eq!(config.reconnect_delay_initial(), Duration::from_secs(1));
        assert_eq!(config.stop_timeout(), Duration::from_secs(5));
        assert_eq!(
            config.headers,
            vec![("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string())]
        );
    }

    #[rstest]
    fn test_with_user_agent_replaces_header() {
        let config = PubSubConfig::new("wss://example.com", "test").with_user_agent("custom/1.0");
        let websocket = config.websocket_config();

        assert_eq!(
            websocket.headers,
            vec![("User-Agent".to_string(), "custom/1.0".to_string())]
        );
        assert_eq!(websocket.url, "wss://example.com");
    }
}
