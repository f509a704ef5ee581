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

//! Application-facing Twitch PubSub client.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use dashmap::DashSet;
use liveupdates_pubsub::{DiagnosticsSnapshot, ManagerState, PubSubManager};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    config::TwitchPubSubConfig,
    websocket::{
        enums::TwitchTopicKind,
        error::TwitchWsError,
        handler::TwitchPubSubProtocol,
        messages::TwitchDispatch,
        topic::TwitchTopic,
    },
};

/// Listens to Twitch PubSub topics over a pool of connections.
///
/// Requested topics are deduplicated here; the pool spreads them across
/// connections of at most 50 topics each and restores them after reconnects.
#[derive(Debug)]
pub struct TwitchPubSub {
    config: TwitchPubSubConfig,
    auth_token: Arc<ArcSwapOption<String>>,
    manager: PubSubManager<TwitchPubSubProtocol>,
    requested: DashSet<TwitchTopic>,
}

impl TwitchPubSub {
    /// Creates a new [`TwitchPubSub`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured endpoint is not a WebSocket URL.
    pub fn new(config: TwitchPubSubConfig) -> Result<Self, TwitchWsError> {
        let protocol =
            TwitchPubSubProtocol::new(config.auth_token.clone(), config.ping_interval());
        Self::with_protocol(config, protocol)
    }

    /// Creates a new [`TwitchPubSub`] instance with a custom protocol setup.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured endpoint is not a WebSocket URL.
    pub fn with_protocol(
        config: TwitchPubSubConfig,
        protocol: TwitchPubSubProtocol,
    ) -> Result<Self, TwitchWsError> {
        let auth_token = protocol.auth_token_handle();
        let manager = PubSubManager::new(config.pubsub_config(), protocol)?;
        Ok(Self {
            config,
            auth_token,
            manager,
            requested: DashSet::new(),
        })
    }

    /// Starts the connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the client was already started or its worker could not be spawned.
    pub fn start(&mut self) -> Result<(), TwitchWsError> {
        self.manager.start()?;
        Ok(())
    }

    /// Closes every connection, blocking until the pool has drained.
    pub fn stop(&mut self) {
        self.manager.stop();
        self.requested.clear();
    }

    #[must_use]
    pub const fn config(&self) -> &TwitchPubSubConfig {
        &self.config
    }

    /// Replaces the auth token used by every later LISTEN and UNLISTEN.
    ///
    /// Requests already sent keep the token they were sent with; topics
    /// restored after a reconnect pick up the new one.
    pub fn set_auth_token(&self, auth_token: Option<String>) {
        tracing::info!(
            "Auth token {}",
            if auth_token.is_some() { "updated" } else { "cleared" }
        );
        self.auth_token.store(auth_token.map(Arc::new));
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.auth_token.load().is_some()
    }

    #[must_use]
    pub fn state(&self) -> ManagerState {
        self.manager.state()
    }

    #[must_use]
    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.manager.diagnostics()
    }

    /// Takes the stream of decoded events; only the first call returns `Some`.
    pub fn take_dispatch_receiver(&mut self) -> Option<UnboundedReceiver<TwitchDispatch>> {
        self.manager.take_dispatch_receiver()
    }

    #[must_use]
    pub fn is_listening(&self, topic: &TwitchTopic) -> bool {
        self.requested.contains(topic)
    }

    #[must_use]
    pub fn listened_topics(&self) -> Vec<TwitchTopic> {
        let mut topics: Vec<TwitchTopic> = self.requested.iter().map(|topic| *topic).collect();
        topics.sort();
        topics
    }

    /// Listens to `topic`; repeated requests for the same topic are no-ops.
    ///
    /// # Errors
    ///
    /// Returns an error if the topic needs an auth token and none is set,
    /// or if the client has been stopped.
    pub fn listen(&self, topic: TwitchTopic) -> Result<(), TwitchWsError> {
        if !self.is_authenticated() && topic.kind().is_some_and(TwitchTopicKind::requires_auth)
        {
            return Err(TwitchWsError::MissingAuthToken(topic));
        }

        if !self.requested.insert(topic) {
            tracing::debug!("Already listening to {topic}");
            return Ok(());
        }

        if let Err(e) = self.manager.subscribe(topic) {
            self.requested.remove(&topic);
            return Err(e.into());
        }
        Ok(())
    }

    /// Stops listening to `topic`; unknown topics are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has been stopped.
    pub fn unlisten(&self, topic: &TwitchTopic) -> Result<(), TwitchWsError> {
        if self.requested.remove(topic).is_none() {
            tracing::debug!("Not listening to {topic}");
            return Ok(());
        }

        self.manager.unsubscribe(*topic)?;
        Ok(())
    }

    /// Stops listening to every topic starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has been stopped.
    pub fn unlisten_prefix(&self, prefix: &str) -> Result<(), TwitchWsError> {
        let topics: Vec<TwitchTopic> = self
            .requested
            .iter()
            .filter(|topic| topic.starts_with(prefix))
            .map(|topic| *topic)
            .collect();

        for topic in &topics {
            self.unlisten(topic)?;
        }
        Ok(())
    }

    /// Listens to moderation actions in `channel_id` as seen by `user_id`.
    ///
    /// # Errors
    ///
    /// See [`Self::listen`].
    pub fn listen_to_channel_moderation_actions(
        &self,
        user_id: &str,
        channel_id: &str,
    ) -> Result<(), TwitchWsError> {
        if user_id.is_empty() || channel_id.is_empty() {
            tracing::debug!("Not listening to moderation actions without user and channel");
            return Ok(());
        }
        self.listen(TwitchTopic::chat_moderator_actions(user_id, channel_id))
    }

    /// Listens to messages AutoMod holds in `channel_id`.
    ///
    /// # Errors
    ///
    /// See [`Self::listen`].
    pub fn listen_to_automod(&self, user_id: &str, channel_id: &str) -> Result<(), TwitchWsError> {
        if user_id.is_empty() || channel_id.is_empty() {
            tracing::debug!("Not listening to AutoMod without user and channel");
            return Ok(());
        }
        self.listen(TwitchTopic::automod_queue(user_id, channel_id))
    }

    /// Listens to suspicious user events in `channel_id`.
    ///
    /// # Errors
    ///
    /// See [`Self::listen`].
    pub fn listen_to_low_trust_users(
        &self,
        user_id: &str,
        channel_id: &str,
    ) -> Result<(), TwitchWsError> {
        if user_id.is_empty() || channel_id.is_empty() {
            tracing::debug!("Not listening to low trust users without user and channel");
            return Ok(());
        }
        self.listen(TwitchTopic::low_trust_users(user_id, channel_id))
    }

    /// Listens to channel point redemptions in `channel_id`.
    ///
    /// # Errors
    ///
    /// See [`Self::listen`].
    pub fn listen_to_channel_points(&self, channel_id: &str) -> Result<(), TwitchWsError> {
        if channel_id.is_empty() {
            tracing::debug!("Not listening to channel points without channel");
            return Ok(());
        }
        self.listen(TwitchTopic::community_points(channel_id))
    }

    /// Stops listening to AutoMod in every channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has been stopped.
    pub fn unlisten_automod(&self) -> Result<(), TwitchWsError> {
        self.unlisten_kind(TwitchTopicKind::AutomodQueue)
    }

    /// Stops listening to low trust users in every channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has been stopped.
    pub fn unlisten_low_trust_users(&self) -> Result<(), TwitchWsError> {
        self.unlisten_kind(TwitchTopicKind::LowTrustUsers)
    }

    /// Stops listening to moderation actions in every channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has been stopped.
    pub fn unlisten_channel_moderation_actions(&self) -> Result<(), TwitchWsError> {
        self.unlisten_kind(TwitchTopicKind::ChatModeratorActions)
    }

    fn unlisten_kind(&self, kind: TwitchTopicKind) -> Result<(), TwitchWsError> {
        self.unlisten_prefix(&format!("{}.", kind.as_ref()))
    }
}
