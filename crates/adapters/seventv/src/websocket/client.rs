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

//! Application-facing 7TV EventAPI client.

use dashmap::DashSet;
use liveupdates_pubsub::{DiagnosticsSnapshot, ManagerState, PubSubManager};
use tokio::sync::mpsc::UnboundedReceiver;
use ustr::Ustr;

use crate::{
    config::SeventvEventApiConfig,
    websocket::{
        enums::SeventvSubscriptionType,
        error::SeventvWsError,
        handler::SeventvEventApiProtocol,
        messages::SeventvDispatch,
        subscription::SeventvSubscription,
    },
};

/// Event types followed for every subscribed Twitch channel.
pub const TWITCH_CHANNEL_SUBSCRIPTION_TYPES: [SeventvSubscriptionType; 3] = [
    SeventvSubscriptionType::CreateCosmetic,
    SeventvSubscriptionType::CreateEntitlement,
    SeventvSubscriptionType::DeleteEntitlement,
];

/// Follows 7TV users, emote sets and Twitch channels over a pool of EventAPI connections.
#[derive(Debug)]
pub struct SeventvEventApi {
    config: SeventvEventApiConfig,
    manager: PubSubManager<SeventvEventApiProtocol>,
    users: DashSet<Ustr>,
    emote_sets: DashSet<Ustr>,
    twitch_channels: DashSet<Ustr>,
}

impl SeventvEventApi {
    /// Creates a new [`SeventvEventApi`] instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured endpoint is not a WebSocket URL.
    pub fn new(config: SeventvEventApiConfig) -> Result<Self, SeventvWsError> {
        let protocol = SeventvEventApiProtocol::new(config.heartbeat_interval());
        Self::with_protocol(config, protocol)
    }

    /// Creates a new [`SeventvEventApi`] instance with a custom protocol setup.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured endpoint is not a WebSocket URL.
    pub fn with_protocol(
        config: SeventvEventApiConfig,
        protocol: SeventvEventApiProtocol,
    ) -> Result<Self, SeventvWsError> {
        let manager = PubSubManager::new(config.pubsub_config(), protocol)?;
        Ok(Self {
            config,
            manager,
            users: DashSet::new(),
            emote_sets: DashSet::new(),
            twitch_channels: DashSet::new(),
        })
    }

    /// Starts the connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the client was already started or its worker could not be spawned.
    pub fn start(&mut self) -> Result<(), SeventvWsError> {
        self.manager.start()?;
        Ok(())
    }

    /// Closes every connection, blocking until the pool has drained.
    pub fn stop(&mut self) {
        self.manager.stop();
        self.users.clear();
        self.emote_sets.clear();
        self.twitch_channels.clear();
    }

    #[must_use]
    pub const fn config(&self) -> &SeventvEventApiConfig {
        &self.config
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
    pub fn take_dispatch_receiver(&mut self) -> Option<UnboundedReceiver<SeventvDispatch>> {
        self.manager.take_dispatch_receiver()
    }

    #[must_use]
    pub fn is_subscribed_to_user(&self, user_id: &str) -> bool {
        self.users.contains(&Ustr::from(user_id))
    }

    #[must_use]
    pub fn is_subscribed_to_emote_set(&self, emote_set_id: &str) -> bool {
        self.emote_sets.contains(&Ustr::from(emote_set_id))
    }

    #[must_use]
    pub fn is_subscribed_to_twitch_channel(&self, channel_id: &str) -> bool {
        self.twitch_channels.contains(&Ustr::from(channel_id))
    }

    /// Follows updates of a 7TV user and of their active emote set.
    ///
    /// Either id may be empty, in which case that half is skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has been stopped.
    pub fn subscribe_user(&self, user_id: &str, emote_set_id: &str) -> Result<(), SeventvWsError> {
        if !user_id.is_empty() {
            Self::subscribe_object(
                &self.manager,
                &self.users,
                SeventvSubscriptionType::UpdateUser,
                user_id,
            )?;
        }

        if !emote_set_id.is_empty() {
            Self::subscribe_object(
                &self.manager,
                &self.emote_sets,
                SeventvSubscriptionType::UpdateEmoteSet,
                emote_set_id,
            )?;
        }
        Ok(())
    }

    /// Follows cosmetics and entitlements of users chatting in a Twitch channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has been stopped.
    pub fn subscribe_twitch_channel(&self, channel_id: &str) -> Result<(), SeventvWsError> {
        if channel_id.is_empty() || !self.twitch_channels.insert(Ustr::from(channel_id)) {
            return Ok(());
        }

        for kind in TWITCH_CHANNEL_SUBSCRIPTION_TYPES {
            if let Err(e) = self
                .manager
                .subscribe(SeventvSubscription::twitch_channel(kind, channel_id))
            {
                self.twitch_channels.remove(&Ustr::from(channel_id));
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Stops following a 7TV user.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has been stopped.
    pub fn unsubscribe_user(&self, user_id: &str) -> Result<(), SeventvWsError> {
        Self::unsubscribe_object(
            &self.manager,
            &self.users,
            SeventvSubscriptionType::UpdateUser,
            user_id,
        )
    }

    /// Stops following an emote set.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has been stopped.
    pub fn unsubscribe_emote_set(&self, emote_set_id: &str) -> Result<(), SeventvWsError> {
        Self::unsubscribe_object(
            &self.manager,
            &self.emote_sets,
            SeventvSubscriptionType::UpdateEmoteSet,
            emote_set_id,
        )
    }

    /// Stops following a Twitch channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has been stopped.
    pub fn unsubscribe_twitch_channel(&self, channel_id: &str) -> Result<(), SeventvWsError> {
        if self.twitch_channels.remove(&Ustr::from(channel_id)).is_none() {
            return Ok(());
        }

        for kind in TWITCH_CHANNEL_SUBSCRIPTION_TYPES {
            self.manager
                .unsubscribe(SeventvSubscription::twitch_channel(kind, channel_id))?;
        }
        Ok(())
    }

    fn subscribe_object(
        manager: &PubSubManager<SeventvEventApiProtocol>,
        followed: &DashSet<Ustr>,
        kind: SeventvSubscriptionType,
        object_id: &str,
    ) -> Result<(), SeventvWsError> {
        let key = Ustr::from(object_id);
        if !followed.insert(key) {
            return Ok(());
        }

        if let Err(e) = manager.subscribe(SeventvSubscription::object(kind, object_id)) {
            followed.remove(&key);
            return Err(e.into());
        }
        Ok(())
    }

    fn unsubscribe_object(
        manager: &PubSubManager<SeventvEventApiProtocol>,
        followed: &DashSet<Ustr>,
        kind: SeventvSubscriptionType,
        object_id: &str,
    ) -> Result<(), SeventvWsError> {
        if followed.remove(&Ustr::from(object_id)).is_none() {
            return Ok(());
        }

        manager.unsubscribe(SeventvSubscription::object(kind, object_id))?;
        Ok(())
    }
}
