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

//! The single-threaded manager state machine.
//!
//! [`ManagerCore`] owns the pool of clients, the backlog of subscriptions that
//! do not fit on any live connection, and the reconnect backoff. It never
//! performs I/O itself: connection attempts and timers go through a
//! [`Transport`], and lifecycle events are fed back in by the caller. This keeps
//! every state transition synchronous and ordered.
//!
//! The core maintains one invariant above all others: a subscription the caller
//! believes active is either held by exactly one client or sits in the backlog
//! exactly once.

use std::{
    sync::{Arc, atomic::AtomicU8},
    time::{Duration, Instant},
};

use indexmap::{IndexMap, IndexSet};
use liveupdates_network::{
    CloseCode, ConnectionHandle, ConnectionId, ExponentialBackoff, WebSocketError,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    client::PubSubClient,
    diagnostics::PubSubDiagnostics,
    mode::ManagerState,
    protocol::{DispatchOf, PubSubProtocol, SubscriptionOf},
};

/// Reason sent with the close frames issued on shutdown.
pub const SHUTDOWN_CLOSE_REASON: &str = "Shutting down";

/// Number of doubling steps before the reconnect delay saturates.
pub const RECONNECT_BACKOFF_STEPS: u32 = 5;

/// Timer callbacks the core asks its transport to deliver later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerEvent {
    /// Retry opening a connection after a backoff delay.
    Reconnect,
    /// Run the liveness check of the given connection's client.
    CheckLiveness(ConnectionId),
}

/// The side-effecting half of the manager.
pub trait Transport {
    /// Starts opening a connection which will report back under `id`.
    fn open(&mut self, id: ConnectionId);

    /// Delivers `event` back to the core after `delay`.
    fn schedule(&mut self, delay: Duration, event: TimerEvent);
}

type ClientOf<P> = PubSubClient<<P as PubSubProtocol>::Handler>;

pub struct ManagerCore<P: PubSubProtocol, T: Transport> {
    protocol: P,
    transport: T,
    clients: IndexMap<ConnectionId, ClientOf<P>>,
    backlog: IndexSet<SubscriptionOf<P>>,
    connecting: Option<ConnectionId>,
    reconnect_scheduled: bool,
    next_id: u64,
    backoff: ExponentialBackoff<RECONNECT_BACKOFF_STEPS>,
    stopping: bool,
    state: Arc<AtomicU8>,
    diagnostics: Arc<PubSubDiagnostics>,
    dispatch_tx: UnboundedSender<DispatchOf<P>>,
}

impl<P: PubSubProtocol, T: Transport> std::fmt::Debug for ManagerCore<P, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(ManagerCore))
            .field("clients", &self.clients.keys().collect::<Vec<_>>())
            .field("backlog", &self.backlog)
            .field("connecting", &self.connecting)
            .field("reconnect_scheduled", &self.reconnect_scheduled)
            .field("backoff", &self.backoff)
            .field("stopping", &self.stopping)
            .finish_non_exhaustive()
    }
}

impl<P: PubSubProtocol, T: Transport> ManagerCore<P, T> {
    /// Creates a new [`ManagerCore`] instance.
    #[must_use]
    pub fn new(
        protocol: P,
        transport: T,
        reconnect_delay_initial: Duration,
        dispatch_tx: UnboundedSender<DispatchOf<P>>,
    ) -> Self {
        Self {
            protocol,
            transport,
            clients: IndexMap::new(),
            backlog: IndexSet::new(),
            connecting: None,
            reconnect_scheduled: false,
            next_id: 0,
            backoff: ExponentialBackoff::new(reconnect_delay_initial),
            stopping: false,
            state: Arc::new(AtomicU8::new(ManagerState::Idle.as_u8())),
            diagnostics: Arc::new(PubSubDiagnostics::new()),
            dispatch_tx,
        }
    }

    #[must_use]
    pub const fn diagnostics(&self) -> &Arc<PubSubDiagnostics> {
        &self.diagnostics
    }

    #[must_use]
    pub const fn state_handle(&self) -> &Arc<AtomicU8> {
        &self.state
    }

    #[must_use]
    pub fn state(&self) -> ManagerState {
        ManagerState::from_atomic(&self.state)
    }

    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.clients.keys().copied().collect()
    }

    /// Returns the subscriptions held by the client of `id`, if registered.
    #[must_use]
    pub fn subscriptions_of(&self, id: ConnectionId) -> Option<Vec<SubscriptionOf<P>>> {
        self.clients.get(&id).map(PubSubClient::subscriptions)
    }

    /// Returns the backlog in assignment order.
    #[must_use]
    pub fn backlog(&self) -> Vec<SubscriptionOf<P>> {
        self.backlog.iter().cloned().collect()
    }

    /// Returns the connection currently being opened, if any.
    #[must_use]
    pub const fn pending_connection(&self) -> Option<ConnectionId> {
        self.connecting
    }

    #[must_use]
    pub const fn is_reconnect_scheduled(&self) -> bool {
        self.reconnect_scheduled
    }

    #[must_use]
    pub const fn is_stopping(&self) -> bool {
        self.stopping
    }

    /// Returns true once shutdown was requested and nothing is left to close.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.stopping && self.clients.is_empty() && self.connecting.is_none()
    }

    /// Assigns `subscription` to the first client with room, or queues it and
    /// makes sure a connection is being opened.
    pub fn subscribe(&mut self, subscription: SubscriptionOf<P>) {
        if self.stopping {
            tracing::debug!("Ignoring subscribe to {subscription} while stopping");
            return;
        }

        if self.backlog.contains(&subscription)
            || self.clients.values().any(|client| client.contains(&subscription))
        {
            tracing::trace!("Already subscribed to {subscription}");
            return;
        }

        for client in self.clients.values_mut() {
            if client.subscribe(subscription.clone()) {
                return;
            }
        }

        tracing::debug!("No room for {subscription}, adding to backlog");
        self.backlog.insert(subscription);
        self.diagnostics.set_backlog(self.backlog.len());
        self.ensure_connection();
        self.update_state();
    }

    /// Removes `subscription` from whichever client holds it, or from the backlog.
    pub fn unsubscribe(&mut self, subscription: &SubscriptionOf<P>) {
        for client in self.clients.values_mut() {
            if client.unsubscribe(subscription) {
                return;
            }
        }

        if self.backlog.shift_remove(subscription) {
            tracing::debug!("Removed pending subscription {subscription}");
            self.diagnostics.set_backlog(self.backlog.len());
            self.update_state();
        } else {
            tracing::debug!("Not subscribed to {subscription}");
        }
    }

    /// Registers a client for the newly opened connection and drains the backlog into it.
    pub fn on_connection_opened(&mut self, handle: ConnectionHandle) {
        let id = handle.id();
        self.clear_connecting(id);
        self.diagnostics.record_connection_opened();

        let capacity = self.protocol.max_subscriptions();
        let mut client = PubSubClient::new(
            handle,
            self.protocol.create_handler(id),
            capacity,
            self.diagnostics.clone(),
        );

        if self.stopping {
            tracing::debug!("Connection {id} opened while stopping, closing");
            client.close(CloseCode::Normal, SHUTDOWN_CLOSE_REASON);
            self.clients.insert(id, client);
            self.update_state();
            return;
        }

        tracing::debug!("Connection {id} opened");

        if let Some(delay) = client.start(Instant::now()) {
            self.transport.schedule(delay, TimerEvent::CheckLiveness(id));
        }

        self.backoff.reset();

        while client.has_capacity() {
            let Some(subscription) = self.backlog.shift_remove_index(0) else {
                break;
            };
            client.subscribe(subscription);
        }
        self.diagnostics.set_backlog(self.backlog.len());
        self.clients.insert(id, client);

        if !self.backlog.is_empty() {
            self.ensure_connection();
        }
        self.update_state();
    }

    /// Removes the client of a closed connection and re-routes its subscriptions.
    pub fn on_connection_closed(&mut self, id: ConnectionId) {
        self.diagnostics.record_connection_closed();
        if self.connecting == Some(id) {
            self.connecting = None;
        }

        let Some(mut client) = self.clients.shift_remove(&id) else {
            tracing::error!("Closed connection {id} was not registered");
            debug_assert!(false, "closed connection {id} was not registered");
            self.update_state();
            return;
        };

        client.stop();
        tracing::debug!("Connection {id} closed holding {} subscriptions", client.len());

        if !self.stopping {
            for subscription in client.into_subscriptions() {
                self.subscribe(subscription);
            }
        }
        self.update_state();
    }

    /// Schedules a retry after the next backoff delay, if anything is still pending.
    pub fn on_connection_failed(&mut self, id: ConnectionId, error: &WebSocketError) {
        self.diagnostics.record_connection_failed();
        self.clear_connecting(id);
        tracing::warn!("Connection {id} failed: {error}");

        if self.stopping {
            self.update_state();
            return;
        }

        if self.backlog.is_empty() {
            tracing::debug!("No pending subscriptions, not reconnecting");
        } else {
            let delay = self.backoff.next_duration();
            tracing::debug!("Reconnecting in {delay:?}");
            self.reconnect_scheduled = true;
            self.transport.schedule(delay, TimerEvent::Reconnect);
        }
        self.update_state();
    }

    /// Routes an inbound frame to the client owning the connection.
    pub fn on_message(&mut self, id: ConnectionId, text: &str) {
        let Some(client) = self.clients.get_mut(&id) else {
            tracing::warn!("Dropping message for unknown connection {id}");
            return;
        };

        if let Some(dispatch) = client.handle_message(text, Instant::now())
            && let Err(e) = self.dispatch_tx.send(dispatch)
        {
            tracing::debug!("Dispatch receiver dropped: {e}");
        }
    }

    pub fn on_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Reconnect => {
                self.reconnect_scheduled = false;
                if !self.stopping && !self.backlog.is_empty() {
                    self.ensure_connection();
                }
                self.update_state();
            }
            TimerEvent::CheckLiveness(id) => {
                let Some(client) = self.clients.get_mut(&id) else {
                    tracing::trace!("Liveness check for stale connection {id}");
                    return;
                };

                if let Some(delay) = client.check_liveness(Instant::now()) {
                    self.transport.schedule(delay, TimerEvent::CheckLiveness(id));
                }
            }
        }
    }

    /// Closes every connection and stops accepting new work.
    pub fn stop(&mut self) {
        if self.stopping {
            return;
        }

        tracing::debug!(
            "Stopping with {} connections and {} pending subscriptions",
            self.clients.len(),
            self.backlog.len()
        );

        self.stopping = true;
        self.backlog.clear();
        self.diagnostics.set_backlog(0);

        for client in self.clients.values_mut() {
            client.stop();
            client.close(CloseCode::Normal, SHUTDOWN_CLOSE_REASON);
        }
        self.update_state();
    }

    /// Marks the manager stopped once the event loop has drained.
    pub fn finish(&mut self) {
        if !self.clients.is_empty() {
            tracing::error!(
                "Finished with {} connections still registered",
                self.clients.len()
            );
        }
        debug_assert!(self.clients.is_empty(), "connections survived shutdown");

        ManagerState::Stopped.store(&self.state);
    }

    fn ensure_connection(&mut self) {
        if self.stopping || self.connecting.is_some() || self.reconnect_scheduled {
            return;
        }

        self.next_id += 1;
        let id = ConnectionId::new(self.next_id);
        self.connecting = Some(id);

        tracing::debug!("Opening connection {id}");
        self.transport.open(id);
    }

    fn clear_connecting(&mut self, id: ConnectionId) {
        match self.connecting {
            Some(pending) if pending == id => self.connecting = None,
            Some(pending) => {
                tracing::warn!("Event for {id} while {pending} is being opened");
            }
            None => {}
        }
    }

    fn update_state(&self) {
        let state = if self.stopping {
            ManagerState::Stopping
        } else if self.connecting.is_some() || self.reconnect_scheduled {
            ManagerState::AwaitingConnection
        } else if self.clients.is_empty() {
            ManagerState::Idle
        } else {
            ManagerState::Active
        };
        state.store(&self.state);
    }
}
