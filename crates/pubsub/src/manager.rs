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

//! Threaded facade running a [`ManagerCore`] on a dedicated worker thread.
//!
//! Callers on any thread hand commands to the worker over an unbounded channel.
//! The worker owns a current-thread tokio runtime; connection lifecycle events,
//! inbound frames, and timers are all funnelled into the same channel so that
//! the core observes them strictly one at a time.

use std::{
    fmt::Debug,
    sync::{Arc, atomic::AtomicU8, mpsc},
    thread::JoinHandle,
    time::Duration,
};

use liveupdates_common::logging::{CMD, EVT};
use liveupdates_network::{
    ConnectionEvent, ConnectionId, EventHandler, WebSocketConfig, spawn_connection,
};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::{
    config::PubSubConfig,
    diagnostics::{DiagnosticsSnapshot, PubSubDiagnostics},
    engine::{ManagerCore, TimerEvent, Transport},
    error::PubSubError,
    mode::ManagerState,
    protocol::{DispatchOf, PubSubProtocol, SubscriptionOf},
};

/// Requests a caller hands to the worker thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ManagerCommand<S> {
    Subscribe(S),
    Unsubscribe(S),
    Stop,
}

/// Everything the event loop reacts to.
#[derive(Debug)]
pub enum ManagerEvent<S> {
    Command(ManagerCommand<S>),
    Connection(ConnectionEvent),
    Timer(TimerEvent),
}

/// [`Transport`] spawning real WebSocket connections and tokio timers.
///
/// Must only be driven from inside the worker's runtime.
#[derive(Debug)]
pub struct TokioTransport<S> {
    websocket: WebSocketConfig,
    event_tx: UnboundedSender<ManagerEvent<S>>,
}

impl<S> TokioTransport<S> {
    #[must_use]
    pub const fn new(websocket: WebSocketConfig, event_tx: UnboundedSender<ManagerEvent<S>>) -> Self {
        Self {
            websocket,
            event_tx,
        }
    }
}

impl<S: Send + 'static> Transport for TokioTransport<S> {
    fn open(&mut self, id: ConnectionId) {
        let tx = self.event_tx.clone();
        let handler: EventHandler = Arc::new(move |event| {
            if tx.send(ManagerEvent::Connection(event)).is_err() {
                tracing::trace!("Event loop gone, dropping connection event");
            }
        });

        // The connection task reports its own outcome through the handler
        drop(spawn_connection(id, self.websocket.clone(), handler));
    }

    fn schedule(&mut self, delay: Duration, event: TimerEvent) {
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(ManagerEvent::Timer(event)).is_err() {
                tracing::trace!("Event loop gone, dropping {event:?}");
            }
        });
    }
}

type CoreOf<P> = ManagerCore<P, TokioTransport<SubscriptionOf<P>>>;
type EventReceiver<P> = UnboundedReceiver<ManagerEvent<SubscriptionOf<P>>>;

/// A pool of pub/sub connections driven by its own worker thread.
pub struct PubSubManager<P: PubSubProtocol> {
    config: PubSubConfig,
    event_tx: UnboundedSender<ManagerEvent<SubscriptionOf<P>>>,
    idle: Option<(CoreOf<P>, EventReceiver<P>)>,
    dispatch_rx: Option<UnboundedReceiver<DispatchOf<P>>>,
    state: Arc<AtomicU8>,
    diagnostics: Arc<PubSubDiagnostics>,
    worker: Option<JoinHandle<()>>,
    done_rx: Option<mpsc::Receiver<()>>,
}

impl<P: PubSubProtocol> Debug for PubSubManager<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(PubSubManager))
            .field("config", &self.config)
            .field("state", &self.state())
            .field("started", &self.idle.is_none())
            .finish_non_exhaustive()
    }
}

impl<P: PubSubProtocol> PubSubManager<P> {
    /// Creates a new [`PubSubManager`] instance; nothing runs until [`Self::start`].
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(config: PubSubConfig, protocol: P) -> Result<Self, PubSubError> {
        config.validate()?;

        let (event_tx, event_rx) = unbounded_channel();
        let (dispatch_tx, dispatch_rx) = unbounded_channel();

        let transport = TokioTransport::new(config.websocket_config(), event_tx.clone());
        let core = ManagerCore::new(
            protocol,
            transport,
            config.reconnect_delay_initial(),
            dispatch_tx,
        );

        Ok(Self {
            state: core.state_handle().clone(),
            diagnostics: core.diagnostics().clone(),
            config,
            event_tx,
            idle: Some((core, event_rx)),
            dispatch_rx: Some(dispatch_rx),
            worker: None,
            done_rx: None,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &PubSubConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> ManagerState {
        ManagerState::from_atomic(&self.state)
    }

    #[must_use]
    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    /// Takes the receiver of decoded business payloads; only the first call returns `Some`.
    pub fn take_dispatch_receiver(&mut self) -> Option<UnboundedReceiver<DispatchOf<P>>> {
        self.dispatch_rx.take()
    }

    /// Spawns the worker thread and starts processing queued commands.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager was already started or stopped, or if
    /// the worker thread cannot be spawned.
    pub fn start(&mut self) -> Result<(), PubSubError> {
        let Some((core, event_rx)) = self.idle.take() else {
            return Err(PubSubError::AlreadyStarted);
        };

        let (done_tx, done_rx) = mpsc::channel();
        let name = format!("pubsub-{}", self.config.short_name);
        tracing::debug!("Starting worker thread {name}");

        let worker = std::thread::Builder::new().name(name).spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::error!("Failed to build worker runtime: {e}");
                    return;
                }
            };

            runtime.block_on(run_event_loop(core, event_rx));
            drop(runtime);

            let _ = done_tx.send(());
        })?;

        self.worker = Some(worker);
        self.done_rx = Some(done_rx);
        Ok(())
    }

    /// Requests `subscription`; calls made before [`Self::start`] are queued.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager is shutting down.
    pub fn subscribe(&self, subscription: SubscriptionOf<P>) -> Result<(), PubSubError> {
        self.send_command(ManagerCommand::Subscribe(subscription))
    }

    /// Withdraws `subscription`, whether live or still pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager is shutting down.
    pub fn unsubscribe(&self, subscription: SubscriptionOf<P>) -> Result<(), PubSubError> {
        self.send_command(ManagerCommand::Unsubscribe(subscription))
    }

    /// Closes every connection and blocks until the worker drains or the stop
    /// timeout elapses, in which case the worker is detached.
    pub fn stop(&mut self) {
        if self.idle.take().is_some() {
            tracing::debug!("Stopping manager which was never started");
            ManagerState::Stopped.store(&self.state);
            return;
        }

        let Some(worker) = self.worker.take() else {
            return;
        };

        if self
            .event_tx
            .send(ManagerEvent::Command(ManagerCommand::Stop))
            .is_err()
        {
            tracing::debug!("Event loop already exited");
        }

        let timeout = self.config.stop_timeout();
        let outcome = self
            .done_rx
            .take()
            .map(|done_rx| done_rx.recv_timeout(timeout));

        match outcome {
            Some(Err(mpsc::RecvTimeoutError::Timeout)) => {
                tracing::warn!(
                    "Worker {} did not stop within {timeout:?}, detaching",
                    self.config.short_name
                );
            }
            _ => {
                if worker.join().is_err() {
                    tracing::error!("Worker {} panicked", self.config.short_name);
                }
                tracing::debug!("Stopped worker {}", self.config.short_name);
            }
        }
    }

    fn send_command(&self, command: ManagerCommand<SubscriptionOf<P>>) -> Result<(), PubSubError> {
        if self.state().is_shutting_down() {
            return Err(PubSubError::NotRunning);
        }

        self.event_tx
            .send(ManagerEvent::Command(command))
            .map_err(|_| PubSubError::NotRunning)
    }
}

impl<P: PubSubProtocol> Drop for PubSubManager<P> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_event_loop<P: PubSubProtocol>(mut core: CoreOf<P>, mut event_rx: EventReceiver<P>) {
    tracing::debug!("Event loop started");

    while let Some(event) = event_rx.recv().await {
        match event {
            ManagerEvent::Command(command) => {
                tracing::debug!("{CMD} {command:?}");
                match command {
                    ManagerCommand::Subscribe(subscription) => core.subscribe(subscription),
                    ManagerCommand::Unsubscribe(subscription) => core.unsubscribe(&subscription),
                    ManagerCommand::Stop => core.stop(),
                }
            }
            ManagerEvent::Connection(ConnectionEvent::Opened(handle)) => {
                core.on_connection_opened(handle);
            }
            ManagerEvent::Connection(ConnectionEvent::Message { id, text }) => {
                core.on_message(id, &text);
            }
            ManagerEvent::Connection(ConnectionEvent::Closed { id }) => {
                core.on_connection_closed(id);
            }
            ManagerEvent::Connection(ConnectionEvent::Failed { id, error }) => {
                core.on_connection_failed(id, &error);
            }
            ManagerEvent::Timer(timer) => {
                tracing::trace!("{EVT} {timer:?}");
                core.on_timer(timer);
            }
        }

        if core.is_drained() {
            break;
        }
    }

    core.finish();
    tracing::debug!("Event loop finished");
}
