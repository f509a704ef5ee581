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

//! Protocol factory plugged into the manager.

use liveupdates_network::ConnectionId;

use crate::client::ClientHandler;

/// Describes one pub/sub backend: its per-connection capacity and how to build
/// the protocol handler for each new connection.
pub trait PubSubProtocol: Send + 'static {
    type Handler: ClientHandler;

    /// The maximum number of subscriptions a single connection may hold.
    fn max_subscriptions(&self) -> usize;

    /// Creates the handler for a freshly opened connection.
    fn create_handler(&self, id: ConnectionId) -> Self::Handler;
}

/// The subscription type routed by protocol `P`.
pub type SubscriptionOf<P> =
    <<P as PubSubProtocol>::Handler as ClientHandler>::Subscription;

/// The business payload type produced by protocol `P`.
pub type DispatchOf<P> = <<P as PubSubProtocol>::Handler as ClientHandler>::Dispatch;
