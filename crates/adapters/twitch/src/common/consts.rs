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

//! Constants for the Twitch PubSub integration.

/// Production PubSub endpoint.
pub const TWITCH_PUBSUB_URL: &str = "wss://pubsub-edge.twitch.tv";

/// Maximum number of topics a single PubSub connection may listen to.
pub const TWITCH_MAX_LISTENS: usize = 50;

/// Interval between client PINGs; a missing PONG by the next PING closes the connection.
pub const TWITCH_DEFAULT_PING_INTERVAL_SECS: u64 = 15;

/// Short name used for the worker thread and log context.
pub const TWITCH_SHORT_NAME: &str = "twitch";
