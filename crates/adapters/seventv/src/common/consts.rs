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

//! Constants for the 7TV EventAPI integration.

/// Production EventAPI endpoint.
pub const SEVENTV_EVENTAPI_URL: &str = "wss://events.7tv.io/v3";

/// Maximum number of subscriptions a single EventAPI connection may hold.
pub const SEVENTV_MAX_SUBSCRIPTIONS: usize = 100;

/// Heartbeat interval assumed until the server's Hello announces its own.
pub const SEVENTV_DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 25_000;

/// A connection is considered dead after this many heartbeat intervals of silence.
pub const SEVENTV_HEARTBEAT_TIMEOUT_FACTOR: u32 = 3;

/// Short name used for the worker thread and log context.
pub const SEVENTV_SHORT_NAME: &str = "7tv";

/// Platform identifier used in channel conditions.
pub const SEVENTV_TWITCH_PLATFORM: &str = "TWITCH";
