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

use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Lifecycle state of a pub/sub manager.
///
/// The state is owned by the manager's event loop and published through an
/// atomic so other threads can observe it.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Hash,
    PartialEq,
    Eq,
    AsRefStr,
    EnumString,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManagerState {
    /// No live connections and no pending subscriptions.
    #[default]
    Idle = 0,
    /// A connection attempt is in flight or scheduled after a backoff delay.
    AwaitingConnection = 1,
    /// At least one connection is live and nothing is waiting for a connection.
    Active = 2,
    /// Shutdown was requested; connections are being closed.
    Stopping = 3,
    /// The event loop has drained and no connections remain.
    Stopped = 4,
}

impl ManagerState {
    /// Convert a u8 to [`ManagerState`], useful when loading from an `AtomicU8`.
    ///
    /// # Panics
    ///
    /// Panics if `value` does not correspond to a variant.
    #[inline]
    #[must_use]
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::AwaitingConnection,
            2 => Self::Active,
            3 => Self::Stopping,
            4 => Self::Stopped,
            _ => panic!("Invalid `ManagerState` value: {value}"),
        }
    }

    #[inline]
    pub fn from_atomic(value: &AtomicU8) -> Self {
        Self::from_u8(value.load(Ordering::SeqCst))
    }

    /// Convert a [`ManagerState`] to a u8, useful when storing to an `AtomicU8`.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn store(self, target: &AtomicU8) {
        target.store(self.as_u8(), Ordering::SeqCst);
    }

    /// Returns true once shutdown has been requested.
    #[inline]
    #[must_use]
    pub const fn is_shutting_down(&self) -> bool {
        matches!(self, Self::Stopping | Self::Stopped)
    }

    #[inline]
    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}
