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

//! Provides a bounded exponential backoff used to pace reconnection attempts.
//!
//! The delay doubles on every call until the configured number of steps is
//! reached, after which it saturates. There is no jitter: the sequence is fully
//! deterministic, which keeps reconnect pacing reproducible under test.

use std::time::Duration;

/// A bounded exponential delay generator with `N` growth steps.
///
/// The k-th call to [`ExponentialBackoff::next_duration`] (1-indexed) returns
/// `start * 2^(min(k, N) - 1)`. A value of `N == 0` behaves like `N == 1`.
///
/// Not thread-safe; the owner serializes access from its event loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExponentialBackoff<const N: u32> {
    /// The delay returned by the first call after construction or reset.
    start: Duration,
    /// The step which the next call will return (1-indexed).
    step: u32,
}

impl<const N: u32> ExponentialBackoff<N> {
    /// Creates a new [`ExponentialBackoff`] instance.
    #[must_use]
    pub const fn new(start: Duration) -> Self {
        Self { start, step: 1 }
    }

    /// Returns the next backoff delay and advances the internal step.
    pub fn next_duration(&mut self) -> Duration {
        let delay = self.current_delay();

        if self.step < Self::max_step() {
            self.step += 1;
        }

        delay
    }

    /// Reset the backoff to its initial state.
    pub const fn reset(&mut self) {
        self.step = 1;
    }

    /// Returns the delay the next call to [`Self::next_duration`] will produce.
    #[must_use]
    pub fn current_delay(&self) -> Duration {
        let exponent = self.step.saturating_sub(1);
        2u32.checked_pow(exponent)
            .and_then(|factor| self.start.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// Returns the initial delay.
    #[must_use]
    pub const fn start(&self) -> Duration {
        self.start
    }

    /// Returns the current 1-indexed step.
    #[must_use]
    pub const fn step(&self) -> u32 {
        self.step
    }

    /// Returns the saturation step.
    #[must_use]
    pub const fn max_step() -> u32 {
        if N == 0 { 1 } else { N }
    }
}
