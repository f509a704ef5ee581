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

//! Common test related helper functions.

use std::{
    future::Future,
    thread,
    time::{Duration, Instant},
};

/// Repeatedly evaluates a condition with a delay until it becomes true or a timeout occurs.
///
/// # Panics
///
/// This function will panic if the timeout duration is exceeded without the condition being met.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
/// use liveupdates_common::testing::wait_until;
///
/// let start_time = Instant::now();
///
/// wait_until(|| start_time.elapsed() > Duration::from_millis(200), Duration::from_secs(2));
/// ```
pub fn wait_until<F>(mut condition: F, timeout: Duration)
where
    F: FnMut() -> bool,
{
    let start_time = Instant::now();

    loop {
        if condition() {
            break;
        }

        assert!(
            start_time.elapsed() <= timeout,
            "Timeout waiting for condition"
        );

        thread::sleep(Duration::from_millis(50));
    }
}

/// Async variant of [`wait_until`], polling the condition from a tokio task.
///
/// # Panics
///
/// This function will panic if the timeout duration is exceeded without the condition being met.
pub async fn wait_until_async<F, Fut>(mut condition: F, timeout: Duration)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start_time = Instant::now();

    loop {
        if condition().await {
            break;
        }

        assert!(
            start_time.elapsed() <= timeout,
            "Timeout waiting for condition"
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_wait_until_returns_once_condition_holds() {
        let mut calls = 0;
        wait_until(
            || {
                calls += 1;
                calls >= 3
            },
            Duration::from_secs(1),
        );
        assert_eq!(calls, 3);
    }

    #[rstest]
    #[should_panic(expected = "Timeout waiting for condition")]
    fn test_wait_until_panics_on_timeout() {
        wait_until(|| false, Duration::from_millis(120));
    }

    #[rstest]
    #[tokio::test]
    async fn test_wait_until_async_observes_background_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            counter_clone.fetch_add(1, Ordering::Relaxed);
        });

        wait_until_async(
            || {
                let counter = counter.clone();
                async move { counter.load(Ordering::Relaxed) == 1 }
            },
            Duration::from_secs(2),
        )
        .await;
    }
}
