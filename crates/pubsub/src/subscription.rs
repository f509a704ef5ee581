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

//! Subscription values routed by the manager.

use std::{
    fmt::{Debug, Display},
    hash::Hash,
};

/// A hashable description of a topic a caller wants to observe.
///
/// Two subscriptions are the same topic iff they compare equal; the manager
/// relies on this to keep each topic on at most one connection. Frame encoding
/// must be a pure function of the value.
pub trait Subscription: Clone + Eq + Hash + Debug + Display + Send + 'static {
    /// Encodes the frame which starts delivery for this topic.
    fn encode_subscribe(&self) -> String;

    /// Encodes the frame which stops delivery for this topic.
    fn encode_unsubscribe(&self) -> String;
}
