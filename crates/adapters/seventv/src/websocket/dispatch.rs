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

//! Typed views over dispatch bodies.
//!
//! Bodies are kept as raw JSON on [`SeventvDispatch`]; these helpers pick out
//! the changes applications usually act on and drop entries that are missing
//! required fields.

use serde_json::Value;
use ustr::Ustr;

use crate::{
    common::consts::SEVENTV_TWITCH_PLATFORM,
    websocket::{
        enums::{SeventvCosmeticKind, SeventvSubscriptionType},
        messages::SeventvDispatch,
    },
};

/// A single emote change within an `emote_set.update` event.
#[derive(Clone, Debug, PartialEq)]
pub enum EmoteSetChange {
    Added {
        emote_set_id: Ustr,
        actor_name: Option<Ustr>,
        emote_id: Ustr,
        /// The active emote object, including its `data`.
        emote: Value,
    },
    Updated {
        emote_set_id: Ustr,
        actor_name: Option<Ustr>,
        emote_id: Ustr,
        old_name: String,
        new_name: String,
    },
    Removed {
        emote_set_id: Ustr,
        actor_name: Option<Ustr>,
        emote_id: Ustr,
        emote_name: String,
    },
}

/// A user switched the emote set bound to one of their platform connections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserEmoteSetUpdate {
    pub user_id: Ustr,
    pub actor_name: Option<Ustr>,
    pub old_emote_set_id: Ustr,
    pub emote_set_id: Ustr,
    pub connection_index: usize,
}

/// A cosmetic (badge, paint, ...) became known.
#[derive(Clone, Debug, PartialEq)]
pub struct CosmeticCreate {
    pub kind: SeventvCosmeticKind,
    pub data: Value,
}

/// A cosmetic was granted to or withdrawn from a Twitch user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntitlementChange {
    pub ref_id: Ustr,
    pub kind: SeventvCosmeticKind,
    pub user_id: Ustr,
    pub user_name: String,
}

fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value[key].as_str().unwrap_or_default()
}

fn entries_for<'a>(body: &'a Value, field: &str, key: &'a str) -> impl Iterator<Item = &'a Value> {
    body[field]
        .as_array()
        .into_iter()
        .flatten()
        .filter(move |entry| entry["key"] == key)
}

fn is_valid_active_emote(emote: &Value) -> bool {
    let data = &emote["data"];
    ["id", "name", "data"].iter().all(|key| emote.get(key).is_some())
        && ["name", "host", "owner"].iter().all(|key| data.get(key).is_some())
}

impl SeventvDispatch {
    /// Returns the emote changes of an `emote_set.update` event in the order
    /// added, updated, removed.
    #[must_use]
    pub fn emote_set_changes(&self) -> Vec<EmoteSetChange> {
        if self.kind != SeventvSubscriptionType::UpdateEmoteSet || self.id.is_empty() {
            return Vec::new();
        }

        let mut changes = Vec::new();

        for pushed in entries_for(&self.body, "pushed", "emotes") {
            let emote = &pushed["value"];
            if !is_valid_active_emote(emote) {
                tracing::debug!("Invalid emote addition in {}: {pushed}", self.id);
                continue;
            }
            changes.push(EmoteSetChange::Added {
                emote_set_id: self.id,
                actor_name: self.actor_name,
                emote_id: Ustr::from(str_field(emote, "id")),
                emote: emote.clone(),
            });
        }

        for updated in entries_for(&self.body, "updated", "emotes") {
            let emote_id = str_field(&updated["value"], "id");
            let old_name = str_field(&updated["old_value"], "name");
            let new_name = str_field(&updated["value"], "name");
            if emote_id.is_empty() || old_name.is_empty() || new_name.is_empty() || old_name == new_name
            {
                tracing::debug!("Invalid emote update in {}: {updated}", self.id);
                continue;
            }
            changes.push(EmoteSetChange::Updated {
                emote_set_id: self.id,
                actor_name: self.actor_name,
                emote_id: Ustr::from(emote_id),
                old_name: old_name.to_string(),
                new_name: new_name.to_string(),
            });
        }

        for pulled in entries_for(&self.body, "pulled", "emotes") {
            let emote_id = str_field(&pulled["old_value"], "id");
            let emote_name = str_field(&pulled["old_value"], "name");
            if emote_id.is_empty() || emote_name.is_empty() {
                tracing::debug!("Invalid emote removal in {}: {pulled}", self.id);
                continue;
            }
            changes.push(EmoteSetChange::Removed {
                emote_set_id: self.id,
                actor_name: self.actor_name,
                emote_id: Ustr::from(emote_id),
                emote_name: emote_name.to_string(),
            });
        }

        changes
    }

    /// Returns the emote set switches of a `user.update` event.
    #[must_use]
    pub fn user_emote_set_updates(&self) -> Vec<UserEmoteSetUpdate> {
        if self.kind != SeventvSubscriptionType::UpdateUser || self.id.is_empty() {
            return Vec::new();
        }

        let mut updates = Vec::new();
        for connection in entries_for(&self.body, "updated", "connections") {
            let connection_index = connection["index"]
                .as_u64()
                .and_then(|index| usize::try_from(index).ok())
                .unwrap_or_default();

            for value in entries_for(connection, "value", "emote_set") {
                let old_emote_set_id = str_field(&value["old_value"], "id");
                let emote_set_id = str_field(&value["value"], "id");
                if old_emote_set_id.is_empty() || emote_set_id.is_empty() {
                    continue;
                }
                updates.push(UserEmoteSetUpdate {
                    user_id: self.id,
                    actor_name: self.actor_name,
                    old_emote_set_id: Ustr::from(old_emote_set_id),
                    emote_set_id: Ustr::from(emote_set_id),
                    connection_index,
                });
            }
        }
        updates
    }

    /// Returns the cosmetic of a `cosmetic.create` event, if complete.
    #[must_use]
    pub fn cosmetic(&self) -> Option<CosmeticCreate> {
        if self.kind != SeventvSubscriptionType::CreateCosmetic {
            return None;
        }

        let object = &self.body["object"];
        let kind = serde_json::from_value(object["kind"].clone()).ok()?;
        let data = &object["data"];

        let has_data = data.as_object().is_some_and(|data| !data.is_empty());
        (has_data && kind != SeventvCosmeticKind::Unknown).then(|| CosmeticCreate {
            kind,
            data: data.clone(),
        })
    }

    /// Returns the entitlement of an `entitlement.create`/`entitlement.delete`
    /// event, resolved to the user's Twitch connection.
    #[must_use]
    pub fn entitlement(&self) -> Option<EntitlementChange> {
        if !matches!(
            self.kind,
            SeventvSubscriptionType::CreateEntitlement | SeventvSubscriptionType::DeleteEntitlement
        ) {
            return None;
        }

        let object = &self.body["object"];
        let kind: SeventvCosmeticKind = serde_json::from_value(object["kind"].clone()).ok()?;
        let ref_id = str_field(object, "ref_id");

        let twitch = object["user"]["connections"]
            .as_array()?
            .iter()
            .find(|connection| connection["platform"] == SEVENTV_TWITCH_PLATFORM)?;
        let user_id = str_field(twitch, "id");
        let user_name = str_field(twitch, "username");

        if ref_id.is_empty()
            || user_id.is_empty()
            || user_name.is_empty()
            || kind == SeventvCosmeticKind::Unknown
        {
            return None;
        }

        Some(EntitlementChange {
            ref_id: Ustr::from(ref_id),
            kind,
            user_id: Ustr::from(user_id),
            user_name: user_name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn active_emote(id: &str, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "data": {"name": name, "host": {"url": "//cdn"}, "owner": {"id": "o"}}
        })
    }

    #[rstest]
    fn test_emote_set_changes() {
        let dispatch = SeventvDispatch::new(
            SeventvSubscriptionType::UpdateEmoteSet,
            json!({
                "id": "set-1",
                "actor": {"display_name": "Editor"},
                "pushed": [
                    {"key": "emotes", "value": active_emote("e1", "Pog")},
                    {"key": "emotes", "value": {"id": "broken"}},
                    {"key": "name", "value": "renamed"}
                ],
                "updated": [
                    {"key": "emotes", "old_value": {"name": "Old"}, "value": {"id": "e2", "name": "New"}},
                    {"key": "emotes", "old_value": {"name": "Same"}, "value": {"id": "e3", "name": "Same"}}
                ],
                "pulled": [
                    {"key": "emotes", "old_value": {"id": "e4", "name": "Gone"}}
                ]
            }),
        );

        let changes = dispatch.emote_set_changes();
        let editor = Some(Ustr::from("Editor"));
        let set = Ustr::from("set-1");

        assert_eq!(changes.len(), 3);
        assert_eq!(
            changes[0],
            EmoteSetChange::Added {
                emote_set_id: set,
                actor_name: editor,
                emote_id: Ustr::from("e1"),
                emote: active_emote("e1", "Pog"),
            }
        );
        assert_eq!(
            changes[1],
            EmoteSetChange::Updated {
                emote_set_id: set,
                actor_name: editor,
                emote_id: Ustr::from("e2"),
                old_name: "Old".to_string(),
                new_name: "New".to_string(),
            }
        );
        assert_eq!(
            changes[2],
            EmoteSetChange::Removed {
                emote_set_id: set,
                actor_name: editor,
                emote_id: Ustr::from("e4"),
                emote_name: "Gone".to_string(),
            }
        );
    }

    #[rstest]
    fn test_user_emote_set_updates() {
        let dispatch = SeventvDispatch::new(
            SeventvSubscriptionType::UpdateUser,
            json!({
                "id": "user-1",
                "updated": [{
                    "key": "connections",
                    "index": 1,
                    "value": [
                        {"key": "emote_set", "old_value": {"id": "a"}, "value": {"id": "b"}},
                        {"key": "display_name", "old_value": "x", "value": "y"}
                    ]
                }]
            }),
        );

        assert_eq!(
            dispatch.user_emote_set_updates(),
            vec![UserEmoteSetUpdate {
                user_id: Ustr::from("user-1"),
                actor_name: None,
                old_emote_set_id: Ustr::from("a"),
                emote_set_id: Ustr::from("b"),
                connection_index: 1,
            }]
        );
    }

    #[rstest]
    #[case(json!({"object": {"kind": "BADGE", "data": {"id": "b1"}}}), Some(SeventvCosmeticKind::Badge))]
    #[case(json!({"object": {"kind": "BADGE", "data": {}}}), None)]
    #[case(json!({"object": {"kind": "SPARKLES", "data": {"id": "x"}}}), None)]
    fn test_cosmetic(#[case] body: Value, #[case] expected: Option<SeventvCosmeticKind>) {
        let dispatch = SeventvDispatch::new(SeventvSubscriptionType::CreateCosmetic, body);
        assert_eq!(dispatch.cosmetic().map(|cosmetic| cosmetic.kind), expected);
    }

    #[rstest]
    fn test_entitlement_resolves_twitch_connection() {
        let dispatch = SeventvDispatch::new(
            SeventvSubscriptionType::CreateEntitlement,
            json!({
                "object": {
                    "kind": "BADGE",
                    "ref_id": "badge-1",
                    "user": {"connections": [
                        {"platform": "YOUTUBE", "id": "yt", "username": "yt_user"},
                        {"platform": "TWITCH", "id": "42", "username": "viewer"}
                    ]}
                }
            }),
        );

        assert_eq!(
            dispatch.entitlement(),
            Some(EntitlementChange {
                ref_id: Ustr::from("badge-1"),
                kind: SeventvCosmeticKind::Badge,
                user_id: Ustr::from("42"),
                user_name: "viewer".to_string(),
            })
        );
    }

    #[rstest]
    fn test_views_reject_other_kinds() {
        let dispatch = SeventvDispatch::new(SeventvSubscriptionType::ResetEntitlement, json!({"id": "x"}));

        assert!(dispatch.emote_set_changes().is_empty());
        assert!(dispatch.user_emote_set_updates().is_empty());
        assert_eq!(dispatch.cosmetic(), None);
        assert_eq!(dispatch.entitlement(), None);
    }
}
