//! Audit log entry construction.
//!
//! Updates record `{field: {"from": .., "to": ..}}` for every changed
//! top-level field. Creates and imports record the new row under `after`;
//! deletes record the removed row under `before`.

use affiliate_types::{AuditAction, NewAuditEntry};
use serde::Serialize;
use serde_json::{Map, Value, json};
use uuid::Uuid;

/// Entity name for network rows.
pub const NETWORKS: &str = "networks";
/// Entity name for offer rows.
pub const OFFERS: &str = "offers";
/// Entity name for banner rows.
pub const BANNERS: &str = "banners";
/// Entity name for rotation rows.
pub const ROTATIONS: &str = "banner_rotations";
/// Entity name for master data rows.
pub const MASTER_DATA: &str = "master_data";
/// Entity name for network join requests.
pub const NETWORK_REQUESTS: &str = "network_requests";
/// Entity name for affiliate account details.
pub const AFFILIATE_DETAILS: &str = "affiliate_details";

/// Bookkeeping fields left out of diffs.
const IGNORED_FIELDS: &[&str] = &["updated_at"];

/// Serialize a record for the audit log. Unserializable records log as null.
pub fn snapshot<T: Serialize>(record: &T) -> Value {
    serde_json::to_value(record).unwrap_or(Value::Null)
}

/// Field-level difference between two snapshots.
///
/// Only top-level object fields are compared; non-object snapshots that
/// differ are recorded whole under `from`/`to`.
pub fn diff(before: &Value, after: &Value) -> Map<String, Value> {
    let mut changes = Map::new();
    match (before, after) {
        (Value::Object(old), Value::Object(new)) => {
            for (key, to) in new {
                if IGNORED_FIELDS.contains(&key.as_str()) {
                    continue;
                }
                let from = old.get(key).unwrap_or(&Value::Null);
                if from != to {
                    changes.insert(key.clone(), json!({"from": from, "to": to}));
                }
            }
            for (key, from) in old {
                if !new.contains_key(key) && !IGNORED_FIELDS.contains(&key.as_str()) {
                    changes.insert(key.clone(), json!({"from": from, "to": Value::Null}));
                }
            }
        }
        (old, new) if old != new => {
            changes.insert("value".to_owned(), json!({"from": old, "to": new}));
        }
        _ => {}
    }
    changes
}

/// Audit entry for a newly created row.
pub fn created<T: Serialize>(
    entity: &str,
    entity_id: Uuid,
    action: AuditAction,
    actor: Option<&str>,
    record: &T,
) -> NewAuditEntry {
    entry(entity, entity_id, action, actor, json!({"after": snapshot(record)}))
}

/// Audit entry for a replaced row, or `None` when nothing changed.
pub fn updated<T: Serialize>(
    entity: &str,
    entity_id: Uuid,
    action: AuditAction,
    actor: Option<&str>,
    before: &T,
    after: &T,
) -> Option<NewAuditEntry> {
    let changes = diff(&snapshot(before), &snapshot(after));
    if changes.is_empty() {
        return None;
    }
    Some(entry(entity, entity_id, action, actor, Value::Object(changes)))
}

/// Audit entry for a deleted row.
pub fn deleted<T: Serialize>(entity: &str, entity_id: Uuid, actor: Option<&str>, record: &T) -> NewAuditEntry {
    entry(
        entity,
        entity_id,
        AuditAction::Delete,
        actor,
        json!({"before": snapshot(record)}),
    )
}

fn entry(entity: &str, entity_id: Uuid, action: AuditAction, actor: Option<&str>, changes: Value) -> NewAuditEntry {
    NewAuditEntry {
        entity: entity.to_owned(),
        entity_id,
        action,
        actor: actor.map(str::to_owned),
        changes,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::indexing_slicing)]

    use super::*;

    #[test]
    fn diff_reports_changed_fields_only() {
        let before = json!({"name": "A", "featured": false, "updated_at": "t1", "tags": ["x"]});
        let after = json!({"name": "B", "featured": false, "updated_at": "t2", "tags": ["x"]});
        let changes = diff(&before, &after);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["name"], json!({"from": "A", "to": "B"}));
    }

    #[test]
    fn removed_fields_become_null() {
        let changes = diff(&json!({"a": 1, "b": 2}), &json!({"a": 1}));
        assert_eq!(changes["b"], json!({"from": 2, "to": null}));
    }

    #[test]
    fn unchanged_update_yields_no_entry() {
        let row = json!({"name": "same"});
        let id = Uuid::now_v7();
        assert!(updated(OFFERS, id, AuditAction::Update, None, &row, &row).is_none());
    }

    #[test]
    fn create_and_delete_wrap_snapshots() {
        let row = json!({"name": "n"});
        let id = Uuid::now_v7();
        let c = created(NETWORKS, id, AuditAction::Import, Some("ops"), &row);
        assert_eq!(c.changes, json!({"after": {"name": "n"}}));
        assert_eq!(c.action, AuditAction::Import);
        assert_eq!(c.actor.as_deref(), Some("ops"));
        let d = deleted(NETWORKS, id, None, &row);
        assert_eq!(d.changes, json!({"before": {"name": "n"}}));
    }
}
