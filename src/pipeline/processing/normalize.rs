//! Record normalization: shape each source's loosely-typed payload into
//! per-identifier sub-records.
//!
//! Records without a usable email are dropped. Fields that are missing or of
//! the wrong type become `None` rather than a sentinel value.

use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::domain::{
    parse_timestamp, CollabRecord, IdentityRecord, MailRecord, SourceKind, SourceRecord, Timestamp,
};
use crate::observability::metrics;

/// One source's records keyed by normalized identifier, in first-seen order.
#[derive(Debug, Clone)]
pub struct SourceRecords {
    source: SourceKind,
    order: Vec<String>,
    records: HashMap<String, SourceRecord>,
}

impl SourceRecords {
    pub fn new(source: SourceKind) -> Self {
        Self {
            source,
            order: Vec::new(),
            records: HashMap::new(),
        }
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    /// Insert a record. A repeated identifier replaces the earlier record
    /// wholesale (nulls included) but keeps its first-seen position.
    pub fn insert(&mut self, identifier: String, record: SourceRecord) {
        match self.records.get_mut(&identifier) {
            Some(existing) => {
                debug!(source = %self.source, identifier = %identifier, "Duplicate identifier within source, last record wins");
                *existing = record;
            }
            None => {
                self.order.push(identifier.clone());
                self.records.insert(identifier, record);
            }
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&SourceRecord> {
        self.records.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceRecord)> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.records.get(id).map(|record| (id.as_str(), record)))
    }
}

/// Base trait for source-specific normalizers
pub trait SourceNormalizer: Send + Sync {
    fn source(&self) -> SourceKind;

    /// Build the source's sub-record from one raw record. The identifier has
    /// already been extracted and validated by the caller.
    fn normalize_record(&self, raw: &Value) -> SourceRecord;
}

pub struct IdentityNormalizer;

impl SourceNormalizer for IdentityNormalizer {
    fn source(&self) -> SourceKind {
        SourceKind::Identity
    }

    fn normalize_record(&self, raw: &Value) -> SourceRecord {
        SourceRecord::Identity(IdentityRecord {
            enabled: raw.get("enabled").and_then(Value::as_bool),
            last_login: timestamp_field(raw, "last_login", self.source()),
        })
    }
}

pub struct CollabNormalizer;

impl SourceNormalizer for CollabNormalizer {
    fn source(&self) -> SourceKind {
        SourceKind::Collab
    }

    fn normalize_record(&self, raw: &Value) -> SourceRecord {
        SourceRecord::Collab(CollabRecord {
            last_active: timestamp_field(raw, "last_active", self.source()),
        })
    }
}

pub struct MailNormalizer;

impl SourceNormalizer for MailNormalizer {
    fn source(&self) -> SourceKind {
        SourceKind::Mail
    }

    fn normalize_record(&self, raw: &Value) -> SourceRecord {
        SourceRecord::Mail(MailRecord {
            last_login: timestamp_field(raw, "last_login", self.source()),
        })
    }
}

pub fn normalizer_for(source: SourceKind) -> Box<dyn SourceNormalizer> {
    match source {
        SourceKind::Identity => Box::new(IdentityNormalizer),
        SourceKind::Collab => Box::new(CollabNormalizer),
        SourceKind::Mail => Box::new(MailNormalizer),
    }
}

/// Normalize a full source payload.
pub fn normalize_payload(source: SourceKind, payload: &Value) -> SourceRecords {
    let normalizer = normalizer_for(source);
    let mut out = SourceRecords::new(source);

    for raw in raw_records(source, payload) {
        let Some(identifier) = raw.get("email").and_then(normalize_identifier) else {
            warn!(source = %source, "Dropping record without a usable email");
            metrics::normalize::record_dropped(source.name());
            continue;
        };
        out.insert(identifier, normalizer.normalize_record(raw));
    }

    metrics::normalize::records_accepted(source.name(), out.len());
    debug!(source = %source, records = out.len(), "Normalized source payload");
    out
}

/// Lowercased, trimmed email; `None` for non-strings and blanks.
pub fn normalize_identifier(value: &Value) -> Option<String> {
    let email = value.as_str()?.trim();
    if email.is_empty() {
        return None;
    }
    Some(email.to_lowercase())
}

/// Records live under `data`; a bare top-level array is accepted too.
fn raw_records(source: SourceKind, payload: &Value) -> &[Value] {
    let list = match payload {
        Value::Array(items) => Some(items),
        other => other.get("data").and_then(Value::as_array),
    };
    match list {
        Some(items) => items.as_slice(),
        None => {
            warn!(source = %source, "Payload has no record list; treating as empty");
            &[]
        }
    }
}

/// Only a parseable string is an observed timestamp. Empty strings, numbers
/// and other non-string values are absent, the same as `null`.
fn timestamp_field(raw: &Value, field: &str, source: SourceKind) -> Option<Timestamp> {
    let value = match raw.get(field)? {
        Value::Null => return None,
        Value::String(value) => value,
        other => {
            warn!(source = %source, field, value = %other, "Non-string timestamp treated as absent");
            return None;
        }
    };
    let parsed = parse_timestamp(value);
    if parsed.is_none() && !value.trim().is_empty() {
        warn!(source = %source, field, value = %value, "Unparseable timestamp treated as absent");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_identity_records_keep_tri_state() {
        let payload = json!({"data": [
            {"email": "A@X.com", "enabled": false, "last_login": null},
            {"email": "b@x.com", "enabled": true, "last_login": "2025-01-02"},
            {"email": "c@x.com", "enabled": "yes"},
        ]});

        let records = normalize_payload(SourceKind::Identity, &payload);
        assert_eq!(records.len(), 3);
        assert_eq!(
            records.get("a@x.com"),
            Some(&SourceRecord::Identity(IdentityRecord { enabled: Some(false), last_login: None }))
        );
        assert_eq!(
            records.get("b@x.com"),
            Some(&SourceRecord::Identity(IdentityRecord {
                enabled: Some(true),
                last_login: Some(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap()),
            }))
        );
        assert_eq!(
            records.get("c@x.com"),
            Some(&SourceRecord::Identity(IdentityRecord { enabled: None, last_login: None }))
        );
    }

    #[test]
    fn test_records_without_email_are_dropped() {
        let payload = json!({"data": [
            {"last_active": "2025-11-10"},
            {"email": null, "last_active": "2025-11-10"},
            {"email": 42},
            {"email": "   "},
            "not-an-object",
            {"email": "ok@x.com", "last_active": "2025-11-10"},
        ]});

        let records = normalize_payload(SourceKind::Collab, &payload);
        assert_eq!(records.len(), 1);
        assert!(records.get("ok@x.com").is_some());
    }

    #[test]
    fn test_missing_data_is_empty() {
        assert!(normalize_payload(SourceKind::Mail, &json!({})).is_empty());
        assert!(normalize_payload(SourceKind::Mail, &json!({"data": null})).is_empty());
        assert!(normalize_payload(SourceKind::Mail, &Value::Null).is_empty());
    }

    #[test]
    fn test_bare_array_payload() {
        let payload = json!([{"email": "m@x.com", "last_login": "2024-01-01T10:00:00Z"}]);
        let records = normalize_payload(SourceKind::Mail, &payload);
        assert_eq!(
            records.get("m@x.com"),
            Some(&SourceRecord::Mail(MailRecord {
                last_login: Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()),
            }))
        );
    }

    #[test]
    fn test_case_variants_collapse_in_first_seen_order() {
        let payload = json!({"data": [
            {"email": "z@x.com", "last_active": "2025-01-01"},
            {"email": "Y@x.com", "last_active": "2025-02-01"},
            {"email": "Z@X.COM", "last_active": "2025-03-01"},
        ]});

        let records = normalize_payload(SourceKind::Collab, &payload);
        let ids: Vec<&str> = records.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["z@x.com", "y@x.com"]);
        assert_eq!(
            records.get("z@x.com"),
            Some(&SourceRecord::Collab(CollabRecord {
                last_active: Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()),
            }))
        );
    }

    #[test]
    fn test_duplicate_identifier_last_record_wins() {
        let payload = json!({"data": [
            {"email": "dup@x.com", "enabled": false, "last_login": "2025-06-01"},
            {"email": "other@x.com", "enabled": true},
            {"email": "DUP@x.com", "enabled": null, "last_login": null},
        ]});

        let records = normalize_payload(SourceKind::Identity, &payload);
        let ids: Vec<&str> = records.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["dup@x.com", "other@x.com"]);
        // The later row replaces the earlier one, nulls included
        assert_eq!(
            records.get("dup@x.com"),
            Some(&SourceRecord::Identity(IdentityRecord { enabled: None, last_login: None }))
        );
    }

    #[test]
    fn test_unparseable_timestamp_is_absent() {
        let payload = json!({"data": [{"email": "a@x.com", "last_active": "last tuesday"}]});
        let records = normalize_payload(SourceKind::Collab, &payload);
        assert_eq!(
            records.get("a@x.com"),
            Some(&SourceRecord::Collab(CollabRecord { last_active: None }))
        );
    }

    #[test]
    fn test_empty_and_non_string_timestamps_are_absent() {
        let payload = json!({"data": [
            {"email": "empty@x.com", "last_active": ""},
            {"email": "number@x.com", "last_active": 1731196800},
            {"email": "object@x.com", "last_active": {"at": "2025-11-10"}},
            {"email": "flag@x.com", "last_active": true},
        ]});

        let records = normalize_payload(SourceKind::Collab, &payload);
        assert_eq!(records.len(), 4);
        for (_, record) in records.iter() {
            assert_eq!(record, &SourceRecord::Collab(CollabRecord { last_active: None }));
        }
    }
}
