//! Domain data shapes shared across layers.
//!
//! A [`CanonicalUserProfile`] is the merged view of one user across the three
//! upstream systems. Each per-system field only ever carries data observed in
//! that system; absence is represented with `None` and never defaulted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    COLLAB_ROUTE, COLLAB_SOURCE, IDENTITY_ROUTE, IDENTITY_SOURCE, MAIL_ROUTE, MAIL_SOURCE,
};

/// Point in time observed in an upstream system, always in UTC.
pub type Timestamp = DateTime<Utc>;

/// The upstream systems a report is built from, in merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Identity provider (Okta)
    Identity,
    /// Collaboration-tool activity feed (Slack)
    Collab,
    /// Email-provider login feed (Google)
    Mail,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Identity => IDENTITY_SOURCE,
            SourceKind::Collab => COLLAB_SOURCE,
            SourceKind::Mail => MAIL_SOURCE,
        }
    }

    /// Route of this source relative to the configured base URL
    pub fn route(&self) -> &'static str {
        match self {
            SourceKind::Identity => IDENTITY_ROUTE,
            SourceKind::Collab => COLLAB_ROUTE,
            SourceKind::Mail => MAIL_ROUTE,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity-provider view of a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityRecord {
    /// `None` when the record carries no boolean `enabled` flag
    pub enabled: Option<bool>,
    pub last_login: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollabRecord {
    pub last_active: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailRecord {
    pub last_login: Option<Timestamp>,
}

/// One source's contribution to a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRecord {
    Identity(IdentityRecord),
    Collab(CollabRecord),
    Mail(MailRecord),
}

/// Merged per-user record. Serialized field names are fixed for
/// compatibility with existing report consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalUserProfile {
    /// Lowercased email, unique across the report
    #[serde(rename = "email")]
    pub identifier: String,
    /// Tri-state: `Some(true)`, `Some(false)`, or `None` when the identity
    /// provider has no data for this user (which is not the same as disabled)
    #[serde(rename = "okta_enabled")]
    pub identity_enabled: Option<bool>,
    #[serde(rename = "okta_last_login")]
    pub identity_last_activity: Option<Timestamp>,
    #[serde(rename = "slack_last_active")]
    pub collab_last_activity: Option<Timestamp>,
    #[serde(rename = "google_last_login")]
    pub mail_last_activity: Option<Timestamp>,
}

impl CanonicalUserProfile {
    /// Empty profile; every per-system field starts absent.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            identity_enabled: None,
            identity_last_activity: None,
            collab_last_activity: None,
            mail_last_activity: None,
        }
    }

    /// Write one source's fields onto the profile. Only the contributing
    /// source's fields are touched, and absent values leave existing data alone.
    pub fn apply(&mut self, record: &SourceRecord) {
        match record {
            SourceRecord::Identity(r) => {
                self.identity_enabled = r.enabled.or(self.identity_enabled);
                self.identity_last_activity = r.last_login.or(self.identity_last_activity);
            }
            SourceRecord::Collab(r) => {
                self.collab_last_activity = r.last_active.or(self.collab_last_activity);
            }
            SourceRecord::Mail(r) => {
                self.mail_last_activity = r.last_login.or(self.mail_last_activity);
            }
        }
    }
}

/// Parse an upstream timestamp into UTC.
///
/// Accepts RFC 3339, naive date-times (taken as UTC) and plain dates (taken as
/// UTC midnight). Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f", // "2025-11-10T08:30:00.000"
        "%Y-%m-%d %H:%M:%S%.f", // "2025-11-10 08:30:00"
        "%Y-%m-%dT%H:%M",       // "2025-11-10T08:30"
    ];
    for format in &formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
