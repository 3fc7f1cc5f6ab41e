//! Risk classification of merged profiles.
//!
//! Labels are independent: a profile can be inactive, an orphan and a
//! conflict at the same time. Recency is measured against a reference instant
//! supplied by the caller, never the wall clock.

use chrono::Duration;

use crate::constants::DEFAULT_INACTIVITY_THRESHOLD_DAYS;
use crate::domain::{CanonicalUserProfile, Timestamp};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Labels {
    pub inactive: bool,
    pub orphan: bool,
    pub conflict: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    reference_time: Timestamp,
    threshold: Duration,
}

impl Classifier {
    /// Thresholds beyond chrono's range saturate instead of panicking.
    pub fn new(reference_time: Timestamp, threshold_days: i64) -> Self {
        Self {
            reference_time,
            threshold: Duration::try_days(threshold_days).unwrap_or(Duration::MAX),
        }
    }

    pub fn with_default_threshold(reference_time: Timestamp) -> Self {
        Self::new(reference_time, DEFAULT_INACTIVITY_THRESHOLD_DAYS)
    }

    pub fn classify(&self, profile: &CanonicalUserProfile) -> Labels {
        Labels {
            inactive: self.is_inactive(profile),
            orphan: is_orphan(profile),
            conflict: is_conflict(profile),
        }
    }

    /// Inactive only when every system's check says inactive. The identity
    /// check looks at the last-login timestamp, not the enabled flag.
    pub fn is_inactive(&self, profile: &CanonicalUserProfile) -> bool {
        self.is_stale(profile.identity_last_activity)
            && self.is_stale(profile.collab_last_activity)
            && self.is_stale(profile.mail_last_activity)
    }

    /// No recorded activity counts as stale, same as activity older than the
    /// threshold.
    pub fn is_stale(&self, last_activity: Option<Timestamp>) -> bool {
        match last_activity {
            None => true,
            Some(ts) => self.reference_time - ts > self.threshold,
        }
    }
}

/// Number of systems with usable data for this profile (0..=3).
pub fn presence_count(profile: &CanonicalUserProfile) -> u8 {
    u8::from(profile.identity_enabled.is_some())
        + u8::from(profile.collab_last_activity.is_some())
        + u8::from(profile.mail_last_activity.is_some())
}

pub fn is_orphan(profile: &CanonicalUserProfile) -> bool {
    presence_count(profile) == 1
}

/// Disabled at the identity provider but still showing activity elsewhere.
pub fn is_conflict(profile: &CanonicalUserProfile) -> bool {
    profile.identity_enabled == Some(false)
        && (profile.collab_last_activity.is_some() || profile.mail_last_activity.is_some())
}
