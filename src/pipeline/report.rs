use serde::{Deserialize, Serialize};

use crate::domain::CanonicalUserProfile;
use crate::pipeline::processing::classify::Classifier;

/// Label counts. A profile carrying two labels counts toward both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub inactive: usize,
    pub orphans: usize,
    pub conflicts: usize,
}

/// Point-in-time cleanup report. Lists keep profile discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub summary: ReportSummary,
    pub inactive_users: Vec<CanonicalUserProfile>,
    pub orphans: Vec<CanonicalUserProfile>,
    pub conflicts: Vec<CanonicalUserProfile>,
}

/// Classify every profile and group it under each label it carries.
pub fn assemble_report(profiles: &[CanonicalUserProfile], classifier: &Classifier) -> CleanupReport {
    let mut report = CleanupReport::default();

    for profile in profiles {
        let labels = classifier.classify(profile);
        if labels.orphan {
            report.orphans.push(profile.clone());
        }
        if labels.conflict {
            report.conflicts.push(profile.clone());
        }
        if labels.inactive {
            report.inactive_users.push(profile.clone());
        }
    }

    report.summary = ReportSummary {
        inactive: report.inactive_users.len(),
        orphans: report.orphans.len(),
        conflicts: report.conflicts.len(),
    };
    report
}
