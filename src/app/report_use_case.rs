use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::app::ports::{HttpClientPort, SourcePort};
use crate::config::Config;
use crate::domain::{SourceKind, Timestamp};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::ingestion::retry::RetryingSourceFetcher;
use crate::pipeline::processing::classify::Classifier;
use crate::pipeline::processing::merge::merge_sources;
use crate::pipeline::processing::normalize::normalize_payload;
use crate::pipeline::report::{assemble_report, CleanupReport};

/// Use case for producing one cleanup report: fetch every source, normalize,
/// merge, classify and assemble.
pub struct ReportUseCase {
    sources: Arc<dyn SourcePort>,
    threshold_days: i64,
}

impl ReportUseCase {
    pub fn new(sources: Arc<dyn SourcePort>, threshold_days: i64) -> Self {
        Self {
            sources,
            threshold_days,
        }
    }

    /// Wire the retrying HTTP fetcher against the configured base URL
    pub fn from_config(http: Arc<dyn HttpClientPort>, config: &Config) -> Self {
        let fetcher = RetryingSourceFetcher::from_config(http, config);
        Self::new(
            Arc::new(fetcher),
            config.classification.inactivity_threshold_days,
        )
    }

    /// Build a report against `reference_time`. Any source failure fails the
    /// whole report; no partial results are returned.
    #[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4(), reference = %reference_time))]
    pub async fn generate_report(&self, reference_time: Timestamp) -> Result<CleanupReport> {
        match self.build(reference_time).await {
            Ok(report) => {
                metrics::report::generated(
                    report.summary.inactive,
                    report.summary.orphans,
                    report.summary.conflicts,
                );
                info!(
                    inactive = report.summary.inactive,
                    orphans = report.summary.orphans,
                    conflicts = report.summary.conflicts,
                    "Report generated"
                );
                Ok(report)
            }
            Err(e) => {
                metrics::report::failed();
                warn!(error = %e, "Report generation failed");
                Err(e)
            }
        }
    }

    async fn build(&self, reference_time: Timestamp) -> Result<CleanupReport> {
        // Fetches are independent; all three must succeed before merging
        let (identity, collab, mail) = tokio::try_join!(
            self.sources.fetch(SourceKind::Identity),
            self.sources.fetch(SourceKind::Collab),
            self.sources.fetch(SourceKind::Mail),
        )?;

        let identity = normalize_payload(SourceKind::Identity, &identity);
        let collab = normalize_payload(SourceKind::Collab, &collab);
        let mail = normalize_payload(SourceKind::Mail, &mail);

        let profiles = merge_sources([&identity, &collab, &mail]);
        info!(profiles = profiles.len(), "Merged sources into canonical profiles");

        let classifier = Classifier::new(reference_time, self.threshold_days);
        Ok(assemble_report(&profiles, &classifier))
    }
}
