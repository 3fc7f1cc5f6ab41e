//! Simple metrics module for the cleanup report pipeline
//!
//! This module provides a straightforward API for recording metrics using
//! the standard Prometheus naming conventions.

use std::fmt;
use std::sync::OnceLock;
use tracing::info;

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Sources metrics
    SourcesAttempts,
    SourcesRetries,
    SourcesRequestsSuccess,
    SourcesRequestsError,
    SourcesRequestDuration,
    SourcesPayloadBytes,

    // Normalize metrics
    NormalizeRecordsAccepted,
    NormalizeRecordsDropped,

    // Merge metrics
    MergeProfilesCreated,

    // Report metrics
    ReportsGenerated,
    ReportsFailed,
    ReportInactive,
    ReportOrphans,
    ReportConflicts,
}

impl MetricName {
    /// Get the metric name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::SourcesAttempts => "saas_cleanup_sources_attempts_total",
            MetricName::SourcesRetries => "saas_cleanup_sources_retries_total",
            MetricName::SourcesRequestsSuccess => "saas_cleanup_sources_requests_success_total",
            MetricName::SourcesRequestsError => "saas_cleanup_sources_requests_error_total",
            MetricName::SourcesRequestDuration => "saas_cleanup_sources_request_duration_seconds",
            MetricName::SourcesPayloadBytes => "saas_cleanup_sources_payload_bytes",

            MetricName::NormalizeRecordsAccepted => "saas_cleanup_normalize_records_accepted_total",
            MetricName::NormalizeRecordsDropped => "saas_cleanup_normalize_records_dropped_total",

            MetricName::MergeProfilesCreated => "saas_cleanup_merge_profiles_created_total",

            MetricName::ReportsGenerated => "saas_cleanup_reports_generated_total",
            MetricName::ReportsFailed => "saas_cleanup_reports_failed_total",
            MetricName::ReportInactive => "saas_cleanup_report_inactive",
            MetricName::ReportOrphans => "saas_cleanup_report_orphans",
            MetricName::ReportConflicts => "saas_cleanup_report_conflicts",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Safe to call more than once; later calls
/// keep the first recorder.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE.set(handle).ok();

    info!("Metrics system initialized");
    Ok(())
}

/// Render the current metrics in Prometheus text format, if a recorder is installed
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

// ============================================================================
// Sources Metrics
// ============================================================================

pub mod sources {
    use super::MetricName;

    pub fn attempt(source: &'static str) {
        ::metrics::counter!(MetricName::SourcesAttempts.as_str(), "source" => source).increment(1);
    }

    pub fn retry(source: &'static str, reason: &'static str) {
        ::metrics::counter!(
            MetricName::SourcesRetries.as_str(),
            "source" => source,
            "reason" => reason
        )
        .increment(1);
    }

    pub fn request_success(source: &'static str) {
        ::metrics::counter!(MetricName::SourcesRequestsSuccess.as_str(), "source" => source)
            .increment(1);
    }

    pub fn request_error(source: &'static str) {
        ::metrics::counter!(MetricName::SourcesRequestsError.as_str(), "source" => source)
            .increment(1);
    }

    pub fn request_duration(source: &'static str, secs: f64) {
        ::metrics::histogram!(MetricName::SourcesRequestDuration.as_str(), "source" => source)
            .record(secs);
    }

    pub fn payload_bytes(source: &'static str, bytes: usize) {
        ::metrics::histogram!(MetricName::SourcesPayloadBytes.as_str(), "source" => source)
            .record(bytes as f64);
    }
}

// ============================================================================
// Normalize Metrics
// ============================================================================

pub mod normalize {
    use super::MetricName;

    pub fn records_accepted(source: &'static str, count: usize) {
        ::metrics::counter!(MetricName::NormalizeRecordsAccepted.as_str(), "source" => source)
            .increment(count as u64);
    }

    pub fn record_dropped(source: &'static str) {
        ::metrics::counter!(MetricName::NormalizeRecordsDropped.as_str(), "source" => source)
            .increment(1);
    }
}

// ============================================================================
// Merge Metrics
// ============================================================================

pub mod merge {
    use super::MetricName;

    pub fn profiles_created(count: usize) {
        ::metrics::counter!(MetricName::MergeProfilesCreated.as_str()).increment(count as u64);
    }
}

// ============================================================================
// Report Metrics
// ============================================================================

pub mod report {
    use super::MetricName;

    pub fn generated(inactive: usize, orphans: usize, conflicts: usize) {
        ::metrics::counter!(MetricName::ReportsGenerated.as_str()).increment(1);
        ::metrics::gauge!(MetricName::ReportInactive.as_str()).set(inactive as f64);
        ::metrics::gauge!(MetricName::ReportOrphans.as_str()).set(orphans as f64);
        ::metrics::gauge!(MetricName::ReportConflicts.as_str()).set(conflicts as f64);
    }

    pub fn failed() {
        ::metrics::counter!(MetricName::ReportsFailed.as_str()).increment(1);
    }
}
