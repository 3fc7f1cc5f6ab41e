//! Reconciles per-user account state from an identity provider, a
//! collaboration activity feed and an email login feed into canonical
//! profiles, then classifies them for a cleanup report.

pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod observability;
pub mod pipeline;
pub mod server;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;

pub use app::report_use_case::ReportUseCase;
pub use domain::CanonicalUserProfile;
pub use error::{CleanupError, Result};
pub use pipeline::report::{CleanupReport, ReportSummary};
