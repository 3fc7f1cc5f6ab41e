// Report pipeline: ingestion, processing, and report assembly

pub mod ingestion;
pub mod processing;
pub mod report;
