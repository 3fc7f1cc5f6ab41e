// Pipeline ingestion: fetching source payloads with retry

pub mod retry;
