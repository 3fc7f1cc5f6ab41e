/// Source and classification constants shared across the codebase

// Upstream mock SaaS APIs
pub const DEFAULT_BASE_URL: &str = "https://mock-saas-apis.vercel.app";

// Source routes, relative to the base URL
pub const IDENTITY_ROUTE: &str = "/api/okta/users";
pub const COLLAB_ROUTE: &str = "/api/slack/activity";
pub const MAIL_ROUTE: &str = "/api/google/logins";

// User-friendly source names (used in logs, metrics and errors)
pub const IDENTITY_SOURCE: &str = "okta";
pub const COLLAB_SOURCE: &str = "slack";
pub const MAIL_SOURCE: &str = "google";

// Retry defaults
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 500;

// Classification defaults
pub const DEFAULT_INACTIVITY_THRESHOLD_DAYS: i64 = 180;
pub const MAX_INACTIVITY_THRESHOLD_DAYS: i64 = 36_500;
// Fixed "today" the upstream mock data set was captured against
pub const DEFAULT_REFERENCE_DATE: &str = "2025-11-20";

// Logging defaults
pub const DEFAULT_LOG_DIRECTORY: &str = "logs";
pub const DEFAULT_LOG_FILE_PREFIX: &str = "saas-cleanup.log";
pub const DEFAULT_LOG_FILTER: &str = "saas_cleanup=debug,info";

// HTTP wrapper defaults
pub const DEFAULT_SERVER_PORT: u16 = 3000;

// Environment overrides
pub const CONFIG_PATH_ENV: &str = "SAAS_CLEANUP_CONFIG";
pub const BASE_URL_ENV: &str = "SAAS_CLEANUP_BASE_URL";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
