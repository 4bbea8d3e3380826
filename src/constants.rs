//! Application constants for IG Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names for authentication
pub mod env {
    /// Environment variable name for the member identifier
    pub const MEMBER_ID: &str = "IG_MEMBER_ID";

    /// Environment variable name for the member PIN
    pub const PIN: &str = "IG_PIN";

    /// Environment variable name for the admin step-up password
    pub const ADMIN_PASSWORD: &str = "IG_ADMIN_PASSWORD";

    /// Environment variable overriding the site base URL
    pub const BASE_URL: &str = "IG_BASE_URL";
}

/// Authentication and credential-related constants
pub mod auth {
    /// Minimum allowed member id length
    pub const MIN_MEMBER_ID_LENGTH: usize = 1;

    /// Maximum allowed member id length
    pub const MAX_MEMBER_ID_LENGTH: usize = 16;

    /// File permissions for .env file (Unix only) - owner read/write only
    #[cfg(unix)]
    pub const ENV_FILE_PERMISSIONS: u32 = 0o600;

    /// Form field carrying the member identifier
    pub const MEMBER_ID_FIELD: &str = "memberid";

    /// Form field carrying the member PIN
    pub const PIN_FIELD: &str = "pin";

    /// Form field carrying the admin password
    pub const ADMIN_PASSWORD_FIELD: &str = "password";

    /// Fixed task markers posted with the primary login
    pub const PRIMARY_TASK_MARKERS: &[(&str, &str)] =
        &[("task", "login"), ("topmenu", "1"), ("cachemid", "1")];

    /// Fixed task markers posted with the step-up login
    pub const STEP_UP_TASK_MARKERS: &[(&str, &str)] = &[("task", "admin_login")];
}

/// External site endpoints
pub mod site {
    /// Default site base URL (overridable by config or `IG_BASE_URL`)
    pub const DEFAULT_BASE_URL: &str = "https://www.example-golf-club.co.uk";

    /// Primary login endpoint
    pub const LOGIN_PATH: &str = "/login.php";

    /// Admin elevation endpoint
    pub const STEP_UP_PATH: &str = "/admin/login.php";

    /// Marker phrase in the page title when the session has expired
    pub const LOGIN_REQUIRED_TITLE: &str = "Login Required";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "IG-Fetcher/0.1.0 (Club Report Client)";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;

    /// Upper bound of jitter added by the rate limiter
    pub const RATE_LIMIT_JITTER: Duration = Duration::from_millis(100);
}

/// Rate limiting configuration
pub mod limits {
    /// Default rate limit for site requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 4;
}

/// Session lifecycle timings
pub mod session {
    use super::Duration;

    /// Force a fresh login once a session is this old
    pub const REFRESH_INTERVAL: Duration = Duration::from_secs(20 * 60);

    /// How often the background loop checks session age
    pub const REFRESH_CHECK_INTERVAL: Duration = Duration::from_secs(60);

    /// Time budget for the whole two-step login
    pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(45);
}

/// Cache tiers
pub mod cache {
    use super::Duration;

    /// Default TTL of parsed report records
    pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

    /// Fixed TTL of raw page snapshots
    pub const RAW_TTL: Duration = Duration::from_secs(2 * 60);

    /// Suffix appended to a parsed-result key to address its raw snapshot
    pub const RAW_KEY_SUFFIX: &str = "::raw";

    /// Interval for purging expired entries and idle key locks
    pub const PURGE_INTERVAL: Duration = Duration::from_secs(5 * 60);
}

/// Parsing limits
pub mod parsing {
    /// Maximum characters of a failing row's markup included in logs
    pub const ROW_LOG_PREVIEW: usize = 300;

    /// Rows at the top of each table considered as header candidates
    pub const HEADER_SCAN_ROWS: usize = 3;

    /// Largest colspan honoured, as in HTML table processing
    pub const MAX_COLSPAN: usize = 1000;
}

/// Background task and shutdown timings
pub mod coordinator {
    use super::Duration;

    /// Timeout for background task shutdown
    pub const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
}

// Re-export commonly used constants for convenience
pub use env::{ADMIN_PASSWORD as ENV_ADMIN_PASSWORD, MEMBER_ID as ENV_MEMBER_ID, PIN as ENV_PIN};
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use limits::DEFAULT_RATE_LIMIT_RPS;
pub use site::LOGIN_REQUIRED_TITLE;
