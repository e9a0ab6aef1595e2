use std::time::Duration;

// Environment variables
pub const ENV_SALTAPI_URL: &str = "SALTAPI_URL";
pub const ENV_SALTAPI_USER: &str = "SALTAPI_USER";
pub const ENV_SALTAPI_PASS: &str = "SALTAPI_PASS";
pub const ENV_SALTAPI_EAUTH: &str = "SALTAPI_EAUTH";

// Connection defaults
pub const DEFAULT_SALTAPI_URL: &str = "https://localhost:8000";
pub const DEFAULT_EAUTH: &str = "auto";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// The number of times a query is issued before an incomplete response is reported.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

// Salt API vocabulary
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
pub const PILLAR_GET: &str = "pillar.get";
pub const LOOKUP_JID: &str = "jobs.lookup_jid";

/// The key under which unresponsive minions are listed in a failure record.
pub const FAILED_KEY: &str = "Failed";

/// The status carried by a record when nothing went wrong.
pub const SUCCESS_STATUS: i32 = 0;

/// The status carried by a failure record when at least one minion did not respond.
pub const INCOMPLETE_STATUS: i32 = 1;
