//! Well-known keys shared between admission, the execution protocol and the front end.

/// Run parameter holding the target base URL.
///
/// Admission resolves it against the configured allow-list and always writes the resolved value back,
/// so every accepted [`crate::RunRecord`] carries this key.
pub const PARAM_BASE_URL: &str = "BASE_URL";

/// Environment variable k6 reads to find the Prometheus remote-write endpoint.
pub const ENV_PROM_RW_SERVER_URL: &str = "K6_PROMETHEUS_RW_SERVER_URL";

/// Environment variable selecting the k6 JavaScript compatibility mode.
pub const ENV_COMPATIBILITY_MODE: &str = "K6_COMPATIBILITY_MODE";
