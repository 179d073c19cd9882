//! Hub configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Missing or unparsable values fall back
//! to defaults, except `LISTEN_ADDR` which must parse when set.

use std::net::SocketAddr;
use std::time::Duration;

/// Default per-connection outbound queue bound.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Default deadline for a single transport write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default heartbeat period.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);

/// Top-level service configuration.
///
/// Loaded once at startup via [`HubConfig::from_env`].
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub log_json: bool,

    /// Mount the `/api/v1` admin routes (publish, list, disconnect).
    /// Off unless `ADMIN_API_ENABLED` is set, because those routes share the
    /// public listener with `/ws` and carry no authentication.
    pub admin_api: bool,

    /// Settings consumed by the connection hub.
    pub hub: HubSettings,
}

/// Per-connection delivery settings shared by every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubSettings {
    /// Capacity of each connection's outbound queue. Always at least 1.
    pub queue_capacity: usize,

    /// Deadline for one transport write; exceeding it closes the connection.
    pub write_timeout: Duration,

    /// Interval between heartbeat pings. `None` disables heartbeats.
    pub ping_interval: Option<Duration>,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            ping_interval: Some(DEFAULT_PING_INTERVAL),
        }
    }
}

impl HubSettings {
    /// Returns a copy with the given queue capacity, clamped to at least 1.
    #[must_use]
    pub fn with_queue_capacity(self, capacity: usize) -> Self {
        Self {
            queue_capacity: capacity.max(1),
            ..self
        }
    }

    /// Returns a copy with the given write timeout.
    #[must_use]
    pub fn with_write_timeout(self, write_timeout: Duration) -> Self {
        Self {
            write_timeout,
            ..self
        }
    }

    /// Returns a copy with the given heartbeat interval.
    #[must_use]
    pub fn with_ping_interval(self, ping_interval: Option<Duration>) -> Self {
        Self {
            ping_interval,
            ..self
        }
    }
}

impl HubConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()?;

        let log_json = parse_env_bool("LOG_JSON", false);
        let admin_api = parse_env_bool("ADMIN_API_ENABLED", false);

        let queue_capacity = parse_env("OUTBOUND_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY);
        let write_timeout_secs = parse_env("WS_WRITE_TIMEOUT_SECS", DEFAULT_WRITE_TIMEOUT.as_secs());
        let ping_interval_secs = parse_env("WS_PING_INTERVAL_SECS", DEFAULT_PING_INTERVAL.as_secs());

        let hub = HubSettings::default()
            .with_queue_capacity(queue_capacity)
            .with_write_timeout(Duration::from_secs(write_timeout_secs.max(1)))
            .with_ping_interval(
                (ping_interval_secs > 0).then(|| Duration::from_secs(ping_interval_secs)),
            );

        Ok(Self {
            listen_addr,
            log_json,
            admin_api,
            hub,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean, returning `default` when
/// it is missing or not recognized by [`parse_bool`].
fn parse_env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default)
}

/// Accepts `"true"`, `"1"`, `"false"`, `"0"`, ignoring ASCII case and
/// surrounding whitespace.
fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value == "1" || value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value == "0" || value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
