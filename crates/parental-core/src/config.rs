// ── Runtime connection configuration ──
//
// Describes *how* to reach the router and how often to poll it. Never
// touches disk; the CLI builds a `ControllerConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use parental_api::{TlsMode, TransportConfig};
use secrecy::SecretString;
use url::Url;

/// Default cadence of background refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default number of activity log lines fetched per refresh.
pub const DEFAULT_ACTIVITY_LOG_LIMIT: u32 = 200;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. uhttpd ships a self-signed certificate.
    DangerAcceptInvalid,
}

/// Configuration for one router.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Router base URL (e.g. `http://192.168.1.1`); `/ubus` is appended.
    pub endpoint: Url,
    /// rpcd session token. `None` uses the anonymous session.
    pub session: Option<SecretString>,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Background refresh period. Zero disables the timer; only
    /// explicitly requested refreshes run.
    pub poll_interval: Duration,
    /// Activity log lines requested per refresh.
    pub activity_log_limit: u32,
}

impl ControllerConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            session: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(10),
            poll_interval: DEFAULT_POLL_INTERVAL,
            activity_log_limit: DEFAULT_ACTIVITY_LOG_LIMIT,
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }
}
