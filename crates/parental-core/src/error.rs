// ── Core error types ──
//
// User-facing errors from parental-core. Consumers never see JSON-RPC
// envelopes or ubus status codes directly; the `From<parental_api::Error>`
// impl translates them into domain variants.

use parental_api::UbusStatus;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach router at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Router request timed out")]
    Timeout,

    #[error("Access denied by router: {message}")]
    PermissionDenied { message: String },

    #[error("Controller is not running")]
    ControllerDisconnected,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Group not found: {id}")]
    GroupNotFound { id: String },

    #[error("Client not found: {mac}")]
    ClientNotFound { mac: String },

    #[error("Discovered device not found: {mac}")]
    DeviceNotFound { mac: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("{action} rejected by router: {message}")]
    ActionRejected { action: String, message: String },

    #[error("Save rejected by router: {message}")]
    SaveRejected { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// `true` for the "entity does not exist" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::GroupNotFound { .. } | Self::ClientNotFound { .. } | Self::DeviceNotFound { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<parental_api::Error> for CoreError {
    fn from(err: parental_api::Error) -> Self {
        if err.is_permission_denied() {
            return CoreError::PermissionDenied {
                message: err.to_string(),
            };
        }

        match err {
            parental_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            parental_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            parental_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            parental_api::Error::Http { status, body } => CoreError::Api {
                message: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {body}")
                },
                status: Some(status),
            },
            parental_api::Error::Rpc { code, message } => CoreError::Api {
                message: format!("JSON-RPC error {code}: {message}"),
                status: None,
            },
            parental_api::Error::Ubus {
                status: UbusStatus::Timeout,
                ..
            } => CoreError::Timeout,
            parental_api::Error::Ubus { method, status } => CoreError::Api {
                message: format!("{method}: {status}"),
                status: None,
            },
            parental_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
