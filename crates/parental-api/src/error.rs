use std::fmt;

use thiserror::Error;

/// Top-level error type for the `parental-api` crate.
///
/// Covers every failure mode of a ubus JSON-RPC round trip: HTTP transport,
/// JSON-RPC protocol errors, non-zero ubus status codes, and payload
/// decoding. `parental-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The endpoint answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ── Protocol ────────────────────────────────────────────────────
    /// JSON-RPC level error object (`{"error": {"code", "message"}}`).
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// ubus accepted the request but the call returned a non-zero status.
    #[error("ubus call {method} failed: {status}")]
    Ubus { method: String, status: UbusStatus },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying on the
    /// next poll.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => *status >= 500,
            Self::Ubus { status, .. } => {
                matches!(status, UbusStatus::Timeout | UbusStatus::ConnectionFailed)
            }
            _ => false,
        }
    }

    /// Returns `true` if the session is not allowed to call the method.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Ubus { status, .. } => *status == UbusStatus::PermissionDenied,
            Self::Http { status, .. } => *status == 401 || *status == 403,
            // rpcd answers unknown/expired sessions with "Access denied".
            Self::Rpc { code, .. } => *code == -32002,
            _ => false,
        }
    }

    /// Returns `true` if the object or method does not exist on the router.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Ubus { status, .. } => {
                matches!(status, UbusStatus::MethodNotFound | UbusStatus::NotFound)
            }
            Self::Http { status, .. } => *status == 404,
            Self::Rpc { code, .. } => *code == -32601 || *code == -32000,
            _ => false,
        }
    }
}

// ── UbusStatus ──────────────────────────────────────────────────────

/// ubus status codes as returned in the first element of a `call` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UbusStatus {
    InvalidCommand,
    InvalidArgument,
    MethodNotFound,
    NotFound,
    NoData,
    PermissionDenied,
    Timeout,
    NotSupported,
    UnknownError,
    ConnectionFailed,
    Other(i64),
}

impl UbusStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::InvalidCommand,
            2 => Self::InvalidArgument,
            3 => Self::MethodNotFound,
            4 => Self::NotFound,
            5 => Self::NoData,
            6 => Self::PermissionDenied,
            7 => Self::Timeout,
            8 => Self::NotSupported,
            9 => Self::UnknownError,
            10 => Self::ConnectionFailed,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::InvalidCommand => 1,
            Self::InvalidArgument => 2,
            Self::MethodNotFound => 3,
            Self::NotFound => 4,
            Self::NoData => 5,
            Self::PermissionDenied => 6,
            Self::Timeout => 7,
            Self::NotSupported => 8,
            Self::UnknownError => 9,
            Self::ConnectionFailed => 10,
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for UbusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidCommand => "invalid command",
            Self::InvalidArgument => "invalid argument",
            Self::MethodNotFound => "method not found",
            Self::NotFound => "not found",
            Self::NoData => "no data",
            Self::PermissionDenied => "permission denied",
            Self::Timeout => "timeout",
            Self::NotSupported => "not supported",
            Self::UnknownError => "unknown error",
            Self::ConnectionFailed => "connection failed",
            Self::Other(_) => "unrecognized status",
        };
        write!(f, "{name} (status {})", self.code())
    }
}
