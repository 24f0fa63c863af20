//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use parental_config::ConfigError;
use parental_core::CoreError;

/// Process exit codes (success is 0).
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach router at {url}")]
    #[diagnostic(
        code(parental::connection_failed),
        help(
            "Check that the router is up and uhttpd serves /ubus.\n\
             Reason: {reason}\n\
             For HTTPS with the stock self-signed certificate, add --insecure (-k)."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(parental::timeout),
        help("Increase the timeout with --timeout or check router responsiveness.")
    )]
    Timeout,

    #[error("Router denied access: {message}")]
    #[diagnostic(
        code(parental::permission_denied),
        help(
            "The rpcd session lacks an ACL for the parental object.\n\
             Pass a session token with --session or set `session_env` in the profile."
        )
    )]
    PermissionDenied { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(parental::not_found),
        help("Run: parental {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{message}")]
    #[diagnostic(code(parental::conflict))]
    Conflict { message: String },

    // ── Router replies ───────────────────────────────────────────────
    #[error("{action} rejected: {message}")]
    #[diagnostic(code(parental::rejected))]
    Rejected { action: String, message: String },

    #[error("Save rejected: {message}")]
    #[diagnostic(
        code(parental::save_rejected),
        help("Nothing was written to the router.")
    )]
    SaveRejected { message: String },

    #[error("{failed} of {total} clients failed")]
    #[diagnostic(
        code(parental::partial_failure),
        help("The remaining clients were updated; see the table above.")
    )]
    PartialFailure { failed: usize, total: usize },

    #[error("Router error: {message}")]
    #[diagnostic(code(parental::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(parental::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(parental::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: parental config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No router configured")]
    #[diagnostic(
        code(parental::no_config),
        help(
            "Create a profile with: parental config init\n\
             Or pass --endpoint http://<router>.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(parental::config))]
    Config(ConfigError),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError ───────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::ControllerDisconnected => CliError::ConnectionFailed {
                url: "(disconnected)".into(),
                reason: "the session stopped before the command completed".into(),
            },

            CoreError::Timeout => CliError::Timeout,

            CoreError::PermissionDenied { message } => CliError::PermissionDenied { message },

            CoreError::GroupNotFound { id } => CliError::NotFound {
                resource_type: "group".into(),
                identifier: id,
                list_command: "groups list".into(),
            },

            CoreError::ClientNotFound { mac } => CliError::NotFound {
                resource_type: "client".into(),
                identifier: mac,
                list_command: "clients list".into(),
            },

            CoreError::DeviceNotFound { mac } => CliError::NotFound {
                resource_type: "device".into(),
                identifier: mac,
                list_command: "devices list".into(),
            },

            CoreError::Conflict { message } => CliError::Conflict { message },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::ActionRejected { action, message } => CliError::Rejected { action, message },

            CoreError::SaveRejected { message } => CliError::SaveRejected { message },

            CoreError::Api { message, .. } | CoreError::Internal(message) => {
                CliError::ApiError { message }
            }

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}
