//! Shared configuration for the parental-control tools.
//!
//! TOML profiles loaded through figment (built-in defaults, then the
//! config file, then `PARENTAL_*` environment variables), session token
//! resolution, and translation to `parental_core::ControllerConfig`. The
//! CLI layers its flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use parental_core::{
    ControllerConfig, DEFAULT_ACTIVITY_LOG_LIMIT, DEFAULT_POLL_INTERVAL, TlsVerification,
};

/// Prefix of environment overrides. Nested keys use `__`, e.g.
/// `PARENTAL_DEFAULTS__POLL_INTERVAL=10` or
/// `PARENTAL_PROFILES__HOME__ENDPOINT=http://192.168.1.1`.
pub const ENV_PREFIX: &str = "PARENTAL_";

/// Session token override, checked after a profile's `session_env`.
pub const SESSION_ENV: &str = "PARENTAL_SESSION";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' is not defined")]
    UnknownProfile { name: String },

    #[error("no router profile configured")]
    NoProfile,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named router profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

/// Values applied to every profile that does not set its own.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Background refresh period in seconds (`watch`).
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Activity log entries fetched per refresh.
    #[serde(default = "default_log_limit")]
    pub log_limit: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            log_limit: default_log_limit(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}
fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}
fn default_log_limit() -> u32 {
    DEFAULT_ACTIVITY_LOG_LIMIT
}

/// A named router profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Router base URL (e.g. "http://192.168.1.1").
    pub endpoint: String,

    /// rpcd session token (plaintext; prefer `session_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,

    /// Environment variable holding the session token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_env: Option<String>,

    /// Path to a custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_limit: Option<u32>,
}

impl Profile {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            session: None,
            session_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            poll_interval: None,
            log_limit: None,
        }
    }
}

impl Config {
    /// Pick the named profile, or the default one.
    pub fn resolve_profile<'a>(
        &'a self,
        name: Option<&str>,
    ) -> Result<(String, &'a Profile), ConfigError> {
        let name = match name {
            Some(name) => name.to_owned(),
            None => self
                .default_profile
                .clone()
                .or_else(|| self.profiles.keys().next().cloned())
                .ok_or(ConfigError::NoProfile)?,
        };

        match self.profiles.get(&name) {
            Some(profile) => Ok((name, profile)),
            None if self.profiles.is_empty() => Err(ConfigError::NoProfile),
            None => Err(ConfigError::UnknownProfile { name }),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "openwrt", "parental").map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("parental");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["session"]).split("__"))
        .extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to the canonical path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Session resolution ──────────────────────────────────────────────

/// Resolve the rpcd session token: the profile's `session_env` variable,
/// then `PARENTAL_SESSION`, then the plaintext value. `None` means the
/// anonymous session.
pub fn resolve_session(profile: &Profile) -> Option<SecretString> {
    if let Some(ref env_name) = profile.session_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    if let Ok(val) = std::env::var(SESSION_ENV) {
        return Some(SecretString::from(val));
    }

    profile
        .session
        .as_ref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| SecretString::from(s.clone()))
}

/// Build a `ControllerConfig` from a profile and the global defaults.
pub fn profile_to_controller_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ControllerConfig, ConfigError> {
    let endpoint: url::Url = profile
        .endpoint
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "endpoint".into(),
            reason: format!("invalid URL: {}", profile.endpoint),
        })?;
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "endpoint".into(),
            reason: format!("expected an http(s) URL, got '{}'", endpoint.scheme()),
        });
    }

    let log_limit = profile.log_limit.unwrap_or(defaults.log_limit);
    if log_limit == 0 {
        return Err(ConfigError::Validation {
            field: "log_limit".into(),
            reason: "must be at least 1".into(),
        });
    }

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = ControllerConfig::new(endpoint);
    config.session = resolve_session(profile);
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.poll_interval =
        Duration::from_secs(profile.poll_interval.unwrap_or(defaults.poll_interval));
    config.activity_log_limit = log_limit;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;

    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "home"

[defaults]
timeout = 15

[profiles.home]
endpoint = "http://192.168.1.1"
poll_interval = 60

[profiles.lab]
endpoint = "https://10.0.0.1"
ca_cert = "/etc/ssl/lab.pem"
session = "deadbeef"
"#;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.defaults.poll_interval, 30);
        assert_eq!(cfg.defaults.log_limit, 200);
    }

    #[test]
    fn file_values_layer_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("home"));
        assert_eq!(cfg.defaults.timeout, 15);
        assert_eq!(cfg.defaults.output, "table");
        assert_eq!(cfg.profiles.len(), 2);
        assert_eq!(cfg.profiles["home"].poll_interval, Some(60));
    }

    #[test]
    fn env_overrides_nested_keys() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("PARENTAL_DEFAULTS__POLL_INTERVAL", "5");
            jail.set_env("PARENTAL_PROFILES__HOME__LOG_LIMIT", "50");

            let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.defaults.poll_interval, 5);
            assert_eq!(cfg.profiles["home"].log_limit, Some(50));
            assert_eq!(cfg.profiles["home"].endpoint, "http://192.168.1.1");
            Ok(())
        });
    }

    #[test]
    fn profile_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let cfg = load_config_from(&path).unwrap();

        let (name, profile) = cfg.resolve_profile(None).unwrap();
        assert_eq!(name, "home");
        assert_eq!(profile.endpoint, "http://192.168.1.1");

        let (name, _) = cfg.resolve_profile(Some("lab")).unwrap();
        assert_eq!(name, "lab");

        let err = cfg.resolve_profile(Some("office")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile { ref name } if name == "office"));

        let empty = Config::default();
        assert!(matches!(empty.resolve_profile(None), Err(ConfigError::NoProfile)));
    }

    #[test]
    fn translation_applies_profile_then_defaults() {
        let defaults = Defaults {
            timeout: 15,
            ..Defaults::default()
        };
        let mut profile = Profile::new("http://192.168.1.1");
        profile.poll_interval = Some(60);

        let cfg = profile_to_controller_config(&profile, &defaults).unwrap();
        assert_eq!(cfg.endpoint.as_str(), "http://192.168.1.1/");
        assert_eq!(cfg.timeout, Duration::from_secs(15));
        assert_eq!(cfg.poll_interval, Duration::from_secs(60));
        assert_eq!(cfg.activity_log_limit, 200);
        assert_eq!(cfg.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn tls_selection() {
        let defaults = Defaults::default();
        let mut profile = Profile::new("https://10.0.0.1");
        profile.ca_cert = Some(PathBuf::from("/etc/ssl/lab.pem"));

        let cfg = profile_to_controller_config(&profile, &defaults).unwrap();
        assert_eq!(cfg.tls, TlsVerification::CustomCa(PathBuf::from("/etc/ssl/lab.pem")));

        profile.insecure = Some(true);
        let cfg = profile_to_controller_config(&profile, &defaults).unwrap();
        assert_eq!(cfg.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn invalid_profiles_are_rejected() {
        let defaults = Defaults::default();

        let err = profile_to_controller_config(&Profile::new("not a url"), &defaults).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "endpoint"));

        let err =
            profile_to_controller_config(&Profile::new("ftp://192.168.1.1"), &defaults).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "endpoint"));

        let mut profile = Profile::new("http://192.168.1.1");
        profile.log_limit = Some(0);
        let err = profile_to_controller_config(&profile, &defaults).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "log_limit"));
    }

    #[test]
    fn session_resolution_order() {
        Jail::expect_with(|jail| {
            let mut profile = Profile::new("http://192.168.1.1");
            assert!(resolve_session(&profile).is_none());

            profile.session = Some("plain".into());
            assert_eq!(resolve_session(&profile).unwrap().expose_secret(), "plain");

            jail.set_env(SESSION_ENV, "from-global-env");
            assert_eq!(
                resolve_session(&profile).unwrap().expose_secret(),
                "from-global-env"
            );

            jail.set_env("ROUTER_TOKEN", "from-profile-env");
            profile.session_env = Some("ROUTER_TOKEN".into());
            assert_eq!(
                resolve_session(&profile).unwrap().expose_secret(),
                "from-profile-env"
            );
            Ok(())
        });
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles
            .insert("default".into(), Profile::new("http://192.168.1.1"));
        save_config_to(&cfg, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[profiles.default]"));
        assert!(!written.contains("session"));
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }
}
