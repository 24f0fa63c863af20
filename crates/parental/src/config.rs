//! CLI configuration: thin wrapper around `parental_config`.
//!
//! Adds `GlobalOpts`-aware resolution on top of the shared profile types
//! (--profile, --endpoint, --session, --insecure, --timeout).

use secrecy::SecretString;

use parental_config::ConfigError;
use parental_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use parental_config::{Config, Profile, config_path, load_config, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Comma-separated profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Pick the profile for this invocation. An explicit `--endpoint` works
/// without any profile at all.
fn select_profile(global: &GlobalOpts, config: &Config) -> Result<Profile, CliError> {
    match config.resolve_profile(global.profile.as_deref()) {
        Ok((_, profile)) => Ok(profile.clone()),
        Err(ConfigError::UnknownProfile { .. } | ConfigError::NoProfile) => {
            match (&global.profile, &global.endpoint) {
                (Some(name), _) => Err(CliError::ProfileNotFound {
                    name: name.clone(),
                    available: available_profiles(config),
                }),
                (None, Some(endpoint)) => Ok(Profile::new(endpoint)),
                (None, None) => Err(CliError::NoConfig {
                    path: config_path().display().to_string(),
                }),
            }
        }
        Err(other) => Err(other.into()),
    }
}

/// Translate config file + global flags into a `ControllerConfig`.
///
/// CLI flag overrides take priority over profile values, which take
/// priority over `[defaults]`.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let config = load_config()?;
    let mut profile = select_profile(global, &config)?;

    if let Some(ref endpoint) = global.endpoint {
        profile.endpoint.clone_from(endpoint);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let mut controller_config =
        parental_config::profile_to_controller_config(&profile, &config.defaults)?;
    if let Some(ref session) = global.session {
        controller_config.session = Some(SecretString::from(session.clone()));
    }
    Ok(controller_config)
}
