//! Config subcommand handlers.

use dialoguer::Input;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Copy of the config with plaintext session tokens masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.session.is_some() {
            profile.session = Some("****".into());
        }
    }
    cfg
}

fn summary(cfg: &Config) -> String {
    let mut lines = vec![
        format!("Config file:      {}", config::config_path().display()),
        format!(
            "Default profile:  {}",
            cfg.default_profile.as_deref().unwrap_or("-")
        ),
        format!("Timeout:          {}s", cfg.defaults.timeout),
        format!("Poll interval:    {}s", cfg.defaults.poll_interval),
        format!("Activity entries: {}", cfg.defaults.log_limit),
    ];
    for (name, p) in &cfg.profiles {
        lines.push(String::new());
        lines.push(format!("[{name}]"));
        lines.push(output::detail_block(&[
            ("endpoint", p.endpoint.clone()),
            ("session", p.session.clone().unwrap_or_else(|| "-".into())),
            ("session_env", p.session_env.clone().unwrap_or_else(|| "-".into())),
            ("insecure", p.insecure.unwrap_or(cfg.defaults.insecure).to_string()),
        ]));
    }
    lines.join("\n")
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config()?);
            let out = output::render_single(global.output, &cfg, summary, |c| {
                c.default_profile.clone().unwrap_or_default()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            eprintln!("parental: configuration wizard");
            eprintln!("   Config path: {}\n", config::config_path().display());

            let name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let endpoint: String = Input::new()
                .with_prompt("Router URL")
                .default("http://192.168.1.1".into())
                .interact_text()
                .map_err(prompt_err)?;

            let session_env: String = Input::new()
                .with_prompt("Environment variable holding the session token (blank for none)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            let mut profile = Profile::new(endpoint);
            if !session_env.trim().is_empty() {
                profile.session_env = Some(session_env.trim().to_owned());
            }

            let mut cfg = config::load_config()?;
            cfg.profiles.insert(name.clone(), profile);
            if cfg.default_profile.is_none() {
                cfg.default_profile = Some(name.clone());
            }
            let path = config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", path.display());
            eprintln!("  Profile: {name}");
            eprintln!("\n  Test it: parental health -p {name}");
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or_default();
            if cfg.profiles.is_empty() {
                output::notice("No profiles configured. Run: parental config init", global.quiet);
            } else {
                for name in cfg.profiles.keys() {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            output::notice(&format!("✓ Default profile set to '{name}'"), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_masks_plaintext_sessions() {
        let mut cfg = Config::default();
        let mut profile = Profile::new("http://192.168.1.1");
        profile.session = Some("0123456789abcdef".into());
        cfg.profiles.insert("home".into(), profile);

        let shown = redacted(&cfg);
        assert_eq!(shown.profiles["home"].session.as_deref(), Some("****"));
        assert!(!summary(&shown).contains("0123456789abcdef"));
    }
}
