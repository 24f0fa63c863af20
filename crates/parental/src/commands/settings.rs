//! Global settings handlers.

use serde::Serialize;
use tabled::Tabled;

use parental_core::{Controller, FormEdit, GlobalKey};

use crate::cli::{GlobalOpts, SettingsArgs, SettingsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct Setting {
    key: String,
    value: String,
}

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Secret values are masked in every output format.
fn masked(key: &str, value: &str) -> String {
    let secret = key.parse::<GlobalKey>().is_ok_and(GlobalKey::is_secret);
    if secret && !value.is_empty() {
        "****".into()
    } else {
        value.to_owned()
    }
}

pub async fn handle(
    controller: &Controller,
    args: SettingsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SettingsCommand::List => {
            let form = controller.form_snapshot();
            let settings: Vec<Setting> = form
                .globals
                .iter()
                .map(|(k, v)| Setting {
                    key: k.clone(),
                    value: masked(k, v),
                })
                .collect();
            let out = output::render_list(
                global.output,
                &settings,
                |s| SettingRow {
                    key: s.key.clone(),
                    value: output::or_dash(&s.value),
                },
                |s| format!("{}={}", s.key, s.value),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SettingsCommand::Set { key, value } => {
            if key.parse::<GlobalKey>().is_err() {
                tracing::warn!(%key, "not a known setting; saving it anyway");
            }
            util::edit_and_save(controller, vec![FormEdit::SetGlobal { key, value }], global)
                .await?;
            Ok(())
        }
    }
}
