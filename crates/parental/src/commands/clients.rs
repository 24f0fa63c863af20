//! Managed-client command handlers.

use tabled::Tabled;

use parental_core::{
    Command as CoreCommand, Controller, FormEdit, FormModel, ManagedClient, UsageReport,
};

use crate::cli::{ClientsArgs, ClientsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ClientRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Paused until")]
    paused: String,
    #[tabled(rename = "Activity")]
    activity: u32,
}

impl ClientRow {
    fn new(c: &ManagedClient, form: &FormModel, usage: &UsageReport) -> Self {
        Self {
            mac: c.mac.to_string(),
            name: output::or_dash(&c.name),
            group: group_label(c, form),
            paused: pause_label(c),
            activity: usage.count(&c.mac).unwrap_or(0),
        }
    }
}

/// Effective group id, or the dangling reference marked as unassigned.
fn group_label(c: &ManagedClient, form: &FormModel) -> String {
    match form.effective_group(c) {
        Some(g) => g.id.clone(),
        None if c.group.is_empty() => "-".into(),
        None => format!("- ({} missing)", c.group),
    }
}

fn pause_label(c: &ManagedClient) -> String {
    match &c.pause_until {
        None | Some(serde_json::Value::Null) => "-".into(),
        Some(serde_json::Value::String(s)) => output::or_dash(s),
        Some(other) => other.to_string(),
    }
}

fn detail(c: &ManagedClient, form: &FormModel, usage: &UsageReport) -> String {
    output::detail_block(&[
        ("MAC", c.mac.to_string()),
        ("Name", output::or_dash(&c.name)),
        ("Group", group_label(c, form)),
        ("Paused until", pause_label(c)),
        ("Activity", usage.count(&c.mac).unwrap_or(0).to_string()),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: ClientsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ClientsCommand::List => {
            let form = controller.form_snapshot();
            let usage = controller.usage_snapshot();
            let out = output::render_list(
                global.output,
                &form.clients,
                |c| ClientRow::new(c, &form, &usage),
                |c| c.mac.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ClientsCommand::Get { mac } => {
            let mac = util::parse_mac(&mac)?;
            let form = controller.form_snapshot();
            let usage = controller.usage_snapshot();
            let client = form.client(&mac).ok_or_else(|| CliError::NotFound {
                resource_type: "client".into(),
                identifier: mac.to_string(),
                list_command: "clients list".into(),
            })?;
            let out = output::render_single(
                global.output,
                client,
                |c| detail(c, &form, &usage),
                |c| c.mac.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ClientsCommand::Add { mac, name, group } => {
            let mac = util::parse_mac(&mac)?;
            util::edit_and_save(
                controller,
                vec![FormEdit::AddClient { mac, name, group }],
                global,
            )
            .await?;
            Ok(())
        }

        ClientsCommand::Assign { mac, group } => {
            let mac = util::parse_mac(&mac)?;
            util::edit_and_save(controller, vec![FormEdit::AssignClient { mac, group }], global)
                .await?;
            Ok(())
        }

        ClientsCommand::Rename { mac, name } => {
            let mac = util::parse_mac(&mac)?;
            util::edit_and_save(
                controller,
                vec![FormEdit::UpdateClient {
                    mac,
                    name: Some(name),
                }],
                global,
            )
            .await?;
            Ok(())
        }

        ClientsCommand::Remove { mac } => {
            let mac = util::parse_mac(&mac)?;
            if controller.form_snapshot().client(&mac).is_none() {
                return Err(CliError::NotFound {
                    resource_type: "client".into(),
                    identifier: mac.to_string(),
                    list_command: "clients list".into(),
                });
            }
            if !util::confirm(&format!("Stop managing {mac}?"), global.yes)? {
                return Ok(());
            }
            util::edit_and_save(controller, vec![FormEdit::RemoveClient { mac }], global).await?;
            Ok(())
        }

        ClientsCommand::Pause { mac, duration } => {
            let mac = util::parse_mac(&mac)?;
            let minutes = util::pause_minutes(duration)?;
            controller
                .execute(CoreCommand::PauseClient {
                    mac: mac.clone(),
                    minutes,
                })
                .await?;
            output::notice(&format!("✓ {mac} paused for {minutes} min"), global.quiet);
            Ok(())
        }

        ClientsCommand::Block { mac } => {
            let mac = util::parse_mac(&mac)?;
            controller
                .execute(CoreCommand::BlockClient { mac: mac.clone() })
                .await?;
            output::notice(&format!("✓ {mac} blocked"), global.quiet);
            Ok(())
        }

        ClientsCommand::Unblock { mac } => {
            let mac = util::parse_mac(&mac)?;
            controller
                .execute(CoreCommand::UnblockClient { mac: mac.clone() })
                .await?;
            output::notice(&format!("✓ {mac} unblocked"), global.quiet);
            Ok(())
        }
    }
}
