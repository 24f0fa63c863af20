//! Group command handlers.

use tabled::Tabled;

use parental_core::{
    Command as CoreCommand, CommandResult, Controller, FormEdit, FormModel, GroupPatch,
    PolicyGroup,
};

use crate::cli::{GlobalOpts, GroupFields, GroupsArgs, GroupsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "DNS")]
    dns: String,
    #[tabled(rename = "Quota/day")]
    quota: String,
    #[tabled(rename = "Schedule")]
    schedule: String,
    #[tabled(rename = "Clients")]
    clients: usize,
}

impl GroupRow {
    fn new(g: &PolicyGroup, form: &FormModel) -> Self {
        Self {
            id: g.id.clone(),
            name: g.name.clone(),
            dns: output::or_dash(&g.dns_profile),
            quota: g
                .quota_daily_min
                .as_ref()
                .map_or_else(|| "-".into(), |q| format!("{q} min")),
            schedule: match g.schedule.len() {
                0 => "-".into(),
                1 => "1 rule".into(),
                n => format!("{n} rules"),
            },
            clients: form.clients_in_group(&g.id).count(),
        }
    }
}

fn detail(g: &PolicyGroup, form: &FormModel) -> String {
    let members: Vec<String> = form
        .clients_in_group(&g.id)
        .map(|c| {
            if c.name.is_empty() {
                c.mac.to_string()
            } else {
                format!("{} ({})", c.name, c.mac)
            }
        })
        .collect();
    output::detail_block(&[
        ("ID", g.id.clone()),
        ("Name", g.name.clone()),
        ("DNS profile", output::or_dash(&g.dns_profile)),
        (
            "Quota",
            g.quota_daily_min
                .as_ref()
                .map_or_else(|| "-".into(), |q| format!("{q} min/day")),
        ),
        ("Schedule", output::or_dash(&g.schedule.join("; "))),
        ("Clients", output::or_dash(&members.join(", "))),
    ])
}

fn patch(name: Option<String>, fields: GroupFields) -> GroupPatch {
    let schedule = if fields.clear_schedule {
        Some(Vec::new())
    } else if fields.schedule.is_empty() {
        None
    } else {
        Some(fields.schedule)
    };
    GroupPatch {
        name,
        dns_profile: fields.dns_profile,
        quota_daily_min: fields.quota,
        schedule,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: GroupsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        GroupsCommand::List => {
            let form = controller.form_snapshot();
            let out = output::render_list(
                global.output,
                &form.groups,
                |g| GroupRow::new(g, &form),
                |g| g.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Get { id } => {
            let form = controller.form_snapshot();
            let group = form.group(&id).ok_or_else(|| CliError::NotFound {
                resource_type: "group".into(),
                identifier: id.clone(),
                list_command: "groups list".into(),
            })?;
            let out = output::render_single(
                global.output,
                group,
                |g| detail(g, &form),
                |g| g.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Add { name, fields } => {
            let created = controller.edit(FormEdit::AddGroup { name }).await?;
            let CommandResult::GroupCreated(id) = created else {
                return Err(CliError::ApiError {
                    message: format!("unexpected result {created:?}"),
                });
            };

            let patch = patch(None, fields);
            let edits = if patch == GroupPatch::default() {
                Vec::new()
            } else {
                vec![FormEdit::UpdateGroup {
                    id: id.clone(),
                    patch,
                }]
            };
            util::edit_and_save(controller, edits, global).await?;
            output::print_output(&id, global.quiet);
            Ok(())
        }

        GroupsCommand::Rename { id, new_id } => {
            let results = util::edit_and_save(
                controller,
                vec![FormEdit::RenameGroup {
                    id: id.clone(),
                    new_id,
                }],
                global,
            )
            .await?;
            if let Some(CommandResult::GroupRenamed(assigned)) = results.first() {
                output::notice(&format!("✓ Group '{id}' is now '{assigned}'"), global.quiet);
            }
            Ok(())
        }

        GroupsCommand::Update { id, name, fields } => {
            let patch = patch(name, fields);
            if patch == GroupPatch::default() {
                return Err(CliError::Validation {
                    field: "update".into(),
                    reason: "nothing to change; pass at least one field flag".into(),
                });
            }
            util::edit_and_save(controller, vec![FormEdit::UpdateGroup { id, patch }], global)
                .await?;
            Ok(())
        }

        GroupsCommand::Remove { id } => {
            let form = controller.form_snapshot();
            if form.group(&id).is_none() {
                return Err(CliError::NotFound {
                    resource_type: "group".into(),
                    identifier: id,
                    list_command: "groups list".into(),
                });
            }
            let members = form.clients_in_group(&id).count();
            let prompt = if members == 0 {
                format!("Delete group '{id}'?")
            } else {
                format!("Delete group '{id}'? {members} client(s) will become unassigned.")
            };
            if !util::confirm(&prompt, global.yes)? {
                return Ok(());
            }
            util::edit_and_save(controller, vec![FormEdit::RemoveGroup { id }], global).await?;
            Ok(())
        }

        GroupsCommand::Pause { id, duration } => {
            let minutes = util::pause_minutes(duration)?;
            let result = controller
                .execute(CoreCommand::PauseGroup { group: id, minutes })
                .await?;
            util::report_batch(result, global)
        }

        GroupsCommand::Block { id } => {
            let result = controller
                .execute(CoreCommand::BlockGroup { group: id })
                .await?;
            util::report_batch(result, global)
        }

        GroupsCommand::Unblock { id } => {
            let result = controller
                .execute(CoreCommand::UnblockGroup { group: id })
                .await?;
            util::report_batch(result, global)
        }
    }
}
