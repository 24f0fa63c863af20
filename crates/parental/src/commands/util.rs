//! Shared helpers for command handlers.

use std::time::Duration;

use tabled::Tabled;

use parental_core::{ActionOutcome, CommandResult, Controller, FormEdit, MacAddress};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Parse and normalize a MAC address argument.
pub fn parse_mac(raw: &str) -> Result<MacAddress, CliError> {
    let mac = MacAddress::new(raw);
    let octets: Vec<&str> = mac.as_str().split(':').collect();
    let valid = octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
    if valid {
        Ok(mac)
    } else {
        Err(CliError::Validation {
            field: "mac".into(),
            reason: format!("'{raw}' is not a MAC address (expected aa:bb:cc:dd:ee:ff)"),
        })
    }
}

/// Whole minutes for a pause, rounded up.
pub fn pause_minutes(duration: Duration) -> Result<u32, CliError> {
    let minutes = duration.as_secs().div_ceil(60);
    match u32::try_from(minutes) {
        Ok(m) if m > 0 => Ok(m),
        _ => Err(CliError::Validation {
            field: "duration".into(),
            reason: format!(
                "expected between 1 minute and {} minutes",
                u32::MAX
            ),
        }),
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Apply edits to the loaded form, then save once. The router only sees
/// the final state; a failing edit aborts before anything is written.
pub async fn edit_and_save(
    controller: &Controller,
    edits: Vec<FormEdit>,
    global: &GlobalOpts,
) -> Result<Vec<CommandResult>, CliError> {
    let mut results = Vec::with_capacity(edits.len());
    for edit in edits {
        tracing::debug!(?edit, "applying edit");
        results.push(controller.edit(edit).await?);
    }
    controller.save().await?;
    output::notice("✓ Saved", global.quiet);
    Ok(results)
}

// ── Group action outcomes ───────────────────────────────────────────

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Result")]
    result: String,
}

/// Print per-client outcomes; any failure fails the command.
pub fn report_batch(result: CommandResult, global: &GlobalOpts) -> Result<(), CliError> {
    let CommandResult::Batch(outcomes) = result else {
        return Ok(());
    };
    if outcomes.is_empty() {
        output::notice("No clients in this group", global.quiet);
        return Ok(());
    }

    let color = output::should_color(global.color);
    let out = output::render_list(
        global.output,
        &outcomes,
        |o: &ActionOutcome| OutcomeRow {
            mac: o.mac.to_string(),
            result: o.error.as_deref().map_or_else(
                || output::status_word("ok", true, color),
                |e| output::status_word(e, false, color),
            ),
        },
        |o| o.mac.to_string(),
    )?;
    output::print_output(&out, global.quiet);

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        return Err(CliError::PartialFailure {
            failed,
            total: outcomes.len(),
        });
    }
    Ok(())
}
