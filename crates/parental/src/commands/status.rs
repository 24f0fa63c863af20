//! Read-only views: health, activity log, usage.

use serde::Serialize;
use strum::IntoEnumIterator;
use tabled::Tabled;

use parental_core::{ActivityEntry, ClientUsage, Controller, HealthCheck, HealthView};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Health ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CheckLine {
    check: String,
    status: String,
    healthy: bool,
}

#[derive(Tabled)]
struct CheckRow {
    #[tabled(rename = "Check")]
    check: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub fn health(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let HealthView::Available(status) = controller.health_snapshot() else {
        return Err(CliError::ApiError {
            message: "health status is unavailable".into(),
        });
    };

    let lines: Vec<CheckLine> = HealthCheck::iter()
        .map(|check| CheckLine {
            check: check.to_string(),
            status: status.status(check).to_owned(),
            healthy: status.is_healthy(check),
        })
        .collect();

    let color = output::should_color(global.color);
    let out = output::render_list(
        global.output,
        &lines,
        |l| CheckRow {
            check: l.check.clone(),
            status: output::status_word(&l.status, l.healthy, color),
        },
        |l| format!("{}={}", l.check, l.status),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Activity ────────────────────────────────────────────────────────

#[derive(Tabled)]
struct ActivityRow {
    #[tabled(rename = "Entry")]
    descriptor: String,
    #[tabled(rename = "Details")]
    details: String,
}

impl ActivityRow {
    fn new(e: &ActivityEntry) -> Self {
        let details = e
            .metadata
            .iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => format!("{k}={s}"),
                other => format!("{k}={other}"),
            })
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            descriptor: e.descriptor.clone(),
            details: output::or_dash(&details),
        }
    }
}

pub fn activity(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let entries = controller.activity_snapshot();
    let out = output::render_list(
        global.output,
        entries.as_slice(),
        ActivityRow::new,
        |e| e.descriptor.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Usage ───────────────────────────────────────────────────────────

#[derive(Tabled)]
struct UsageRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Entries")]
    count: u32,
    #[tabled(rename = "Share")]
    share: String,
}

impl UsageRow {
    fn new(u: &ClientUsage) -> Self {
        Self {
            mac: u.mac.to_string(),
            name: output::or_dash(&u.name),
            count: u.count,
            share: format!("{:>3.0}%", u.share * 100.0),
        }
    }
}

pub fn usage(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let report = controller.usage_snapshot();
    let out = output::render_list(
        global.output,
        &report.clients,
        UsageRow::new,
        |u| format!("{} {}", u.mac, u.count),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
