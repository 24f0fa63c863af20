//! `watch`: keep a session open and print a line whenever a view changes.

use chrono::Local;

use parental_core::{ConnectionState, Controller, ControllerConfig, EditState, HealthView};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    mut config: ControllerConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(interval) = args.interval {
        config.poll_interval = interval;
    }
    if config.poll_interval.is_zero() {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "must be greater than zero".into(),
        });
    }

    let controller = Controller::new(config);
    controller.start().await?;
    let result = run(&controller, global).await;
    controller.shutdown().await;
    result
}

async fn run(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color);

    if let ConnectionState::Disconnected { reason } = controller.ready().await? {
        tracing::warn!(%reason, "initial load failed; retrying on the next tick");
    }
    print_status(controller, color, global.quiet);

    let mut connection = controller.connection_state();
    let mut form = controller.form();
    let mut health = controller.health();
    let mut edit_state = controller.edit_state();
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            _ = &mut interrupt => {
                tracing::debug!("interrupted");
                return Ok(());
            }
            changed = connection.changed() => if changed.is_none() { return Ok(()) },
            changed = form.changed() => if changed.is_none() { return Ok(()) },
            changed = health.changed() => if changed.is_none() { return Ok(()) },
            changed = edit_state.changed() => if changed.is_none() { return Ok(()) },
        }
        print_status(controller, color, global.quiet);
    }
}

fn print_status(controller: &Controller, color: bool, quiet: bool) {
    let form = controller.form_snapshot();
    let connection = match controller.connection_snapshot() {
        ConnectionState::Idle => output::dim("idle", color),
        ConnectionState::Connected => output::status_word("connected", true, color),
        ConnectionState::Disconnected { reason } => {
            output::status_word(&format!("disconnected ({reason})"), false, color)
        }
    };
    let health = match controller.health_snapshot() {
        HealthView::Unavailable => output::dim("health unknown", color),
        HealthView::Available(status) => {
            let good = status.all_healthy();
            output::status_word(if good { "healthy" } else { "degraded" }, good, color)
        }
    };
    let edits = match controller.edit_state_snapshot() {
        EditState::Clean => "",
        EditState::Dirty => " (unsaved edits)",
    };
    let loaded = controller
        .last_overview_at()
        .map_or_else(|| "never".into(), |t| t.with_timezone(&Local).format("%H:%M:%S").to_string());

    let line = format!(
        "{} {connection} | {health} | {} groups, {} clients, {} devices | loaded {loaded}{edits}",
        Local::now().format("%H:%M:%S"),
        form.groups.len(),
        form.clients.len(),
        controller.discovered_snapshot().len(),
    );
    output::print_output(&line, quiet);
}
