//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod actions;
pub mod clients;
pub mod config_cmd;
pub mod devices;
pub mod groups;
pub mod settings;
pub mod status;
pub mod util;
pub mod watch;

use parental_core::{Controller, ControllerConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Run a router-bound command. Everything except `watch` loads the
/// policy once, runs, and shuts the session down.
pub async fn dispatch(
    cmd: Command,
    config: ControllerConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Command::Watch(args) = cmd {
        return watch::handle(config, args, global).await;
    }

    Controller::oneshot(config, |controller| async move {
        Ok(route(cmd, &controller, global).await)
    })
    .await?
}

async fn route(cmd: Command, controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(controller, args, global).await,
        Command::Groups(args) => groups::handle(controller, args, global).await,
        Command::Clients(args) => clients::handle(controller, args, global).await,
        Command::Settings(args) => settings::handle(controller, args, global).await,
        Command::Health => status::health(controller, global),
        Command::Activity => status::activity(controller, global),
        Command::Usage => status::usage(controller, global),
        Command::Sync => actions::sync(controller, global).await,
        Command::Apply => actions::apply(controller, global).await,
        // Handled before a session is opened
        Command::Watch(_) | Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
