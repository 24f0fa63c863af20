//! Router-wide actions.

use parental_core::{Command as CoreCommand, Controller};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn sync(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    controller.execute(CoreCommand::SyncExternalFilter).await?;
    output::notice("✓ DNS profiles pushed to the external filter", global.quiet);
    Ok(())
}

pub async fn apply(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    controller.execute(CoreCommand::ApplyRules).await?;
    output::notice("✓ Firewall rules regenerated", global.quiet);
    Ok(())
}
