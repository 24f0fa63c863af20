//! Device command handlers (merged discovery view).

use tabled::Tabled;

use parental_core::{Controller, DiscoveredDevice, FormEdit, FormModel};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Sources")]
    sources: String,
    #[tabled(rename = "Signal")]
    signal: String,
    #[tabled(rename = "Managed")]
    managed: String,
}

impl DeviceRow {
    fn new(d: &DiscoveredDevice, form: &FormModel) -> Self {
        Self {
            mac: d.mac.to_string(),
            hostname: output::or_dash(d.hostname.as_deref().unwrap_or_default()),
            ip: d
                .primary_ip()
                .map(|ip| ip.to_string())
                .or_else(|| d.ipv6.first().map(ToString::to_string))
                .unwrap_or_else(|| "-".into()),
            sources: output::or_dash(&d.sources.join(",")),
            signal: d.signal.map_or_else(|| "-".into(), |s| format!("{s} dBm")),
            managed: form
                .client(&d.mac)
                .map_or_else(|| "-".into(), |c| output::or_dash(&c.group)),
        }
    }
}

fn detail(d: &DiscoveredDevice) -> String {
    let join = |items: Vec<String>| output::or_dash(&items.join(", "));
    output::detail_block(&[
        ("MAC", d.mac.to_string()),
        ("Hostname", output::or_dash(d.hostname.as_deref().unwrap_or_default())),
        ("IPv4", join(d.ipv4.iter().map(ToString::to_string).collect())),
        ("IPv6", join(d.ipv6.iter().map(ToString::to_string).collect())),
        ("Sources", join(d.sources.clone())),
        ("Interface", output::or_dash(d.interface.as_deref().unwrap_or_default())),
        ("Group hint", output::or_dash(d.group_hint.as_deref().unwrap_or_default())),
        ("Signal", d.signal.map_or_else(|| "-".into(), |s| format!("{s} dBm"))),
        ("Last seen", d.last_seen.map_or_else(|| "-".into(), |t| t.to_string())),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List { unmanaged } => {
            let form = controller.form_snapshot();
            let devices: Vec<DiscoveredDevice> = controller
                .discovered_snapshot()
                .iter()
                .filter(|d| !unmanaged || form.client(&d.mac).is_none())
                .cloned()
                .collect();
            let out = output::render_list(
                global.output,
                &devices,
                |d| DeviceRow::new(d, &form),
                |d| d.mac.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { mac } => {
            let mac = util::parse_mac(&mac)?;
            let devices = controller.discovered_snapshot();
            let device = devices
                .iter()
                .find(|d| d.mac == mac)
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "device".into(),
                    identifier: mac.to_string(),
                    list_command: "devices list".into(),
                })?;
            let out = output::render_single(global.output, device, detail, |d| d.mac.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Promote { mac, group } => {
            let mac = util::parse_mac(&mac)?;
            util::edit_and_save(
                controller,
                vec![FormEdit::PromoteDevice {
                    mac: mac.clone(),
                    group: group.clone(),
                }],
                global,
            )
            .await?;
            output::notice(&format!("✓ {mac} now managed in group '{group}'"), global.quiet);
            Ok(())
        }
    }
}
