// Methods of the `parental` ubus object
//
// One thin wrapper per rpcd method. Argument objects are built inline;
// reply shapes live in `models.rs`.

use serde_json::json;
use tracing::debug;

use crate::error::Error;
use crate::ubus::client::UbusClient;
use crate::ubus::models::{ActionAck, ActivityLog, Overview, RawHealth, SavePayload};

impl UbusClient {
    // ── Reads ────────────────────────────────────────────────────────

    /// Full snapshot: globals, groups, managed clients, discovered devices.
    pub async fn get_overview(&self) -> Result<Overview, Error> {
        let overview: Overview = self.call("get_overview", &json!({})).await?;
        debug!(
            groups = overview.groups.len(),
            clients = overview.clients.len(),
            discovered = overview.discovered.len(),
            "fetched overview"
        );
        Ok(overview)
    }

    /// Status of the enforcement subsystems (nftables, fw4 chain, cron,
    /// AdGuard).
    pub async fn health(&self) -> Result<RawHealth, Error> {
        self.call("health", &json!({})).await
    }

    /// The newest `limit` activity log lines.
    pub async fn activity_log(&self, limit: u32) -> Result<ActivityLog, Error> {
        self.call("activity_log", &json!({ "limit": limit })).await
    }

    // ── Client actions ───────────────────────────────────────────────

    /// Suspend a client's access for `duration_minutes`.
    pub async fn pause_client(&self, mac: &str, duration_minutes: u32) -> Result<ActionAck, Error> {
        self.call(
            "pause_client",
            &json!({ "mac": mac, "duration_minutes": duration_minutes }),
        )
        .await
    }

    pub async fn block_client(&self, mac: &str) -> Result<ActionAck, Error> {
        self.call("block_client", &json!({ "mac": mac })).await
    }

    pub async fn unblock_client(&self, mac: &str) -> Result<ActionAck, Error> {
        self.call("unblock_client", &json!({ "mac": mac })).await
    }

    // ── Router-wide actions ──────────────────────────────────────────

    /// Push group DNS profiles to the external filter (AdGuard Home).
    pub async fn sync_external_filter(&self) -> Result<ActionAck, Error> {
        self.call("sync_external_filter", &json!({})).await
    }

    /// Regenerate and reload the firewall rule set.
    pub async fn apply_rules(&self) -> Result<ActionAck, Error> {
        self.call("apply_rules", &json!({})).await
    }

    /// Persist a complete configuration. The router replaces its stored
    /// config wholesale; anything not in `payload` is removed.
    pub async fn save_config(&self, payload: &SavePayload) -> Result<ActionAck, Error> {
        debug!(
            groups = payload.groups.len(),
            clients = payload.clients.len(),
            "saving config"
        );
        self.call("save_config", payload).await
    }
}
