// ── Session state ──
//
// The single owned context of a dashboard session: the live form model,
// its dirty flag, and every derived view. The controller's session task
// is the only owner; nothing here suspends or does I/O.
//
// Commit rules for an arriving refresh:
//   overview ok, Clean or forced   form replaced, state -> Clean
//   overview ok, Dirty, unforced   form untouched, other views updated
//   overview failed                form untouched, connection -> Disconnected
//   health / activity failed       previous value kept

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parental_api::{Overview, SavePayload};
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{debug, warn};

use crate::builder::{build, to_save_payload};
use crate::command::{CommandResult, FormEdit};
use crate::error::CoreError;
use crate::merge::merge;
use crate::model::{
    ActivityEntry, DiscoveredDevice, DiscoveryObservation, FormModel, HealthStatus, HealthView,
    ManagedClient,
};
use crate::usage::UsageReport;

/// Whether the form model carries unsaved edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum EditState {
    #[default]
    Clean,
    Dirty,
}

/// Reachability of the router as seen by the last overview fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    /// No refresh has completed yet.
    #[default]
    Idle,
    Connected,
    Disconnected { reason: String },
}

/// The three results of one refresh, observed together.
#[derive(Debug)]
pub struct RefreshData {
    pub overview: Result<Overview, CoreError>,
    pub health: Result<HealthStatus, CoreError>,
    pub activity: Result<Vec<ActivityEntry>, CoreError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReport {
    pub form_replaced: bool,
    pub overview_ok: bool,
}

#[derive(Debug, Clone)]
pub struct Session {
    form: Arc<FormModel>,
    state: EditState,
    discovered: Arc<Vec<DiscoveredDevice>>,
    health: HealthView,
    activity: Arc<Vec<ActivityEntry>>,
    usage: Arc<UsageReport>,
    connection: ConnectionState,
    last_overview_at: Option<DateTime<Utc>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::init()
    }
}

impl Session {
    /// Fresh session: empty clean form, no data yet.
    pub fn init() -> Self {
        Self {
            form: Arc::new(FormModel::default()),
            state: EditState::Clean,
            discovered: Arc::new(Vec::new()),
            health: HealthView::Unavailable,
            activity: Arc::new(Vec::new()),
            usage: Arc::new(UsageReport::default()),
            connection: ConnectionState::Idle,
            last_overview_at: None,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn form(&self) -> &Arc<FormModel> {
        &self.form
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn discovered(&self) -> &Arc<Vec<DiscoveredDevice>> {
        &self.discovered
    }

    pub fn health(&self) -> &HealthView {
        &self.health
    }

    pub fn activity(&self) -> &Arc<Vec<ActivityEntry>> {
        &self.activity
    }

    pub fn usage(&self) -> &Arc<UsageReport> {
        &self.usage
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub fn last_overview_at(&self) -> Option<DateTime<Utc>> {
        self.last_overview_at
    }

    // ── Edits ────────────────────────────────────────────────────────

    /// Apply one local edit. On success the session is Dirty before this
    /// returns; on error nothing changes.
    pub fn edit(&mut self, edit: FormEdit) -> Result<CommandResult, CoreError> {
        let mut form = FormModel::clone(&self.form);
        let result = apply_edit(&mut form, edit, &self.discovered)?;

        let clients_changed = form.clients != self.form.clients;
        self.form = Arc::new(form);
        self.state = EditState::Dirty;
        if clients_changed {
            self.recompute_usage();
        }
        Ok(result)
    }

    // ── Refresh / save ───────────────────────────────────────────────

    pub fn commit(&mut self, data: RefreshData, force: bool, at: DateTime<Utc>) -> CommitReport {
        let mut report = CommitReport {
            form_replaced: false,
            overview_ok: false,
        };

        match data.overview {
            Ok(overview) => {
                self.discovered = Arc::new(merge(
                    overview.discovered.iter().map(DiscoveryObservation::from),
                ));
                if force || self.state == EditState::Clean {
                    self.form = Arc::new(build(&overview));
                    self.state = EditState::Clean;
                    report.form_replaced = true;
                } else {
                    debug!("form has unsaved edits; keeping it");
                }
                self.connection = ConnectionState::Connected;
                self.last_overview_at = Some(at);
                report.overview_ok = true;
            }
            Err(e) => {
                warn!(error = %e, "overview fetch failed");
                self.connection = ConnectionState::Disconnected {
                    reason: e.to_string(),
                };
            }
        }

        match data.health {
            Ok(status) => self.health = HealthView::Available(status),
            Err(e) => warn!(error = %e, "health fetch failed"),
        }

        match data.activity {
            Ok(entries) => self.activity = Arc::new(entries),
            Err(e) => warn!(error = %e, "activity log fetch failed"),
        }

        self.recompute_usage();
        report
    }

    /// The router confirmed a save.
    pub fn mark_saved(&mut self) {
        self.state = EditState::Clean;
    }

    pub fn save_payload(&self) -> SavePayload {
        to_save_payload(&self.form)
    }

    fn recompute_usage(&mut self) {
        self.usage = Arc::new(UsageReport::compute(&self.activity, &self.form.clients));
    }
}

fn apply_edit(
    form: &mut FormModel,
    edit: FormEdit,
    discovered: &[DiscoveredDevice],
) -> Result<CommandResult, CoreError> {
    match edit {
        FormEdit::SetGlobal { key, value } => form.set_global(&key, value)?,
        FormEdit::AddGroup { name } => return Ok(CommandResult::GroupCreated(form.add_group(&name))),
        FormEdit::RenameGroup { id, new_id } => {
            return form.rename_group(&id, &new_id).map(CommandResult::GroupRenamed);
        }
        FormEdit::UpdateGroup { id, patch } => form.update_group(&id, patch)?,
        FormEdit::RemoveGroup { id } => {
            form.remove_group(&id)?;
        }
        FormEdit::AddClient { mac, name, group } => form.add_client(ManagedClient {
            mac,
            name,
            group,
            pause_until: None,
        })?,
        FormEdit::PromoteDevice { mac, group } => {
            let device = discovered
                .iter()
                .find(|d| d.mac == mac)
                .ok_or_else(|| CoreError::DeviceNotFound {
                    mac: mac.to_string(),
                })?;
            form.add_client(ManagedClient {
                mac: device.mac.clone(),
                name: device.hostname.clone().unwrap_or_default(),
                group,
                pause_until: None,
            })?;
        }
        FormEdit::UpdateClient { mac, name } => form.update_client(&mac, name)?,
        FormEdit::AssignClient { mac, group } => form.assign_client(&mac, &group)?,
        FormEdit::RemoveClient { mac } => {
            form.remove_client(&mac)?;
        }
    }
    Ok(CommandResult::Ok)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::MacAddress;

    fn overview(value: serde_json::Value) -> Overview {
        serde_json::from_value(value).unwrap()
    }

    fn first_snapshot() -> Overview {
        overview(json!({
            "globals": { "enabled": "1" },
            "groups_list": [{ "section": "kids", "name": "Kids" }],
            "clients_list": [{ "mac": "11:22:33:44:55:66", "name": "Tablet", "group": "kids" }],
            "discovered": [{ "mac": "aa:bb:cc:dd:ee:01", "hostname": "laptop", "src": "dhcp" }]
        }))
    }

    fn second_snapshot() -> Overview {
        overview(json!({
            "globals": { "enabled": "0" },
            "groups_list": [{ "section": "teens", "name": "Teens" }],
            "clients_list": [],
            "discovered": [
                { "mac": "aa:bb:cc:dd:ee:01", "hostname": "laptop" },
                { "mac": "aa:bb:cc:dd:ee:02", "hostname": "console" }
            ]
        }))
    }

    fn ok(overview: Overview) -> RefreshData {
        RefreshData {
            overview: Ok(overview),
            health: Ok(HealthStatus {
                nft: "ok".into(),
                ..HealthStatus::default()
            }),
            activity: Ok(vec![ActivityEntry::new("Tablet online")]),
        }
    }

    fn loaded() -> Session {
        let mut session = Session::init();
        session.commit(ok(first_snapshot()), false, Utc::now());
        session
    }

    #[test]
    fn initial_state_is_clean_and_idle() {
        let session = Session::init();
        assert_eq!(session.state(), EditState::Clean);
        assert_eq!(session.connection(), &ConnectionState::Idle);
        assert_eq!(session.health(), &HealthView::Unavailable);
    }

    #[test]
    fn clean_refresh_replaces_form() {
        let mut session = loaded();
        assert_eq!(session.form().groups[0].id, "kids");
        assert_eq!(session.usage().count(&MacAddress::new("11:22:33:44:55:66")), Some(1));

        let report = session.commit(ok(second_snapshot()), false, Utc::now());
        assert!(report.form_replaced);
        assert_eq!(session.form().as_ref(), &build(&second_snapshot()));
        assert_eq!(session.state(), EditState::Clean);
    }

    #[test]
    fn edit_marks_dirty_synchronously() {
        let mut session = loaded();
        session
            .edit(FormEdit::SetGlobal {
                key: "default_policy".into(),
                value: "block".into(),
            })
            .unwrap();
        assert_eq!(session.state(), EditState::Dirty);
    }

    #[test]
    fn failed_edit_stays_clean() {
        let mut session = loaded();
        let before = Arc::clone(session.form());
        let err = session
            .edit(FormEdit::RemoveGroup { id: "missing".into() })
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(session.state(), EditState::Clean);
        assert!(Arc::ptr_eq(&before, session.form()));
    }

    #[test]
    fn dirty_unforced_refresh_keeps_form_but_updates_views() {
        let mut session = loaded();
        session
            .edit(FormEdit::AddGroup {
                name: "Weekend".into(),
            })
            .unwrap();
        let edited = FormModel::clone(session.form());

        let mut data = ok(second_snapshot());
        data.activity = Ok(vec![ActivityEntry::new("console idle")]);
        let report = session.commit(data, false, Utc::now());

        assert!(!report.form_replaced);
        assert_eq!(session.form().as_ref(), &edited);
        assert_eq!(session.state(), EditState::Dirty);
        assert_eq!(session.discovered().len(), 2);
        assert_eq!(session.activity()[0].descriptor, "console idle");
        assert!(matches!(session.health(), HealthView::Available(_)));
    }

    #[test]
    fn forced_refresh_discards_edits() {
        let mut session = loaded();
        session
            .edit(FormEdit::RemoveGroup { id: "kids".into() })
            .unwrap();

        let report = session.commit(ok(first_snapshot()), true, Utc::now());
        assert!(report.form_replaced);
        assert_eq!(session.state(), EditState::Clean);
        assert!(session.form().group("kids").is_some());
    }

    #[test]
    fn failed_overview_keeps_form_and_disconnects() {
        let mut session = loaded();
        session
            .edit(FormEdit::AddGroup { name: "x".into() })
            .unwrap();
        let edited = Arc::clone(session.form());
        let seen_at = session.last_overview_at();

        let report = session.commit(
            RefreshData {
                overview: Err(CoreError::Timeout),
                health: Err(CoreError::Timeout),
                activity: Err(CoreError::Timeout),
            },
            true,
            Utc::now(),
        );

        assert!(!report.overview_ok);
        assert!(Arc::ptr_eq(&edited, session.form()));
        assert_eq!(session.state(), EditState::Dirty);
        assert!(matches!(session.connection(), ConnectionState::Disconnected { .. }));
        assert_eq!(session.last_overview_at(), seen_at);
        // Previous health and activity survive the failure.
        assert!(matches!(session.health(), HealthView::Available(_)));
        assert_eq!(session.activity().len(), 1);
    }

    #[test]
    fn partial_failure_degrades_only_that_view() {
        let mut session = Session::init();
        let mut data = ok(first_snapshot());
        data.health = Err(CoreError::Timeout);
        session.commit(data, false, Utc::now());

        assert_eq!(session.connection(), &ConnectionState::Connected);
        assert_eq!(session.health(), &HealthView::Unavailable);
        assert_eq!(session.form().clients.len(), 1);
        assert_eq!(session.activity().len(), 1);
    }

    #[test]
    fn promote_device_uses_hostname() {
        let mut session = loaded();
        session
            .edit(FormEdit::PromoteDevice {
                mac: MacAddress::new("AA:BB:CC:DD:EE:01"),
                group: "kids".into(),
            })
            .unwrap();

        let client = session.form().client(&MacAddress::new("aa:bb:cc:dd:ee:01")).unwrap();
        assert_eq!(client.name, "laptop");
        assert_eq!(client.group, "kids");
        assert_eq!(session.usage().clients.len(), 2);

        let err = session
            .edit(FormEdit::PromoteDevice {
                mac: MacAddress::new("00:00:00:00:00:00"),
                group: String::new(),
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::DeviceNotFound { .. }));
    }

    #[test]
    fn mark_saved_returns_to_clean() {
        let mut session = loaded();
        session
            .edit(FormEdit::AddGroup { name: "x".into() })
            .unwrap();
        assert_eq!(session.save_payload().groups.len(), 2);
        session.mark_saved();
        assert_eq!(session.state(), EditState::Clean);
    }
}
