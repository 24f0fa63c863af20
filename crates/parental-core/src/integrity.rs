// ── Referential integrity ──
//
// In-place edits of a `FormModel` that keep the group/client relation
// consistent. Every operation validates before mutating, so a returned
// error leaves the model untouched.

use crate::builder::{positional_id, slugify, unique_id};
use crate::error::CoreError;
use crate::model::form::same_id;
use crate::model::{FormModel, MacAddress, ManagedClient, PolicyGroup};

/// Partial update of a group's non-identifier fields. `None` leaves a field
/// as is; an empty quota clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub dns_profile: Option<String>,
    pub quota_daily_min: Option<String>,
    pub schedule: Option<Vec<String>>,
}

impl FormModel {
    // ── Globals ──────────────────────────────────────────────────────

    pub fn set_global(&mut self, key: &str, value: impl Into<String>) -> Result<(), CoreError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "setting name must not be empty".into(),
            });
        }
        self.globals.insert(key.to_owned(), value.into());
        Ok(())
    }

    // ── Groups ───────────────────────────────────────────────────────

    /// Append a new group and return its generated identifier.
    pub fn add_group(&mut self, name: &str) -> String {
        let name = name.trim();
        let base = if name.is_empty() {
            positional_id(self.groups.len())
        } else {
            slugify(name)
        };
        let id = self.unique_group_id(&base, None);
        self.groups.push(PolicyGroup {
            name: if name.is_empty() { id.clone() } else { name.to_owned() },
            id: id.clone(),
            dns_profile: String::new(),
            quota_daily_min: None,
            schedule: Vec::new(),
        });
        id
    }

    /// Remove a group and unassign every client that referenced it.
    pub fn remove_group(&mut self, id: &str) -> Result<PolicyGroup, CoreError> {
        let index = self.require_group(id)?;
        let removed = self.groups.remove(index);
        for client in &mut self.clients {
            if same_id(&client.group, &removed.id) {
                client.group.clear();
            }
        }
        Ok(removed)
    }

    /// Change a group's identifier and repoint its clients. Returns the
    /// identifier actually assigned, which may differ from `new_id` after
    /// slugging and de-duplication.
    pub fn rename_group(&mut self, id: &str, new_id: &str) -> Result<String, CoreError> {
        let index = self.require_group(id)?;
        let old_id = self.groups[index].id.clone();

        let requested = new_id.trim();
        let base = if requested.is_empty() {
            positional_id(index)
        } else {
            slugify(requested)
        };
        let assigned = self.unique_group_id(&base, Some(index));

        for client in &mut self.clients {
            if !client.group.is_empty() && same_id(&client.group, &old_id) {
                client.group.clone_from(&assigned);
            }
        }
        self.groups[index].id.clone_from(&assigned);
        Ok(assigned)
    }

    pub fn update_group(&mut self, id: &str, patch: GroupPatch) -> Result<(), CoreError> {
        let index = self.require_group(id)?;
        if let Some(quota) = patch.quota_daily_min.as_deref().map(str::trim) {
            if !quota.is_empty() && quota.parse::<u32>().is_err() {
                return Err(CoreError::ValidationFailed {
                    message: format!("quota must be a whole number of minutes, got {quota:?}"),
                });
            }
        }

        let group = &mut self.groups[index];
        if let Some(name) = patch.name {
            let name = name.trim();
            group.name = if name.is_empty() {
                group.id.clone()
            } else {
                name.to_owned()
            };
        }
        if let Some(dns_profile) = patch.dns_profile {
            dns_profile.trim().clone_into(&mut group.dns_profile);
        }
        if let Some(quota) = patch.quota_daily_min {
            let quota = quota.trim();
            group.quota_daily_min = (!quota.is_empty()).then(|| quota.to_owned());
        }
        if let Some(schedule) = patch.schedule {
            group.schedule = schedule
                .iter()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect();
        }
        Ok(())
    }

    // ── Clients ──────────────────────────────────────────────────────

    /// Stores name and group trimmed, as a reload would.
    pub fn add_client(&mut self, mut client: ManagedClient) -> Result<(), CoreError> {
        client.name = client.name.trim().to_owned();
        client.group = client.group.trim().to_owned();
        if client.mac.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "client hardware address must not be empty".into(),
            });
        }
        if self.client(&client.mac).is_some() {
            return Err(CoreError::Conflict {
                message: format!("client {} is already managed", client.mac),
            });
        }
        self.clients.push(client);
        Ok(())
    }

    pub fn remove_client(&mut self, mac: &MacAddress) -> Result<ManagedClient, CoreError> {
        let index = self.require_client(mac)?;
        Ok(self.clients.remove(index))
    }

    /// Point a client at `group`. Any value is stored, including one that
    /// matches no group yet.
    pub fn assign_client(&mut self, mac: &MacAddress, group: &str) -> Result<(), CoreError> {
        let index = self.require_client(mac)?;
        group.trim().clone_into(&mut self.clients[index].group);
        Ok(())
    }

    pub fn update_client(&mut self, mac: &MacAddress, name: Option<String>) -> Result<(), CoreError> {
        let index = self.require_client(mac)?;
        if let Some(name) = name {
            name.trim().clone_into(&mut self.clients[index].name);
        }
        Ok(())
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn unique_group_id(&self, base: &str, skip: Option<usize>) -> String {
        unique_id(base, |candidate| {
            self.groups
                .iter()
                .enumerate()
                .any(|(i, g)| Some(i) != skip && same_id(&g.id, candidate))
        })
    }

    fn require_group(&self, id: &str) -> Result<usize, CoreError> {
        self.group_index(id).ok_or_else(|| CoreError::GroupNotFound { id: id.to_owned() })
    }

    fn require_client(&self, mac: &MacAddress) -> Result<usize, CoreError> {
        self.client_index(mac).ok_or_else(|| CoreError::ClientNotFound {
            mac: mac.to_string(),
        })
    }
}
