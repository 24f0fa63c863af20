// ── Editable form model ──
//
// The locally editable projection of the router's policy config. Built
// from a snapshot by `builder`, mutated in place by `integrity`, and turned
// back into a save payload by `builder::to_save_payload`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use super::mac::MacAddress;

// ── Global settings ─────────────────────────────────────────────────

/// Global settings the router understands. Unknown keys are still carried
/// in [`FormModel::globals`]; these are the ones that always exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum GlobalKey {
    Enabled,
    DefaultPolicy,
    AdguardUrl,
    AdguardToken,
    LogLevel,
    TelegramToken,
    TelegramChatId,
}

impl GlobalKey {
    pub fn default_value(self) -> &'static str {
        match self {
            Self::Enabled => "1",
            Self::DefaultPolicy => "allow",
            Self::LogLevel => "info",
            Self::AdguardUrl | Self::AdguardToken | Self::TelegramToken | Self::TelegramChatId => {
                ""
            }
        }
    }

    /// Credentials that should be masked when displayed.
    pub fn is_secret(self) -> bool {
        matches!(self, Self::AdguardToken | Self::TelegramToken)
    }
}

/// The default settings map, in declaration order.
pub fn default_globals() -> IndexMap<String, String> {
    GlobalKey::iter()
        .map(|key| (key.as_ref().to_owned(), key.default_value().to_owned()))
        .collect()
}

// ── Entities ────────────────────────────────────────────────────────

/// A policy group. `id` is a machine-safe slug, unique within the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyGroup {
    pub id: String,
    pub name: String,
    pub dns_profile: String,
    /// Daily quota in minutes, kept as the router's string form.
    pub quota_daily_min: Option<String>,
    /// Schedule rules, opaque to the core.
    pub schedule: Vec<String>,
}

/// A client under policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedClient {
    pub mac: MacAddress,
    pub name: String,
    /// Group reference. Empty means unassigned; a value matching no group
    /// is kept but treated as unassigned.
    pub group: String,
    /// Opaque pause marker, passed through untouched.
    pub pause_until: Option<serde_json::Value>,
}

// ── FormModel ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormModel {
    pub globals: IndexMap<String, String>,
    pub groups: Vec<PolicyGroup>,
    pub clients: Vec<ManagedClient>,
}

impl Default for FormModel {
    fn default() -> Self {
        Self {
            globals: default_globals(),
            groups: Vec::new(),
            clients: Vec::new(),
        }
    }
}

impl FormModel {
    pub fn global(&self, key: GlobalKey) -> &str {
        self.globals
            .get(key.as_ref())
            .map_or(key.default_value(), String::as_str)
    }

    pub fn group(&self, id: &str) -> Option<&PolicyGroup> {
        self.groups.iter().find(|g| same_id(&g.id, id))
    }

    pub fn client(&self, mac: &MacAddress) -> Option<&ManagedClient> {
        self.clients.iter().find(|c| &c.mac == mac)
    }

    /// The group a client's reference resolves to, if any.
    pub fn effective_group(&self, client: &ManagedClient) -> Option<&PolicyGroup> {
        if client.group.is_empty() {
            return None;
        }
        self.group(&client.group)
    }

    /// Clients whose reference resolves to group `id`.
    pub fn clients_in_group<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a ManagedClient> {
        self.clients
            .iter()
            .filter(move |c| !c.group.is_empty() && same_id(&c.group, id))
    }

    pub(crate) fn group_index(&self, id: &str) -> Option<usize> {
        self.groups.iter().position(|g| same_id(&g.id, id))
    }

    pub(crate) fn client_index(&self, mac: &MacAddress) -> Option<usize> {
        self.clients.iter().position(|c| &c.mac == mac)
    }
}

/// Group identifiers compare case-insensitively everywhere.
pub(crate) fn same_id(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
