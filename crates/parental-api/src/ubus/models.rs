// Wire models for the `parental` ubus object
//
// The backend is a shell/ucode script and is loose about shapes: the same
// discovery attribute arrives under different keys depending on which
// discovery source produced the record, numbers arrive as strings, and
// address fields are either a string or a list. Records with that kind of
// variance deserialize from a raw JSON object and pick their fields from an
// explicit list of accepted key names, so optional/mixed naming never
// leaks past this module.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ── Accepted key names ───────────────────────────────────────────────

const MAC_KEYS: &[&str] = &["mac", "hwaddr", "macaddr"];
const HOSTNAME_KEYS: &[&str] = &["hostname", "name"];
const IPV4_KEYS: &[&str] = &["ip", "ipv4", "address", "ipaddr"];
const IPV6_KEYS: &[&str] = &["ipv6", "ip6"];
const SOURCE_KEYS: &[&str] = &["source", "src", "via"];
const INTERFACE_KEYS: &[&str] = &["iface", "interface", "dev", "device"];
const GROUP_HINT_KEYS: &[&str] = &["group", "group_hint"];
const SIGNAL_KEYS: &[&str] = &["signal", "rssi"];
const LAST_SEEN_KEYS: &[&str] = &["last_seen", "seen", "ts"];

const SECTION_KEYS: &[&str] = &["section", "id", ".name"];
const DNS_PROFILE_KEYS: &[&str] = &["dns_profile", "dns"];
const QUOTA_KEYS: &[&str] = &["quota_daily_min", "quota"];

const DESCRIPTOR_KEYS: &[&str] = &["client", "descriptor", "mac", "src"];

// ── Overview ─────────────────────────────────────────────────────────

/// Authoritative snapshot returned by `get_overview`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    #[serde(default, deserialize_with = "null_as_default")]
    pub globals: Map<String, Value>,
    #[serde(
        default,
        rename = "groups_list",
        alias = "groups",
        deserialize_with = "null_as_default"
    )]
    pub groups: Vec<RawGroup>,
    #[serde(
        default,
        rename = "clients_list",
        alias = "clients",
        deserialize_with = "null_as_default"
    )]
    pub clients: Vec<RawClient>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub discovered: Vec<RawObservation>,
}

/// One raw sighting of a LAN device from a passive discovery source
/// (DHCP leases, ARP/neighbour table, wireless association list, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct RawObservation {
    pub mac: Option<String>,
    pub hostname: Option<String>,
    pub ipv4: Vec<String>,
    pub ipv6: Vec<String>,
    pub source: Option<String>,
    pub interface: Option<String>,
    pub group_hint: Option<String>,
    pub signal: Option<i64>,
    pub last_seen: Option<i64>,
}

impl From<Map<String, Value>> for RawObservation {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            mac: first_str(&map, MAC_KEYS),
            hostname: first_str(&map, HOSTNAME_KEYS),
            ipv4: str_list(&map, IPV4_KEYS),
            ipv6: str_list(&map, IPV6_KEYS),
            source: first_str(&map, SOURCE_KEYS),
            interface: first_str(&map, INTERFACE_KEYS),
            group_hint: first_str(&map, GROUP_HINT_KEYS),
            signal: first_i64(&map, SIGNAL_KEYS),
            last_seen: first_i64(&map, LAST_SEEN_KEYS),
        }
    }
}

/// A policy group as stored in the router's UCI config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct RawGroup {
    /// Explicit section identifier. May be a positional reference such as
    /// `@group[1]` for anonymous UCI sections.
    pub section: Option<String>,
    pub name: Option<String>,
    pub dns_profile: Option<String>,
    pub quota_daily_min: Option<String>,
    pub schedule: Vec<String>,
}

impl From<Map<String, Value>> for RawGroup {
    fn from(map: Map<String, Value>) -> Self {
        let schedule = match map.get("schedule") {
            Some(Value::String(s)) => s.lines().map(str::to_owned).collect(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .flat_map(str::lines)
                .map(str::to_owned)
                .collect(),
            _ => Vec::new(),
        };

        Self {
            section: first_str(&map, SECTION_KEYS),
            name: first_str(&map, &["name"]),
            dns_profile: first_str(&map, DNS_PROFILE_KEYS),
            quota_daily_min: first_str(&map, QUOTA_KEYS),
            schedule,
        }
    }
}

/// A managed client entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct RawClient {
    pub mac: Option<String>,
    pub name: Option<String>,
    pub group: Option<String>,
    /// Opaque pause marker; carried verbatim.
    pub pause_until: Option<Value>,
}

impl From<Map<String, Value>> for RawClient {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            mac: first_str(&map, MAC_KEYS),
            name: first_str(&map, &["name"]),
            group: first_str(&map, &["group"]),
            pause_until: map.get("pause_until").filter(|v| !v.is_null()).cloned(),
        }
    }
}

// ── Health ───────────────────────────────────────────────────────────

/// Result of the `health` call: one status string per subsystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHealth {
    #[serde(default)]
    pub nft: Option<String>,
    #[serde(default)]
    pub fw4_chain: Option<String>,
    #[serde(default)]
    pub cron: Option<String>,
    #[serde(default)]
    pub adguard: Option<String>,
}

// ── Activity log ─────────────────────────────────────────────────────

/// Result of the `activity_log` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    #[serde(default, deserialize_with = "null_as_default")]
    pub entries: Vec<RawActivityEntry>,
}

/// One log line. The backend emits either a bare string or an object; in
/// both cases a free-text client descriptor is extracted and everything
/// else is kept as metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct RawActivityEntry {
    pub descriptor: String,
    pub metadata: IndexMap<String, Value>,
}

impl From<Value> for RawActivityEntry {
    fn from(value: Value) -> Self {
        match value {
            Value::String(descriptor) => Self {
                descriptor,
                metadata: IndexMap::new(),
            },
            Value::Object(map) => {
                let descriptor = first_str(&map, DESCRIPTOR_KEYS).unwrap_or_default();
                let metadata = map
                    .into_iter()
                    .filter(|(k, _)| !DESCRIPTOR_KEYS.contains(&k.as_str()))
                    .collect();
                Self {
                    descriptor,
                    metadata,
                }
            }
            Value::Null => Self::default(),
            other => Self {
                descriptor: other.to_string(),
                metadata: IndexMap::new(),
            },
        }
    }
}

// ── Save payload ─────────────────────────────────────────────────────

/// Body of the `save_config` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavePayload {
    pub globals: IndexMap<String, String>,
    pub groups: Vec<SaveGroup>,
    pub clients: Vec<SaveClient>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveGroup {
    pub section: String,
    pub name: String,
    pub dns_profile: String,
    /// Daily quota in minutes; empty means no quota.
    pub quota_daily_min: String,
    pub schedule: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveClient {
    pub mac: String,
    pub name: String,
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_until: Option<Value>,
}

// ── Action results ───────────────────────────────────────────────────

/// Result object of an action call (`pause_client`, `save_config`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAck {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}

impl ActionAck {
    /// Whether an action went through. A bare ubus success with no marker
    /// counts; an explicit negative marker does not.
    pub fn is_success(&self) -> bool {
        if self.success == Some(false) {
            return false;
        }
        self.status
            .as_deref()
            .is_none_or(|s| s.eq_ignore_ascii_case("ok"))
    }

    /// Whether the reply carries an explicit success marker. Saves are only
    /// considered persisted when this holds.
    pub fn confirmed(&self) -> bool {
        self.success == Some(true)
            || self
                .status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("ok"))
    }

    /// Human-readable reason for a rejected action.
    pub fn failure_message(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.status.clone())
            .unwrap_or_else(|| "no success marker in reply".into())
    }
}

// ── Field helpers ────────────────────────────────────────────────────

/// Treat an explicit JSON `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// First non-empty string (or number rendered as a string) among `keys`.
fn first_str(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// First integer among `keys`, accepting numbers and numeric strings.
fn first_i64(map: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| match map.get(*key) {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().and_then(round_to_i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(round_to_i64))
        }
        _ => None,
    })
}

/// Every non-empty string under any of `keys`; each value may be a single
/// string or a list of strings.
fn str_list(map: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    for key in keys {
        match map.get(*key) {
            Some(Value::String(s)) => out.push(s.trim().to_owned()),
            Some(Value::Array(items)) => out.extend(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|s| s.trim().to_owned()),
            ),
            _ => {}
        }
    }
    out.retain(|s| !s.is_empty());
    out
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn round_to_i64(f: f64) -> Option<i64> {
    f.is_finite().then(|| f.round() as i64)
}
