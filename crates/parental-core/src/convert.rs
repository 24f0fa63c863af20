// ── API-to-domain type conversions ──
//
// Bridges raw `parental_api` models into `parental_core::model` types.
// Key-name variance is already resolved by the wire layer; here strings
// become strong types and missing data gets its documented default.

use std::net::IpAddr;

use indexmap::IndexMap;
use parental_api::{RawActivityEntry, RawHealth, RawObservation};
use serde_json::{Map, Value};
use tracing::debug;

use crate::model::health::UNKNOWN;
use crate::model::{ActivityEntry, DiscoveryObservation, HealthStatus, MacAddress};

// ── Helpers ────────────────────────────────────────────────────────

/// Parse an address, tolerating an IPv6 zone (`fe80::1%br-lan`) and a
/// prefix length (`192.168.1.2/24`). Unparseable values yield `None`.
fn parse_ip(raw: &str) -> Option<IpAddr> {
    let addr = raw.split(['%', '/']).next().unwrap_or(raw).trim();
    addr.parse().ok()
}

/// Stringify scalar settings the way UCI stores them.
pub(crate) fn globals_from_wire(raw: &Map<String, Value>) -> IndexMap<String, String> {
    raw.iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Bool(true) => "1".to_owned(),
                Value::Bool(false) => "0".to_owned(),
                Value::Number(n) => n.to_string(),
                Value::Null => return None,
                Value::Array(_) | Value::Object(_) => {
                    debug!(key, "ignoring non-scalar global setting");
                    return None;
                }
            };
            Some((key.clone(), value))
        })
        .collect()
}

// ── Discovery ──────────────────────────────────────────────────────

impl From<&RawObservation> for DiscoveryObservation {
    fn from(raw: &RawObservation) -> Self {
        let mut ipv4 = Vec::new();
        let mut ipv6 = Vec::new();
        // Routed by what actually parses, not by which field it arrived in.
        for addr in raw.ipv4.iter().chain(&raw.ipv6).filter_map(|s| parse_ip(s)) {
            match addr {
                IpAddr::V4(v4) => ipv4.push(v4),
                IpAddr::V6(v6) => ipv6.push(v6),
            }
        }

        Self {
            mac: MacAddress::new(raw.mac.as_deref().unwrap_or_default()),
            hostname: raw.hostname.clone(),
            ipv4,
            ipv6,
            source: raw.source.clone(),
            interface: raw.interface.clone(),
            group_hint: raw.group_hint.clone(),
            signal: raw.signal,
            last_seen: raw.last_seen,
        }
    }
}

// ── Health ─────────────────────────────────────────────────────────

impl From<RawHealth> for HealthStatus {
    fn from(raw: RawHealth) -> Self {
        let or_unknown = |s: Option<String>| s.unwrap_or_else(|| UNKNOWN.to_owned());
        Self {
            nft: or_unknown(raw.nft),
            fw4_chain: or_unknown(raw.fw4_chain),
            cron: or_unknown(raw.cron),
            adguard: or_unknown(raw.adguard),
        }
    }
}

// ── Activity ───────────────────────────────────────────────────────

impl From<RawActivityEntry> for ActivityEntry {
    fn from(raw: RawActivityEntry) -> Self {
        Self {
            descriptor: raw.descriptor,
            metadata: raw.metadata,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn addresses_are_routed_by_family() {
        let raw = RawObservation {
            mac: Some("aa:bb:cc:dd:ee:ff".into()),
            ipv4: vec!["10.0.0.5".into(), "fd00::5".into(), "not-an-ip".into()],
            ipv6: vec!["fe80::1%br-lan".into(), "10.0.0.6/24".into()],
            ..RawObservation::default()
        };
        let obs = DiscoveryObservation::from(&raw);

        assert_eq!(obs.mac.as_str(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(
            obs.ipv4,
            vec![Ipv4Addr::new(10, 0, 0, 5), Ipv4Addr::new(10, 0, 0, 6)]
        );
        assert_eq!(
            obs.ipv6,
            vec![
                "fd00::5".parse::<Ipv6Addr>().unwrap(),
                "fe80::1".parse::<Ipv6Addr>().unwrap()
            ]
        );
    }

    #[test]
    fn globals_stringify_scalars() {
        let raw = json!({
            "enabled": true,
            "paused": false,
            "quota": 30,
            "log_level": "debug",
            "unset": null,
            "nested": { "a": 1 }
        });
        let globals = globals_from_wire(raw.as_object().unwrap());

        let expected: IndexMap<String, String> = [
            ("enabled", "1"),
            ("paused", "0"),
            ("quota", "30"),
            ("log_level", "debug"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
        assert_eq!(globals, expected);
    }

    #[test]
    fn missing_health_fields_are_unknown() {
        let status = HealthStatus::from(RawHealth {
            nft: Some("ok".into()),
            ..RawHealth::default()
        });
        assert_eq!(status.nft, "ok");
        assert_eq!(status.cron, "unknown");
    }
}
