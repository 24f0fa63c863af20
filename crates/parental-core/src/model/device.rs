// ── Discovered devices ──
//
// `DiscoveryObservation` is the strict shape a raw sighting is normalized
// into before merging; `DiscoveredDevice` is the merged, canonical record.

use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

use super::mac::MacAddress;

/// One sighting of a LAN device by a single discovery mechanism.
///
/// The MAC may be empty; such observations are dropped by the merger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryObservation {
    pub mac: MacAddress,
    pub hostname: Option<String>,
    pub ipv4: Vec<Ipv4Addr>,
    pub ipv6: Vec<Ipv6Addr>,
    pub source: Option<String>,
    pub interface: Option<String>,
    pub group_hint: Option<String>,
    pub signal: Option<i64>,
    /// Unix seconds or a monotonic counter; compared numerically either way.
    pub last_seen: Option<i64>,
}

/// Canonical record of all observations that share a MAC address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    pub mac: MacAddress,
    pub hostname: Option<String>,
    /// Distinct addresses in first-seen order; the first is the primary IP.
    pub ipv4: Vec<Ipv4Addr>,
    pub ipv6: Vec<Ipv6Addr>,
    /// Distinct source tags in first-seen order.
    pub sources: Vec<String>,
    pub interface: Option<String>,
    pub group_hint: Option<String>,
    pub signal: Option<i64>,
    pub last_seen: Option<i64>,
}

impl DiscoveredDevice {
    pub fn new(mac: MacAddress) -> Self {
        Self {
            mac,
            hostname: None,
            ipv4: Vec::new(),
            ipv6: Vec::new(),
            sources: Vec::new(),
            interface: None,
            group_hint: None,
            signal: None,
            last_seen: None,
        }
    }

    pub fn primary_ip(&self) -> Option<Ipv4Addr> {
        self.ipv4.first().copied()
    }

    /// Hostname if known, else the MAC.
    pub fn display_name(&self) -> &str {
        self.hostname.as_deref().unwrap_or(self.mac.as_str())
    }

    /// Re-express this record as observations that merge back into an
    /// identical record: one carrying every scalar and address, plus one per
    /// additional source tag.
    pub fn to_observations(&self) -> Vec<DiscoveryObservation> {
        let mut sources = self.sources.iter();
        let mut out = vec![DiscoveryObservation {
            mac: self.mac.clone(),
            hostname: self.hostname.clone(),
            ipv4: self.ipv4.clone(),
            ipv6: self.ipv6.clone(),
            source: sources.next().cloned(),
            interface: self.interface.clone(),
            group_hint: self.group_hint.clone(),
            signal: self.signal,
            last_seen: self.last_seen,
        }];
        out.extend(sources.map(|source| DiscoveryObservation {
            mac: self.mac.clone(),
            source: Some(source.clone()),
            ..DiscoveryObservation::default()
        }));
        out
    }
}
