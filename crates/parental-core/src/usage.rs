// ── Usage attribution ──
//
// Best-effort mapping of activity log lines to managed clients. The log
// carries no stable device id, so an entry counts for every client whose
// MAC or display name appears in its descriptor (case-insensitive). One
// entry may therefore count for several clients.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{ActivityEntry, MacAddress, ManagedClient};

/// Raw per-client counts. Every client is present, zero or not.
pub fn attribute(entries: &[ActivityEntry], clients: &[ManagedClient]) -> IndexMap<MacAddress, u32> {
    let needles: Vec<(String, Option<String>)> = clients
        .iter()
        .map(|c| {
            let name = c.name.trim();
            (
                c.mac.as_str().to_lowercase(),
                (!name.is_empty()).then(|| name.to_lowercase()),
            )
        })
        .collect();

    let mut counts: IndexMap<MacAddress, u32> =
        clients.iter().map(|c| (c.mac.clone(), 0)).collect();

    for entry in entries {
        if entry.descriptor.is_empty() {
            continue;
        }
        let haystack = entry.descriptor.to_lowercase();
        for (client, (mac, name)) in clients.iter().zip(&needles) {
            let matched = haystack.contains(mac.as_str())
                || name.as_deref().is_some_and(|n| haystack.contains(n));
            if matched {
                if let Some(count) = counts.get_mut(&client.mac) {
                    *count = count.saturating_add(1);
                }
            }
        }
    }

    counts
}

/// One client's line in the usage view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientUsage {
    pub mac: MacAddress,
    pub name: String,
    pub count: u32,
    /// `count / max(1, highest count)`, in `0.0..=1.0`.
    pub share: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub clients: Vec<ClientUsage>,
}

impl UsageReport {
    pub fn compute(entries: &[ActivityEntry], clients: &[ManagedClient]) -> Self {
        let counts = attribute(entries, clients);
        let max = counts.values().copied().max().unwrap_or(0).max(1);

        let clients = clients
            .iter()
            .filter_map(|c| {
                let count = *counts.get(&c.mac)?;
                Some(ClientUsage {
                    mac: c.mac.clone(),
                    name: c.name.clone(),
                    count,
                    share: f64::from(count) / f64::from(max),
                })
            })
            .collect();

        Self { clients }
    }

    pub fn count(&self, mac: &MacAddress) -> Option<u32> {
        self.clients.iter().find(|u| &u.mac == mac).map(|u| u.count)
    }
}
