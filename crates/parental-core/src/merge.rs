// ── Device merging ──
//
// Folds discovery observations into one `DiscoveredDevice` per MAC. Pure;
// no I/O and no state beyond one pass.
//
// Reducers per field:
//   hostname, interface, group hint   first non-empty wins
//   IPv4, IPv6, source tags           accumulate distinct, first-seen order
//   signal, last seen                 maximum

use std::collections::BTreeMap;

use tracing::trace;

use crate::model::{DiscoveredDevice, DiscoveryObservation, MacAddress};

/// Incremental merger. Output is ordered by MAC.
#[derive(Debug, Default)]
pub struct DeviceMerger {
    devices: BTreeMap<MacAddress, DiscoveredDevice>,
}

impl DeviceMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, obs: DiscoveryObservation) {
        if obs.mac.is_empty() {
            trace!("dropping observation without a hardware address");
            return;
        }
        self.devices
            .entry(obs.mac.clone())
            .or_insert_with(|| DiscoveredDevice::new(obs.mac.clone()))
            .absorb(obs);
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn finish(self) -> Vec<DiscoveredDevice> {
        self.devices.into_values().collect()
    }
}

/// Merge a batch of observations.
pub fn merge<I>(observations: I) -> Vec<DiscoveredDevice>
where
    I: IntoIterator<Item = DiscoveryObservation>,
{
    let mut merger = DeviceMerger::new();
    for obs in observations {
        merger.observe(obs);
    }
    merger.finish()
}

impl DiscoveredDevice {
    fn absorb(&mut self, obs: DiscoveryObservation) {
        first_non_empty(&mut self.hostname, obs.hostname);
        first_non_empty(&mut self.interface, obs.interface);
        first_non_empty(&mut self.group_hint, obs.group_hint);

        push_unique(&mut self.ipv4, obs.ipv4);
        push_unique(&mut self.ipv6, obs.ipv6);
        push_unique(&mut self.sources, obs.source.filter(|s| !s.is_empty()));

        self.signal = self.signal.max(obs.signal);
        self.last_seen = self.last_seen.max(obs.last_seen);
    }
}

fn first_non_empty(slot: &mut Option<String>, candidate: Option<String>) {
    if slot.as_deref().is_none_or(str::is_empty) {
        if let Some(value) = candidate.filter(|v| !v.is_empty()) {
            *slot = Some(value);
        }
    }
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, items: impl IntoIterator<Item = T>) {
    for item in items {
        if !list.contains(&item) {
            list.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use pretty_assertions::assert_eq;

    use super::*;

    fn obs(mac: &str) -> DiscoveryObservation {
        DiscoveryObservation {
            mac: MacAddress::new(mac),
            ..DiscoveryObservation::default()
        }
    }

    fn sample() -> Vec<DiscoveryObservation> {
        vec![
            DiscoveryObservation {
                hostname: Some("tablet".into()),
                ipv4: vec![Ipv4Addr::new(192, 168, 1, 20)],
                source: Some("dhcp".into()),
                last_seen: Some(1_700_000_000),
                ..obs("aa:bb:cc:dd:ee:01")
            },
            DiscoveryObservation {
                ipv4: vec![Ipv4Addr::new(192, 168, 1, 20), Ipv4Addr::new(192, 168, 1, 21)],
                ipv6: vec![Ipv6Addr::LOCALHOST],
                source: Some("arp".into()),
                interface: Some("br-lan".into()),
                signal: Some(-70),
                ..obs("AA:BB:CC:DD:EE:01")
            },
            DiscoveryObservation {
                source: Some("wifi".into()),
                signal: Some(-52),
                group_hint: Some("kids".into()),
                last_seen: Some(12),
                ..obs("aa-bb-cc-dd-ee-01")
            },
            DiscoveryObservation {
                hostname: Some("laptop".into()),
                source: Some("dhcp".into()),
                ..obs("aa:bb:cc:dd:ee:02")
            },
            DiscoveryObservation {
                hostname: Some("ghost".into()),
                ..obs("")
            },
        ]
    }

    /// Devices with their list fields sorted, for order-insensitive comparison.
    fn as_set(mut devices: Vec<DiscoveredDevice>) -> Vec<DiscoveredDevice> {
        for d in &mut devices {
            d.ipv4.sort_unstable();
            d.ipv6.sort_unstable();
            d.sources.sort_unstable();
        }
        devices.sort_by(|a, b| a.mac.cmp(&b.mac));
        devices
    }

    #[test]
    fn case_variants_collapse_to_one_upper_case_key() {
        let merged = merge(vec![obs("aa:bb:cc:dd:ee:ff"), obs("AA:BB:CC:DD:EE:FF")]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].mac.as_str(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn observations_without_identity_are_dropped() {
        let merged = merge(vec![obs(""), obs("   ")]);
        assert!(merged.is_empty());
    }

    #[test]
    fn reducers_apply_per_field() {
        let merged = merge(sample());
        assert_eq!(merged.len(), 2);

        let tablet = &merged[0];
        assert_eq!(tablet.hostname.as_deref(), Some("tablet"));
        assert_eq!(
            tablet.ipv4,
            vec![Ipv4Addr::new(192, 168, 1, 20), Ipv4Addr::new(192, 168, 1, 21)]
        );
        assert_eq!(tablet.primary_ip(), Some(Ipv4Addr::new(192, 168, 1, 20)));
        assert_eq!(tablet.ipv6, vec![Ipv6Addr::LOCALHOST]);
        assert_eq!(tablet.sources, vec!["dhcp", "arp", "wifi"]);
        assert_eq!(tablet.interface.as_deref(), Some("br-lan"));
        assert_eq!(tablet.group_hint.as_deref(), Some("kids"));
        assert_eq!(tablet.signal, Some(-52));
        // Epoch seconds and a small counter are compared as plain numbers.
        assert_eq!(tablet.last_seen, Some(1_700_000_000));

        assert_eq!(merged[1].display_name(), "laptop");
    }

    #[test]
    fn empty_hostname_does_not_win() {
        let merged = merge(vec![
            DiscoveryObservation {
                hostname: Some(String::new()),
                ..obs("aa:bb:cc:dd:ee:03")
            },
            DiscoveryObservation {
                hostname: Some("printer".into()),
                ..obs("aa:bb:cc:dd:ee:03")
            },
        ]);
        assert_eq!(merged[0].hostname.as_deref(), Some("printer"));
    }

    #[test]
    fn merge_is_idempotent() {
        let once = merge(sample());
        let twice = merge(once.iter().flat_map(DiscoveredDevice::to_observations));
        assert_eq!(twice, once);
    }

    #[test]
    fn repeated_identical_observations_change_nothing() {
        let once = merge(sample());
        let doubled = merge(sample().into_iter().chain(sample()));
        assert_eq!(doubled, once);
    }

    #[test]
    fn merge_is_order_independent() {
        let forward = as_set(merge(sample()));

        let mut reversed = sample();
        reversed.reverse();
        assert_eq!(as_set(merge(reversed)), forward);

        let mut rotated = sample();
        rotated.rotate_left(2);
        assert_eq!(as_set(merge(rotated)), forward);
    }
}
