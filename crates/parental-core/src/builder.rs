// ── Form model builder ──
//
// Projects an overview snapshot into a fresh `FormModel` and back into a
// save payload. Build never looks at the previous model.

use parental_api::{Overview, RawGroup, SaveClient, SaveGroup, SavePayload};
use tracing::debug;

use crate::convert::globals_from_wire;
use crate::model::form::same_id;
use crate::model::{FormModel, MacAddress, ManagedClient, PolicyGroup, default_globals};

const SLUG_FALLBACK: &str = "group";

/// Lower-case, collapse every run of characters outside `[a-z0-9_-]` into
/// one hyphen, trim hyphens. An empty result becomes `group`.
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_hyphen = false;
    for ch in raw.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-' {
            if pending_hyphen {
                slug.push('-');
                pending_hyphen = false;
            }
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        SLUG_FALLBACK.to_owned()
    } else {
        slug.to_owned()
    }
}

/// `base`, or `base-2`, `base-3`, ... whichever `taken` rejects first.
pub fn unique_id(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_owned();
    }
    (2_u32..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_owned())
}

/// Positional default for a group with nothing usable to slugify.
pub(crate) fn positional_id(index: usize) -> String {
    format!("group{}", index + 1)
}

/// Build a fresh form model from a snapshot.
pub fn build(overview: &Overview) -> FormModel {
    let mut globals = default_globals();
    globals.extend(globals_from_wire(&overview.globals));

    let mut groups: Vec<PolicyGroup> = Vec::with_capacity(overview.groups.len());
    for (index, raw) in overview.groups.iter().enumerate() {
        let base = preferred_source(raw).map_or_else(|| positional_id(index), slugify);
        let id = unique_id(&base, |candidate| {
            groups.iter().any(|g| same_id(&g.id, candidate))
        });
        groups.push(PolicyGroup {
            name: raw.name.clone().unwrap_or_else(|| id.clone()),
            dns_profile: raw.dns_profile.clone().unwrap_or_default(),
            quota_daily_min: raw
                .quota_daily_min
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_owned),
            schedule: raw
                .schedule
                .iter()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect(),
            id,
        });
    }

    let mut clients: Vec<ManagedClient> = Vec::with_capacity(overview.clients.len());
    for raw in &overview.clients {
        let mac = MacAddress::new(raw.mac.as_deref().unwrap_or_default());
        if mac.is_empty() || clients.iter().any(|c| c.mac == mac) {
            debug!(mac = %mac, "skipping client entry without a unique hardware address");
            continue;
        }
        clients.push(ManagedClient {
            mac,
            name: raw.name.clone().unwrap_or_default(),
            group: raw.group.clone().unwrap_or_default(),
            pause_until: raw.pause_until.clone(),
        });
    }

    FormModel {
        globals,
        groups,
        clients,
    }
}

/// Explicit section id unless it is a positional `@type[n]` reference,
/// else the display name.
fn preferred_source(raw: &RawGroup) -> Option<&str> {
    raw.section
        .as_deref()
        .filter(|s| !s.starts_with('@'))
        .or(raw.name.as_deref())
        .filter(|s| !s.trim().is_empty())
}

/// The complete payload for `save_config`.
pub fn to_save_payload(form: &FormModel) -> SavePayload {
    SavePayload {
        globals: form.globals.clone(),
        groups: form
            .groups
            .iter()
            .map(|g| SaveGroup {
                section: g.id.clone(),
                name: g.name.clone(),
                dns_profile: g.dns_profile.clone(),
                quota_daily_min: g.quota_daily_min.clone().unwrap_or_default(),
                schedule: g.schedule.clone(),
            })
            .collect(),
        clients: form
            .clients
            .iter()
            .map(|c| SaveClient {
                mac: c.mac.to_string(),
                name: c.name.clone(),
                group: c.group.clone(),
                pause_until: c.pause_until.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn overview(value: serde_json::Value) -> Overview {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn slugify_examples() {
        assert_eq!(slugify("My Family!! "), "my-family");
        assert_eq!(slugify(""), "group");
        assert_eq!(slugify("!!!"), "group");
        assert_eq!(slugify("Kids_2  Weekend"), "kids_2-weekend");
        assert_eq!(slugify("a - b"), "a---b");
        assert_eq!(slugify("-Teens-"), "teens");
        assert_eq!(slugify("Ünïcode"), "n-code");
    }

    #[test]
    fn unique_id_appends_increasing_suffix() {
        let taken = ["kids", "kids-2"];
        assert_eq!(unique_id("kids", |c| taken.contains(&c)), "kids-3");
        assert_eq!(unique_id("teens", |c| taken.contains(&c)), "teens");
    }

    #[test]
    fn group_ids_prefer_section_then_name_then_position() {
        let form = build(&overview(json!({
            "groups_list": [
                { "section": "Kids", "name": "Little ones" },
                { "section": "@group[1]", "name": "Teen Agers" },
                { "section": "@group[2]" },
                { "name": "kids" },
                { "name": "   " }
            ]
        })));

        let ids: Vec<_> = form.groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["kids", "teen-agers", "group3", "kids-2", "group5"]);
        assert_eq!(form.groups[2].name, "group3");
    }

    #[test]
    fn quota_and_schedule_are_normalized() {
        let form = build(&overview(json!({
            "groups_list": [{
                "section": "kids",
                "quota_daily_min": " ",
                "schedule": "  mon 08:00-20:00 \n\n tue 08:00-20:00"
            }, {
                "section": "teens",
                "quota_daily_min": 180
            }]
        })));

        assert_eq!(form.groups[0].quota_daily_min, None);
        assert_eq!(
            form.groups[0].schedule,
            vec!["mon 08:00-20:00".to_owned(), "tue 08:00-20:00".to_owned()]
        );
        assert_eq!(form.groups[1].quota_daily_min.as_deref(), Some("180"));
    }

    #[test]
    fn globals_start_from_defaults() {
        let form = build(&overview(json!({
            "globals": { "default_policy": "block", "enabled": false, "custom": 7 }
        })));
        assert_eq!(form.globals["default_policy"], "block");
        assert_eq!(form.globals["enabled"], "0");
        assert_eq!(form.globals["log_level"], "info");
        assert_eq!(form.globals["custom"], "7");
    }

    #[test]
    fn clients_are_upper_cased_and_keep_unknown_groups() {
        let form = build(&overview(json!({
            "clients_list": [
                { "mac": "aa:bb:cc:dd:ee:01", "name": "Tablet", "group": "nowhere",
                  "pause_until": 1_700_000_000 },
                { "mac": "AA:BB:CC:DD:EE:01", "name": "Duplicate" },
                { "name": "No MAC" }
            ]
        })));

        assert_eq!(form.clients.len(), 1);
        assert_eq!(form.clients[0].mac.as_str(), "AA:BB:CC:DD:EE:01");
        assert_eq!(form.clients[0].group, "nowhere");
        assert_eq!(form.clients[0].pause_until, Some(json!(1_700_000_000)));
    }

    #[test]
    fn saved_configuration_round_trips() {
        let original = build(&overview(json!({
            "globals": { "enabled": "1", "adguard_url": "http://10.0.0.1:3000" },
            "groups_list": [
                { "section": "@group[0]", "name": "My Family!!", "dns_profile": "family",
                  "quota_daily_min": "90", "schedule": ["mon 07:00-21:00", ""] },
                { "section": "kids", "name": "Kids" }
            ],
            "clients_list": [
                { "mac": "11:22:33:44:55:66", "name": "Tablet", "group": "kids",
                  "pause_until": "2024-05-01T18:00:00Z" },
                { "mac": "11:22:33:44:55:77", "name": "", "group": "" }
            ]
        })));

        let payload = serde_json::to_value(to_save_payload(&original)).unwrap();
        let rebuilt = build(&overview(payload));
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn edited_configuration_round_trips() {
        use crate::integrity::GroupPatch;
        use crate::model::{MacAddress, ManagedClient};

        let mut form = build(&overview(json!({
            "groups_list": [{ "section": "kids", "name": "Kids" }],
            "clients_list": [{ "mac": "11:22:33:44:55:66", "name": "Tablet", "group": "kids" }]
        })));

        form.update_group(
            "kids",
            GroupPatch {
                name: Some(String::new()),
                dns_profile: Some(" family ".into()),
                quota_daily_min: Some(" 45 ".into()),
                schedule: Some(vec![" sat 09:00-22:00 ".into(), " ".into()]),
            },
        )
        .unwrap();
        form.update_client(&MacAddress::new("11:22:33:44:55:66"), Some(" Tab ".into()))
            .unwrap();
        form.add_group("  Teens  ");
        form.add_client(ManagedClient {
            mac: MacAddress::new("11:22:33:44:55:77"),
            name: "  Console ".into(),
            group: " teens ".into(),
            pause_until: None,
        })
        .unwrap();

        assert_eq!(form.groups[0].name, "kids");
        assert_eq!(form.groups[0].dns_profile, "family");
        assert_eq!(form.clients[0].name, "Tab");

        let payload = serde_json::to_value(to_save_payload(&form)).unwrap();
        let rebuilt = build(&overview(payload));
        assert_eq!(rebuilt, form);
    }
}
