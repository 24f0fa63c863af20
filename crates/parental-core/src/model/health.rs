use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// Subsystems the router reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum HealthCheck {
    Nft,
    Fw4Chain,
    Cron,
    Adguard,
}

/// Status string per subsystem; absent fields read as `"unknown"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub nft: String,
    pub fw4_chain: String,
    pub cron: String,
    pub adguard: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            nft: UNKNOWN.into(),
            fw4_chain: UNKNOWN.into(),
            cron: UNKNOWN.into(),
            adguard: UNKNOWN.into(),
        }
    }
}

pub(crate) const UNKNOWN: &str = "unknown";

impl HealthStatus {
    pub fn status(&self, check: HealthCheck) -> &str {
        match check {
            HealthCheck::Nft => &self.nft,
            HealthCheck::Fw4Chain => &self.fw4_chain,
            HealthCheck::Cron => &self.cron,
            HealthCheck::Adguard => &self.adguard,
        }
    }

    /// `ok` and `present` are healthy, case-insensitively.
    pub fn is_healthy(&self, check: HealthCheck) -> bool {
        let status = self.status(check);
        status.eq_ignore_ascii_case("ok") || status.eq_ignore_ascii_case("present")
    }

    pub fn all_healthy(&self) -> bool {
        HealthCheck::iter().all(|check| self.is_healthy(check))
    }
}

/// Health as published by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "status", rename_all = "snake_case")]
pub enum HealthView {
    /// No health fetch has succeeded yet.
    #[default]
    Unavailable,
    Available(HealthStatus),
}
