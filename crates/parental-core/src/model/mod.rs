// ── Domain model ──
//
// Canonical, wire-independent types. Raw ubus shapes are converted into
// these in `convert`; nothing here knows about JSON-RPC.

pub mod activity;
pub mod device;
pub mod form;
pub mod health;
pub mod mac;

// ── Re-exports ──────────────────────────────────────────────────────

pub use activity::ActivityEntry;
pub use device::{DiscoveredDevice, DiscoveryObservation};
pub use form::{FormModel, GlobalKey, ManagedClient, PolicyGroup, default_globals};
pub use health::{HealthCheck, HealthStatus, HealthView};
pub use mac::MacAddress;
