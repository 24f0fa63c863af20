//! Async client for the `parental` ubus object exposed by an OpenWrt router.
//!
//! Every call is a single JSON-RPC 2.0 `call` request posted to the
//! router's `/ubus` endpoint. This crate owns the transport mechanics
//! (envelope encoding, ubus status decoding, TLS/timeout tuning) and the
//! raw wire models. It knows nothing about form models, dirty state, or
//! polling; `parental-core` builds those on top.

pub mod error;
pub mod transport;
pub mod ubus;

pub use error::{Error, UbusStatus};
pub use transport::{TlsMode, TransportConfig};
pub use ubus::UbusClient;
pub use ubus::models::{
    ActionAck, ActivityLog, Overview, RawActivityEntry, RawClient, RawGroup, RawHealth,
    RawObservation, SaveClient, SaveGroup, SavePayload,
};
