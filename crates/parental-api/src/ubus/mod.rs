// ubus JSON-RPC client modules
//
// `client` carries the transport mechanics (envelope encoding, status
// decoding); `parental` adds one inherent method per method of the
// `parental` ubus object; `models` holds the raw wire shapes.

pub mod client;
pub mod models;
pub mod parental;

pub use client::{ANONYMOUS_SESSION, PARENTAL_OBJECT, UbusClient};
