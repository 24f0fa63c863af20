// ubus JSON-RPC HTTP client
//
// Wraps `reqwest::Client` with the rpcd envelope: every request is a
// JSON-RPC `call` carrying `[session, object, method, args]`, every answer
// is `{"result": [status, data?]}` or `{"error": {...}}`. The per-method
// wrappers live in `parental.rs` so this module stays focused on the
// transport mechanics.

use std::sync::atomic::{AtomicU64, Ordering};

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, UbusStatus};
use crate::transport::TransportConfig;

/// rpcd's anonymous session. Calls under it succeed only for methods the
/// router's ACL grants to `unauthenticated`.
pub const ANONYMOUS_SESSION: &str = "00000000000000000000000000000000";

/// Name of the ubus object every method in this crate is invoked on.
pub const PARENTAL_OBJECT: &str = "parental";

const BODY_PREVIEW_LEN: usize = 200;

#[derive(Serialize)]
struct RpcRequest<'a, A: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: (&'a str, &'a str, &'a str, &'a A),
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    #[serde(default)]
    message: String,
}

/// Raw HTTP client for the router's `/ubus` JSON-RPC endpoint.
///
/// Handles request id allocation, the `[status, data]` result envelope and
/// ubus status decoding. All methods return the unwrapped `data` payload;
/// a call that succeeds without data decodes from an empty object.
pub struct UbusClient {
    http: reqwest::Client,
    endpoint: Url,
    session: SecretString,
    object: String,
    next_id: AtomicU64,
}

impl UbusClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the router root (e.g. `http://192.168.1.1`); the
    /// `/ubus` path is appended unless already present. `session` defaults
    /// to [`ANONYMOUS_SESSION`].
    pub fn new(
        base_url: &Url,
        session: Option<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url, session)
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &Url,
        session: Option<SecretString>,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            endpoint: rpc_url(base_url)?,
            session: session.unwrap_or_else(|| SecretString::from(ANONYMOUS_SESSION.to_owned())),
            object: PARENTAL_OBJECT.to_owned(),
            next_id: AtomicU64::new(1),
        })
    }

    /// The full JSON-RPC endpoint URL (`.../ubus`).
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The ubus object calls are addressed to.
    pub fn object(&self) -> &str {
        &self.object
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Invoke `method` on the parental object and decode its data payload.
    pub(crate) async fn call<A, T>(&self, method: &str, args: &A) -> Result<T, Error>
    where
        A: Serialize + Sync,
        T: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            id,
            method: "call",
            params: (
                self.session.expose_secret(),
                self.object.as_str(),
                method,
                args,
            ),
        };

        debug!(method, id, "ubus call");

        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body: preview(&body).to_owned(),
            });
        }

        let body = resp.text().await?;
        trace!(method, id, body = preview(&body), "ubus reply");
        decode_reply(method, &body)
    }
}

// ── Envelope decoding ────────────────────────────────────────────────

/// Strip the JSON-RPC envelope and the ubus status from a reply body.
fn decode_reply<T: DeserializeOwned>(method: &str, body: &str) -> Result<T, Error> {
    let envelope: RpcResponse = serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(body)),
        body: body.to_owned(),
    })?;

    if let Some(err) = envelope.error {
        return Err(Error::Rpc {
            code: err.code,
            message: err.message,
        });
    }

    let result = envelope.result.ok_or_else(|| Error::Deserialization {
        message: format!("{method}: reply carries neither result nor error"),
        body: body.to_owned(),
    })?;

    let mut parts = result.into_iter();
    let status = parts
        .next()
        .and_then(|v| v.as_i64())
        .ok_or_else(|| Error::Deserialization {
            message: format!("{method}: result is missing its status code"),
            body: body.to_owned(),
        })?;

    if status != 0 {
        return Err(Error::Ubus {
            method: method.to_owned(),
            status: UbusStatus::from_code(status),
        });
    }

    let data = parts
        .next()
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

    serde_json::from_value(data).map_err(|e| Error::Deserialization {
        message: format!("{method}: {e}"),
        body: body.to_owned(),
    })
}

/// Build the `/ubus` endpoint from a router base URL.
fn rpc_url(base: &Url) -> Result<Url, Error> {
    let base = base.as_str().trim_end_matches('/');
    if base.ends_with("/ubus") {
        return Ok(Url::parse(base)?);
    }
    Ok(Url::parse(&format!("{base}/ubus"))?)
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn endpoint_appends_ubus_path() {
        let url = rpc_url(&Url::parse("http://192.168.1.1").unwrap()).unwrap();
        assert_eq!(url.as_str(), "http://192.168.1.1/ubus");

        let url = rpc_url(&Url::parse("https://router.lan/ubus/").unwrap()).unwrap();
        assert_eq!(url.as_str(), "https://router.lan/ubus");
    }

    #[test]
    fn request_params_are_a_positional_array() {
        let args = json!({ "limit": 5 });
        let req = RpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "call",
            params: (ANONYMOUS_SESSION, PARENTAL_OBJECT, "activity_log", &args),
        };
        let encoded = serde_json::to_value(&req).unwrap();
        assert_eq!(
            encoded,
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "call",
                "params": [ANONYMOUS_SESSION, "parental", "activity_log", { "limit": 5 }]
            })
        );
    }

    #[test]
    fn status_only_reply_decodes_as_empty_object() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":[0]}"#;
        let data: Value = decode_reply("apply_rules", body).unwrap();
        assert_eq!(data, json!({}));
    }

    #[test]
    fn nonzero_status_is_a_ubus_error() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":[6]}"#;
        let err = decode_reply::<Value>("save_config", body).unwrap_err();
        assert!(matches!(
            err,
            Error::Ubus {
                status: UbusStatus::PermissionDenied,
                ..
            }
        ));
    }

    #[test]
    fn rpc_error_object_wins() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32002,"message":"Access denied"}}"#;
        let err = decode_reply::<Value>("get_overview", body).unwrap_err();
        assert!(err.is_permission_denied());
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let long = "é".repeat(BODY_PREVIEW_LEN + 10);
        assert_eq!(preview(&long).chars().count(), BODY_PREVIEW_LEN);
    }
}
