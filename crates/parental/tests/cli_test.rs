//! Integration tests for the `parental` CLI binary.
//!
//! Argument parsing, help output and configuration errors run without a
//! router; the rest talk to a wiremock stand-in for the ubus endpoint.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `parental` binary with env isolation.
///
/// Clears all `PARENTAL_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn parental_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("parental");
    cmd.env("HOME", "/tmp/parental-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/parental-cli-test-nonexistent")
        .env_remove("PARENTAL_PROFILE")
        .env_remove("PARENTAL_ENDPOINT")
        .env_remove("PARENTAL_SESSION")
        .env_remove("PARENTAL_OUTPUT")
        .env_remove("PARENTAL_INSECURE")
        .env_remove("PARENTAL_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary against `server` off the async runtime.
async fn run_against(server: &MockServer, args: &[&str]) -> std::process::Output {
    let endpoint = server.uri();
    let mut cmd = parental_cmd();
    cmd.args(["--endpoint", endpoint.as_str(), "--color", "never"])
        .args(args);
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

struct UbusMethod(&'static str);

impl Match for UbusMethod {
    fn matches(&self, request: &Request) -> bool {
        serde_json::from_slice::<Value>(&request.body)
            .is_ok_and(|body| body["params"][2] == self.0)
    }
}

fn reply(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": [0, data] }))
}

async fn mount(server: &MockServer, ubus_method: &'static str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/ubus"))
        .and(UbusMethod(ubus_method))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn router() -> MockServer {
    let server = MockServer::start().await;
    mount(
        &server,
        "get_overview",
        reply(json!({
            "globals": { "enabled": "1", "adguard_token": "hunter2" },
            "groups_list": [
                { "section": "kids", "name": "Kids", "quota_daily_min": "90" },
                { "section": "adults", "name": "Adults" }
            ],
            "clients_list": [
                { "mac": "aa:bb:cc:dd:ee:01", "name": "Tablet", "group": "kids" },
                { "mac": "aa:bb:cc:dd:ee:02", "name": "Phone", "group": "kids" }
            ],
            "discovered": [
                { "mac": "aa:bb:cc:dd:ee:01", "ip": "192.168.1.20", "hostname": "tablet", "src": "dhcp" },
                { "mac": "aa:bb:cc:dd:ee:09", "ip": "192.168.1.90", "hostname": "tv", "src": "arp" }
            ]
        })),
    )
    .await;
    mount(
        &server,
        "health",
        reply(json!({ "nft": "ok", "fw4_chain": "present", "cron": "missing", "adguard": "ok" })),
    )
    .await;
    mount(
        &server,
        "activity_log",
        reply(json!({ "entries": ["aa:bb:cc:dd:ee:01 blocked", "Tablet paused", "Phone online"] })),
    )
    .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = parental_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    parental_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("parental-control")
            .and(predicate::str::contains("groups"))
            .and(predicate::str::contains("clients"))
            .and(predicate::str::contains("devices")),
    );
}

#[test]
fn test_version_flag() {
    parental_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("parental"));
}

#[test]
fn test_invalid_subcommand() {
    let output = parental_cmd().arg("frobnicate").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_pause_requires_duration() {
    let output = parental_cmd()
        .args(["clients", "pause", "aa:bb:cc:dd:ee:01"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--duration"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    parental_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    parental_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("parental"));
}

#[test]
fn test_completions_fish() {
    parental_cmd()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn test_no_config_is_reported() {
    let output = parental_cmd().args(["groups", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("No router configured"), "{text}");
    assert!(text.contains("config init"), "{text}");
}

#[test]
fn test_unknown_profile_is_reported() {
    let output = parental_cmd()
        .args(["--profile", "cabin", "health"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("'cabin' not found"));
}

#[test]
fn test_config_path() {
    parental_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_profiles_empty() {
    parental_cmd()
        .args(["config", "profiles"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No profiles configured"));
}

#[test]
fn test_config_use_unknown_profile() {
    let output = parental_cmd().args(["config", "use", "nope"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("(none)"));
}

// ── Router-backed commands ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_groups_list_json() {
    let server = router().await;
    let output = run_against(&server, &["groups", "list", "-o", "json"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let groups: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(groups[0]["id"], "kids");
    assert_eq!(groups[0]["quota_daily_min"], "90");
    assert_eq!(groups[1]["id"], "adults");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_clients_list_plain() {
    let server = router().await;
    let output = run_against(&server, &["clients", "list", "-o", "plain"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "AA:BB:CC:DD:EE:01\nAA:BB:CC:DD:EE:02\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unmanaged_devices() {
    let server = router().await;
    let output = run_against(&server, &["devices", "list", "--unmanaged", "-o", "plain"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "AA:BB:CC:DD:EE:09\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_settings_mask_secrets() {
    let server = router().await;
    let output = run_against(&server, &["settings", "list", "-o", "plain"]).await;
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("adguard_token=****"), "{stdout}");
    assert!(!stdout.contains("hunter2"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health_table_shows_every_check() {
    let server = router().await;
    let output = run_against(&server, &["health"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    for check in ["nft", "fw4_chain", "cron", "adguard", "missing"] {
        assert!(stdout.contains(check), "missing {check}:\n{stdout}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_group_exit_code() {
    let server = router().await;
    let output = run_against(&server, &["groups", "get", "teens"]).await;
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("groups list"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_bad_mac_is_usage_error() {
    let server = router().await;
    let output = run_against(&server, &["clients", "block", "not-a-mac"]).await;
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("not a MAC address"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_block_client() {
    let server = router().await;
    mount(&server, "block_client", reply(json!({ "success": true }))).await;

    let output = run_against(&server, &["clients", "block", "aa-bb-cc-dd-ee-01"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stderr).contains("AA:BB:CC:DD:EE:01 blocked"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_group_block_partial_failure() {
    let server = router().await;
    mount(&server, "block_client", reply(json!({ "success": false, "message": "nft busy" }))).await;

    let output = run_against(&server, &["groups", "block", "kids", "-o", "plain"]).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("2 of 2 clients failed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_permission_denied() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ubus"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": [6] })),
        )
        .mount(&server)
        .await;

    let output = run_against(&server, &["groups", "list"]).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("--session"));
}

#[test]
fn test_unreachable_router_exit_code() {
    let output = parental_cmd()
        .args(["--endpoint", "http://127.0.0.1:1", "--timeout", "2", "health"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}

// ── Profiles on disk ────────────────────────────────────────────────

/// Write `toml` where the binary will look for its config and return the
/// guard directory.
fn config_dir(toml: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let app = dir.path().join("parental");
    std::fs::create_dir_all(&app).unwrap();
    std::fs::write(app.join("config.toml"), toml).unwrap();
    dir
}

#[test]
fn test_config_show_masks_session() {
    let dir = config_dir(
        r#"
default_profile = "home"

[profiles.home]
endpoint = "http://192.168.1.1"
session = "0123456789abcdef"
"#,
    );
    let output = parental_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "show", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let shown: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["profiles"]["home"]["session"], "****");
    assert_eq!(shown["profiles"]["home"]["endpoint"], "http://192.168.1.1");
}

#[test]
fn test_config_use_switches_default() {
    let dir = config_dir(
        r#"
default_profile = "home"

[profiles.home]
endpoint = "http://192.168.1.1"

[profiles.cabin]
endpoint = "http://10.0.0.1"
"#,
    );
    parental_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "use", "cabin"])
        .assert()
        .success();

    parental_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cabin *").and(predicate::str::contains("home\n")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_profile_endpoint_is_used() {
    let server = router().await;
    let dir = config_dir(&format!(
        "default_profile = \"home\"\n\n[profiles.home]\nendpoint = \"{}\"\n",
        server.uri()
    ));

    let mut cmd = parental_cmd();
    cmd.env("XDG_CONFIG_HOME", dir.path())
        .args(["usage", "-o", "json"]);
    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let usage: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(usage[0]["mac"], "AA:BB:CC:DD:EE:01");
    assert_eq!(usage[0]["count"], 2);
    assert_eq!(usage[1]["count"], 1);
}
