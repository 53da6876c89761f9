//! End-to-end tests for the `odq` binary.
//!
//! Each test runs the compiled binary against an isolated config file and,
//! where a request is sent, a wiremock server.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn odq(config: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_odq"));
    cmd.args(args)
        .env("ODQ_CONFIG", config)
        .env_remove("ODQ_BASE_URL")
        .env_remove("ODQ_LOG")
        .env_remove("RUST_LOG");
    cmd
}

fn config_path(dir: &TempDir) -> PathBuf {
    dir.path().join("config.toml")
}

async fn run(mut cmd: Command) -> Output {
    tokio::task::spawn_blocking(move || cmd.output())
        .await
        .unwrap()
        .unwrap()
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

/// Test: `url` compiles filter and sorts without contacting the service
#[test]
fn test_url_prints_compiled_request() {
    let dir = TempDir::new().unwrap();
    let output = odq(
        &config_path(&dir),
        &[
            "--json",
            "--base-url",
            "https://svc.example.com/odata",
            "url",
            "People",
            "--filter",
            "Age between 18 and 30",
            "--sort",
            "Name desc",
            "--top",
            "5",
        ],
    )
    .output()
    .unwrap();

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["filter"], "(Age ge 18 and Age le 30)");
    assert_eq!(json["orderby"], "Name desc");
    let url = json["url"].as_str().unwrap();
    assert!(url.starts_with("https://svc.example.com/odata/People?"));
    assert!(url.contains("%24top=5"));
}

/// Test: config set persists values that later commands use
#[test]
fn test_config_set_then_url_uses_backend() {
    let dir = TempDir::new().unwrap();
    let config = config_path(&dir);

    let set = odq(&config, &["config", "set", "base_address", "https://main.example.com/odata"])
        .output()
        .unwrap();
    assert!(set.status.success());
    let set = odq(
        &config,
        &["config", "set", "alternate.archive", "https://archive.example.com/odata"],
    )
    .output()
    .unwrap();
    assert!(set.status.success());

    let output = odq(&config, &["url", "Orders", "--backend", "archive"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "https://archive.example.com/odata/Orders?%24count=true"
    );
}

/// Test: a malformed filter exits with the filter error code
#[test]
fn test_bad_filter_exit_code() {
    let dir = TempDir::new().unwrap();
    let output = odq(
        &config_path(&dir),
        &[
            "--json",
            "--base-url",
            "https://svc.example.com/odata",
            "url",
            "People",
            "--filter",
            "Age ge 1 and Age le 9 or Age eq 5",
        ],
    )
    .output()
    .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let error: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(error["error"]["code"], "FILTER_ERROR");
}

/// Test: missing service root is a configuration error
#[test]
fn test_missing_base_address_exit_code() {
    let dir = TempDir::new().unwrap();
    let output = odq(&config_path(&dir), &["url", "People"]).output().unwrap();
    assert_eq!(output.status.code(), Some(5));
}

/// Test: `query --json` prints the envelope returned by the service
#[tokio::test(flavor = "multi_thread")]
async fn test_query_prints_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/odata/People"))
        .and(query_param("$filter", "startswith(Name,'A')"))
        .and(query_param("$count", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "@odata.count": 1,
            "value": [{ "Name": "Ann", "Age": 31 }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let base_url = format!("{}/odata", mock_server.uri());
    let cmd = odq(
        &config_path(&dir),
        &[
            "--json",
            "--base-url",
            &base_url,
            "query",
            "People",
            "--filter",
            "Name startswith 'A'",
        ],
    );
    let output = run(cmd).await;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let json = stdout_json(&output);
    assert_eq!(json["count"], 1);
    assert_eq!(json["value"][0]["Name"], "Ann");
}

/// Test: server failures exit with the query error code and localized text
#[tokio::test(flavor = "multi_thread")]
async fn test_query_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/People"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let base_url = mock_server.uri();
    let cmd = odq(
        &config_path(&dir),
        &["--no-color", "--base-url", &base_url, "query", "People"],
    );
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Could not read data (HTTP status 503)."));
}
