//! End-to-end command tests against a wiremock agent API.

use std::time::Duration;

use parley::ParleyError;
use parley::app::{self, TermOptions};
use parley::cli::Cli;
use parley::config::{ConfigError, Settings};
use parley_client::AgentClient;
use parley_types::MemoryMode;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PLAIN: TermOptions = TermOptions {
    cursor: false,
    interrupts: false,
};

fn settings(server: &MockServer, agent: Option<&str>) -> Settings {
    Settings {
        api_key: Some("test-key".into()),
        agent_id: agent.map(str::to_string),
        base_url: server.uri(),
        memory_mode: MemoryMode::Full,
        pacing: Duration::ZERO,
    }
}

fn client(settings: &Settings) -> AgentClient {
    app::build_client(settings).unwrap()
}

fn sse(fragments: &[&str]) -> ResponseTemplate {
    let mut body = String::new();
    for fragment in fragments {
        body.push_str(&format!("data: {}\n", json!({ "data": fragment })));
    }
    body.push_str("data: [DONE]\n");
    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}

#[tokio::test]
async fn ask_prints_the_assembled_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent/a1"))
        .and(body_json(json!({"messages": [{"role": "user", "content": "hello?"}]})))
        .respond_with(sse(&["Hel", "lo", " there"]))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings(&server, Some("a1"));
    let mut out = Vec::new();
    let report = app::ask(client(&settings), &settings, "hello?", &mut out, PLAIN)
        .await
        .unwrap();

    assert_eq!(report.response, "Hello there");
    assert!(report.sentinel_seen);
    assert_eq!(String::from_utf8(out).unwrap(), "Hello there\n");
}

#[tokio::test]
async fn ask_falls_back_when_the_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent/a1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let settings = settings(&server, Some("a1"));
    let mut out = Vec::new();
    let report = app::ask(client(&settings), &settings, "hi", &mut out, PLAIN)
        .await
        .unwrap();

    assert!(report.fallback);
    assert!(report.transport_error.is_some());
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "No response from the assistant\n"
    );
}

#[tokio::test]
async fn chat_runs_commands_and_turns() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent/a1"))
        .and(body_json(json!({"messages": [{"role": "user", "content": "hi"}]})))
        .respond_with(sse(&["Hello"]))
        .expect(1)
        .mount(&server)
        .await;
    // Memory off: only the latest message goes upstream.
    Mock::given(method("POST"))
        .and(path("/agent/a1"))
        .and(body_json(json!({"messages": [{"role": "user", "content": "again"}]})))
        .respond_with(sse(&["Once more"]))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings(&server, Some("a1"));
    let input: &[u8] = b"hi\n/history\n/memory off\nagain\n/bogus\n/quit\nnever sent\n";
    let mut out = Vec::new();
    app::chat(client(&settings), &settings, input, &mut out, PLAIN)
        .await
        .unwrap();

    let out = String::from_utf8(out).unwrap();
    assert!(out.starts_with("Chat with: a1\n"), "{out}");
    assert!(out.contains("user: hi\nassistant: Hello\n"), "{out}");
    assert!(out.contains("memory off"), "{out}");
    assert!(out.contains("Once more\n"), "{out}");
    assert!(out.contains("unknown command /bogus"), "{out}");
}

#[tokio::test]
async fn chat_lets_the_user_pick_an_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "a1", "name": "Helper"},
            {"id": "a2", "name": "Critic"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/agent/a2"))
        .respond_with(sse(&["Hmm."]))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings(&server, None);
    let input: &[u8] = b"7\n2\nthoughts?\n";
    let mut out = Vec::new();
    app::chat(client(&settings), &settings, input, &mut out, PLAIN)
        .await
        .unwrap();

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("  1. Helper (a1)\n  2. Critic (a2)\n"), "{out}");
    assert!(out.contains("no agent \"7\""), "{out}");
    assert!(out.contains("Chat with: Critic (a2)"), "{out}");
    assert!(out.contains("Hmm.\n"), "{out}");
}

#[tokio::test]
async fn agents_lists_ids_and_names() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "a1", "name": "Helper", "model": "x"}]
        })))
        .mount(&server)
        .await;

    let settings = settings(&server, None);
    let mut out = Vec::new();
    app::agents(&client(&settings), &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "a1  Helper\n");
}

#[tokio::test]
async fn agents_reports_rejected_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agent"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let settings = settings(&server, None);
    let err = app::agents(&client(&settings), &mut Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ParleyError::Client(_)), "{err:?}");
}

#[test]
fn explicit_secrets_file_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");
    let cli = Cli::parse(["--secrets".to_string(), missing.display().to_string()]).unwrap();
    let err = app::load_settings(&cli).unwrap_err();
    assert!(matches!(err, ParleyError::Config(ConfigError::Io { .. })), "{err:?}");
}

#[test]
fn secrets_file_is_layered_under_flags() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("secrets.json");
    std::fs::write(
        &file,
        r#"{"codegpt_api_key": "file-key", "codegpt_agent_id": "file-agent"}"#,
    )
    .unwrap();

    let cli = Cli::parse(
        [
            "--secrets",
            file.to_str().unwrap(),
            "--api-key",
            "flag-key",
            "--agent",
            "flag-agent",
            "--base-url",
            "http://localhost:1/api",
            "--no-memory",
        ]
        .map(String::from),
    )
    .unwrap();
    let settings = app::load_settings(&cli).unwrap();
    assert_eq!(settings.api_key.as_deref(), Some("flag-key"));
    assert_eq!(settings.agent_id.as_deref(), Some("flag-agent"));
    assert_eq!(settings.base_url, "http://localhost:1/api");
    assert_eq!(settings.memory_mode, MemoryMode::LatestOnly);
}

#[test]
fn invalid_secrets_json_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("secrets.json");
    std::fs::write(&file, "{not json").unwrap();
    let cli = Cli::parse(["--secrets".to_string(), file.display().to_string()]).unwrap();
    let err = app::load_settings(&cli).unwrap_err();
    assert!(matches!(err, ParleyError::Config(ConfigError::Json { .. })), "{err:?}");
}

#[test]
fn client_requires_an_api_key() {
    let settings = Settings::default();
    assert!(matches!(
        app::build_client(&settings),
        Err(ParleyError::Usage(_))
    ));
}
