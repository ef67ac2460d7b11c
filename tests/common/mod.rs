#![allow(dead_code)]

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use judge_relay::config::Config;
use judge_relay::store::{self, SolutionStore};
use judge_relay::web_server::AppState;

// Helper function to build the application state against a mock judge
pub async fn create_test_state(server: &MockServer, watcher: serde_json::Value) -> AppState {
    let config: Config = serde_json::from_value(json!({
        "server": {},
        "judge": { "base_url": server.uri(), "access_token": "test-token" },
        "watcher": watcher,
        "history_capacity": 5
    }))
    .expect("Failed to build test config");

    let pool = store::init_pool("sqlite::memory:")
        .await
        .expect("Failed to initialize test database");

    AppState::from_config(&config, SolutionStore::new(pool)).expect("Failed to build state")
}

pub fn fast_watcher() -> serde_json::Value {
    json!({ "poll_interval_ms": 20, "run_timeout_ms": 2000, "judge_timeout_ms": 5000 })
}

// Mounts a submission that is created for `input`, reports `result` and prints `output`
pub async fn mount_submission(
    server: &MockServer,
    input: &str,
    link: &str,
    result: i64,
    output: &str,
    cmpinfo: &str,
) {
    Mock::given(method("POST"))
        .and(path("/submissions"))
        .and(body_partial_json(json!({ "input": input })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "link": link })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/submissions/{link}/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": result })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/submissions/{link}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": result,
            "output": output,
            "cmpinfo": cmpinfo,
            "time": 0.015,
            "memory": 2048
        })))
        .expect(1)
        .mount(server)
        .await;
}
