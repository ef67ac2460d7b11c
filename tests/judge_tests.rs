mod common;

use actix_web::{App, test};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{create_test_state, fast_watcher, mount_submission};

#[actix_web::test]
async fn test_judge_stops_at_first_wrong_answer() {
    let server = MockServer::start().await;
    mount_submission(&server, "1", "a", 15, "1\n", "").await;
    mount_submission(&server, "2", "b", 15, "5\n", "").await;
    for input in ["3", "4"] {
        Mock::given(method("POST"))
            .and(path("/submissions"))
            .and(body_partial_json(json!({ "input": input })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "link": "never" })))
            .expect(0)
            .mount(&server)
            .await;
    }
    let state = create_test_state(&server, fast_watcher()).await;

    let app = test::init_service(App::new().configure(|cfg| state.register(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/sessions/dave/judge")
        .set_json(json!({
            "code": "print(input())",
            "language": "python",
            "test_cases": [
                { "input": "1", "expected_output": "1", "description": "echo one" },
                { "input": "2", "expected_output": "2" },
                { "input": "3", "expected_output": "3" },
                { "input": "4", "expected_output": "4" }
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let verdict: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(verdict["status"], "wrong_answer");
    assert_eq!(verdict["passed_tests"], 1);
    assert_eq!(verdict["total_tests"], 4);
    assert_eq!(verdict["aggregate_time_ms"], 30);
    assert_eq!(verdict["message"], "Wrong answer on test case 2");

    let reports = verdict["per_test_results"].as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["description"], "echo one");
    assert_eq!(reports[1]["actual_output"], "5");
    assert_eq!(reports[1]["passed"], false);
}

#[actix_web::test]
async fn test_accepted_solution_updates_statistics() {
    let server = MockServer::start().await;
    mount_submission(&server, "1 2 3", "sum", 15, "6", "").await;
    let state = create_test_state(&server, fast_watcher()).await;

    let app = test::init_service(App::new().configure(|cfg| state.register(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/sessions/erin/judge")
        .set_json(json!({
            "code": "print(sum(map(int, input().split())))",
            "language": "python",
            "test_cases": [{ "input": "1 2 3", "expected_output": "6" }],
            "submitter": { "user_id": 7, "problem_id": 1 }
        }))
        .to_request();
    let verdict: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(verdict["status"], "accepted");
    assert_eq!(verdict["passed_tests"], 1);
    assert_eq!(verdict["total_tests"], 1);
    assert!(verdict.get("side_effect_errors").is_none());

    let req = test::TestRequest::get().uri("/solutions/7/stats").to_request();
    let stats: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(stats["accepted_count"], 1);
    assert_eq!(stats["total_time_ms"], 15);

    let req = test::TestRequest::get().uri("/history").to_request();
    let history: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["record"]["kind"], "judge");
}

#[actix_web::test]
async fn test_judge_without_test_cases() {
    let server = MockServer::start().await;
    let state = create_test_state(&server, fast_watcher()).await;

    let app = test::init_service(App::new().configure(|cfg| state.register(cfg))).await;

    let req = test::TestRequest::post()
        .uri("/sessions/frank/judge")
        .set_json(json!({ "code": "x", "language": "python", "test_cases": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["reason"], "ERR_INVALID_ARGUMENT");
    assert_eq!(body["code"], 1);
}

#[actix_web::test]
async fn test_stats_of_unknown_user() {
    let server = MockServer::start().await;
    let state = create_test_state(&server, fast_watcher()).await;

    let app = test::init_service(App::new().configure(|cfg| state.register(cfg))).await;

    let req = test::TestRequest::get().uri("/solutions/99/stats").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}
