//! Invocation endpoint tests, driven through warp's test harness.

use std::fs;
use std::sync::Arc;

use lexbot::config::Config;
use lexbot::server;
use serde_json::Value;
use tempfile::TempDir;

const INVOKE_PATH: &str = "/2015-03-31/functions/function/invocations";

fn routes_with_script(
    temp: &TempDir,
    name: &str,
    body: &str,
) -> impl warp::Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    fs::write(temp.path().join(name), body).unwrap();
    let mut config = Config::default();
    config.scripts_dir = temp.path().to_path_buf();
    config.scripts_base_url = None;
    config.bucket = None;
    server::routes(Arc::new(config))
}

#[tokio::test]
async fn invocation_returns_the_handler_mapping() {
    let temp = TempDir::new().unwrap();
    let routes = routes_with_script(
        &temp,
        "greet.rhai",
        r#"fn main(event) { #{ status: "ok", text: "hello" } }"#,
    );

    let response = warp::test::request()
        .method("POST")
        .path(INVOKE_PATH)
        .body(r#"{"script_name": "greet"}"#)
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["text"], "hello");
}

#[tokio::test]
async fn malformed_body_still_returns_a_status_mapping() {
    let temp = TempDir::new().unwrap();
    let routes = routes_with_script(&temp, "unused.rhai", "fn main(event) { #{} }");

    let response = warp::test::request()
        .method("POST")
        .path(INVOKE_PATH)
        .body("{not json")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["status"], "error");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("invalid task descriptor"));
}

#[tokio::test]
async fn health_endpoint_answers_ok() {
    let temp = TempDir::new().unwrap();
    let routes = routes_with_script(&temp, "unused.rhai", "fn main(event) { #{} }");

    let response = warp::test::request()
        .method("GET")
        .path("/health")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.body().as_ref(), b"OK");
}

#[tokio::test]
async fn unknown_paths_are_rejected() {
    let temp = TempDir::new().unwrap();
    let routes = routes_with_script(&temp, "unused.rhai", "fn main(event) { #{} }");

    let response = warp::test::request()
        .method("POST")
        .path("/nope")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), 404);
}
