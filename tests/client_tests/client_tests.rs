//! Client Tests
//!
//! Session bootstrap, typed value helpers, and sharing one connection
//! between threads.

#[path = "../common/mod.rs"]
mod common;

use std::thread;
use std::time::Duration;

use common::StubServer;
use marionette::{Client, Config, MarionetteError, Timeouts};
use serde_json::json;

fn connected(server: &StubServer) -> Client {
    let client = Client::new(
        Config::builder()
            .io_timeout(Duration::from_secs(5))
            .build(),
    );
    client.connect(&server.addr).unwrap();
    client
}

#[test]
fn test_new_session() {
    let server = StubServer::serve(|cmd| {
        assert_eq!(cmd.name, "WebDriver:NewSession");
        Ok(json!({
            "sessionId": "4f2c-11aa",
            "capabilities": {"browserName": "firefox"}
        }))
    });

    let client = connected(&server);
    let session = client
        .new_session(None, Some(json!({"acceptInsecureCerts": true})))
        .unwrap();
    assert_eq!(session.session_id, "4f2c-11aa");
    assert_eq!(session.capabilities["browserName"], "firefox");
    assert_eq!(client.session_id().as_deref(), Some("4f2c-11aa"));

    client.close().unwrap();
    let received = server.join();
    assert_eq!(
        received[0].params,
        json!({"capabilities": {"acceptInsecureCerts": true}})
    );
}

#[test]
fn test_delete_session_closes_connection() {
    let server = StubServer::serve(|cmd| match cmd.name.as_str() {
        "WebDriver:NewSession" => Ok(json!({"sessionId": "abc", "capabilities": {}})),
        _ => Ok(json!({})),
    });

    let client = connected(&server);
    client.new_session(None, None).unwrap();
    client.delete_session().unwrap();

    assert!(!client.is_connected());
    assert!(client.session_id().is_none());
    let names: Vec<String> = server.join().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["WebDriver:NewSession", "WebDriver:DeleteSession"]);
}

#[test]
fn test_new_session_with_requested_id() {
    let server = StubServer::serve(|cmd| {
        Ok(json!({"sessionId": cmd.params["sessionId"].clone(), "capabilities": {}}))
    });

    let client = connected(&server);
    let session = client.new_session(Some("fixed-id"), None).unwrap();
    assert_eq!(session.session_id, "fixed-id");

    client.close().unwrap();
    let received = server.join();
    assert_eq!(
        received[0].params,
        json!({"sessionId": "fixed-id", "capabilities": null})
    );
}

#[test]
fn test_delete_session_driver_error_still_closes() {
    let server = StubServer::serve(|cmd| match cmd.name.as_str() {
        "WebDriver:NewSession" => Ok(json!({"sessionId": "abc", "capabilities": {}})),
        _ => Err(json!({"error": "invalid session id", "message": "gone", "stacktrace": null})),
    });

    let client = connected(&server);
    client.new_session(None, None).unwrap();

    let err = client.delete_session().unwrap_err();
    assert_eq!(err.driver_error().unwrap().error, "invalid session id");
    assert!(!client.is_connected());
    assert!(client.session_id().is_none());

    assert_eq!(server.join().len(), 2);
}

#[test]
fn test_value_helper() {
    let server = StubServer::serve(|cmd| match cmd.name.as_str() {
        "WebDriver:GetTitle" => Ok(json!({"value": "Example"})),
        _ => Ok(json!({"value": ["a", "b"]})),
    });

    let client = connected(&server);
    let title: String = client.value("WebDriver:GetTitle", &()).unwrap();
    assert_eq!(title, "Example");
    let handles: Vec<String> = client.value("WebDriver:GetWindowHandles", &()).unwrap();
    assert_eq!(handles, vec!["a", "b"]);

    client.close().unwrap();
    server.join();
}

#[test]
fn test_value_helper_driver_error() {
    let server = StubServer::serve(|_| {
        Err(json!({"error": "no such alert", "message": "none open", "stacktrace": null}))
    });

    let client = connected(&server);
    let err = client
        .value::<String, _>("WebDriver:GetAlertText", &())
        .unwrap_err();
    assert!(matches!(err, MarionetteError::Driver(ref e) if e.error == "no such alert"));
    assert!(client.is_connected());

    client.close().unwrap();
    server.join();
}

#[test]
fn test_timeouts() {
    let server = StubServer::serve(|cmd| match cmd.name.as_str() {
        "WebDriver:GetTimeouts" => Ok(json!({"implicit": 0, "pageLoad": 300000, "script": 30000})),
        _ => Ok(json!({})),
    });

    let client = connected(&server);
    client
        .set_timeouts(&Timeouts::script(Duration::from_secs(10)))
        .unwrap();
    let timeouts = client.timeouts().unwrap();
    assert_eq!(timeouts.implicit, Some(0));
    assert_eq!(timeouts.page_load, Some(300000));
    assert_eq!(timeouts.script, Some(30000));

    client.close().unwrap();
    let received = server.join();
    assert_eq!(received[0].params, json!({"script": 10000}));
}

#[test]
fn test_capabilities() {
    let server = StubServer::serve(|_| {
        Ok(json!({"capabilities": {"browserName": "firefox", "platformName": "linux"}}))
    });

    let client = connected(&server);
    let caps = client.capabilities().unwrap();
    assert_eq!(caps["platformName"], "linux");
    client.close().unwrap();
    server.join();
}

#[test]
fn test_shared_between_threads() {
    let server = StubServer::serve(|cmd| Ok(json!({"value": cmd.id})));
    let client = connected(&server);

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let client = client.clone();
            thread::spawn(move || {
                (0..5)
                    .map(|_| client.value::<u64, _>("WebDriver:GetTitle", &()).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<u64> = workers
        .into_iter()
        .flat_map(|w| w.join().unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=20).collect::<Vec<u64>>());

    client.close().unwrap();
    assert_eq!(server.join().len(), 20);
}
