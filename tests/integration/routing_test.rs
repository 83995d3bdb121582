// tests/integration/routing_test.rs

//! Correlation of inbound units with the pending command or the listener.

use super::test_helpers::{TestBridge, wait_until};
use mobdebug_bridge::BridgeError;

fn params(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn unsolicited_events_reach_listener() {
    let bridge = TestBridge::start().await;
    let mut debuggee = bridge.attach_running().await;

    debuggee.send("203 2 15").await;
    debuggee.send("202 Paused main.lua 12").await;

    let listener = bridge.listener.clone();
    wait_until(move || listener.events().len() == 2).await;
    assert_eq!(
        bridge.listener.events(),
        vec![
            (203, params(&["2", "15"])),
            (202, params(&["Paused", "main.lua", "12"])),
        ]
    );

    bridge.server.stop().await;
}

#[tokio::test]
async fn pending_response_never_reaches_listener() {
    let bridge = TestBridge::start().await;
    let mut debuggee = bridge.attach_running().await;

    debuggee.send("202 Paused main.lua 1").await;
    let listener = bridge.listener.clone();
    wait_until(move || listener.events().len() == 1).await;

    let reply = bridge.server.request("EXEC return 5", 2);
    assert_eq!(debuggee.expect_line().await, "EXEC return 5");
    // Looks like an event, but a command is pending.
    debuggee.send("200 OK 1").await;
    debuggee.send("5").await;
    assert_eq!(reply.await.unwrap(), vec!["200 OK 1", "5"]);

    debuggee.send("202 Paused main.lua 2").await;
    let listener = bridge.listener.clone();
    wait_until(move || listener.events().len() == 2).await;
    assert_eq!(
        bridge.listener.events(),
        vec![
            (202, params(&["Paused", "main.lua", "1"])),
            (202, params(&["Paused", "main.lua", "2"])),
        ]
    );

    bridge.server.stop().await;
}

#[tokio::test]
async fn malformed_event_is_reported_and_dropped() {
    let bridge = TestBridge::start().await;
    let mut debuggee = bridge.attach_running().await;

    debuggee.send("RUNNING").await;
    debuggee.send("").await;
    debuggee.send("202 Paused main.lua 3").await;

    let listener = bridge.listener.clone();
    wait_until(move || listener.events().len() == 1).await;
    assert_eq!(
        bridge.listener.faults(),
        vec![BridgeError::MalformedEvent("RUNNING".to_string())]
    );
    assert_eq!(bridge.listener.disconnects(), 0);

    // The connection keeps working.
    bridge.server.add_text_command("STEP");
    assert_eq!(debuggee.expect_line().await, "STEP");

    bridge.server.stop().await;
}
