//! Drives a bridge over loopback TCP the way a controller would: the test
//! listens, the bridge connects.

use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use simulate_bridge::framing::{read_frame, write_frame};
use simulate_bridge::{
    Bridge, BridgeConfig, ExitReason, MAX_MESSAGE_SIZE, ProtocolError, SimContext,
};
use simulate_core::{NodeDescription, SceneDescription};
use simulate_test_utils::{scene_bytes, single_agent_scene};

struct Controller {
    stream: TcpStream,
}

impl Controller {
    fn request(&mut self, request: &Value) -> String {
        write_frame(&mut self.stream, &serde_json::to_vec(request).unwrap()).unwrap();
        let reply = read_frame(&mut self.stream, MAX_MESSAGE_SIZE).unwrap();
        String::from_utf8(reply).unwrap()
    }

    fn request_json(&mut self, request: &Value) -> Value {
        let reply = self.request(request);
        serde_json::from_str(&reply).unwrap_or_else(|_| panic!("not JSON: {reply}"))
    }
}

type BridgeThread = JoinHandle<Result<ExitReason, ProtocolError>>;

fn start() -> (Controller, BridgeThread) {
    start_with(MAX_MESSAGE_SIZE)
}

fn start_with(max_message_size: usize) -> (Controller, BridgeThread) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = BridgeConfig {
        host: "127.0.0.1".into(),
        port,
        poll_interval: Duration::from_millis(1),
        max_message_size,
    };
    let bridge = thread::spawn(move || {
        let mut ctx = SimContext::headless();
        Bridge::new(config).connect_and_run(&mut ctx)
    });
    let (stream, _) = listener.accept().unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();
    (Controller { stream }, bridge)
}

fn initialize(controller: &mut Controller) {
    let b64 = STANDARD.encode(scene_bytes(&single_agent_scene()));
    let reply = controller.request(&json!({"type": "Initialize", "b64bytes": b64}));
    assert_eq!(reply, "{}");
}

#[test]
fn full_session_ends_on_close() {
    let (mut controller, bridge) = start();

    let reply = controller.request(&json!({"type": "Teleport"}));
    assert!(reply.contains("Teleport"), "{reply}");
    let reply = controller.request(&json!({"type": "Echo", "message": "still here"}));
    assert_eq!(reply, "still here");

    initialize(&mut controller);

    let event = controller.request_json(&json!({"type": "Step", "action": [0]}));
    assert!(event["nodes"]["agent"].is_object(), "{event}");

    let reward = controller.request_json(&json!({"type": "GetReward"}));
    assert!(reward[0].as_f64().unwrap() > 0.0, "{reward}");
    assert_eq!(controller.request_json(&json!({"type": "GetReward"})), json!([0.0]));
    assert_eq!(controller.request_json(&json!({"type": "GetDone"})), json!([false]));

    assert_eq!(controller.request(&json!({"type": "Close"})), "{}");
    assert_eq!(bridge.join().unwrap().unwrap(), ExitReason::CloseRequested);
}

#[test]
fn pipelined_requests_answer_in_order() {
    let (mut controller, bridge) = start();

    // Queue Initialize and two follow-ups before reading anything back.
    let b64 = STANDARD.encode(scene_bytes(&single_agent_scene()));
    for request in [
        json!({"type": "Initialize", "b64bytes": b64}),
        json!({"type": "GetDone"}),
        json!({"type": "Echo", "contents": "{\"message\": \"last\"}"}),
    ] {
        write_frame(&mut controller.stream, &serde_json::to_vec(&request).unwrap()).unwrap();
    }

    let mut replies = Vec::new();
    for _ in 0..3 {
        let frame = read_frame(&mut controller.stream, MAX_MESSAGE_SIZE).unwrap();
        replies.push(String::from_utf8(frame).unwrap());
    }
    assert_eq!(replies, ["{}", "[false]", "last"]);

    drop(controller);
    assert_eq!(bridge.join().unwrap().unwrap(), ExitReason::PeerClosed);
}

#[test]
fn failed_initialize_allows_a_retry() {
    let (mut controller, bridge) = start();

    let reply = controller.request(&json!({"type": "Initialize", "b64bytes": "***"}));
    assert_ne!(reply, "{}");
    initialize(&mut controller);

    let reply = controller.request(&json!({"type": "Initialize", "b64bytes": ""}));
    assert!(reply.starts_with("Invalid state"), "{reply}");

    drop(controller);
    assert_eq!(bridge.join().unwrap().unwrap(), ExitReason::PeerClosed);
}

#[test]
fn oversized_response_becomes_an_error_reply() {
    let (mut controller, bridge) = start_with(4096);

    let scene = SceneDescription::new("wide")
        .with_node(NodeDescription::new("cam").with_camera(64, 64));
    let b64 = STANDARD.encode(scene_bytes(&scene));
    let reply = controller.request(&json!({"type": "Initialize", "b64bytes": b64}));
    assert_eq!(reply, "{}");

    // 64x64 RGB frame data alone is well past 4096 bytes of JSON.
    let reply = controller.request(&json!({"type": "Step"}));
    assert!(reply.starts_with("Response too large: "), "{reply}");
    assert!(reply.ends_with("(max 4096)"), "{reply}");

    let reply = controller.request(&json!({"type": "Step", "return_frames": false}));
    assert!(reply.starts_with('{'), "{reply}");
    let reply = controller.request(&json!({"type": "Echo", "message": "still here"}));
    assert_eq!(reply, "still here");

    assert_eq!(controller.request(&json!({"type": "Close"})), "{}");
    assert_eq!(bridge.join().unwrap().unwrap(), ExitReason::CloseRequested);
}
