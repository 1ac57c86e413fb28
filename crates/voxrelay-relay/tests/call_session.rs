// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end relay sessions over in-memory transports.

use std::time::Duration;

use serde_json::{json, Value};
use voxrelay_relay::RelaySettings;
use voxrelay_test_utils::{CallHarness, ScriptedTool};

fn count(frames: &[Value], key: &str, value: &str) -> usize {
    frames.iter().filter(|f| f[key] == value).count()
}

fn user_texts(frames: &[Value]) -> Vec<String> {
    frames
        .iter()
        .filter(|f| f["type"] == "conversation.item.create" && f["item"]["type"] == "message")
        .filter_map(|f| f["item"]["content"][0]["text"].as_str().map(String::from))
        .collect()
}

/// Starts a call and consumes the bootstrap `session.update`.
async fn started_call(builder: voxrelay_test_utils::CallHarnessBuilder) -> CallHarness {
    let mut call = builder.start().unwrap();
    let update = call.next_gateway().await.unwrap();
    assert_eq!(update["type"], "session.update");
    call.start_stream("MZ100");
    call.settle().await;
    call
}

#[tokio::test(start_paused = true)]
async fn bootstrap_advertises_registered_tools() {
    let tool = ScriptedTool::new("check_inventory", Duration::ZERO, "");
    let mut call = CallHarness::builder().with_tool(tool).start().unwrap();

    let update = call.next_gateway().await.unwrap();
    assert_eq!(update["session"]["tool_choice"], "auto");
    assert_eq!(update["session"]["tools"][0]["name"], "check_inventory");
    assert_eq!(update["session"]["tools"][0]["type"], "function");
}

#[tokio::test(start_paused = true)]
async fn greeting_is_sent_after_session_update() {
    let mut call = CallHarness::builder()
        .with_greeting("Say hello to the caller.")
        .start()
        .unwrap();

    assert_eq!(call.next_gateway().await.unwrap()["type"], "session.update");
    let greeting = call.next_gateway().await.unwrap();
    assert_eq!(greeting["item"]["content"][0]["text"], "Say hello to the caller.");
    assert_eq!(call.next_gateway().await.unwrap(), json!({"type": "response.create"}));
}

#[tokio::test(start_paused = true)]
async fn caller_audio_is_forwarded_verbatim() {
    let mut call = started_call(CallHarness::builder()).await;

    call.caller_media(20, "AAEC");
    assert_eq!(
        call.next_gateway().await.unwrap(),
        json!({"type": "input_audio_buffer.append", "audio": "AAEC"})
    );
    assert_eq!(call.state.snapshot().latest_media_timestamp_ms, 20);
}

#[tokio::test(start_paused = true)]
async fn start_event_resets_timing_and_interruption_state() {
    let mut call = started_call(CallHarness::builder()).await;
    call.caller_media(500, "AAEC");
    call.audio_delta("item_1", "UklG");
    call.settle().await;
    assert_eq!(call.state.snapshot().pending_marks.len(), 1);

    call.start_stream("MZ200");
    call.settle().await;

    let state = call.state.snapshot();
    assert_eq!(state.stream_sid.as_deref(), Some("MZ200"));
    assert_eq!(state.latest_media_timestamp_ms, 0);
    assert_eq!(state.response_start_timestamp_ms, None);
    assert_eq!(state.active_response_item_id, None);
    assert!(state.pending_marks.is_empty());

    call.drain_telephony();
    call.speech_started();
    call.settle().await;
    assert!(call.drain_telephony().is_empty());
}

#[tokio::test(start_paused = true)]
async fn marks_follow_deltas_and_acks_drain_the_queue() {
    let mut call = started_call(CallHarness::builder()).await;

    for delta in ["d1", "d2", "d3"] {
        call.audio_delta("item_1", delta);
    }
    call.settle().await;

    let frames = call.drain_telephony();
    let order: Vec<&str> = frames
        .iter()
        .map(|f| match f["event"].as_str().unwrap() {
            "media" => f["media"]["payload"].as_str().unwrap(),
            other => other,
        })
        .collect();
    assert_eq!(order, ["d1", "mark", "d2", "mark", "d3", "mark"]);
    assert!(frames.iter().all(|f| f["streamSid"] == "MZ100"));
    assert_eq!(call.state.snapshot().pending_marks.len(), 3);

    for _ in 0..5 {
        call.ack_mark();
    }
    call.settle().await;
    assert!(call.state.snapshot().pending_marks.is_empty());
}

#[tokio::test(start_paused = true)]
async fn barge_in_truncates_at_heard_position() {
    let mut call = started_call(CallHarness::builder()).await;

    call.caller_media(1_000, "AAEC");
    call.settle().await;
    call.audio_delta("item_42", "UklG");
    call.audio_delta("item_42", "UklH");
    call.settle().await;
    call.caller_media(3_340, "AAEC");
    call.settle().await;
    call.drain_gateway();
    call.drain_telephony();

    call.speech_started();
    call.settle().await;

    assert_eq!(
        call.drain_gateway(),
        vec![json!({
            "type": "conversation.item.truncate",
            "item_id": "item_42",
            "content_index": 0,
            "audio_end_ms": 2_340
        })]
    );
    let telephony = call.drain_telephony();
    assert_eq!(telephony, vec![json!({"event": "clear", "streamSid": "MZ100"})]);

    let state = call.state.snapshot();
    assert!(state.pending_marks.is_empty());
    assert_eq!(state.active_response_item_id, None);
    assert_eq!(state.response_start_timestamp_ms, None);
}

#[tokio::test(start_paused = true)]
async fn speech_without_playback_does_nothing() {
    let mut call = started_call(CallHarness::builder()).await;
    call.caller_media(100, "AAEC");
    call.settle().await;
    call.drain_gateway();

    call.speech_started();
    call.settle().await;
    assert!(call.drain_gateway().is_empty());
    assert!(call.drain_telephony().is_empty());
}

#[tokio::test(start_paused = true)]
async fn five_second_tool_produces_two_extra_stalls() {
    let tool = ScriptedTool::new("check_inventory", Duration::from_secs(5), "2 sedans in stock");
    let mut call = started_call(CallHarness::builder().with_tool(tool.clone())).await;

    call.function_call("call_9", "check_inventory", json!({"model": "X5"}));
    call.settle().await;

    // Caller audio keeps flowing while the tool runs.
    tokio::time::sleep(Duration::from_secs(3)).await;
    call.caller_media(3_000, "AAEC");

    let mut frames = Vec::new();
    loop {
        let frame = call.next_gateway().await.unwrap();
        let done = frame["type"] == "response.create" && frame.get("response").is_some();
        frames.push(frame);
        if done {
            break;
        }
    }

    let settings = RelaySettings::default();
    assert_eq!(
        user_texts(&frames),
        vec![
            settings.stall_prompt(0),
            settings.stall_prompt(1),
            settings.stall_prompt(2)
        ]
    );

    let position = |kind: &str| {
        frames
            .iter()
            .position(|f| f["type"] == kind || f["item"]["type"] == kind)
            .unwrap()
    };
    assert!(position("input_audio_buffer.append") < position("function_call_output"));
    assert_eq!(count(&frames, "type", "input_audio_buffer.append"), 1);

    let output = &frames[position("function_call_output")];
    assert_eq!(output["item"]["call_id"], "call_9");
    assert_eq!(output["item"]["output"], "2 sedans in stock");
    assert!(frames.last().unwrap()["response"]["instructions"]
        .as_str()
        .unwrap()
        .contains("2 sedans in stock"));

    assert_eq!(tool.call_count(), 1);
    assert_eq!(tool.last_args(), Some(json!({"model": "X5"})));
}

#[tokio::test(start_paused = true)]
async fn stalls_respect_the_live_ledger() {
    let tool = ScriptedTool::new("check_inventory", Duration::from_secs(5), "ok");
    let mut call = started_call(CallHarness::builder().with_tool(tool)).await;

    call.function_call("call_1", "check_inventory", json!({}));
    call.settle().await;
    // The model starts speaking the first stall.
    call.response_status(true, "resp_1", "in_progress");
    call.settle().await;

    tokio::time::sleep(Duration::from_secs(6)).await;
    let frames = call.drain_gateway();
    assert_eq!(user_texts(&frames).len(), 1);
    assert_eq!(count(&frames, "type", "response.create"), 2);
}

#[tokio::test(start_paused = true)]
async fn unknown_tool_returns_empty_output() {
    let mut call = started_call(CallHarness::builder()).await;

    call.function_call("call_x", "does_not_exist", json!({}));
    call.settle().await;

    let frames = call.drain_gateway();
    let output = frames
        .iter()
        .find(|f| f["item"]["type"] == "function_call_output")
        .unwrap();
    assert_eq!(output["item"]["output"], "");

    // The session is still relaying.
    call.caller_media(60, "AAEC");
    assert_eq!(
        call.next_gateway().await.unwrap()["type"],
        "input_audio_buffer.append"
    );
}

#[tokio::test(start_paused = true)]
async fn failing_tool_apologises_and_session_continues() {
    let tool = ScriptedTool::failing("check_inventory", Duration::from_millis(100), "backend down");
    let mut call = started_call(CallHarness::builder().with_tool(tool)).await;

    call.function_call("call_1", "check_inventory", json!({}));
    call.settle().await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let texts = user_texts(&call.drain_gateway());
    assert!(texts.last().unwrap().contains("apologetic"));

    call.audio_delta("item_1", "UklG");
    assert_eq!(call.next_telephony().await.unwrap()["event"], "media");
}

#[tokio::test(start_paused = true)]
async fn gateway_errors_and_garbage_are_not_fatal() {
    let mut call = started_call(CallHarness::builder()).await;

    call.send_gateway(json!({"type": "error", "error": {"message": "rate limited"}}));
    call.send_gateway_raw("{{{");
    call.send_telephony_raw("not json");
    call.send_gateway(json!({"type": "response.audio_transcript.delta", "delta": "hi"}));

    call.audio_delta("item_1", "UklG");
    assert_eq!(call.next_telephony().await.unwrap()["event"], "media");
}

#[tokio::test(start_paused = true)]
async fn hang_up_closes_gateway_and_ends_session() {
    let call = started_call(CallHarness::builder()).await;
    let gateway = call.gateway.clone();
    let telephony = call.telephony.clone();

    call.hang_up();
    call.join().await.unwrap();
    assert!(!gateway.is_open());
    assert!(!telephony.is_open());
}

#[tokio::test(start_paused = true)]
async fn gateway_drop_closes_telephony_and_cancels_tools() {
    let tool = ScriptedTool::new("check_inventory", Duration::from_secs(60), "late");
    let mut call = started_call(CallHarness::builder().with_tool(tool)).await;

    call.function_call("call_1", "check_inventory", json!({}));
    call.settle().await;
    call.drain_gateway();

    let telephony = call.telephony.clone();
    call.drop_gateway();
    call.settle().await;
    assert!(!telephony.is_open());

    call.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn ledger_tracks_response_lifecycle() {
    let call = started_call(CallHarness::builder()).await;

    call.response_status(true, "resp_1", "in_progress");
    call.settle().await;
    assert!(call.ledger.is_latest_in_progress());

    call.response_status(false, "resp_1", "completed");
    call.settle().await;
    assert!(!call.ledger.is_latest_in_progress());
    assert_eq!(call.ledger.lock().records().len(), 1);
}
