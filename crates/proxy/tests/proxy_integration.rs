// RDT - Routine DevTools Bridge
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! End-to-end tests of the proxy over a scripted backend.
//!
//! Each test boots a full session: mock debugger client, stub Runtime
//! companion, a command channel playing the transport's inbound side and an
//! event channel playing its outbound side.

use rdt_common::{
    error_codes,
    test_utils::{paused_state, routine, stackframe, MockCall, MockDebugClient, StubRuntime},
    DebuggerState, EvaluateOnCallFrameParams, GetScriptSourceParams, RemoveBreakpointParams,
    SetBreakpointByUrlParams, SetBreakpointByUrlReturn, StepParams,
};
use rdt_proxy::{
    breakpoints::fingerprint, Command, CommandResult, DebuggerCommand, DebuggerProxy,
    OutboundEvent, ProxyConfig, ProxyHandle,
};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::timeout;

struct Session {
    client: Arc<MockDebugClient>,
    runtime: Arc<StubRuntime>,
    pause_tx: mpsc::UnboundedSender<DebuggerState>,
    commands: mpsc::Sender<DebuggerCommand>,
    events: mpsc::UnboundedReceiver<OutboundEvent>,
    handle: ProxyHandle,
    shutdown_rx: broadcast::Receiver<()>,
}

/// Boot a session: configure the mock, send Enable, run the startup
/// sequence, consume the startup scriptParsed events and wait for the
/// initial pause snapshot to have run.
async fn start_session(
    sources: Vec<&str>,
    configure: impl FnOnce(&MockDebugClient),
) -> Session {
    rdt_utils::logging::ensure_test_logging(None);

    let (client, pause_tx) = MockDebugClient::new();
    client.set_sources(sources.clone());
    configure(&client);
    let client = Arc::new(client);
    let runtime = Arc::new(StubRuntime::default());

    let (event_tx, mut events) = mpsc::unbounded_channel();
    let (commands, command_rx) = mpsc::channel(64);

    let proxy = DebuggerProxy::new(
        client.clone(),
        runtime.clone(),
        event_tx,
        command_rx,
        ProxyConfig::default(),
    );

    let (enable, enable_rx) = Command::new(());
    commands.send(DebuggerCommand::Enable(enable)).await.unwrap();

    let handle = proxy.start().await.expect("proxy startup failed");
    let shutdown_rx = handle.subscribe_shutdown();
    assert_eq!(enable_rx.await.unwrap().unwrap(), json!({}));

    let announced: Vec<&str> =
        sources.into_iter().filter(|s| *s != "<autogenerated>").collect();
    for source in &announced {
        let event = next_event(&mut events).await;
        assert_eq!(event.method, "Debugger.scriptParsed");
        assert_eq!(event.target_id, None);
        assert_eq!(event.params["scriptId"], *source);
        assert_eq!(event.params["url"], *source);
        assert_eq!(event.params["executionContextId"], 1);
    }

    // The initial pause snapshot runs concurrently with source listing; wait
    // until its routine sync has hit the backend.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while client.count_calls(|c| matches!(c, MockCall::ListRoutines)) == 0 {
        assert!(tokio::time::Instant::now() < deadline, "initial snapshot never ran");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    Session { client, runtime, pause_tx, commands, events, handle, shutdown_rx }
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<OutboundEvent>) -> OutboundEvent {
    timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event channel closed")
}

async fn next_events(
    events: &mut mpsc::UnboundedReceiver<OutboundEvent>,
    count: usize,
) -> Vec<OutboundEvent> {
    let mut collected = Vec::with_capacity(count);
    for _ in 0..count {
        collected.push(next_event(events).await);
    }
    collected
}

async fn await_response(rx: oneshot::Receiver<CommandResult>) -> CommandResult {
    timeout(Duration::from_secs(2), rx)
        .await
        .expect("timed out waiting for a response")
        .expect("responder dropped")
}

async fn expect_shutdown(shutdown_rx: &mut broadcast::Receiver<()>) {
    timeout(Duration::from_secs(2), shutdown_rx.recv())
        .await
        .expect("timed out waiting for shutdown")
        .expect("shutdown channel closed");
}

/// Attach targets by stepping once with `destination`; drains and returns
/// the resulting events so tests start from a settled session.
async fn step_and_drain(
    session: &mut Session,
    destination: Option<&str>,
    expected_events: usize,
) -> Vec<OutboundEvent> {
    let (cmd, rx) = Command::new(StepParams {
        destination_target_id: destination.map(String::from),
    });
    session.commands.send(DebuggerCommand::StepOver(cmd)).await.unwrap();
    assert_eq!(await_response(rx).await.unwrap(), json!({}));
    next_events(&mut session.events, expected_events).await
}

#[tokio::test]
async fn test_enable_then_startup_announces_each_real_source() {
    let session = start_session(
        vec!["/a/b.src", "<autogenerated>", "/a/c.src"],
        |_client| {},
    )
    .await;

    // `<autogenerated>` was filtered: only the two real sources were
    // announced (asserted inside start_session) and nothing else arrived.
    assert_eq!(
        session.client.count_calls(|c| matches!(c, MockCall::ListSources)),
        1
    );
}

#[tokio::test]
async fn test_startup_adopts_the_selected_routine() {
    let mut session = start_session(vec!["/a/b.src"], |client| {
        client.set_selected(Some(routine(7, "/a/b.src", 3, Some("pkg.main"))));
    })
    .await;

    session.client.set_routines(vec![routine(7, "/a/b.src", 3, Some("pkg.main"))]);
    session
        .client
        .set_stack(rdt_common::RoutineId(7), vec![stackframe("/a/b.src", 3, Some("pkg.main"))]);

    // A step without destination drives the routine startup selected.
    let (cmd, rx) = Command::new(StepParams::default());
    session.commands.send(DebuggerCommand::StepOver(cmd)).await.unwrap();
    assert_eq!(await_response(rx).await.unwrap(), json!({}));

    let calls = session.client.calls();
    assert!(calls.contains(&MockCall::SwitchRoutine(rdt_common::RoutineId(7))));
}

#[tokio::test]
async fn test_set_then_remove_breakpoint_round_trip() {
    let mut session = start_session(vec!["/a/b.src"], |_client| {}).await;

    let (cmd, rx) = Command::new(SetBreakpointByUrlParams {
        line_number: 10,
        url: Some("/a/b.src".into()),
        ..Default::default()
    });
    session.commands.send(DebuggerCommand::SetBreakpointByUrl(cmd)).await.unwrap();

    let ret: SetBreakpointByUrlReturn =
        serde_json::from_value(await_response(rx).await.unwrap()).unwrap();
    let expected_id = fingerprint("/a/b.src", 10);
    assert_eq!(ret.breakpoint_id, expected_id);
    assert_eq!(ret.locations.len(), 1);
    assert_eq!(ret.locations[0].script_id, "/a/b.src");
    assert_eq!(ret.locations[0].line_number, 10);

    assert!(session.client.calls().contains(&MockCall::CreateBreakpoint {
        file: "/a/b.src".into(),
        line: 11,
        name: expected_id.clone(),
    }));

    let (cmd, rx) = Command::new(RemoveBreakpointParams { breakpoint_id: expected_id.clone() });
    session.commands.send(DebuggerCommand::RemoveBreakpoint(cmd)).await.unwrap();
    assert_eq!(await_response(rx).await.unwrap(), json!({}));
    assert!(session
        .client
        .calls()
        .contains(&MockCall::ClearBreakpoint { name: expected_id }));
}

#[tokio::test]
async fn test_breakpoint_with_url_regex_is_rejected_before_the_backend() {
    let mut session = start_session(vec!["/a/b.src"], |_client| {}).await;

    let (cmd, rx) = Command::new(SetBreakpointByUrlParams {
        line_number: 0,
        url_regex: Some(".*".into()),
        ..Default::default()
    });
    session.commands.send(DebuggerCommand::SetBreakpointByUrl(cmd)).await.unwrap();

    let err = await_response(rx).await.unwrap_err();
    assert_eq!(err.code, error_codes::INVALID_PARAMS);
    assert_eq!(err.message, "urlRegex not available");
    assert_eq!(
        session.client.count_calls(|c| matches!(c, MockCall::CreateBreakpoint { .. })),
        0
    );
}

#[tokio::test]
async fn test_unsupported_commands_always_answer_method_not_found() {
    let mut session = start_session(vec!["/a/b.src"], |_client| {}).await;

    let constructors: Vec<fn(Command<serde_json::Value>) -> DebuggerCommand> = vec![
        DebuggerCommand::Disable,
        DebuggerCommand::SetBreakpointsActive,
        DebuggerCommand::SetSkipAllPauses,
        DebuggerCommand::SetBreakpoint,
        DebuggerCommand::GetPossibleBreakpoints,
        DebuggerCommand::ContinueToLocation,
        DebuggerCommand::Pause,
        DebuggerCommand::SearchInContent,
        DebuggerCommand::SetScriptSource,
        DebuggerCommand::RestartFrame,
        DebuggerCommand::SetPauseOnExceptions,
        DebuggerCommand::SetVariableValue,
        DebuggerCommand::SetAsyncCallStackDepth,
        DebuggerCommand::SetBlackboxPatterns,
        DebuggerCommand::SetBlackboxedRanges,
    ];

    for constructor in constructors {
        // Arbitrary payloads must not change the outcome.
        let (cmd, rx) = Command::new(json!({"anything": [1, 2, 3]}));
        session.commands.send(constructor(cmd)).await.unwrap();
        let err = await_response(rx).await.unwrap_err();
        assert_eq!(err.code, error_codes::METHOD_NOT_FOUND);
    }
}

#[tokio::test]
async fn test_step_with_target_switch_drives_the_destination_routine() {
    let mut session = start_session(vec!["/a/b.src"], |client| {
        client.set_selected(Some(routine(7, "/a/b.src", 3, Some("pkg.main"))));
    })
    .await;

    session.client.set_routines(vec![
        routine(7, "/a/b.src", 3, Some("pkg.main")),
        routine(42, "/a/b.src", 8, Some("pkg.worker.run")),
    ]);
    session
        .client
        .set_stack(rdt_common::RoutineId(7), vec![stackframe("/a/b.src", 3, Some("pkg.main"))]);
    session.client.set_stack(
        rdt_common::RoutineId(42),
        vec![stackframe("/a/b.src", 12, Some("pkg.worker.run"))],
    );

    let (cmd, rx) = Command::new(StepParams { destination_target_id: Some("42".into()) });
    session.commands.send(DebuggerCommand::StepOver(cmd)).await.unwrap();
    assert_eq!(await_response(rx).await.unwrap(), json!({}));

    // Backend saw the switch before the step primitive.
    let calls = session.client.calls();
    let switch_at = calls
        .iter()
        .position(|c| *c == MockCall::SwitchRoutine(rdt_common::RoutineId(42)))
        .expect("no switch recorded");
    let next_at = calls.iter().position(|c| *c == MockCall::Next).expect("no step recorded");
    assert!(switch_at < next_at);

    // Fan-out (no targets yet), attach 7, attach 42, active pause, other pause.
    let events = next_events(&mut session.events, 7).await;
    assert_eq!(events[0].method, "Debugger.resumed");
    assert_eq!(events[0].target_id, None);
    assert_eq!(events[1].method, "Target.attachedToTarget");
    assert_eq!(events[1].params["targetInfo"]["targetId"], "7");
    assert_eq!(events[2].method, "Debugger.scriptParsed");
    assert_eq!(events[2].target_id.as_deref(), Some("7"));
    assert_eq!(events[3].method, "Target.attachedToTarget");
    assert_eq!(events[3].params["targetInfo"]["targetId"], "42");
    assert_eq!(events[3].params["targetInfo"]["url"], "42: run");
    assert_eq!(events[4].method, "Debugger.scriptParsed");
    assert_eq!(events[4].target_id.as_deref(), Some("42"));

    // The default-agent pause mirrors routine 42's stack, zero-based.
    assert_eq!(events[5].method, "Debugger.paused");
    assert_eq!(events[5].target_id, None);
    assert_eq!(events[5].params["reason"], "other");
    let frame = &events[5].params["callFrames"][0];
    assert_eq!(frame["callFrameId"], "0");
    assert_eq!(frame["functionName"], "pkg.worker.run");
    assert_eq!(frame["location"]["scriptId"], "/a/b.src");
    assert_eq!(frame["location"]["lineNumber"], 11);
    assert_eq!(frame["this"]["type"], "undefined");
    assert_eq!(frame["scopeChain"][0]["type"], "local");
    assert_eq!(frame["scopeChain"][0]["object"]["objectId"], "local:0");

    // The non-active routine pauses inside its own target session, after the
    // default view.
    assert_eq!(events[6].method, "Debugger.paused");
    assert_eq!(events[6].target_id.as_deref(), Some("7"));
    assert_eq!(events[6].params["callFrames"][0]["location"]["lineNumber"], 2);
}

#[tokio::test]
async fn test_target_lifecycle_detaches_vanished_routines_exactly_once() {
    let mut session = start_session(vec!["/a/b.src"], |_client| {}).await;

    session.client.set_routines(vec![
        routine(1, "/a/b.src", 2, Some("pkg.one")),
        routine(2, "/a/b.src", 4, Some("pkg.two")),
    ]);
    session
        .client
        .set_stack(rdt_common::RoutineId(1), vec![stackframe("/a/b.src", 2, Some("pkg.one"))]);
    session
        .client
        .set_stack(rdt_common::RoutineId(2), vec![stackframe("/a/b.src", 4, Some("pkg.two"))]);

    // Attach both targets; active becomes 1.
    // resumed + (attach+script)*2 + default paused + other paused = 7 events
    let events = step_and_drain(&mut session, Some("1"), 7).await;
    let attached: Vec<_> =
        events.iter().filter(|e| e.method == "Target.attachedToTarget").collect();
    assert_eq!(attached.len(), 2);

    // Routine 1 vanishes; the next snapshot detaches it exactly once and the
    // active view adopts the smallest survivor.
    session.client.set_routines(vec![routine(2, "/a/b.src", 4, Some("pkg.two"))]);

    // resumed on "1", resumed on "2", default resumed, detach 1, default paused
    let events = step_and_drain(&mut session, None, 5).await;
    let detach_count =
        events.iter().filter(|e| e.method == "Target.detachedFromTarget").count();
    assert_eq!(detach_count, 1);
    let detach_at = events
        .iter()
        .position(|e| e.method == "Target.detachedFromTarget")
        .unwrap();
    assert_eq!(events[detach_at].params["targetId"], "1");

    // After the detach, nothing addresses target 1 again.
    for event in &events[detach_at + 1..] {
        assert_ne!(event.target_id.as_deref(), Some("1"));
    }

    // The default pause now mirrors routine 2 (smallest surviving id).
    let paused = events.iter().find(|e| e.method == "Debugger.paused").unwrap();
    assert_eq!(paused.target_id, None);
    assert_eq!(paused.params["callFrames"][0]["functionName"], "pkg.two");
}

#[tokio::test]
async fn test_resume_acks_first_fans_out_then_snapshots_after_the_pause() {
    let mut session = start_session(vec!["/a/b.src"], |_client| {}).await;

    session.client.set_routines(vec![
        routine(1, "/a/b.src", 2, Some("pkg.one")),
        routine(2, "/a/b.src", 4, Some("pkg.two")),
    ]);
    session
        .client
        .set_stack(rdt_common::RoutineId(1), vec![stackframe("/a/b.src", 2, Some("pkg.one"))]);
    session
        .client
        .set_stack(rdt_common::RoutineId(2), vec![stackframe("/a/b.src", 4, Some("pkg.two"))]);
    step_and_drain(&mut session, Some("1"), 7).await;

    let (cmd, rx) = Command::new(StepParams::default());
    session.commands.send(DebuggerCommand::Resume(cmd)).await.unwrap();

    // Acknowledged while Continue is still blocked.
    assert_eq!(await_response(rx).await.unwrap(), json!({}));

    // Per-target resumes precede the default-agent resume.
    let fan_out = next_events(&mut session.events, 3).await;
    let mut target_ids: Vec<_> = fan_out[..2]
        .iter()
        .map(|e| {
            assert_eq!(e.method, "Debugger.resumed");
            e.target_id.clone().expect("per-target resume")
        })
        .collect();
    target_ids.sort();
    assert_eq!(target_ids, vec!["1".to_string(), "2".to_string()]);
    assert_eq!(fan_out[2].method, "Debugger.resumed");
    assert_eq!(fan_out[2].target_id, None);

    // The backend pauses with routine 2 selected; the active view follows.
    session
        .pause_tx
        .send(paused_state(Some(routine(2, "/a/b.src", 4, Some("pkg.two")))))
        .unwrap();

    let snapshot = next_events(&mut session.events, 2).await;
    let default_paused =
        snapshot.iter().find(|e| e.method == "Debugger.paused" && e.target_id.is_none());
    let target_paused = snapshot
        .iter()
        .find(|e| e.method == "Debugger.paused" && e.target_id.as_deref() == Some("1"));
    let default_paused = default_paused.expect("no default pause");
    assert!(target_paused.is_some());
    assert_eq!(default_paused.params["callFrames"][0]["functionName"], "pkg.two");

    // Active pause is emitted before the per-target one.
    let default_at = snapshot
        .iter()
        .position(|e| e.target_id.is_none())
        .unwrap();
    assert_eq!(default_at, 0);
}

#[tokio::test]
async fn test_debuggee_exit_during_resume_is_fatal() {
    let mut session = start_session(vec!["/a/b.src"], |_client| {}).await;

    let (cmd, rx) = Command::new(StepParams::default());
    session.commands.send(DebuggerCommand::Resume(cmd)).await.unwrap();
    assert_eq!(await_response(rx).await.unwrap(), json!({}));

    // Closing the pause channel is the debuggee exiting.
    drop(session.pause_tx);
    expect_shutdown(&mut session.shutdown_rx).await;
}

#[tokio::test]
async fn test_evaluate_projects_through_the_runtime_bridge() {
    let mut session = start_session(vec!["/a/b.src"], |client| {
        client.set_eval_result(
            "count",
            Ok(rdt_common::Variable {
                name: "count".into(),
                type_name: "int".into(),
                value: "3".into(),
            }),
        );
    })
    .await;

    let (cmd, rx) = Command::new(EvaluateOnCallFrameParams {
        call_frame_id: "2".into(),
        expression: "count".into(),
        destination_target_id: Some("9".into()),
    });
    session.commands.send(DebuggerCommand::EvaluateOnCallFrame(cmd)).await.unwrap();

    let value = await_response(rx).await.unwrap();
    assert_eq!(value["result"]["type"], "object");
    assert_eq!(value["result"]["value"], "3");
    assert_eq!(value["result"]["description"], "int");
    assert!(value.get("exceptionDetails").is_none());

    assert!(session.client.calls().contains(&MockCall::EvalVariable {
        routine: rdt_common::RoutineId(9),
        frame: 2,
        expression: "count".into(),
    }));
}

#[tokio::test]
async fn test_evaluator_failure_is_returned_as_exception_details() {
    let mut session = start_session(vec!["/a/b.src"], |client| {
        client.set_eval_result("oops", Err("undefined symbol"));
    })
    .await;

    let (cmd, rx) = Command::new(EvaluateOnCallFrameParams {
        call_frame_id: "0".into(),
        expression: "oops".into(),
        destination_target_id: None,
    });
    session.commands.send(DebuggerCommand::EvaluateOnCallFrame(cmd)).await.unwrap();

    // The command succeeds; the failure is data.
    let value = await_response(rx).await.unwrap();
    assert!(value.get("result").is_none());
    assert_eq!(value["exceptionDetails"]["exceptionId"], 1);
    assert_eq!(value["exceptionDetails"]["text"], "undefined symbol");
    assert_eq!(value["exceptionDetails"]["lineNumber"], -1);
    assert_eq!(value["exceptionDetails"]["columnNumber"], -1);
}

#[tokio::test]
async fn test_non_decimal_call_frame_id_is_fatal() {
    let mut session = start_session(vec!["/a/b.src"], |_client| {}).await;

    let (cmd, rx) = Command::new(EvaluateOnCallFrameParams {
        call_frame_id: "frame-0".into(),
        expression: "x".into(),
        destination_target_id: None,
    });
    session.commands.send(DebuggerCommand::EvaluateOnCallFrame(cmd)).await.unwrap();

    // No response is produced; the proxy goes down instead.
    assert!(timeout(Duration::from_secs(2), rx).await.expect("timed out").is_err());
    expect_shutdown(&mut session.shutdown_rx).await;
}

#[tokio::test]
async fn test_get_script_source_serves_announced_files_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("b.src");
    std::fs::write(&path, "routine main() {}\n").unwrap();
    let path_str = path.to_str().unwrap().to_string();

    let mut session = start_session(vec![&path_str], |_client| {}).await;

    let (cmd, rx) = Command::new(GetScriptSourceParams { script_id: path_str.clone() });
    session.commands.send(DebuggerCommand::GetScriptSource(cmd)).await.unwrap();
    let value = await_response(rx).await.unwrap();
    assert_eq!(value["scriptSource"], "routine main() {}\n");

    // A path the backend never announced is refused without a read.
    let (cmd, rx) = Command::new(GetScriptSourceParams { script_id: "/etc/passwd".into() });
    session.commands.send(DebuggerCommand::GetScriptSource(cmd)).await.unwrap();
    let err = await_response(rx).await.unwrap_err();
    assert_eq!(err.code, error_codes::INVALID_PARAMS);
}

#[tokio::test]
async fn test_unreadable_announced_script_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.src");
    std::fs::write(&path, "x\n").unwrap();
    let path_str = path.to_str().unwrap().to_string();

    let mut session = start_session(vec![&path_str], |_client| {}).await;
    std::fs::remove_file(&path).unwrap();

    let (cmd, rx) = Command::new(GetScriptSourceParams { script_id: path_str });
    session.commands.send(DebuggerCommand::GetScriptSource(cmd)).await.unwrap();

    assert!(timeout(Duration::from_secs(2), rx).await.expect("timed out").is_err());
    expect_shutdown(&mut session.shutdown_rx).await;
}

#[tokio::test]
async fn test_commands_sent_before_enable_are_served_after_startup() {
    rdt_utils::logging::ensure_test_logging(None);

    let (client, _pause_tx) = MockDebugClient::new();
    client.set_sources(vec!["/a/b.src"]);
    let client = Arc::new(client);
    let runtime = Arc::new(StubRuntime::default());

    let (event_tx, _events) = mpsc::unbounded_channel();
    let (commands, command_rx) = mpsc::channel(64);
    let proxy = DebuggerProxy::new(
        client.clone(),
        runtime.clone(),
        event_tx,
        command_rx,
        ProxyConfig::default(),
    );

    // A breakpoint arrives before Enable; it must be buffered, not lost.
    let (bp_cmd, bp_rx) = Command::new(SetBreakpointByUrlParams {
        line_number: 10,
        url: Some("/a/b.src".into()),
        ..Default::default()
    });
    commands.send(DebuggerCommand::SetBreakpointByUrl(bp_cmd)).await.unwrap();

    let (enable, enable_rx) = Command::new(());
    commands.send(DebuggerCommand::Enable(enable)).await.unwrap();

    let _handle = proxy.start().await.expect("proxy startup failed");
    assert!(await_response(enable_rx).await.is_ok());

    let ret: SetBreakpointByUrlReturn =
        serde_json::from_value(await_response(bp_rx).await.unwrap()).unwrap();
    assert_eq!(ret.breakpoint_id, fingerprint("/a/b.src", 10));
}

#[tokio::test]
async fn test_embedder_can_request_shutdown_through_the_handle() {
    let mut session = start_session(vec!["/a/b.src"], |_client| {}).await;
    session.handle.shutdown();
    expect_shutdown(&mut session.shutdown_rx).await;
}

#[tokio::test]
async fn test_startup_creates_the_runtime_context() {
    let session = start_session(vec!["/a/b.src"], |_client| {}).await;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !session.runtime.context_created() {
        assert!(tokio::time::Instant::now() < deadline, "runtime context never created");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_stacktrace_failure_in_the_pause_path_is_fatal() {
    let mut session = start_session(vec!["/a/b.src"], |_client| {}).await;

    session.client.set_routines(vec![routine(1, "/a/b.src", 2, Some("pkg.one"))]);
    session.client.fail_stacktrace("backend detached");

    let (cmd, rx) = Command::new(StepParams::default());
    session.commands.send(DebuggerCommand::StepOver(cmd)).await.unwrap();

    // The step itself succeeds; the snapshot afterwards is what dies.
    assert_eq!(await_response(rx).await.unwrap(), json!({}));
    expect_shutdown(&mut session.shutdown_rx).await;
}
