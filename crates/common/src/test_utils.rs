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

//! Test doubles for the collaborator contracts.
//!
//! [`MockDebugClient`] is a scriptable backend: tests preload its sources,
//! routines, stacks and evaluator results, then assert on the exact sequence
//! of backend calls the proxy made. Its Continue primitive is a channel
//! rendezvous; dropping the pause sender plays the role of the debuggee
//! exiting.

use crate::{
    client::{DebugClient, RuntimeBridge},
    types::{
        DebuggerState, EvalScope, FunctionInfo, LoadConfig, RemoteObject, RemoteObjectKind,
        Routine, RoutineId, SourceLocation, Stackframe, Variable,
    },
};
use async_trait::async_trait;
use eyre::{bail, Result};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};
use tokio::sync::{mpsc, Mutex as AsyncMutex};

/// One recorded backend call, in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// `block_until_ready`
    BlockUntilReady,
    /// `get_state`
    GetState,
    /// `list_sources`
    ListSources,
    /// `list_routines`
    ListRoutines,
    /// `switch_routine(id)`
    SwitchRoutine(RoutineId),
    /// `next`
    Next,
    /// `step`
    Step,
    /// `step_out`
    StepOut,
    /// `continue_execution`
    Continue,
    /// `create_breakpoint_at_line(file, line, name)`
    CreateBreakpoint {
        /// Source file
        file: String,
        /// One-based line
        line: i64,
        /// Breakpoint name (the fingerprint)
        name: String,
    },
    /// `clear_breakpoint_by_name(name)`
    ClearBreakpoint {
        /// Breakpoint name (the fingerprint)
        name: String,
    },
    /// `stacktrace(routine, depth, _)`
    Stacktrace {
        /// Routine queried
        routine: RoutineId,
        /// Requested depth
        depth: i64,
    },
    /// `eval_variable(scope, expression, _)`
    EvalVariable {
        /// Routine evaluated on
        routine: RoutineId,
        /// Frame index evaluated on
        frame: i64,
        /// The expression
        expression: String,
    },
}

#[derive(Default)]
struct MockState {
    state: DebuggerState,
    sources: Vec<String>,
    routines: Vec<Routine>,
    stacks: HashMap<RoutineId, Vec<Stackframe>>,
    eval_results: HashMap<String, Result<Variable, String>>,
    breakpoint_error: Option<String>,
    switch_error: Option<String>,
    stacktrace_error: Option<String>,
}

/// Scriptable [`DebugClient`] for tests.
pub struct MockDebugClient {
    inner: Mutex<MockState>,
    calls: Mutex<Vec<MockCall>>,
    continue_rx: AsyncMutex<mpsc::UnboundedReceiver<DebuggerState>>,
}

impl MockDebugClient {
    /// Create a mock plus the sender that feeds its Continue rendezvous.
    ///
    /// Each value sent becomes the state Continue completes with; dropping
    /// the sender makes the next Continue report that the debuggee exited.
    pub fn new() -> (Self, mpsc::UnboundedSender<DebuggerState>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = Self {
            inner: Mutex::new(MockState::default()),
            calls: Mutex::new(Vec::new()),
            continue_rx: AsyncMutex::new(rx),
        };
        (client, tx)
    }

    /// All backend calls made so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().expect("mock calls lock").clone()
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&MockCall) -> bool) -> usize {
        self.calls.lock().expect("mock calls lock").iter().filter(|c| predicate(c)).count()
    }

    /// Replace the source file list reported by `list_sources`.
    pub fn set_sources(&self, sources: Vec<&str>) {
        self.lock().sources = sources.into_iter().map(String::from).collect();
    }

    /// Replace the routine listing reported by `list_routines`.
    pub fn set_routines(&self, routines: Vec<Routine>) {
        self.lock().routines = routines;
    }

    /// Set the stack returned for one routine.
    pub fn set_stack(&self, routine: RoutineId, stack: Vec<Stackframe>) {
        self.lock().stacks.insert(routine, stack);
    }

    /// Set the routine the backend reports as selected.
    pub fn set_selected(&self, routine: Option<Routine>) {
        self.lock().state.selected_routine = routine;
    }

    /// Mark the debuggee as running (state queries will claim not-paused).
    pub fn set_running(&self, running: bool) {
        self.lock().state.running = running;
    }

    /// Script the evaluator's answer for one expression.
    pub fn set_eval_result(&self, expression: &str, result: Result<Variable, &str>) {
        self.lock()
            .eval_results
            .insert(expression.to_string(), result.map_err(String::from));
    }

    /// Make breakpoint creation fail with `message`.
    pub fn fail_breakpoints(&self, message: &str) {
        self.lock().breakpoint_error = Some(message.to_string());
    }

    /// Make routine switching fail with `message`.
    pub fn fail_switch(&self, message: &str) {
        self.lock().switch_error = Some(message.to_string());
    }

    /// Make stack fetches fail with `message`.
    pub fn fail_stacktrace(&self, message: &str) {
        self.lock().stacktrace_error = Some(message.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.inner.lock().expect("mock state lock")
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().expect("mock calls lock").push(call);
    }
}

#[async_trait]
impl DebugClient for MockDebugClient {
    async fn block_until_ready(&self) -> Result<()> {
        self.record(MockCall::BlockUntilReady);
        Ok(())
    }

    async fn get_state(&self) -> Result<DebuggerState> {
        self.record(MockCall::GetState);
        Ok(self.lock().state.clone())
    }

    async fn list_sources(&self) -> Result<Vec<String>> {
        self.record(MockCall::ListSources);
        Ok(self.lock().sources.clone())
    }

    async fn list_routines(&self) -> Result<Vec<Routine>> {
        self.record(MockCall::ListRoutines);
        Ok(self.lock().routines.clone())
    }

    async fn switch_routine(&self, id: RoutineId) -> Result<DebuggerState> {
        self.record(MockCall::SwitchRoutine(id));
        let mut inner = self.lock();
        if let Some(message) = &inner.switch_error {
            bail!("{message}");
        }
        let selected = inner
            .routines
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .unwrap_or_else(|| routine(id.0, "<unknown>", 0, None));
        inner.state.selected_routine = Some(selected);
        Ok(inner.state.clone())
    }

    async fn next(&self) -> Result<DebuggerState> {
        self.record(MockCall::Next);
        Ok(self.lock().state.clone())
    }

    async fn step(&self) -> Result<DebuggerState> {
        self.record(MockCall::Step);
        Ok(self.lock().state.clone())
    }

    async fn step_out(&self) -> Result<DebuggerState> {
        self.record(MockCall::StepOut);
        Ok(self.lock().state.clone())
    }

    async fn continue_execution(&self) -> Result<Option<DebuggerState>> {
        self.record(MockCall::Continue);
        let mut rx = self.continue_rx.lock().await;
        match rx.recv().await {
            Some(state) => {
                self.lock().state = state.clone();
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    async fn create_breakpoint_at_line(&self, file: &str, line: i64, name: &str) -> Result<()> {
        self.record(MockCall::CreateBreakpoint {
            file: file.to_string(),
            line,
            name: name.to_string(),
        });
        if let Some(message) = &self.lock().breakpoint_error {
            bail!("{message}");
        }
        Ok(())
    }

    async fn clear_breakpoint_by_name(&self, name: &str) -> Result<()> {
        self.record(MockCall::ClearBreakpoint { name: name.to_string() });
        if let Some(message) = &self.lock().breakpoint_error {
            bail!("{message}");
        }
        Ok(())
    }

    async fn stacktrace(
        &self,
        routine: RoutineId,
        depth: i64,
        _cfg: &LoadConfig,
    ) -> Result<Vec<Stackframe>> {
        self.record(MockCall::Stacktrace { routine, depth });
        let inner = self.lock();
        if let Some(message) = &inner.stacktrace_error {
            bail!("{message}");
        }
        Ok(inner.stacks.get(&routine).cloned().unwrap_or_default())
    }

    async fn eval_variable(
        &self,
        scope: EvalScope,
        expression: &str,
        _cfg: &LoadConfig,
    ) -> Result<Variable> {
        self.record(MockCall::EvalVariable {
            routine: scope.routine_id,
            frame: scope.frame,
            expression: expression.to_string(),
        });
        match self.lock().eval_results.get(expression) {
            Some(Ok(variable)) => Ok(variable.clone()),
            Some(Err(message)) => bail!("{message}"),
            None => bail!("could not evaluate expression: {expression}"),
        }
    }
}

/// [`RuntimeBridge`] stub that records context creation and projects
/// variables into plain value objects.
#[derive(Default)]
pub struct StubRuntime {
    context_created: AtomicBool,
}

impl StubRuntime {
    /// Whether `create_context` was invoked.
    pub fn context_created(&self) -> bool {
        self.context_created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RuntimeBridge for StubRuntime {
    async fn create_context(&self) -> Result<()> {
        self.context_created.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn make_remote_object(&self, variable: &Variable) -> RemoteObject {
        RemoteObject {
            kind: RemoteObjectKind::Object,
            object_id: None,
            value: Some(serde_json::Value::String(variable.value.clone())),
            description: Some(variable.type_name.clone()),
        }
    }
}

/// Shorthand for building a [`Routine`] fixture.
pub fn routine(id: i64, file: &str, line: i64, function: Option<&str>) -> Routine {
    Routine {
        id: RoutineId(id),
        current_loc: SourceLocation {
            file: file.to_string(),
            line,
            function: function.map(|name| FunctionInfo { name: name.to_string() }),
        },
    }
}

/// Shorthand for building a [`Stackframe`] fixture.
pub fn stackframe(file: &str, line: i64, function: Option<&str>) -> Stackframe {
    Stackframe {
        location: SourceLocation {
            file: file.to_string(),
            line,
            function: function.map(|name| FunctionInfo { name: name.to_string() }),
        },
    }
}

/// A paused state with `routine` selected.
pub fn paused_state(selected: Option<Routine>) -> DebuggerState {
    DebuggerState { running: false, selected_routine: selected }
}
