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

//! Contracts of the two external collaborators.
//!
//! The proxy core never talks to a concrete debugger or Runtime agent; it is
//! generic over these traits. Production embedders wire in the real backend
//! client library and the Runtime companion, tests wire in the mocks from
//! [`crate::test_utils`].

use crate::types::{
    DebuggerState, EvalScope, LoadConfig, RemoteObject, Routine, RoutineId, Stackframe, Variable,
};
use async_trait::async_trait;
use eyre::Result;

/// Client of the backend debugger.
///
/// All operations may block their task on the debuggee; `continue_execution`
/// blocks until the next pause. Implementations must be shareable across the
/// proxy's concurrently dispatched command handlers.
#[async_trait]
pub trait DebugClient: Send + Sync + 'static {
    /// Wait until the backend has attached and is ready to serve requests.
    async fn block_until_ready(&self) -> Result<()>;

    /// Query the current debugger state.
    async fn get_state(&self) -> Result<DebuggerState>;

    /// List every source file compiled into the debuggee.
    async fn list_sources(&self) -> Result<Vec<String>>;

    /// List all live routines.
    async fn list_routines(&self) -> Result<Vec<Routine>>;

    /// Make `id` the routine the resume primitives operate on.
    async fn switch_routine(&self, id: RoutineId) -> Result<DebuggerState>;

    /// Step over the current line; returns when the step completed.
    async fn next(&self) -> Result<DebuggerState>;

    /// Step into the current call; returns when the step completed.
    async fn step(&self) -> Result<DebuggerState>;

    /// Run until the current function returns.
    async fn step_out(&self) -> Result<DebuggerState>;

    /// Resume execution. Completes at the next pause with the new state, or
    /// with `None` when the debuggee exited instead of pausing again.
    async fn continue_execution(&self) -> Result<Option<DebuggerState>>;

    /// Create a named breakpoint at a one-based source line.
    async fn create_breakpoint_at_line(&self, file: &str, line: i64, name: &str) -> Result<()>;

    /// Clear a breakpoint previously created under `name`.
    async fn clear_breakpoint_by_name(&self, name: &str) -> Result<()>;

    /// Fetch up to `depth` frames of a routine's stack.
    async fn stacktrace(
        &self,
        routine: RoutineId,
        depth: i64,
        cfg: &LoadConfig,
    ) -> Result<Vec<Stackframe>>;

    /// Evaluate an expression in the given scope.
    async fn eval_variable(
        &self,
        scope: EvalScope,
        expression: &str,
        cfg: &LoadConfig,
    ) -> Result<Variable>;
}

/// The Runtime companion that owns remote object materialization.
#[async_trait]
pub trait RuntimeBridge: Send + Sync + 'static {
    /// Announce the (single) execution context to the front-end. Called once
    /// during proxy startup.
    async fn create_context(&self) -> Result<()>;

    /// Project an evaluator result into a RemoteObject the front-end can
    /// render and expand.
    fn make_remote_object(&self, variable: &Variable) -> RemoteObject;
}
