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

//! Command routing.
//!
//! Every parsed command meets one of three fates: Enable is acknowledged in
//! place, the unsupported set is answered method-not-found in place, and the
//! real work is spawned onto its own task so a handler blocked on the backend
//! (a Continue can block for minutes) never stalls the stream.

use crate::{
    commands::DebuggerCommand,
    proxy::{ProxyShared, StepKind},
};
use rdt_common::{error_codes, DebugClient, RuntimeBridge};
use std::{collections::VecDeque, sync::Arc};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// The command classification loop.
pub struct CommandRouter<C, R> {
    shared: Arc<ProxyShared<C, R>>,
    commands: mpsc::Receiver<DebuggerCommand>,
    backlog: VecDeque<DebuggerCommand>,
}

impl<C, R> CommandRouter<C, R>
where
    C: DebugClient,
    R: RuntimeBridge,
{
    pub(crate) fn new(
        shared: Arc<ProxyShared<C, R>>,
        commands: mpsc::Receiver<DebuggerCommand>,
        backlog: VecDeque<DebuggerCommand>,
    ) -> Self {
        Self { shared, commands, backlog }
    }

    /// Drain the backlog, then route until the stream closes or the proxy
    /// shuts down.
    pub(crate) async fn run(mut self) {
        let mut shutdown = self.shared.subscribe_shutdown();

        while let Some(command) = self.backlog.pop_front() {
            self.dispatch(command);
        }

        loop {
            let command = tokio::select! {
                command = self.commands.recv() => command,
                _ = shutdown.recv() => {
                    info!("command router stopping on shutdown signal");
                    return;
                }
            };
            let Some(command) = command else {
                info!("command stream closed; router exiting");
                return;
            };
            self.dispatch(command);
        }
    }

    fn dispatch(&self, command: DebuggerCommand) {
        debug!(method = command.method(), "routing command");
        let shared = self.shared.clone();
        match command {
            // A repeated enable is acknowledged like the first one.
            DebuggerCommand::Enable(cmd) => cmd.respond_empty(),

            DebuggerCommand::SetBreakpointByUrl(cmd) => {
                tokio::spawn(async move {
                    shared.breakpoints.set(&*shared.client, cmd).await;
                });
            }
            DebuggerCommand::RemoveBreakpoint(cmd) => {
                tokio::spawn(async move {
                    shared.breakpoints.clear(&*shared.client, cmd).await;
                });
            }
            DebuggerCommand::StepOver(cmd) => {
                tokio::spawn(async move { shared.handle_step(StepKind::Over, cmd).await });
            }
            DebuggerCommand::StepInto(cmd) => {
                tokio::spawn(async move { shared.handle_step(StepKind::Into, cmd).await });
            }
            DebuggerCommand::StepOut(cmd) => {
                tokio::spawn(async move { shared.handle_step(StepKind::Out, cmd).await });
            }
            DebuggerCommand::Resume(cmd) => {
                tokio::spawn(async move { shared.handle_resume(cmd).await });
            }
            DebuggerCommand::GetScriptSource(cmd) => {
                tokio::spawn(async move { shared.handle_get_script_source(cmd).await });
            }
            DebuggerCommand::EvaluateOnCallFrame(cmd) => {
                tokio::spawn(async move { shared.handle_evaluate(cmd).await });
            }

            DebuggerCommand::Disable(cmd)
            | DebuggerCommand::SetBreakpointsActive(cmd)
            | DebuggerCommand::SetSkipAllPauses(cmd)
            | DebuggerCommand::SetBreakpoint(cmd)
            | DebuggerCommand::GetPossibleBreakpoints(cmd)
            | DebuggerCommand::ContinueToLocation(cmd)
            | DebuggerCommand::Pause(cmd)
            | DebuggerCommand::SearchInContent(cmd)
            | DebuggerCommand::SetScriptSource(cmd)
            | DebuggerCommand::RestartFrame(cmd)
            | DebuggerCommand::SetPauseOnExceptions(cmd)
            | DebuggerCommand::SetVariableValue(cmd)
            | DebuggerCommand::SetAsyncCallStackDepth(cmd)
            | DebuggerCommand::SetBlackboxPatterns(cmd)
            | DebuggerCommand::SetBlackboxedRanges(cmd) => {
                cmd.respond_with_error(error_codes::METHOD_NOT_FOUND, "");
            }
        }
    }
}
