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

//! The proxy orchestrator.
//!
//! Owns the shared session state (targets, breakpoints, active routine),
//! runs the startup sequence, and implements the step/resume state machine
//! plus the dispatched command handlers. Unrecoverable conditions do not
//! panic: they signal the shutdown channel carried by [`ProxyHandle`] and
//! the embedder tears the session down.

use crate::{
    agents::{DebuggerAgent, EventSink, OutboundEvent, TargetAgent},
    breakpoints::BreakpointRegistry,
    commands::{Command, DebuggerCommand},
    config::ProxyConfig,
    router::CommandRouter,
    snapshot::send_pause_state,
    target::Target,
};
use eyre::{bail, eyre, Result, WrapErr};
use rdt_common::{
    error_codes, DebugClient, EvalScope, EvaluateOnCallFrameParams, EvaluateOnCallFrameReturn,
    ExceptionDetails, GetScriptSourceParams, GetScriptSourceReturn, RoutineId, RuntimeBridge,
    ScriptParsedEvent, StepParams, EXECUTION_CONTEXT_ID,
};
use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, warn};

/// Which resume-awaiting primitive a step command maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepKind {
    /// `Debugger.stepOver` -> backend `next`
    Over,
    /// `Debugger.stepInto` -> backend `step`
    Into,
    /// `Debugger.stepOut` -> backend `step_out`
    Out,
}

/// Session state shared by the orchestrator, the router and every dispatched
/// handler task.
pub(crate) struct ProxyShared<C, R> {
    pub(crate) client: Arc<C>,
    pub(crate) runtime: Arc<R>,
    pub(crate) debugger: DebuggerAgent,
    pub(crate) targets_agent: TargetAgent,
    pub(crate) targets: RwLock<HashMap<RoutineId, Target>>,
    pub(crate) file_list: Arc<RwLock<Vec<String>>>,
    pub(crate) breakpoints: BreakpointRegistry,
    pub(crate) config: ProxyConfig,
    active_routine: AtomicI64,
    shutdown: broadcast::Sender<()>,
}

impl<C, R> ProxyShared<C, R>
where
    C: DebugClient,
    R: RuntimeBridge,
{
    /// The routine whose stack the default Debugger view mirrors.
    pub(crate) fn active_routine(&self) -> RoutineId {
        RoutineId(self.active_routine.load(Ordering::SeqCst))
    }

    pub(crate) fn set_active_routine(&self, id: RoutineId) {
        self.active_routine.store(id.0, Ordering::SeqCst);
    }

    /// Record an unrecoverable condition and signal shutdown.
    pub(crate) fn fatal(&self, err: eyre::Report) {
        error!("fatal proxy error: {err:#}");
        let _ = self.shutdown.send(());
    }

    pub(crate) fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown.subscribe()
    }

    /// Fan a resume out to every target session, then to the default view.
    pub(crate) async fn send_resume_state(&self) {
        let targets = self.targets.read().await;
        for target in targets.values() {
            target.fire_resumed();
        }
        self.debugger.fire_resumed();
    }

    /// Reconcile the target population with the backend's routine listing.
    ///
    /// New routines attach, vanished routines destroy exactly once, and if
    /// the active routine vanished the smallest surviving id takes over.
    pub(crate) async fn sync_routines(&self) -> Result<()> {
        let mut targets = self.targets.write().await;
        let routines = self.client.list_routines().await.wrap_err("routine listing failed")?;

        let mut live = HashSet::with_capacity(routines.len());
        for routine in &routines {
            live.insert(routine.id);
            if !targets.contains_key(&routine.id) {
                let target = Target::new(
                    routine.id,
                    self.debugger.clone(),
                    self.targets_agent.clone(),
                    self.file_list.clone(),
                );
                target.attach(routine).await;
                targets.insert(routine.id, target);
            }
        }

        let vanished: Vec<RoutineId> =
            targets.keys().filter(|id| !live.contains(id)).copied().collect();
        for id in vanished {
            debug!(routine = %id, "routine vanished; detaching target");
            if let Some(target) = targets.remove(&id) {
                target.destroy();
            }
        }

        if !targets.contains_key(&self.active_routine()) {
            // Recovery path: the surfaced routine died, adopt the smallest
            // survivor so the default view stays attached to something real.
            if let Some(&id) = targets.keys().min() {
                warn!(adopted = %id, "active routine vanished");
                self.set_active_routine(id);
            }
        }

        Ok(())
    }

    /// Apply a `destinationTargetID`, if any, to the active routine.
    fn adopt_destination(&self, destination: Option<&str>) -> Result<(), String> {
        let Some(dest) = destination.filter(|d| !d.is_empty()) else {
            return Ok(());
        };
        match dest.parse::<RoutineId>() {
            Ok(id) => {
                self.set_active_routine(id);
                Ok(())
            }
            Err(_) => Err(format!("could not parse destination target id {dest:?}")),
        }
    }

    /// Shared body of the three step commands: switch, fan out the resume,
    /// step, acknowledge, snapshot.
    pub(crate) async fn handle_step(&self, kind: StepKind, cmd: Command<StepParams>) {
        let (params, responder) = cmd.into_parts();

        if let Err(reason) = self.adopt_destination(params.destination_target_id.as_deref()) {
            responder.respond_with_error(error_codes::INTERNAL_ERROR, reason.clone());
            self.fatal(eyre!(reason));
            return;
        }

        let active = self.active_routine();
        if let Err(err) = self.client.switch_routine(active).await {
            responder.respond_with_error(error_codes::INTERNAL_ERROR, err.to_string());
            return;
        }

        self.send_resume_state().await;
        let stepped = match kind {
            StepKind::Over => self.client.next().await,
            StepKind::Into => self.client.step().await,
            StepKind::Out => self.client.step_out().await,
        };
        if let Err(err) = stepped {
            responder.respond_with_error(error_codes::INTERNAL_ERROR, err.to_string());
            return;
        }
        responder.respond_empty();

        if let Err(err) = send_pause_state(self).await {
            self.fatal(err);
        }
    }

    /// `Debugger.resume`: acknowledge, fan out, then block on Continue until
    /// the next pause (or the debuggee's exit, which is terminal).
    pub(crate) async fn handle_resume(&self, cmd: Command<StepParams>) {
        let (params, responder) = cmd.into_parts();

        if let Err(reason) = self.adopt_destination(params.destination_target_id.as_deref()) {
            responder.respond_with_error(error_codes::INTERNAL_ERROR, reason.clone());
            self.fatal(eyre!(reason));
            return;
        }

        let active = self.active_routine();
        if let Err(err) = self.client.switch_routine(active).await {
            responder.respond_with_error(error_codes::INTERNAL_ERROR, err.to_string());
            return;
        }
        responder.respond_empty();

        self.send_resume_state().await;
        match self.client.continue_execution().await {
            Err(err) => {
                self.fatal(err.wrap_err("continue failed"));
                return;
            }
            Ok(None) => {
                self.fatal(eyre!("debuggee exited while continuing"));
                return;
            }
            Ok(Some(state)) => {
                if let Some(selected) = state.selected_routine {
                    self.set_active_routine(selected.id);
                }
            }
        }

        if let Err(err) = send_pause_state(self).await {
            self.fatal(err);
        }
    }

    /// `Debugger.evaluateOnCallFrame`. Evaluator failures are data: the
    /// command succeeds and carries exception details instead of a result.
    pub(crate) async fn handle_evaluate(
        &self,
        cmd: Command<EvaluateOnCallFrameParams>,
    ) {
        let (params, responder) = cmd.into_parts();

        let routine_id = match params.destination_target_id.as_deref().filter(|d| !d.is_empty()) {
            Some(dest) => match dest.parse::<RoutineId>() {
                Ok(id) => id,
                Err(_) => {
                    let reason = format!("could not parse destination target id {dest:?}");
                    responder.respond_with_error(error_codes::INTERNAL_ERROR, reason.clone());
                    self.fatal(eyre!(reason));
                    return;
                }
            },
            None => self.active_routine(),
        };

        let frame = match params.call_frame_id.parse::<i64>() {
            Ok(frame) => frame,
            Err(_) => {
                self.fatal(eyre!("non-decimal call frame id {:?}", params.call_frame_id));
                return;
            }
        };

        let scope = EvalScope { routine_id, frame };
        match self.client.eval_variable(scope, &params.expression, &self.config.eval_load).await {
            Err(err) => {
                debug!(expression = %params.expression, %err, "evaluation failed");
                responder.respond(&EvaluateOnCallFrameReturn {
                    result: None,
                    exception_details: Some(ExceptionDetails {
                        exception_id: 1,
                        text: err.to_string(),
                        line_number: -1,
                        column_number: -1,
                    }),
                });
            }
            Ok(variable) => {
                responder.respond(&EvaluateOnCallFrameReturn {
                    result: Some(self.runtime.make_remote_object(&variable)),
                    exception_details: None,
                });
            }
        }
    }

    /// `Debugger.getScriptSource`. Reads are restricted to the files the
    /// backend announced; anything else never touches the filesystem.
    pub(crate) async fn handle_get_script_source(
        &self,
        cmd: Command<GetScriptSourceParams>,
    ) {
        let (params, responder) = cmd.into_parts();

        let known = self.file_list.read().await.iter().any(|file| *file == params.script_id);
        if !known {
            return responder.respond_with_error(
                error_codes::INVALID_PARAMS,
                format!("unknown script: {}", params.script_id),
            );
        }

        match tokio::fs::read(&params.script_id).await {
            Ok(bytes) => {
                responder.respond(&GetScriptSourceReturn {
                    script_source: String::from_utf8_lossy(&bytes).into_owned(),
                });
            }
            Err(err) => {
                self.fatal(
                    eyre!(err).wrap_err(format!("failed to read script {}", params.script_id)),
                );
            }
        }
    }
}

/// Handle to a started proxy. Carries the shutdown channel fatal conditions
/// signal; embedders await it to tear the session down.
#[derive(Clone)]
pub struct ProxyHandle {
    shutdown: broadcast::Sender<()>,
}

impl ProxyHandle {
    /// Subscribe to the shutdown signal.
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown.subscribe()
    }

    /// Request shutdown from the embedder side.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }
}

/// The Debugger Proxy.
///
/// Construct with the two collaborator handles and the two transport
/// channels, then [`start`](Self::start) it. Startup blocks until the
/// front-end enables the Debugger domain and the backend reports ready.
pub struct DebuggerProxy<C, R> {
    shared: Arc<ProxyShared<C, R>>,
    commands: mpsc::Receiver<DebuggerCommand>,
}

impl<C, R> DebuggerProxy<C, R>
where
    C: DebugClient,
    R: RuntimeBridge,
{
    /// Wire a proxy to its collaborators and transport channels.
    pub fn new(
        client: Arc<C>,
        runtime: Arc<R>,
        events: mpsc::UnboundedSender<OutboundEvent>,
        commands: mpsc::Receiver<DebuggerCommand>,
        config: ProxyConfig,
    ) -> Self {
        let sink = EventSink::new(events);
        let (shutdown, _) = broadcast::channel(4);
        let shared = Arc::new(ProxyShared {
            client,
            runtime,
            debugger: DebuggerAgent::new(sink.clone()),
            targets_agent: TargetAgent::new(sink),
            targets: RwLock::new(HashMap::new()),
            file_list: Arc::new(RwLock::new(Vec::new())),
            breakpoints: BreakpointRegistry::new(),
            config,
            active_routine: AtomicI64::new(0),
            shutdown,
        });
        Self { shared, commands }
    }

    /// Run the startup sequence and hand the session over to the router.
    ///
    /// Strict order: wait for Enable, spawn the router and the Runtime
    /// context, wait for the backend, record the selected routine, kick off
    /// the initial pause snapshot (the debuggee is expected to sit at an
    /// entry breakpoint), then announce every source file.
    pub async fn start(mut self) -> Result<ProxyHandle> {
        let backlog = self.wait_for_enable().await?;
        info!("front-end enabled the debugger domain");

        let router = CommandRouter::new(self.shared.clone(), self.commands, backlog);
        tokio::spawn(router.run());

        let runtime = self.shared.runtime.clone();
        tokio::spawn(async move {
            if let Err(err) = runtime.create_context().await {
                warn!(%err, "runtime context creation failed");
            }
        });

        self.shared.client.block_until_ready().await.wrap_err("backend never became ready")?;

        let state = self.shared.client.get_state().await.wrap_err("initial state query failed")?;
        if let Some(selected) = state.selected_routine {
            self.shared.set_active_routine(selected.id);
        }

        let shared = self.shared.clone();
        tokio::spawn(async move {
            if let Err(err) = send_pause_state(&shared).await {
                shared.fatal(err);
            }
        });

        let sources =
            self.shared.client.list_sources().await.wrap_err("source listing failed")?;
        let mut files = self.shared.file_list.write().await;
        for source in sources {
            if source == self.shared.config.synthetic_source_marker {
                continue;
            }
            self.shared.debugger.fire_script_parsed(&ScriptParsedEvent {
                script_id: source.clone(),
                url: source.clone(),
                execution_context_id: EXECUTION_CONTEXT_ID,
            });
            files.push(source);
        }
        drop(files);

        Ok(ProxyHandle { shutdown: self.shared.shutdown.clone() })
    }

    /// Consume commands until Enable arrives; everything received before it
    /// is kept for the router, in order.
    async fn wait_for_enable(&mut self) -> Result<VecDeque<DebuggerCommand>> {
        let mut backlog = VecDeque::new();
        loop {
            let Some(command) = self.commands.recv().await else {
                bail!("command stream closed before the front-end enabled the debugger");
            };
            match command {
                DebuggerCommand::Enable(cmd) => {
                    cmd.respond_empty();
                    return Ok(backlog);
                }
                other => {
                    debug!(method = other.method(), "buffering command received before enable");
                    backlog.push_back(other);
                }
            }
        }
    }
}
