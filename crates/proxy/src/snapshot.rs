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

//! The pause pipeline.
//!
//! Entered after every resume-awaiting primitive returns: verify the backend
//! is actually paused, sync the routine population, capture one stack per
//! routine, then emit the active routine's pause on the default view before
//! any per-target pause. Failures here are fatal to the proxy - a pause the
//! front-end cannot trust leaves the session unusable.

use crate::{proxy::ProxyShared, scope::build_scope_chain, target::Target};
use eyre::{bail, Result, WrapErr};
use rdt_common::{
    CallFrame, DebugClient, Location, PausedEvent, RemoteObject, RuntimeBridge, Stackframe,
};
use tracing::debug;

/// The only pause reason this proxy reports.
pub(crate) const PAUSE_REASON_OTHER: &str = "other";

/// Placeholder when the backend has no function for a frame.
pub(crate) const UNKNOWN_FUNCTION: &str = "<Unknown>";

/// Translate backend frames into protocol call frames.
///
/// Backend lines are one-based, the wire is zero-based; this is the single
/// outbound conversion point.
pub(crate) fn translate_frames(stack: &[Stackframe]) -> Vec<CallFrame> {
    stack
        .iter()
        .enumerate()
        .map(|(index, frame)| CallFrame {
            call_frame_id: index.to_string(),
            function_name: frame
                .location
                .function
                .as_ref()
                .map(|function| function.name.clone())
                .unwrap_or_else(|| UNKNOWN_FUNCTION.to_string()),
            location: Location::new(frame.location.file.clone(), frame.location.line - 1),
            scope_chain: build_scope_chain(index),
            this: RemoteObject::undefined(),
            return_value: None,
        })
        .collect()
}

/// Run one pause snapshot: sync routines, capture stacks, emit pauses.
pub(crate) async fn send_pause_state<C, R>(shared: &ProxyShared<C, R>) -> Result<()>
where
    C: DebugClient,
    R: RuntimeBridge,
{
    let state = shared.client.get_state().await.wrap_err("pause pipeline: state query failed")?;
    if state.running {
        bail!("pause pipeline entered while the debuggee is running");
    }

    shared.sync_routines().await?;

    // Stacks are captured under the read lock so the population cannot shift
    // mid-snapshot; emission happens after the lock is gone.
    let targets = shared.targets.read().await;
    let active_id = shared.active_routine();
    let mut active_stack: Option<Vec<Stackframe>> = None;
    let mut paused_targets: Vec<(Target, Vec<Stackframe>)> = Vec::with_capacity(targets.len());
    for (&id, target) in targets.iter() {
        let stack = shared
            .client
            .stacktrace(id, shared.config.max_stack_depth, &shared.config.frame_load)
            .await
            .wrap_err_with(|| format!("stack fetch failed for routine {id}"))?;
        if id == active_id {
            active_stack = Some(stack);
            continue;
        }
        paused_targets.push((target.clone(), stack));
    }
    drop(targets);

    debug!(%active_id, targets = paused_targets.len() + 1, "emitting pause snapshot");

    if let Some(stack) = active_stack {
        shared.debugger.fire_paused(&PausedEvent {
            call_frames: translate_frames(&stack),
            reason: PAUSE_REASON_OTHER.to_string(),
        });
    }
    for (target, stack) in paused_targets {
        target.fire_paused(&stack);
    }

    Ok(())
}
