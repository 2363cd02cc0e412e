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

//! Per-routine DevTools target.
//!
//! A [`Target`] is one routine surfaced to the front-end. It owns no
//! reference back into the proxy: it is constructed with the two agent
//! emitters and the shared file list, so it can be driven (and tested) with
//! nothing but stub sinks.
//!
//! Event ordering per target: `attach` strictly first, `destroy` strictly
//! last, nothing after `destroy`. The caller (routine sync) upholds this by
//! attaching on insertion and destroying on removal, with `destroy` consuming
//! the target.

use crate::{
    agents::{DebuggerAgent, TargetAgent},
    snapshot::{translate_frames, PAUSE_REASON_OTHER},
};
use rdt_common::{
    AttachedToTargetEvent, DetachedFromTargetEvent, PausedEvent, Routine, RoutineId,
    ScriptParsedEvent, Stackframe, TargetInfo, EXECUTION_CONTEXT_ID,
};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Target type reported to the front-end; makes DevTools treat each routine
/// as an inspectable VM instance.
const TARGET_TYPE: &str = "node";

/// One routine surfaced as a DevTools target.
#[derive(Clone)]
pub(crate) struct Target {
    id: RoutineId,
    debugger: DebuggerAgent,
    targets: TargetAgent,
    file_list: Arc<RwLock<Vec<String>>>,
}

impl Target {
    pub(crate) fn new(
        id: RoutineId,
        debugger: DebuggerAgent,
        targets: TargetAgent,
        file_list: Arc<RwLock<Vec<String>>>,
    ) -> Self {
        Self { id, debugger, targets, file_list }
    }

    pub(crate) fn id(&self) -> RoutineId {
        self.id
    }

    /// Announce the target and replay every known script into its session.
    pub(crate) async fn attach(&self, routine: &Routine) {
        let short_name = routine.short_function_name().unwrap_or_default();
        let suffix =
            if short_name.is_empty() { String::new() } else { format!(" {short_name}") };
        self.targets.fire_attached_to_target(&AttachedToTargetEvent {
            target_info: TargetInfo {
                target_id: self.id.to_string(),
                kind: TARGET_TYPE.to_string(),
                title: short_name.to_string(),
                url: format!("{}:{}", self.id, suffix),
            },
            waiting_for_debugger: false,
        });

        let target_id = self.id.to_string();
        let files = self.file_list.read().await;
        for file in files.iter() {
            self.debugger.fire_script_parsed_on_target(
                &target_id,
                &ScriptParsedEvent {
                    script_id: file.clone(),
                    url: file.clone(),
                    execution_context_id: EXECUTION_CONTEXT_ID,
                },
            );
        }
    }

    /// Announce the target going away. Terminal: consumes the target.
    pub(crate) fn destroy(self) {
        self.targets
            .fire_detached_from_target(&DetachedFromTargetEvent { target_id: self.id.to_string() });
    }

    /// Relay a resume into the target's session.
    pub(crate) fn fire_resumed(&self) {
        self.debugger.fire_resumed_on_target(&self.id.to_string());
    }

    /// Relay a pause with this routine's stack into the target's session.
    pub(crate) fn fire_paused(&self, stack: &[Stackframe]) {
        self.debugger.fire_paused_on_target(
            &self.id.to_string(),
            &PausedEvent {
                call_frames: translate_frames(stack),
                reason: PAUSE_REASON_OTHER.to_string(),
            },
        );
    }
}
