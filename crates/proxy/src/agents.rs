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

//! Event emission toward the transport.
//!
//! The transport (out of scope here) drains a single unbounded channel of
//! [`OutboundEvent`]s and frames them for the front-end. Events carry an
//! optional target id: `None` means the default Debugger agent view, `Some`
//! means the event is relayed into that target's session.
//!
//! A dropped receiver means the front-end went away; emission then degrades
//! to a debug log instead of failing the caller.

use rdt_common::{
    AttachedToTargetEvent, DetachedFromTargetEvent, PausedEvent, ResumedEvent, ScriptParsedEvent,
    TargetId,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// One event on its way to the front-end.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEvent {
    /// Target session the event belongs to; `None` for the default view
    pub target_id: Option<TargetId>,
    /// Protocol method, e.g. `"Debugger.paused"`
    pub method: String,
    /// Event payload
    pub params: serde_json::Value,
}

/// Sending half of the transport seam.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<OutboundEvent>,
}

impl EventSink {
    /// Wrap the channel the transport drains.
    pub fn new(tx: mpsc::UnboundedSender<OutboundEvent>) -> Self {
        Self { tx }
    }

    fn emit<T: Serialize>(&self, target_id: Option<&str>, method: &str, payload: &T) {
        let params = match serde_json::to_value(payload) {
            Ok(params) => params,
            Err(err) => {
                error!(method, %err, "failed to serialize event payload");
                return;
            }
        };
        let event =
            OutboundEvent { target_id: target_id.map(String::from), method: method.to_string(), params };
        if self.tx.send(event).is_err() {
            debug!(method, "front-end disconnected; dropping event");
        }
    }
}

/// Emitter for Debugger-domain events.
#[derive(Clone)]
pub struct DebuggerAgent {
    sink: EventSink,
}

impl DebuggerAgent {
    /// Create an emitter over `sink`.
    pub fn new(sink: EventSink) -> Self {
        Self { sink }
    }

    /// `Debugger.scriptParsed` on the default view.
    pub fn fire_script_parsed(&self, event: &ScriptParsedEvent) {
        self.sink.emit(None, "Debugger.scriptParsed", event);
    }

    /// `Debugger.scriptParsed` relayed into a target session.
    pub fn fire_script_parsed_on_target(&self, target_id: &str, event: &ScriptParsedEvent) {
        self.sink.emit(Some(target_id), "Debugger.scriptParsed", event);
    }

    /// `Debugger.paused` on the default view.
    pub fn fire_paused(&self, event: &PausedEvent) {
        self.sink.emit(None, "Debugger.paused", event);
    }

    /// `Debugger.paused` relayed into a target session.
    pub fn fire_paused_on_target(&self, target_id: &str, event: &PausedEvent) {
        self.sink.emit(Some(target_id), "Debugger.paused", event);
    }

    /// `Debugger.resumed` on the default view.
    pub fn fire_resumed(&self) {
        self.sink.emit(None, "Debugger.resumed", &ResumedEvent::default());
    }

    /// `Debugger.resumed` relayed into a target session.
    pub fn fire_resumed_on_target(&self, target_id: &str) {
        self.sink.emit(Some(target_id), "Debugger.resumed", &ResumedEvent::default());
    }
}

/// Emitter for Target-domain events.
#[derive(Clone)]
pub struct TargetAgent {
    sink: EventSink,
}

impl TargetAgent {
    /// Create an emitter over `sink`.
    pub fn new(sink: EventSink) -> Self {
        Self { sink }
    }

    /// `Target.attachedToTarget`
    pub fn fire_attached_to_target(&self, event: &AttachedToTargetEvent) {
        self.sink.emit(None, "Target.attachedToTarget", event);
    }

    /// `Target.detachedFromTarget`
    pub fn fire_detached_from_target(&self, event: &DetachedFromTargetEvent) {
        self.sink.emit(None, "Target.detachedFromTarget", event);
    }
}
