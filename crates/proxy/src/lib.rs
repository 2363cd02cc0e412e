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

//! RDT Proxy - the Debugger Proxy core.
//!
//! This crate translates between a Chrome DevTools front-end and a native
//! debugger for a routine-based concurrent language. Every live routine in
//! the debuggee is surfaced as its own DevTools target; breakpoints, stepping,
//! stack traces, scopes and expression evaluation are mapped between the two
//! models.
//!
//! # Architecture
//!
//! - [`proxy`] - the orchestrator: startup sequence, active-routine tracking,
//!   the step/resume state machine and routine lifecycle
//! - [`router`] - classifies incoming Debugger-domain commands and spawns a
//!   task per dispatched handler
//! - [`breakpoints`] - fingerprint-keyed breakpoint registry
//! - [`snapshot`] - the pause pipeline: per-routine stacks, frame translation
//! - [`target`] - per-routine event surface
//! - [`agents`] - event emission toward the transport
//! - [`commands`] - the typed command envelope the transport feeds us
//!
//! The transport itself, the protocol dispatch tables, the backend debugger
//! library and the Runtime companion are external: the proxy touches them
//! only through channels and the traits in `rdt-common`.
//!
//! # Line numbers
//!
//! The protocol is zero-based, the backend is one-based. The conversion is a
//! boundary policy: +1 exactly once on the way into the backend
//! ([`breakpoints`]), -1 exactly once on the way out ([`snapshot`]).

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod agents;
pub mod breakpoints;
pub mod commands;
pub mod config;
pub mod proxy;
pub mod router;
pub mod scope;
pub mod snapshot;
pub mod target;

pub use agents::{DebuggerAgent, EventSink, OutboundEvent, TargetAgent};
pub use commands::{Command, CommandResult, DebuggerCommand, ProtocolError, Responder};
pub use config::ProxyConfig;
pub use proxy::{DebuggerProxy, ProxyHandle};
