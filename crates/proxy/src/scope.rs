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

//! Scope chain projection.
//!
//! The backend exposes variables only through its evaluator, so instead of
//! materializing all locals at each pause the proxy advertises a single lazy
//! Local scope per frame. The `local:<frame>` handle is opaque here; the
//! Runtime companion resolves it when the front-end asks for properties.

use rdt_common::{RemoteObject, Scope, ScopeType};

/// Build the scope chain reported for the frame at `frame_index`.
pub fn build_scope_chain(frame_index: usize) -> Vec<Scope> {
    vec![Scope {
        kind: ScopeType::Local,
        object: RemoteObject::lazy(format!("local:{frame_index}")),
    }]
}
