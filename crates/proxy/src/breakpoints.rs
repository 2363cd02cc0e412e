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

//! Breakpoint registry.
//!
//! Breakpoint identity is a *fingerprint* of `url:line`: stable across
//! reconnects, opaque to the front-end, and a legal identifier on the client
//! side. The registry owns the set of fingerprints believed active in the
//! backend and serializes every operation through one mutex, held across the
//! backend call - two concurrent sets of the same (url, line) must not race
//! to create duplicate backend breakpoints.

use crate::commands::{Command, Responder};
use rdt_common::{
    error_codes, BreakpointId, DebugClient, Location, RemoveBreakpointParams,
    SetBreakpointByUrlParams, SetBreakpointByUrlReturn,
};
use sha1::{Digest, Sha1};
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::debug;

/// Compute the public breakpoint id for a frontend (url, zero-based line)
/// pair. The leading `a` keeps the id from starting with a digit, which the
/// front-end requires of identifiers.
pub fn fingerprint(url: &str, line: i64) -> BreakpointId {
    let digest = Sha1::digest(format!("{url}:{line}").as_bytes());
    format!("a{}", hex::encode(digest))
}

/// The set of breakpoints believed active in the backend, keyed by
/// fingerprint.
pub(crate) struct BreakpointRegistry {
    fingerprints: Mutex<HashSet<BreakpointId>>,
}

impl BreakpointRegistry {
    pub(crate) fn new() -> Self {
        Self { fingerprints: Mutex::new(HashSet::new()) }
    }

    /// Handle `Debugger.setBreakpointByUrl`.
    pub(crate) async fn set<C: DebugClient>(
        &self,
        client: &C,
        cmd: Command<SetBreakpointByUrlParams>,
    ) {
        let (params, responder) = cmd.into_parts();

        if params.url_regex.is_some() {
            return responder
                .respond_with_error(error_codes::INVALID_PARAMS, "urlRegex not available");
        }
        if params.column_number.is_some_and(|column| column != 0) {
            return responder
                .respond_with_error(error_codes::INVALID_PARAMS, "columnNumber not available");
        }
        if params.condition.as_deref().is_some_and(|condition| !condition.is_empty()) {
            return responder
                .respond_with_error(error_codes::INVALID_PARAMS, "condition not available");
        }
        let Some(url) = params.url else {
            return responder.respond_with_error(error_codes::INVALID_PARAMS, "url must be set");
        };

        let line = params.line_number;
        let id = fingerprint(&url, line);

        let mut fingerprints = self.fingerprints.lock().await;
        if fingerprints.contains(&id) {
            debug!(%url, line, %id, "breakpoint already set");
            return respond_set(responder, &url, line, id);
        }

        // The backend wants one-based lines.
        if let Err(err) = client.create_breakpoint_at_line(&url, line + 1, &id).await {
            fingerprints.remove(&id);
            return responder.respond_with_error(error_codes::INTERNAL_ERROR, err.to_string());
        }
        fingerprints.insert(id.clone());
        respond_set(responder, &url, line, id);
    }

    /// Handle `Debugger.removeBreakpoint`.
    ///
    /// The fingerprint is forgotten before the backend is asked, so a failed
    /// clear leaves the registry without the entry rather than claiming a
    /// breakpoint the front-end believes gone.
    pub(crate) async fn clear<C: DebugClient>(
        &self,
        client: &C,
        cmd: Command<RemoveBreakpointParams>,
    ) {
        let (params, responder) = cmd.into_parts();
        let id = params.breakpoint_id;

        let mut fingerprints = self.fingerprints.lock().await;
        fingerprints.remove(&id);
        if let Err(err) = client.clear_breakpoint_by_name(&id).await {
            return responder.respond_with_error(error_codes::INTERNAL_ERROR, err.to_string());
        }
        responder.respond_empty();
    }
}

fn respond_set(responder: Responder, url: &str, line: i64, id: BreakpointId) {
    responder.respond(&SetBreakpointByUrlReturn {
        breakpoint_id: id,
        locations: vec![Location::new(url, line)],
    });
}
