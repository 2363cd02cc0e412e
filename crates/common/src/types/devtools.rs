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

//! Chrome DevTools Debugger/Target/Runtime wire shapes.
//!
//! Only the subset the proxy actually exchanges is defined here. All shapes
//! serialize with the camelCase field names the protocol mandates. Line
//! numbers on these types are zero-based; the conversion to the backend's
//! one-based lines happens exactly once at the adapter boundary (see the
//! proxy crate), never here.

use serde::{Deserialize, Serialize};

/// Breakpoint identifier on the wire: `"a"` followed by 40 hex chars.
pub type BreakpointId = String;

/// Script identifier. The proxy uses the absolute source file path, so a
/// script's id and its url are always the same string.
pub type ScriptId = String;

/// Handle to an object living behind the Runtime companion.
pub type RemoteObjectId = String;

/// DevTools target identifier; the decimal routine id.
pub type TargetId = String;

/// The single execution context every script is reported under.
pub const EXECUTION_CONTEXT_ID: i64 = 1;

/// Error codes for protocol-level command failures.
///
/// The DevTools wire format reuses the JSON-RPC 2.0 error code space.
pub mod error_codes {
    /// Parse error - invalid JSON was received
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid request - the JSON sent is not a valid command object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found - the command is not supported by this agent
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params - invalid command parameter(s)
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error - the command failed inside the proxy or the backend
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// A source location as the front-end sees it (zero-based line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Script the location points into; equal to the source path.
    pub script_id: ScriptId,
    /// Zero-based line number.
    pub line_number: i64,
    /// Zero-based column number; never populated by this proxy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_number: Option<i64>,
}

impl Location {
    /// Build the location reported back to the front-end for `file:line`.
    pub fn new(script_id: impl Into<ScriptId>, line_number: i64) -> Self {
        Self { script_id: script_id.into(), line_number, column_number: None }
    }
}

/// Kind discriminator of a [`RemoteObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteObjectKind {
    /// The undefined value
    Undefined,
    /// A compound object, usually carrying an object id for lazy expansion
    Object,
    /// A string value
    String,
    /// A numeric value
    Number,
    /// A boolean value
    Boolean,
}

/// Mirror of the Runtime domain's RemoteObject, reduced to the fields the
/// proxy emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    /// Object kind
    #[serde(rename = "type")]
    pub kind: RemoteObjectKind,
    /// Handle the Runtime companion can dereference later
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id: Option<RemoteObjectId>,
    /// Primitive value, when the object is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RemoteObject {
    /// The `undefined` placeholder used for `this` in every call frame.
    pub fn undefined() -> Self {
        Self { kind: RemoteObjectKind::Undefined, object_id: None, value: None, description: None }
    }

    /// An object that is only a handle; contents are fetched on demand.
    pub fn lazy(object_id: impl Into<RemoteObjectId>) -> Self {
        Self {
            kind: RemoteObjectKind::Object,
            object_id: Some(object_id.into()),
            value: None,
            description: None,
        }
    }
}

/// Scope kind discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    /// Function-local variables
    Local,
}

/// One entry of a call frame's scope chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    /// Scope kind
    #[serde(rename = "type")]
    pub kind: ScopeType,
    /// Object holding the scope's variables; here always a lazy handle.
    pub object: RemoteObject,
}

/// One stack frame as reported to the front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrame {
    /// Decimal frame index, top of stack first
    pub call_frame_id: String,
    /// Function name, or `"<Unknown>"` when the backend has none
    pub function_name: String,
    /// Where the frame is paused (zero-based line)
    pub location: Location,
    /// Scope chain; exactly one lazy Local scope
    pub scope_chain: Vec<Scope>,
    /// Receiver object; always `undefined` for this backend
    pub this: RemoteObject,
    /// Return value; never populated by this proxy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_value: Option<RemoteObject>,
}

/// Description of an evaluation failure, returned as data rather than as a
/// command error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    /// Identifier of the exception within the session
    pub exception_id: i64,
    /// Failure text from the evaluator
    pub text: String,
    /// Line of the failure; `-1` when unknown
    pub line_number: i64,
    /// Column of the failure; `-1` when unknown
    pub column_number: i64,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// `Debugger.scriptParsed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptParsedEvent {
    /// Script id; equals `url`
    pub script_id: ScriptId,
    /// Absolute source file path
    pub url: String,
    /// Always [`EXECUTION_CONTEXT_ID`]
    pub execution_context_id: i64,
}

/// `Debugger.paused`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PausedEvent {
    /// Stack of the paused routine, top frame first
    pub call_frames: Vec<CallFrame>,
    /// Pause reason; this proxy always reports `"other"`
    pub reason: String,
}

/// `Debugger.resumed` (no payload)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResumedEvent {}

/// Description of a target carried by [`AttachedToTargetEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    /// Decimal routine id
    pub target_id: TargetId,
    /// Target type; this proxy reports `"node"` so front-ends treat the
    /// routine as an inspectable VM instance
    #[serde(rename = "type")]
    pub kind: String,
    /// Display title
    pub title: String,
    /// `"<id>: <short function name>"`
    pub url: String,
}

/// `Target.attachedToTarget`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedToTargetEvent {
    /// The new target
    pub target_info: TargetInfo,
    /// Whether the target is blocked waiting for a debugger
    pub waiting_for_debugger: bool,
}

/// `Target.detachedFromTarget`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachedFromTargetEvent {
    /// The target that went away
    pub target_id: TargetId,
}

// ---------------------------------------------------------------------------
// Command parameters and returns
// ---------------------------------------------------------------------------

/// Parameters of `Debugger.setBreakpointByUrl`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointByUrlParams {
    /// Zero-based line to break on
    pub line_number: i64,
    /// Source path; required by this proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Unsupported; presence is rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_regex: Option<String>,
    /// Unsupported; only absent or zero is accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_number: Option<i64>,
    /// Unsupported; only absent or empty is accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// Result of `Debugger.setBreakpointByUrl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointByUrlReturn {
    /// The breakpoint fingerprint
    pub breakpoint_id: BreakpointId,
    /// The single location the breakpoint resolved to
    pub locations: Vec<Location>,
}

/// Parameters of `Debugger.removeBreakpoint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBreakpointParams {
    /// Fingerprint previously returned by setBreakpointByUrl
    pub breakpoint_id: BreakpointId,
}

/// Parameters shared by the step commands and `Debugger.resume`.
///
/// `destinationTargetID` is the session extension that lets the front-end
/// drive a routine other than the currently active one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepParams {
    /// Routine to switch to before stepping, as a decimal string
    #[serde(
        default,
        rename = "destinationTargetID",
        skip_serializing_if = "Option::is_none"
    )]
    pub destination_target_id: Option<String>,
}

/// Parameters of `Debugger.getScriptSource`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetScriptSourceParams {
    /// Script to fetch; must be a path announced via scriptParsed
    pub script_id: ScriptId,
}

/// Result of `Debugger.getScriptSource`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetScriptSourceReturn {
    /// File contents as text
    pub script_source: String,
}

/// Parameters of `Debugger.evaluateOnCallFrame`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateOnCallFrameParams {
    /// Decimal frame index within the routine's stack
    pub call_frame_id: String,
    /// Expression handed to the backend evaluator
    pub expression: String,
    /// Routine to evaluate on; defaults to the active routine
    #[serde(
        default,
        rename = "destinationTargetID",
        skip_serializing_if = "Option::is_none"
    )]
    pub destination_target_id: Option<String>,
}

/// Result of `Debugger.evaluateOnCallFrame`.
///
/// Exactly one of the two fields is populated: evaluator failures are data,
/// not command errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateOnCallFrameReturn {
    /// Projected result object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<RemoteObject>,
    /// Evaluation failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_details: Option<ExceptionDetails>,
}
