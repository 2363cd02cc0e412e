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

//! The typed command envelope the transport feeds the proxy.
//!
//! The agent dispatch layer (out of scope) parses each front-end command into
//! a [`DebuggerCommand`] variant carrying typed parameters and a one-shot
//! [`Responder`]. Exactly one response travels back per command; a dropped
//! responder means the front-end abandoned the session.

use rdt_common::{
    error_codes, EvaluateOnCallFrameParams, GetScriptSourceParams, RemoveBreakpointParams,
    SetBreakpointByUrlParams, StepParams,
};
use serde::Serialize;
use serde_json::json;
use tokio::sync::oneshot;
use tracing::{debug, error};

/// A protocol-level command failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolError {
    /// One of [`error_codes`]
    pub code: i32,
    /// Human-readable reason; may be empty
    pub message: String,
}

/// What a command resolves to: a result payload or a protocol error.
pub type CommandResult = Result<serde_json::Value, ProtocolError>;

/// One-shot response channel of a single command.
pub struct Responder(oneshot::Sender<CommandResult>);

impl Responder {
    /// Create a responder and the receiver the transport awaits.
    pub fn channel() -> (Self, oneshot::Receiver<CommandResult>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }

    /// Acknowledge with an empty result object.
    pub fn respond_empty(self) {
        self.send(Ok(json!({})));
    }

    /// Respond with a result payload.
    pub fn respond<T: Serialize>(self, payload: &T) {
        match serde_json::to_value(payload) {
            Ok(value) => self.send(Ok(value)),
            Err(err) => {
                error!(%err, "failed to serialize command result");
                self.send(Err(ProtocolError {
                    code: error_codes::INTERNAL_ERROR,
                    message: "failed to serialize result".to_string(),
                }));
            }
        }
    }

    /// Respond with a protocol error.
    pub fn respond_with_error(self, code: i32, message: impl Into<String>) {
        self.send(Err(ProtocolError { code, message: message.into() }));
    }

    fn send(self, result: CommandResult) {
        if self.0.send(result).is_err() {
            debug!("command abandoned before its response was delivered");
        }
    }
}

/// A parsed command: typed parameters plus the response channel.
pub struct Command<P> {
    /// Parsed parameters
    pub params: P,
    /// Response channel
    pub responder: Responder,
}

impl<P> Command<P> {
    /// Build a command and the receiver its response arrives on.
    pub fn new(params: P) -> (Self, oneshot::Receiver<CommandResult>) {
        let (responder, rx) = Responder::channel();
        (Self { params, responder }, rx)
    }

    /// Split into parameters and responder.
    pub fn into_parts(self) -> (P, Responder) {
        (self.params, self.responder)
    }

    /// Acknowledge with an empty result object.
    pub fn respond_empty(self) {
        self.responder.respond_empty();
    }

    /// Respond with a protocol error.
    pub fn respond_with_error(self, code: i32, message: impl Into<String>) {
        self.responder.respond_with_error(code, message);
    }
}

/// Every Debugger-domain command the agent parses.
///
/// Unsupported commands still arrive as their own variants so the router can
/// uphold the method-not-found contract per method; their raw parameters are
/// carried along untyped and ignored.
pub enum DebuggerCommand {
    /// `Debugger.enable`
    Enable(Command<()>),
    /// `Debugger.setBreakpointByUrl`
    SetBreakpointByUrl(Command<SetBreakpointByUrlParams>),
    /// `Debugger.removeBreakpoint`
    RemoveBreakpoint(Command<RemoveBreakpointParams>),
    /// `Debugger.stepOver`
    StepOver(Command<StepParams>),
    /// `Debugger.stepInto`
    StepInto(Command<StepParams>),
    /// `Debugger.stepOut`
    StepOut(Command<StepParams>),
    /// `Debugger.resume`
    Resume(Command<StepParams>),
    /// `Debugger.getScriptSource`
    GetScriptSource(Command<GetScriptSourceParams>),
    /// `Debugger.evaluateOnCallFrame`
    EvaluateOnCallFrame(Command<EvaluateOnCallFrameParams>),
    /// `Debugger.disable`
    Disable(Command<serde_json::Value>),
    /// `Debugger.setBreakpointsActive`
    SetBreakpointsActive(Command<serde_json::Value>),
    /// `Debugger.setSkipAllPauses`
    SetSkipAllPauses(Command<serde_json::Value>),
    /// `Debugger.setBreakpoint`
    SetBreakpoint(Command<serde_json::Value>),
    /// `Debugger.getPossibleBreakpoints`
    GetPossibleBreakpoints(Command<serde_json::Value>),
    /// `Debugger.continueToLocation`
    ContinueToLocation(Command<serde_json::Value>),
    /// `Debugger.pause`
    Pause(Command<serde_json::Value>),
    /// `Debugger.searchInContent`
    SearchInContent(Command<serde_json::Value>),
    /// `Debugger.setScriptSource`
    SetScriptSource(Command<serde_json::Value>),
    /// `Debugger.restartFrame`
    RestartFrame(Command<serde_json::Value>),
    /// `Debugger.setPauseOnExceptions`
    SetPauseOnExceptions(Command<serde_json::Value>),
    /// `Debugger.setVariableValue`
    SetVariableValue(Command<serde_json::Value>),
    /// `Debugger.setAsyncCallStackDepth`
    SetAsyncCallStackDepth(Command<serde_json::Value>),
    /// `Debugger.setBlackboxPatterns`
    SetBlackboxPatterns(Command<serde_json::Value>),
    /// `Debugger.setBlackboxedRanges`
    SetBlackboxedRanges(Command<serde_json::Value>),
}

impl DebuggerCommand {
    /// Protocol method name, for logging.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Enable(_) => "Debugger.enable",
            Self::SetBreakpointByUrl(_) => "Debugger.setBreakpointByUrl",
            Self::RemoveBreakpoint(_) => "Debugger.removeBreakpoint",
            Self::StepOver(_) => "Debugger.stepOver",
            Self::StepInto(_) => "Debugger.stepInto",
            Self::StepOut(_) => "Debugger.stepOut",
            Self::Resume(_) => "Debugger.resume",
            Self::GetScriptSource(_) => "Debugger.getScriptSource",
            Self::EvaluateOnCallFrame(_) => "Debugger.evaluateOnCallFrame",
            Self::Disable(_) => "Debugger.disable",
            Self::SetBreakpointsActive(_) => "Debugger.setBreakpointsActive",
            Self::SetSkipAllPauses(_) => "Debugger.setSkipAllPauses",
            Self::SetBreakpoint(_) => "Debugger.setBreakpoint",
            Self::GetPossibleBreakpoints(_) => "Debugger.getPossibleBreakpoints",
            Self::ContinueToLocation(_) => "Debugger.continueToLocation",
            Self::Pause(_) => "Debugger.pause",
            Self::SearchInContent(_) => "Debugger.searchInContent",
            Self::SetScriptSource(_) => "Debugger.setScriptSource",
            Self::RestartFrame(_) => "Debugger.restartFrame",
            Self::SetPauseOnExceptions(_) => "Debugger.setPauseOnExceptions",
            Self::SetVariableValue(_) => "Debugger.setVariableValue",
            Self::SetAsyncCallStackDepth(_) => "Debugger.setAsyncCallStackDepth",
            Self::SetBlackboxPatterns(_) => "Debugger.setBlackboxPatterns",
            Self::SetBlackboxedRanges(_) => "Debugger.setBlackboxedRanges",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_respond_empty_yields_empty_object() {
        let (cmd, rx) = Command::new(());
        cmd.respond_empty();
        assert_eq!(rx.await.unwrap().unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_respond_with_error_carries_code_and_message() {
        let (cmd, rx) = Command::new(());
        cmd.respond_with_error(error_codes::INVALID_PARAMS, "urlRegex not available");
        let err = rx.await.unwrap().unwrap_err();
        assert_eq!(err.code, error_codes::INVALID_PARAMS);
        assert_eq!(err.message, "urlRegex not available");
    }

    #[test]
    fn test_responder_tolerates_dropped_receiver() {
        let (cmd, rx) = Command::new(());
        drop(rx);
        cmd.respond_empty();
    }
}
