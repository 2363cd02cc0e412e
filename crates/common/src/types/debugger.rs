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

//! Backend debugger data model.
//!
//! These are the shapes the [`DebugClient`](crate::client::DebugClient)
//! contract speaks. Line numbers here are one-based, as native debuggers
//! report them.

use serde::{Deserialize, Serialize};
use std::{fmt, num::ParseIntError, str::FromStr};

/// Identifier of one routine in the debuggee.
///
/// Stable while the routine lives; the backend may reuse an id after the
/// routine is destroyed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct RoutineId(pub i64);

impl fmt::Display for RoutineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RoutineId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(Self)
    }
}

/// Function metadata attached to a source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    /// Fully qualified function name (dot-separated path)
    pub name: String,
}

/// A source location as the backend reports it (one-based line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Absolute source file path
    pub file: String,
    /// One-based line number
    pub line: i64,
    /// Enclosing function, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionInfo>,
}

/// One routine as reported by a routine listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    /// Routine identifier
    pub id: RoutineId,
    /// Where the routine currently is in user code
    pub current_loc: SourceLocation,
}

impl Routine {
    /// Short name of the routine's current function: the last dot-segment of
    /// the fully qualified name, or `None` when the backend reports no
    /// function.
    pub fn short_function_name(&self) -> Option<&str> {
        let name = self.current_loc.function.as_ref()?.name.as_str();
        Some(name.rsplit('.').next().unwrap_or(name))
    }
}

/// One backend stack frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stackframe {
    /// Frame location (one-based line)
    pub location: SourceLocation,
}

/// Debugger state as returned by state queries and resume primitives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebuggerState {
    /// Whether the debuggee is currently executing
    pub running: bool,
    /// The routine the backend considers selected, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_routine: Option<Routine>,
}

/// How much variable data the backend loads per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Dereference pointers while loading
    pub follow_pointers: bool,
    /// Recursion limit for nested values
    pub max_variable_recurse: i64,
    /// Truncate strings beyond this many bytes
    pub max_string_len: i64,
    /// Load at most this many array elements
    pub max_array_values: i64,
    /// Load at most this many struct fields
    pub max_struct_fields: i64,
}

/// Evaluation scope: a frame within a routine's stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalScope {
    /// Routine to evaluate on
    pub routine_id: RoutineId,
    /// Zero-based frame index within that routine's stack
    pub frame: i64,
}

/// A variable as produced by the backend evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Variable name
    pub name: String,
    /// Backend type name
    pub type_name: String,
    /// Rendered value
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routine_id_round_trips_through_decimal_strings() {
        let id: RoutineId = "42".parse().unwrap();
        assert_eq!(id, RoutineId(42));
        assert_eq!(id.to_string(), "42");

        assert!("42x".parse::<RoutineId>().is_err());
        assert!("".parse::<RoutineId>().is_err());
    }

    #[test]
    fn test_short_function_name_takes_last_dot_segment() {
        let mut routine = Routine {
            id: RoutineId(1),
            current_loc: SourceLocation {
                file: "/a/b.src".into(),
                line: 3,
                function: Some(FunctionInfo { name: "pkg.sub.Worker".into() }),
            },
        };
        assert_eq!(routine.short_function_name(), Some("Worker"));

        routine.current_loc.function = Some(FunctionInfo { name: "main".into() });
        assert_eq!(routine.short_function_name(), Some("main"));

        routine.current_loc.function = None;
        assert_eq!(routine.short_function_name(), None);
    }
}
