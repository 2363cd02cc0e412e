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

//! RDT Common - Shared types and contracts for RDT components
//!
//! This crate carries everything the proxy core and its embedders agree on:
//! the DevTools wire shapes, the backend debugger data model, and the traits
//! for the two external collaborators (the debugger client library and the
//! Runtime companion that materializes remote object handles).

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod client;
pub mod test_utils;
pub mod types;

pub use client::*;
pub use types::*;
