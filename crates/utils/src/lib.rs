// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
// SPDX-License-Identifier: AGPL-3.0
//! RDT Utils - Shared functionality for RDT components
//!
//! This crate provides utilities used by the proxy core and by embedders,
//! currently logging setup for binaries and tests.

pub mod logging;

pub use logging::*;
