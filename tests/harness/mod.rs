// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for the MCP gateway.
//!
//! Builds fixture sites, wires them into the real router, and signs
//! requests the way an agent would.

#![allow(dead_code)]

pub mod fixtures;
pub mod requests;
