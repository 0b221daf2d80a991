// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per collection.

pub mod entries;
pub mod folders;
pub mod master_keys;
