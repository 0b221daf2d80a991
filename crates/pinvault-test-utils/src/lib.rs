// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Pinvault integration tests.
//!
//! Provides in-process test doubles for the collaborators the vault engine
//! depends on, so tests run fast and deterministically without a database or
//! a terminal.
//!
//! # Components
//!
//! - [`MemoryStore`] - In-memory document store with change events and failure injection
//! - [`ScriptedPrompt`] - Secret prompt that replays pre-configured answers
//! - [`FixedRandom`] - Random source that emits a fixed byte pattern

pub mod memory_store;
pub mod random;
pub mod scripted_prompt;

pub use memory_store::MemoryStore;
pub use random::{FailingRandom, FixedRandom};
pub use scripted_prompt::ScriptedPrompt;
