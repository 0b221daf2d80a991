// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the vault engine.
//!
//! The document store and the prompt are async and use `#[async_trait]` so
//! they can be held as `Arc<dyn ...>` trait objects.

pub mod prompt;
pub mod random;
pub mod store;

pub use prompt::SecretPrompt;
pub use random::RandomSource;
pub use store::DocumentStore;
