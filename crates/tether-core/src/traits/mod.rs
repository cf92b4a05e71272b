// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits at the seams of the execution pipeline.
//!
//! The executor only talks to its surroundings through these traits, so each
//! side can be swapped for a mock in tests.

pub mod history;
pub mod notifier;
pub mod reply;
pub mod runner;
pub mod secrets;

pub use history::HistoryStore;
pub use notifier::Notifier;
pub use reply::ReplySink;
pub use runner::AgentRunner;
pub use secrets::SecretStore;
