// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Execution side of Tether.
//!
//! [`Dispatcher`] turns socket events into queue items, [`TaskQueue`] runs
//! them one at a time through the [`Executor`], which owns conversation memory
//! and the task and mention views.

pub mod dispatch;
pub mod executor;
pub mod history;
pub mod notify;
pub mod queue;
pub mod shutdown;

pub use dispatch::{DEDUPE_WINDOW, Dispatched, Dispatcher};
pub use executor::{Collaborators, EMPTY_OUTPUT_PLACEHOLDER, Executor};
pub use history::{MentionLog, TaskHistory};
pub use notify::LogNotifier;
pub use queue::{QueueHandle, QueueItem, TaskQueue};
pub use shutdown::{install_signal_handler, wait_for_idle};
