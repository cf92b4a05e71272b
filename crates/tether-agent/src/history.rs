// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded in-memory views of recent tasks and mentions.

use std::collections::VecDeque;

use tether_core::{MentionRecord, Task};

/// Most recent tasks, oldest first, capped at `capacity`.
#[derive(Debug, Clone)]
pub struct TaskHistory {
    tasks: VecDeque<Task>,
    capacity: usize,
}

impl TaskHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            tasks: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Seed from persisted tasks (oldest first).
    pub fn restore(&mut self, tasks: impl IntoIterator<Item = Task>) {
        self.tasks.clear();
        for task in tasks {
            self.upsert(task);
        }
    }

    /// Replace a task with the same id in place, or append it and drop the
    /// oldest entries beyond capacity.
    pub fn upsert(&mut self, task: Task) {
        if let Some(existing) = self.tasks.iter_mut().rev().find(|t| t.id == task.id) {
            *existing = task;
            return;
        }
        self.tasks.push_back(task);
        while self.tasks.len() > self.capacity {
            self.tasks.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

/// Most recent mention records, oldest first, capped at `capacity`.
#[derive(Debug, Clone)]
pub struct MentionLog {
    records: VecDeque<MentionRecord>,
    capacity: usize,
}

impl MentionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn restore(&mut self, records: impl IntoIterator<Item = MentionRecord>) {
        self.records.clear();
        for record in records {
            self.push(record);
        }
    }

    pub fn push(&mut self, record: MentionRecord) {
        self.records.push_back(record);
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &MentionRecord> {
        self.records.iter()
    }
}
