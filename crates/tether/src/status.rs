// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tether status` command implementation.
//!
//! Reads recent tasks and mentions straight from the history database, so it
//! works whether or not `tether serve` is running.

use std::io::IsTerminal;

use serde::Serialize;
use tether_config::TetherConfig;
use tether_core::{HistoryStore, MentionRecord, MentionStatus, Task, TaskStatus, TetherError};
use tether_storage::SqliteHistoryStore;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub database_path: String,
    pub monitored_channels: Vec<String>,
    pub tasks: Vec<Task>,
    pub mentions: Vec<MentionRecord>,
}

pub async fn run_status(
    config: &TetherConfig,
    json: bool,
    plain: bool,
    limit: usize,
) -> Result<(), TetherError> {
    let store = SqliteHistoryStore::open(&config.history).await?;
    let mut tasks = store.load_tasks(limit).await?;
    let mut mentions = store.load_mentions(limit).await?;
    // Newest first for display.
    tasks.reverse();
    mentions.reverse();

    let report = StatusReport {
        database_path: config.history.database_path.clone(),
        monitored_channels: config.slack.normalized_channel_ids(),
        tasks,
        mentions,
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print!("{}", render_report(&report, use_color));
    }
    Ok(())
}

fn render_report(report: &StatusReport, use_color: bool) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str("  tether status\n");
    out.push_str(&format!("  {}\n", "-".repeat(35)));
    out.push_str(&format!("    Database: {}\n", report.database_path));
    let channels = if report.monitored_channels.is_empty() {
        "all".to_string()
    } else {
        report.monitored_channels.join(", ")
    };
    out.push_str(&format!("    Channels: {channels}\n\n"));

    out.push_str("  Recent tasks\n");
    if report.tasks.is_empty() {
        out.push_str("    (none)\n");
    }
    for task in &report.tasks {
        out.push_str(&format!(
            "    {} {} {} {}\n",
            task_badge(task.status, use_color),
            task.created_at.format("%Y-%m-%d %H:%M:%S"),
            task.channel,
            truncate(&task.request_text, 60)
        ));
        if let Some(error) = &task.error {
            out.push_str(&format!("        error: {}\n", truncate(error, 100)));
        }
    }

    out.push_str("\n  Recent mentions\n");
    if report.mentions.is_empty() {
        out.push_str("    (none)\n");
    }
    for record in &report.mentions {
        out.push_str(&format!(
            "    {} {} {} {}\n",
            mention_badge(record.status, use_color),
            record.received_at.format("%Y-%m-%d %H:%M:%S"),
            record.channel,
            truncate(&record.prompt, 60)
        ));
    }
    out.push('\n');
    out
}

fn task_badge(status: TaskStatus, use_color: bool) -> String {
    let label = format!("[{status}]");
    if !use_color {
        return label;
    }
    use colored::Colorize;
    match status {
        TaskStatus::Succeeded => label.green().to_string(),
        TaskStatus::Failed => label.red().to_string(),
        TaskStatus::Queued | TaskStatus::Running => label.yellow().to_string(),
    }
}

fn mention_badge(status: MentionStatus, use_color: bool) -> String {
    let label = format!("[{status}]");
    if !use_color {
        return label;
    }
    use colored::Colorize;
    match status {
        MentionStatus::Queued => label.green().to_string(),
        MentionStatus::IgnoredChannel | MentionStatus::IgnoredEmptyPrompt => {
            label.dimmed().to_string()
        }
    }
}

/// Single-line preview of at most `max` characters.
fn truncate(text: &str, max: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let mut cut: String = flat.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use tether_core::Trigger;

    use super::*;

    fn report(tasks: Vec<Task>) -> StatusReport {
        StatusReport {
            database_path: "/tmp/tether.db".into(),
            monitored_channels: vec![],
            tasks,
            mentions: vec![],
        }
    }

    #[test]
    fn truncate_flattens_and_shortens() {
        assert_eq!(truncate("a\n  b", 10), "a b");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }

    #[test]
    fn plain_report_lists_tasks_and_errors() {
        let mut task = Task::from_trigger(&Trigger {
            channel: "C0123ABCD".into(),
            message_ts: "1.0".into(),
            thread_ts: "1.0".into(),
            prompt: "deploy staging".into(),
        });
        task.start();
        task.fail("agent exited with code 1: boom");

        let text = render_report(&report(vec![task]), false);
        assert!(text.contains("[failed]"));
        assert!(text.contains("deploy staging"));
        assert!(text.contains("error: agent exited with code 1: boom"));
        assert!(text.contains("Channels: all"));
        assert!(text.contains("Recent mentions\n    (none)"));
    }

    #[test]
    fn report_serializes_statuses_in_snake_case() {
        let event = tether_core::InboundEvent {
            kind: tether_core::EventKind::AppMention,
            channel: "C1".into(),
            ts: "1".into(),
            thread_ts: None,
            user: None,
            text: "<@U1>".into(),
            from_self: false,
        };
        let mut r = report(vec![]);
        r.mentions.push(MentionRecord::new(
            &event,
            "",
            MentionStatus::IgnoredEmptyPrompt,
        ));
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"ignored_empty_prompt\""));
    }

    #[tokio::test]
    async fn status_reads_an_empty_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TetherConfig::default();
        config.history.database_path = dir.path().join("t.db").to_string_lossy().into_owned();
        run_status(&config, true, true, 5).await.unwrap();
    }
}
