// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context-augmented prompt rendering.

use tether_core::ConversationTurn;

const PREAMBLE: &str = "You are continuing a conversation in a Slack thread. \
The earlier turns of the thread are listed below, oldest first.";

const CLOSING: &str = "Reply to the latest request. Use the earlier turns as context \
and do not repeat them.";

/// Render `turns` followed by `latest_prompt`. With no turns the prompt is
/// returned as is.
pub fn build_augmented_prompt(turns: &[ConversationTurn], latest_prompt: &str) -> String {
    if turns.is_empty() {
        return latest_prompt.to_string();
    }

    let mut out = String::with_capacity(
        PREAMBLE.len() + CLOSING.len() + latest_prompt.len() + turns.len() * 64,
    );
    out.push_str(PREAMBLE);
    out.push_str("\n\nConversation so far:\n");
    for turn in turns {
        out.push_str(turn.role.label());
        out.push_str(": ");
        out.push_str(turn.text.trim());
        out.push('\n');
    }
    out.push_str("\nLatest request:\n");
    out.push_str(latest_prompt);
    out.push_str("\n\n");
    out.push_str(CLOSING);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_turns_in_order_between_preamble_and_closing() {
        let turns = [
            ConversationTurn::user("deploy staging"),
            ConversationTurn::assistant("done\n"),
        ];
        let prompt = build_augmented_prompt(&turns, "now production");

        let user = prompt.find("User: deploy staging\n").unwrap();
        let assistant = prompt.find("Assistant: done\n").unwrap();
        let latest = prompt.find("Latest request:\nnow production").unwrap();
        assert!(prompt.starts_with(PREAMBLE));
        assert!(user < assistant && assistant < latest);
        assert!(prompt.ends_with(CLOSING));
    }

    #[test]
    fn empty_history_is_identity() {
        assert_eq!(build_augmented_prompt(&[], "hello"), "hello");
    }
}
