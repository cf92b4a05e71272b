// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mention routing: decides which inbound events become agent triggers.
//!
//! All functions here are pure. An event is a trigger when it is an
//! `app_mention`, mentions the bot's user id, or starts with the configured
//! command prefix. Triggers outside the allowlist or with nothing left after
//! stripping the mention are rejected with a reason.

use std::fmt;

use tether_config::channels::normalize_channel_id;
use tether_config::model::SlackConfig;
use tether_core::{EventKind, InboundEvent, MentionRecord, MentionStatus, Trigger};

/// Why a mention was not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    ChannelNotMonitored,
    EmptyPrompt,
}

impl RejectionReason {
    pub fn status(self) -> MentionStatus {
        match self {
            Self::ChannelNotMonitored => MentionStatus::IgnoredChannel,
            Self::EmptyPrompt => MentionStatus::IgnoredEmptyPrompt,
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelNotMonitored => f.write_str("ignored: channel not monitored"),
            Self::EmptyPrompt => f.write_str("ignored: empty prompt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Not addressed to the bot. No record is kept.
    NotAMention,
    /// Addressed to the bot but not actionable.
    Rejected {
        reason: RejectionReason,
        prompt: String,
    },
    Accepted(Trigger),
}

impl RouteDecision {
    /// Audit record for this decision, `None` for non-mentions.
    pub fn mention_record(&self, event: &InboundEvent) -> Option<MentionRecord> {
        match self {
            Self::NotAMention => None,
            Self::Rejected { reason, prompt } => {
                Some(MentionRecord::new(event, prompt.as_str(), reason.status()))
            }
            Self::Accepted(trigger) => Some(MentionRecord::new(
                event,
                trigger.prompt.as_str(),
                MentionStatus::Queued,
            )),
        }
    }
}

/// Stateless apart from the bot identity, which is refreshed on every connect.
#[derive(Debug, Clone, Default)]
pub struct MentionRouter {
    bot_user_id: Option<String>,
    allowlist: Vec<String>,
    command_prefix: Option<String>,
}

impl MentionRouter {
    /// Router with an allowlist of channel ids. Entries are normalized but not
    /// validated; an empty list allows every channel.
    pub fn new<I, S>(allowlist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            bot_user_id: None,
            allowlist: allowlist
                .into_iter()
                .map(|id| normalize_channel_id(id.as_ref()))
                .filter(|id| !id.is_empty())
                .collect(),
            command_prefix: None,
        }
    }

    /// Router for the configured allowlist, keeping only valid channel ids.
    pub fn from_config(config: &SlackConfig) -> Self {
        Self::new(config.normalized_channel_ids()).with_command_prefix(&config.command_prefix)
    }

    /// An empty prefix disables prefix triggers.
    pub fn with_command_prefix(mut self, prefix: &str) -> Self {
        let prefix = prefix.trim();
        self.command_prefix = (!prefix.is_empty()).then(|| prefix.to_string());
        self
    }

    pub fn with_bot_user_id(mut self, bot_user_id: impl Into<String>) -> Self {
        self.set_bot_user_id(Some(bot_user_id.into()));
        self
    }

    pub fn set_bot_user_id(&mut self, bot_user_id: Option<String>) {
        self.bot_user_id = bot_user_id.filter(|id| !id.is_empty());
    }

    pub fn bot_user_id(&self) -> Option<&str> {
        self.bot_user_id.as_deref()
    }

    pub fn allowlist(&self) -> &[String] {
        &self.allowlist
    }

    /// Whether the event is addressed to the bot at all.
    pub fn is_trigger(&self, event: &InboundEvent) -> bool {
        if event.from_self {
            return false;
        }
        if event.kind == EventKind::AppMention {
            return true;
        }
        if let Some(bot) = &self.bot_user_id
            && contains_mention_of(&event.text, bot)
        {
            return true;
        }
        self.command_prefix
            .as_deref()
            .is_some_and(|prefix| event.text.trim().starts_with(prefix))
    }

    /// Text with the bot mention (or prefix) removed and whitespace trimmed.
    pub fn extract_prompt(&self, text: &str) -> String {
        let cleaned = extract_prompt(text, self.bot_user_id.as_deref());
        match self.command_prefix.as_deref() {
            Some(prefix) => match cleaned.strip_prefix(prefix) {
                Some(rest) => rest.trim().to_string(),
                None => cleaned,
            },
            None => cleaned,
        }
    }

    /// Route one event.
    pub fn evaluate(&self, event: &InboundEvent) -> RouteDecision {
        if !self.is_trigger(event) {
            return RouteDecision::NotAMention;
        }

        let prompt = self.extract_prompt(&event.text);

        if !self.allowlist.is_empty() && !self.allowlist.contains(&normalize_channel_id(&event.channel)) {
            return RouteDecision::Rejected {
                reason: RejectionReason::ChannelNotMonitored,
                prompt,
            };
        }

        if prompt.is_empty() {
            return RouteDecision::Rejected {
                reason: RejectionReason::EmptyPrompt,
                prompt,
            };
        }

        RouteDecision::Accepted(Trigger {
            channel: event.channel.clone(),
            message_ts: event.ts.clone(),
            thread_ts: event.thread_id().to_string(),
            prompt,
        })
    }
}

/// Whether `text` contains `<@BOT>` or the labelled form `<@BOT|name>`.
fn contains_mention_of(text: &str, bot_user_id: &str) -> bool {
    find_mention(text, bot_user_id).is_some()
}

/// Byte range of the first mention token for `bot_user_id`.
fn find_mention(text: &str, bot_user_id: &str) -> Option<(usize, usize)> {
    let needle = format!("<@{bot_user_id}");
    let mut from = 0;
    while let Some(pos) = text[from..].find(&needle) {
        let start = from + pos;
        let after = start + needle.len();
        match text[after..].chars().next() {
            Some('>') => return Some((start, after + 1)),
            Some('|') => {
                if let Some(close) = text[after..].find('>') {
                    return Some((start, after + close + 1));
                }
            }
            _ => {}
        }
        from = after;
    }
    None
}

/// Strip bot mentions from `text` and trim.
///
/// With a known identity every `<@BOT>` token is removed (repeatedly, so the
/// result never contains one). Without it, a single leading `<@…>` token is
/// removed on the assumption that it addresses the bot; this is approximate.
pub fn extract_prompt(text: &str, bot_user_id: Option<&str>) -> String {
    match bot_user_id {
        Some(bot) => {
            let mut cleaned = text.to_string();
            while let Some((start, end)) = find_mention(&cleaned, bot) {
                cleaned.replace_range(start..end, "");
            }
            cleaned.trim().to_string()
        }
        None => {
            let trimmed = text.trim();
            match trimmed.strip_prefix("<@").and_then(|rest| rest.find('>').map(|i| &rest[i + 1..])) {
                Some(rest) => rest.trim().to_string(),
                None => trimmed.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn message(text: &str, channel: &str) -> InboundEvent {
        InboundEvent {
            kind: EventKind::Message,
            channel: channel.into(),
            ts: "1".into(),
            thread_ts: None,
            user: Some("U9".into()),
            text: text.into(),
            from_self: false,
        }
    }

    #[test]
    fn message_mentioning_bot_becomes_trigger() {
        let router = MentionRouter::new(Vec::<String>::new()).with_bot_user_id("U1");
        let decision = router.evaluate(&message("<@U1> hello", "C1"));
        assert_eq!(
            decision,
            RouteDecision::Accepted(Trigger {
                channel: "C1".into(),
                message_ts: "1".into(),
                thread_ts: "1".into(),
                prompt: "hello".into(),
            })
        );
    }

    #[test]
    fn channel_outside_allowlist_is_rejected() {
        let router = MentionRouter::new(["C2"]).with_bot_user_id("U1");
        let decision = router.evaluate(&message("<@U1> hello", "C1"));
        assert!(matches!(
            decision,
            RouteDecision::Rejected {
                reason: RejectionReason::ChannelNotMonitored,
                ..
            }
        ));
        assert_eq!(
            RejectionReason::ChannelNotMonitored.to_string(),
            "ignored: channel not monitored"
        );
    }

    #[test]
    fn allowlist_matches_normalized_incoming_channel() {
        let router = MentionRouter::new(["#c0123abcd"]).with_bot_user_id("U1");
        let decision = router.evaluate(&message("<@U1> hi", "c0123abcd"));
        assert!(matches!(decision, RouteDecision::Accepted(_)));
    }

    #[test]
    fn bare_mention_is_empty_prompt() {
        let router = MentionRouter::new(Vec::<String>::new()).with_bot_user_id("U1");
        let event = message("  <@U1>  ", "C1");
        let decision = router.evaluate(&event);
        assert_eq!(
            decision,
            RouteDecision::Rejected {
                reason: RejectionReason::EmptyPrompt,
                prompt: String::new()
            }
        );
        let record = decision.mention_record(&event).unwrap();
        assert_eq!(record.status, MentionStatus::IgnoredEmptyPrompt);
    }

    #[test]
    fn unrelated_message_is_not_a_mention() {
        let router = MentionRouter::new(Vec::<String>::new()).with_bot_user_id("U1");
        let event = message("<@U2> lunch?", "C1");
        let decision = router.evaluate(&event);
        assert_eq!(decision, RouteDecision::NotAMention);
        assert!(decision.mention_record(&event).is_none());
    }

    #[test]
    fn self_events_are_never_triggers() {
        let router = MentionRouter::new(Vec::<String>::new()).with_bot_user_id("U1");
        let mut event = message("<@U1> loop", "C1");
        event.kind = EventKind::AppMention;
        event.from_self = true;
        assert_eq!(router.evaluate(&event), RouteDecision::NotAMention);
    }

    #[test]
    fn app_mention_without_identity_strips_leading_token() {
        let router = MentionRouter::new(Vec::<String>::new());
        let mut event = message("<@UXYZ> summarize the thread", "C1");
        event.kind = EventKind::AppMention;
        event.thread_ts = Some("0.5".into());
        match router.evaluate(&event) {
            RouteDecision::Accepted(trigger) => {
                assert_eq!(trigger.prompt, "summarize the thread");
                assert_eq!(trigger.thread_ts, "0.5");
            }
            other => panic!("expected Accepted, got {other:?}"),
        }
    }

    #[test]
    fn config_allowlist_drops_invalid_entries() {
        let config = SlackConfig {
            monitored_channels: vec!["general, #c0123abcd".into()],
            ..SlackConfig::default()
        };
        let router = MentionRouter::from_config(&config);
        assert_eq!(router.allowlist(), ["C0123ABCD"]);
    }

    #[test]
    fn labelled_and_repeated_mentions_are_removed() {
        assert_eq!(
            extract_prompt("<@U1|tether> ping <@U1> pong", Some("U1")),
            "ping  pong"
        );
        assert_eq!(extract_prompt("<@<@U1>U1> x", Some("U1")), "x");
        assert_eq!(extract_prompt("<@U10> x", Some("U1")), "<@U10> x");
    }

    #[test]
    fn command_prefix_triggers_and_is_stripped() {
        let router = MentionRouter::new(Vec::<String>::new())
            .with_bot_user_id("U1")
            .with_command_prefix("!claude");
        match router.evaluate(&message("  !claude  what time is it", "C1")) {
            RouteDecision::Accepted(trigger) => assert_eq!(trigger.prompt, "what time is it"),
            other => panic!("expected Accepted, got {other:?}"),
        }
        assert_eq!(
            router.evaluate(&message("no prefix here", "C1")),
            RouteDecision::NotAMention
        );
    }

    proptest! {
        #[test]
        fn extraction_is_idempotent_with_identity(text in "[a-zA-Z0-9 <@>|]{0,40}") {
            let once = extract_prompt(&text, Some("U1"));
            let twice = extract_prompt(&once, Some("U1"));
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn extraction_is_idempotent_on_clean_text(text in "[a-zA-Z0-9 ,.?]{0,40}") {
            let once = extract_prompt(&text, None);
            prop_assert_eq!(extract_prompt(&once, None), once.clone());
            prop_assert_eq!(extract_prompt(&once, Some("U1")), once);
        }
    }
}
