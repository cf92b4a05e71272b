// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slack channel id normalization for the monitored-channel allowlist.
//!
//! The same [`normalize_channel_id`] is applied to configured entries and to
//! incoming event channel ids, so `#c0123abcd` in the config matches events
//! from `C0123ABCD`.

/// Minimum length of a Slack conversation id.
const MIN_CHANNEL_ID_LEN: usize = 9;

/// Trim, drop one leading `#`, and uppercase.
pub fn normalize_channel_id(entry: &str) -> String {
    let trimmed = entry.trim();
    let without_hash = trimmed.strip_prefix('#').unwrap_or(trimmed);
    without_hash.to_ascii_uppercase()
}

/// Whether an already-normalized value looks like a public, private or DM
/// conversation id.
pub fn is_valid_channel_id(value: &str) -> bool {
    value.len() >= MIN_CHANNEL_ID_LEN
        && value.starts_with(['C', 'G', 'D'])
        && value
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Split every entry on commas, trim, and drop empties.
fn raw_entries(entries: &[String]) -> impl Iterator<Item = &str> {
    entries
        .iter()
        .flat_map(|e| e.split(','))
        .map(str::trim)
        .filter(|e| !e.is_empty())
}

/// Normalized ids of all valid entries, in configuration order.
pub fn normalized_channel_ids(entries: &[String]) -> Vec<String> {
    raw_entries(entries)
        .map(normalize_channel_id)
        .filter(|id| is_valid_channel_id(id))
        .collect()
}

/// Raw entries that fail validation after normalization.
pub fn invalid_channel_entries(entries: &[String]) -> Vec<String> {
    raw_entries(entries)
        .filter(|e| !is_valid_channel_id(&normalize_channel_id(e)))
        .map(str::to_string)
        .collect()
}
