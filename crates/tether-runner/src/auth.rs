// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Detection of "you need to sign in" failures in agent output.

/// Phrases the agent CLI prints when it has no usable credentials. Matched
/// against lowercased, whitespace-collapsed output.
const SIGN_IN_PHRASES: &[&str] = &[
    "please run claude login",
    "please run /login",
    "run `claude login`",
    "not logged in",
    "invalid api key",
    "authentication required",
    "login required",
    "oauth token has expired",
];

/// Maximum characters of output attached to an authentication failure.
pub const SNIPPET_CHARS: usize = 200;

/// Collapse every whitespace run to a single space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// If the combined output asks for a sign-in, return a short snippet of it.
pub fn detect_sign_in_required(stdout: &str, stderr: &str) -> Option<String> {
    let combined = collapse_whitespace(&format!("{stderr}\n{stdout}"));
    let haystack = combined.to_lowercase();
    if !SIGN_IN_PHRASES.iter().any(|p| haystack.contains(p)) {
        return None;
    }
    Some(combined.chars().take(SNIPPET_CHARS).collect())
}
