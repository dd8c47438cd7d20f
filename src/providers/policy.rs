use crate::models::ValidationResult;

/// Shared forbidden terms, matched case-insensitively as substrings.
pub const FORBIDDEN_TERMS: &[&str] = &[
    "child",
    "kid",
    "minor",
    "underage",
    "teen",
    "toddler",
    "infant",
    "baby",
    "loli",
    "schoolgirl",
    "schulmädchen",
    "minderjährig",
    "gore",
    "mutilat",
    "dismember",
];

/// Wording that marks a provider-side rejection as a content-policy decision.
const POLICY_MARKERS: &[&str] = &[
    "policy",
    "safety",
    "nsfw",
    "content filter",
    "content_filtered",
    "moderation",
];

/// Returns every forbidden term (shared list first, then `extra`) found in
/// `prompt`.
pub fn matched_terms(prompt: &str, extra: &[&str]) -> Vec<String> {
    let haystack = prompt.to_lowercase();
    FORBIDDEN_TERMS
        .iter()
        .chain(extra.iter())
        .filter(|term| haystack.contains(&term.to_lowercase()))
        .map(|term| term.to_string())
        .collect()
}

pub fn check_prompt(prompt: &str, extra: &[&str]) -> ValidationResult {
    let matched = matched_terms(prompt, extra);
    if matched.is_empty() {
        ValidationResult::allowed()
    } else {
        ValidationResult::rejected(
            format!("Prompt contains forbidden terms: {}", matched.join(", ")),
            matched,
        )
    }
}

/// True when an error message reads like a safety or content-policy rejection.
pub fn mentions_policy(message: &str) -> bool {
    let message = message.to_lowercase();
    POLICY_MARKERS.iter().any(|marker| message.contains(marker))
}
