//! Prefix command parsing and lookup
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Name/alias routing with "did you mean" suggestions

use std::sync::Arc;

use super::registry::Registry;
use crate::features::definitions::PrefixCommand;

const MAX_SUGGESTIONS: usize = 3;
const MAX_DISTANCE: usize = 2;

/// A message split into trigger and arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    /// Lowercased first word after the prefix
    pub trigger: String,
    pub args: Vec<String>,
}

/// Outcome of routing a message to a prefix command
pub enum PrefixRoute {
    /// Not addressed to the bot
    NotPrefixed,
    Unknown {
        trigger: String,
        suggestions: Vec<String>,
    },
    Matched {
        command: Arc<PrefixCommand>,
        parsed: ParsedMessage,
    },
}

/// Split `content` into trigger and args if it starts with `prefix`
///
/// The prefix match ignores case; arguments keep their original case.
pub fn parse(content: &str, prefix: &str) -> Option<ParsedMessage> {
    if prefix.is_empty() {
        return None;
    }
    let head = content.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }

    let mut words = content[prefix.len()..].split_whitespace();
    let trigger = words.next()?.to_lowercase();
    Some(ParsedMessage {
        trigger,
        args: words.map(String::from).collect(),
    })
}

/// Resolve a message against the prefix registry
pub fn route(registry: &Registry<PrefixCommand>, content: &str, prefix: &str) -> PrefixRoute {
    let Some(parsed) = parse(content, prefix) else {
        return PrefixRoute::NotPrefixed;
    };

    match registry.resolve(&parsed.trigger) {
        Some(command) => PrefixRoute::Matched { command, parsed },
        None => PrefixRoute::Unknown {
            suggestions: suggest(&parsed.trigger, &registry.triggers()),
            trigger: parsed.trigger,
        },
    }
}

/// Up to three known triggers within a small edit distance, closest first
pub fn suggest(input: &str, known: &[String]) -> Vec<String> {
    let mut scored: Vec<(usize, &String)> = known
        .iter()
        .map(|k| (levenshtein(input, k), k))
        .filter(|(d, _)| *d <= MAX_DISTANCE)
        .collect();
    scored.sort();
    scored.dedup_by(|a, b| a.1 == b.1);
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, k)| k.clone())
        .collect()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Reply for an unknown trigger; unknown words with no close match get no reply
pub fn unknown_reply(suggestions: &[String]) -> Option<String> {
    if suggestions.is_empty() {
        return None;
    }
    Some(format!(
        "Command not found. Did you mean: {}?",
        suggestions.join(", ")
    ))
}
