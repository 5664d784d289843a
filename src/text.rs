//! Phrase normalization and regex construction shared by the matcher and scorer.

use std::collections::BTreeSet;

/// Lowercases and collapses internal whitespace.
pub fn normalize_phrase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Regex source for a literal phrase: escaped, flexible on whitespace, and
/// anchored on word boundaries wherever the phrase edge is a word character.
pub fn phrase_pattern(phrase: &str) -> Option<String> {
    let normalized = normalize_phrase(phrase);
    let first = normalized.chars().next()?;
    let last = normalized.chars().last()?;

    let body = normalized
        .split(' ')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");

    Some(format!(
        "{}{}{}",
        if is_word_char(first) { r"\b" } else { "" },
        body,
        if is_word_char(last) { r"\b" } else { "" },
    ))
}

/// Case-insensitive alternation over literal phrases, longest phrase first so
/// that leftmost-first matching prefers "office 365" over "office".
pub fn phrase_alternation<I, S>(phrases: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let unique: BTreeSet<String> = phrases
        .into_iter()
        .map(|p| normalize_phrase(p.as_ref()))
        .filter(|p| !p.is_empty())
        .collect();

    let mut ordered: Vec<String> = unique.into_iter().collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let branches: Vec<String> = ordered.iter().filter_map(|p| phrase_pattern(p)).collect();
    if branches.is_empty() {
        return None;
    }

    Some(format!("(?i)(?:{})", branches.join("|")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_normalize_phrase() {
        assert_eq!(normalize_phrase("  Office   365 "), "office 365");
    }

    #[test]
    fn test_phrase_pattern_boundaries() {
        let re = Regex::new(&format!("(?i){}", phrase_pattern("msp").unwrap())).unwrap();
        assert!(re.is_match("Our MSP pricing"));
        assert!(!re.is_match("msps everywhere"));

        let re = Regex::new(&format!("(?i){}", phrase_pattern("wiz.io").unwrap())).unwrap();
        assert!(re.is_match("see wiz.io today"));
        assert!(!re.is_match("wizzio"));
    }

    #[test]
    fn test_alternation_prefers_longest() {
        let re = Regex::new(&phrase_alternation(["office", "office 365"]).unwrap()).unwrap();
        let m = re.find("Office  365 renewals").unwrap();
        assert_eq!(m.as_str(), "Office  365");
    }

    #[test]
    fn test_alternation_empty() {
        assert!(phrase_alternation(Vec::<String>::new()).is_none());
        assert!(phrase_alternation(["  "]).is_none());
    }
}
