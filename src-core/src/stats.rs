//! Pure tallying behind the statistics pass: permissive address extraction,
//! subject tokenization, and frequency tables with stable tie-breaks.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Messages analyzed per statistics pass, at most. Larger folders are
/// sampled down to their most recent identifiers.
pub const SAMPLE_CEILING: usize = 1000;

pub const TOP_SENDERS: usize = 10;
pub const TOP_KEYWORDS: usize = 15;

/// Common words excluded from subject keyword tallies.
pub const SUBJECT_STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "was", "one", "our",
    "out", "day", "get", "has", "him", "his", "how", "its", "new", "now", "old", "see", "two",
    "who", "boy", "did", "may", "say", "she", "use", "her", "way", "will", "your",
];

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email pattern")
});

static SUBJECT_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-zA-Z]{3,}\b").expect("subject word pattern"));

/// Extract the first email address in a string, lowercased for keying.
pub fn extract_address(text: &str) -> Option<String> {
    EMAIL_PATTERN.find(text).map(|m| m.as_str().to_lowercase())
}

/// Meaningful subject tokens: alphabetic, length >= 3, not a stop word.
pub fn subject_keywords(subject: &str) -> Vec<String> {
    let lower = subject.to_lowercase();
    SUBJECT_WORD
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .filter(|w| !SUBJECT_STOP_WORDS.contains(&w.as_str()))
        .collect()
}

/// Keep the most recent `ceiling` identifiers of an ascending list.
pub fn sample_tail(ids: &[u32], ceiling: usize) -> &[u32] {
    if ids.len() > ceiling {
        &ids[ids.len() - ceiling..]
    } else {
        ids
    }
}

/// Frequency counter that remembers first-seen order so ranking ties come
/// out stable across runs.
#[derive(Debug, Default)]
pub struct FrequencyTable {
    counts: HashMap<String, (usize, usize)>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>) {
        let rank = self.counts.len();
        let entry = self.counts.entry(key.into()).or_insert((0, rank));
        entry.0 += 1;
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total of all counts across keys.
    pub fn total(&self) -> usize {
        self.counts.values().map(|(c, _)| c).sum()
    }

    /// Top `n` entries by count, ties resolved by first-seen order.
    pub fn top(&self, n: usize) -> Vec<(String, usize)> {
        let mut rows: Vec<(String, usize, usize)> = self
            .counts
            .iter()
            .map(|(k, &(count, rank))| (k.clone(), count, rank))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        rows.into_iter().take(n).map(|(k, c, _)| (k, c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_extraction_is_permissive_and_lowercases() {
        assert_eq!(
            extract_address("From: Alice Smith <Alice.Smith+x@Example.COM>"),
            Some("alice.smith+x@example.com".to_string())
        );
        assert_eq!(extract_address("no address here"), None);
    }

    #[test]
    fn subject_tokens_exclude_stop_words_and_short_words() {
        let words = subject_keywords("The new Project is ON for you");
        assert_eq!(words, vec!["project"]);
    }

    #[test]
    fn frequency_ties_break_by_first_seen_order() {
        let mut table = FrequencyTable::new();
        for key in ["beta", "alpha", "beta", "gamma", "alpha", "delta"] {
            table.add(key);
        }
        // beta and alpha tie at 2; beta was seen first.
        assert_eq!(
            table.top(3),
            vec![
                ("beta".to_string(), 2),
                ("alpha".to_string(), 2),
                ("gamma".to_string(), 1),
            ]
        );
        assert_eq!(table.total(), 6);
    }

    #[test]
    fn sample_tail_keeps_the_most_recent_identifiers() {
        let ids: Vec<u32> = (1..=5000).collect();
        let sampled = sample_tail(&ids, SAMPLE_CEILING);
        assert_eq!(sampled.len(), SAMPLE_CEILING);
        assert_eq!(sampled[0], 4001);
        assert_eq!(*sampled.last().unwrap(), 5000);

        let small: Vec<u32> = (1..=3).collect();
        assert_eq!(sample_tail(&small, SAMPLE_CEILING), &[1, 2, 3]);
    }
}
