//! Label keywords for clusters, mined from member titles.

use std::collections::HashMap;

/// Maximum number of keywords returned per cluster.
pub const MAX_KEYWORDS: usize = 5;

/// Only this many titles are considered.
pub const MAX_TITLES: usize = 10;

/// Tokens of this many characters or fewer are dropped.
const MIN_TOKEN_CHARS: usize = 3;

/// Function words plus words that appear in almost every paper title.
const STOPWORDS: &[&str] = &[
    // function words
    "the", "and", "for", "with", "from", "into", "onto", "upon", "that", "this", "these", "those",
    "their", "there", "which", "while", "where", "when", "what", "whose", "about", "above",
    "after", "again", "against", "among", "around", "before", "below", "between", "beyond",
    "both", "during", "each", "either", "more", "most", "other", "over", "same", "some", "such",
    "than", "then", "through", "toward", "towards", "under", "until", "very", "within",
    "without", "have", "been", "being", "were", "does", "will", "would", "could", "should",
    "also", "only", "just", "using", "based", "versus",
    // scholarly noise
    "study", "studies", "analysis", "analyses", "results", "result", "approach", "approaches",
    "method", "methods", "methodology", "paper", "review", "survey", "case", "effect",
    "effects", "evaluation", "investigation", "research", "novel", "application",
    "applications", "model", "models", "framework", "perspective",
    "perspectives", "evidence", "implications", "role", "impact", "understanding",
];

/// Extracts up to [`MAX_KEYWORDS`] keywords from cluster titles.
///
/// Titles are lowercased, stripped of non-alphabetic characters and split
/// on whitespace. Short tokens and stopwords are dropped; the rest are
/// ranked by frequency, ties going to the token seen first.
pub fn extract_keywords<S: AsRef<str>>(titles: &[S]) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for title in titles.iter().take(MAX_TITLES) {
        let cleaned: String = title
            .as_ref()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphabetic() || c.is_whitespace())
            .collect();

        for token in cleaned.split_whitespace() {
            if token.chars().count() <= MIN_TOKEN_CHARS || STOPWORDS.contains(&token) {
                continue;
            }
            match positions.get(token) {
                Some(&pos) => counts[pos].1 += 1,
                None => {
                    positions.insert(token.to_string(), counts.len());
                    counts.push((token.to_string(), 1));
                }
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(token, _)| token)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_keywords() {
        let keywords = extract_keywords(&[
            "Deep Learning for Cancer Detection",
            "Deep Learning in Oncology",
        ]);
        assert!(keywords.contains(&"deep".to_string()));
        assert!(keywords.contains(&"learning".to_string()));
        assert!(!keywords.contains(&"for".to_string()));
        assert!(!keywords.contains(&"in".to_string()));
        assert_eq!(keywords[..2], ["deep", "learning"]);
    }

    #[test]
    fn test_scholarly_noise_is_dropped() {
        let keywords = extract_keywords(&[
            "A Study of Protein Folding: Results and Analysis",
            "Protein Folding Dynamics",
        ]);
        assert_eq!(keywords, vec!["protein", "folding", "dynamics"]);
    }

    #[test]
    fn test_punctuation_and_digits_are_stripped() {
        let keywords = extract_keywords(&["COVID-19 Transmission (2020)"]);
        assert_eq!(keywords, vec!["covid", "transmission"]);
    }

    #[test]
    fn test_top_five_by_frequency_then_first_seen() {
        let keywords = extract_keywords(&[
            "alpha bravo charlie delta echo foxtrot",
            "foxtrot echo",
            "foxtrot",
        ]);
        assert_eq!(
            keywords,
            vec!["foxtrot", "echo", "alpha", "bravo", "charlie"]
        );
    }

    #[test]
    fn test_only_first_ten_titles_count() {
        let mut titles = vec!["graph"; 10];
        titles.extend(["protein"; 20]);
        // "graph" is 5 chars and survives; "protein" comes after the cap
        let keywords = extract_keywords(&titles);
        assert_eq!(keywords, vec!["graph"]);
    }

    #[test]
    fn test_empty_when_nothing_survives() {
        let keywords = extract_keywords(&["The and of in", "a an"]);
        assert!(keywords.is_empty());

        let none: [&str; 0] = [];
        assert!(extract_keywords(&none).is_empty());
    }
}
