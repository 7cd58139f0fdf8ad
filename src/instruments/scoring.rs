use std::collections::HashSet;

/// Outcome of matching free-text recall against the shown word list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecallScore {
    /// Matched words with the casing they were shown in, in shown-list order.
    pub correct_words: Vec<String>,
}

impl RecallScore {
    pub fn score(&self) -> usize {
        self.correct_words.len()
    }
}

/// Splits on whitespace and commas, dropping empty tokens.
pub fn tokenize(input: &str) -> impl Iterator<Item = &str> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
}

/// Exact, case-insensitive, order-independent recall scoring.
///
/// A token recalled several times counts once. Each matched word is reported with the casing
/// of its first occurrence in `words`.
pub fn score_recall(words: &[String], input: &str) -> RecallScore {
    let recalled: HashSet<String> = tokenize(input).map(str::to_lowercase).collect();

    let mut matched = HashSet::new();
    let correct_words = words
        .iter()
        .filter(|word| {
            let lower = word.to_lowercase();
            recalled.contains(&lower) && matched.insert(lower)
        })
        .cloned()
        .collect();

    RecallScore { correct_words }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn repeated_and_mixed_case_tokens_count_once() {
        let result = score_recall(&words(&["River", "Moon"]), "river RIVER moon");
        assert_eq!(result.correct_words, vec!["River", "Moon"]);
        assert_eq!(result.score(), 2);
    }

    #[test]
    fn commas_and_whitespace_both_separate() {
        let result = score_recall(&words(&["Sun", "Moon", "Star"]), "moon,sun,\tsun\n");
        assert_eq!(result.correct_words, vec!["Sun", "Moon"]);
    }

    #[test]
    fn no_fuzzy_matching() {
        let result = score_recall(&words(&["Mountain", "Ocean"]), "mountains ocea Oceans");
        assert_eq!(result.score(), 0);
    }

    #[test]
    fn order_does_not_matter() {
        let list = words(&["Cloud", "Rain", "Forest"]);
        let forward = score_recall(&list, "cloud rain forest");
        let backward = score_recall(&list, "FOREST, rain, cloud");
        assert_eq!(forward, backward);
    }

    #[test]
    fn empty_input_scores_zero() {
        let result = score_recall(&words(&["Valley"]), " , ,, ");
        assert!(result.correct_words.is_empty());
        assert_eq!(tokenize(" , ,, ").count(), 0);
    }

    #[test]
    fn duplicate_list_entries_use_first_casing() {
        let result = score_recall(&words(&["Star", "STAR"]), "star");
        assert_eq!(result.correct_words, vec!["Star"]);
    }
}
