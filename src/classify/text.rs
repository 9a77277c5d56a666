//! Tokenization for market questions

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "of", "to", "in", "on", "at", "by", "for", "from", "with",
    "is", "are", "was", "were", "be", "been", "will", "would", "should", "can", "could", "does",
    "do", "did", "this", "that", "these", "those", "it", "its", "as", "than", "then", "there",
    "their", "they", "he", "she", "his", "her", "who", "what", "which", "when", "where", "how",
    "if", "not", "no", "yes", "any", "before", "after", "end", "market", "resolve", "resolves",
];

/// Lowercase words of two or more characters, stop words removed.
/// `$` survives as a word prefix so tickers like `$btc` stay distinct.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tokens = Vec::new();
    let mut current = String::new();

    fn flush(current: &mut String, tokens: &mut Vec<String>) {
        let word = current.trim_start_matches('$');
        let keep = word.chars().count() >= 2 && !STOP_WORDS.contains(&word);
        if keep {
            tokens.push(std::mem::take(current));
        } else {
            current.clear();
        }
    }

    for c in lower.chars() {
        if c.is_alphanumeric() || (c == '$' && current.is_empty()) {
            current.push(c);
        } else {
            flush(&mut current, &mut tokens);
        }
    }
    flush(&mut current, &mut tokens);
    tokens
}

/// Lowercase text with separators collapsed to single spaces, for phrase lookups
pub fn normalize_phrase_text(text: &str) -> String {
    let lower = text.to_lowercase();
    let replaced: String = lower
        .chars()
        .map(|c| if matches!(c, '-' | '_' | '/' | ',' | '?' | '!' | '(' | ')' | ':' | ';') { ' ' } else { c })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
