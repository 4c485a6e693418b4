//! Text analysis for the in-memory store.
//!
//! Analyzers are resolved by the names used in field mappings. The `ik_*`
//! analyzers segment Chinese text into dictionary words with jieba, so that a
//! title such as `小米手机` yields the tokens `小米` and `手机`.

use jieba_rs::Jieba;
use once_cell::sync::Lazy;

/// Global jieba segmenter, loaded with the default dictionary on first use.
static JIEBA: Lazy<Jieba> = Lazy::new(Jieba::new);

/// A tokenization pipeline applied to text at index and query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Analyzer {
    /// Splits on non-alphanumeric characters, one token per CJK ideograph.
    Standard,
    /// Finest-grained dictionary segmentation: every dictionary word found.
    IkMaxWord,
    /// Coarse dictionary segmentation: one best path through the text.
    IkSmart,
    /// Splits on whitespace only, case preserved.
    Whitespace,
    /// The whole value as a single token.
    Keyword,
}

impl Analyzer {
    /// Resolve an analyzer by mapping name. Unknown names fall back to `standard`.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("ik_max_word") => Analyzer::IkMaxWord,
            Some("ik_smart") => Analyzer::IkSmart,
            Some("whitespace") => Analyzer::Whitespace,
            Some("keyword") => Analyzer::Keyword,
            _ => Analyzer::Standard,
        }
    }

    /// Split `text` into tokens.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        match self {
            Analyzer::Standard => standard_tokens(text),
            Analyzer::IkMaxWord => segment(JIEBA.cut_for_search(text, true)),
            Analyzer::IkSmart => segment(JIEBA.cut(text, true)),
            Analyzer::Whitespace => text.split_whitespace().map(str::to_string).collect(),
            Analyzer::Keyword => vec![text.to_string()],
        }
    }
}

/// Lowercase segmenter output, dropping whitespace and punctuation pieces.
/// Duplicates are removed while keeping first-seen order.
fn segment(words: Vec<&str>) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::with_capacity(words.len());
    for word in words {
        let word = word.trim();
        if word.is_empty() || !word.chars().any(char::is_alphanumeric) {
            continue;
        }
        let token = word.to_lowercase();
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

fn standard_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if is_cjk(c) {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            tokens.push(c.to_string());
        } else if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Check if a character is a CJK ideograph or kana/hangul syllable.
fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4e00}'..='\u{9fff}' |  // CJK Unified Ideographs
        '\u{3400}'..='\u{4dbf}' |  // CJK Extension A
        '\u{3040}'..='\u{309f}' |  // Hiragana
        '\u{30a0}'..='\u{30ff}' |  // Katakana
        '\u{ac00}'..='\u{d7af}'    // Hangul Syllables
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Analyzer::from_name(Some("ik_max_word")), Analyzer::IkMaxWord);
        assert_eq!(Analyzer::from_name(Some("ik_smart")), Analyzer::IkSmart);
        assert_eq!(Analyzer::from_name(Some("keyword")), Analyzer::Keyword);
        assert_eq!(Analyzer::from_name(Some("unknown")), Analyzer::Standard);
        assert_eq!(Analyzer::from_name(None), Analyzer::Standard);
    }

    #[test]
    fn test_standard_splits_cjk_per_character() {
        assert_eq!(
            Analyzer::Standard.analyze("Apple手机, 2024 edition"),
            vec!["apple", "手", "机", "2024", "edition"]
        );
    }

    #[test]
    fn test_ik_max_word_segments_words() {
        let tokens = Analyzer::IkMaxWord.analyze("小米手机");
        assert!(tokens.contains(&"小米".to_string()), "{:?}", tokens);
        assert!(tokens.contains(&"手机".to_string()), "{:?}", tokens);
    }

    #[test]
    fn test_ik_max_word_lowercases_latin_words() {
        let tokens = Analyzer::IkMaxWord.analyze("OPPO手机");
        assert!(tokens.contains(&"oppo".to_string()), "{:?}", tokens);
        assert!(tokens.contains(&"手机".to_string()), "{:?}", tokens);
    }

    #[test]
    fn test_segment_drops_punctuation_and_duplicates() {
        assert_eq!(
            segment(vec!["手机", " ", "，", "手机", "Apple"]),
            vec!["手机", "apple"]
        );
    }

    #[test]
    fn test_keyword_and_whitespace() {
        assert_eq!(Analyzer::Keyword.analyze("华为 手机"), vec!["华为 手机"]);
        assert_eq!(Analyzer::Whitespace.analyze("华为 Mate"), vec!["华为", "Mate"]);
    }
}
