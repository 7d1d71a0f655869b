//! Term extraction shared by the pack builder and the query engine.
//!
//! Both sides must tokenize with byte-for-byte identical rules, so the
//! settings travel inside the pack (see [`crate::pack::Pack::tokenizer`]).

use std::collections::HashSet;
use std::iter::Peekable;
use std::str::CharIndices;

use vitae_core::TokenizerConfig;

/// English stopwords dropped from every token stream unless replaced via
/// [`TokenizerConfig::stopwords`].
pub const BUILTIN_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "aren't", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "can't", "could", "couldn't", "did", "didn't", "do", "does", "doesn't",
    "doing", "don't", "down", "during", "each", "few", "for", "from", "further", "had", "hadn't",
    "has", "hasn't", "have", "haven't", "having", "he", "he'd", "he'll", "he's", "her", "here",
    "here's", "hers", "herself", "him", "himself", "his", "how", "how's", "i", "i'd", "i'll",
    "i'm", "i've", "if", "in", "into", "is", "isn't", "it", "it's", "its", "itself", "let's", "me",
    "more", "most", "mustn't", "my", "myself", "no", "nor", "not", "of", "off", "on", "once",
    "only", "or", "other", "ought", "our", "ours", "ourselves", "out", "over", "own", "same",
    "shan't", "she", "she'd", "she'll", "she's", "should", "shouldn't", "so", "some", "such",
    "than", "that", "that's", "the", "their", "theirs", "them", "themselves", "then", "there",
    "there's", "these", "they", "they'd", "they'll", "they're", "they've", "this", "those",
    "through", "to", "too", "under", "until", "up", "very", "was", "wasn't", "we", "we'd",
    "we'll", "we're", "we've", "were", "weren't", "what", "what's", "when", "when's", "where",
    "where's", "which", "while", "who", "who's", "whom", "why", "why's", "with", "won't", "would",
    "wouldn't", "you", "you'd", "you'll", "you're", "you've", "your", "yours", "yourself",
    "yourselves",
];

const APOSTROPHES: [char; 3] = ['\'', '\u{2018}', '\u{2019}'];

/// Splits text into normalized index terms.
///
/// A raw token is a maximal run of alphanumeric characters, optionally
/// joined by a single apostrophe to a further run (`don't`). Anything
/// else separates tokens, so `C++17` yields `c` and `17`. Tokens are then
/// lowercased, accented Latin letters are folded to ASCII (unless disabled),
/// and the result is filtered: numeric tokens (unless kept), stopwords, and
/// tokens shorter than the minimum length (unless whitelisted) are dropped.
///
/// # Examples
///
/// ```
/// use vitae_core::TokenizerConfig;
/// use vitae_index::tokenizer::Tokenizer;
///
/// let tokenizer = Tokenizer::new(&TokenizerConfig::default());
/// let terms: Vec<String> = tokenizer.tokens("Built the C++ parser in 2021!").collect();
/// assert_eq!(terms, vec!["built", "c", "parser"]);
/// ```
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stopwords: HashSet<String>,
    whitelist: HashSet<String>,
    min_len: usize,
    keep_numeric: bool,
    fold_accents: bool,
}

impl Tokenizer {
    /// Build a tokenizer from explicit settings.
    pub fn new(config: &TokenizerConfig) -> Self {
        let term = |word: &str| {
            let lower = word.to_lowercase();
            if config.fold_accents && !lower.is_ascii() {
                fold_accents(&lower)
            } else {
                lower
            }
        };
        let base: Box<dyn Iterator<Item = &str> + '_> = match &config.stopwords {
            Some(custom) => Box::new(custom.iter().map(String::as_str)),
            None => Box::new(BUILTIN_STOPWORDS.iter().copied()),
        };
        let stopwords = base
            .chain(config.extra_stopwords.iter().map(String::as_str))
            .map(term)
            .collect();
        let whitelist = config.whitelist.iter().map(|w| term(w)).collect();

        Self {
            stopwords,
            whitelist,
            min_len: config.min_token_len,
            keep_numeric: config.keep_numeric,
            fold_accents: config.fold_accents,
        }
    }

    /// Lazily yield the index terms of `text`, in order of appearance.
    pub fn tokens<'a>(&'a self, text: &'a str) -> Tokens<'a> {
        Tokens {
            tokenizer: self,
            text,
            chars: text.char_indices().peekable(),
        }
    }

    /// Whether `term` is dropped as a stopword.
    pub fn is_stopword(&self, term: &str) -> bool {
        self.stopwords.contains(term)
    }

    fn keep(&self, term: &str) -> bool {
        if !self.keep_numeric && term.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        if self.stopwords.contains(term) {
            return false;
        }
        term.chars().count() >= self.min_len || self.whitelist.contains(term)
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(&TokenizerConfig::default())
    }
}

/// ASCII spelling of an accented lowercase Latin letter.
fn fold_char(c: char) -> Option<&'static str> {
    Some(match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'ĉ' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' | 'ģ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'ķ' => "k",
        'ĺ' | 'ļ' | 'ľ' | 'ł' => "l",
        'ñ' | 'ń' | 'ņ' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ŕ' | 'ř' => "r",
        'ś' | 'ş' | 'š' | 'ș' => "s",
        'ß' => "ss",
        'ţ' | 'ť' | 'ț' => "t",
        'þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    })
}

fn fold_accents(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        match fold_char(c) {
            Some(base) => out.push_str(base),
            None => out.push(c),
        }
    }
    out
}

/// Iterator returned by [`Tokenizer::tokens`].
pub struct Tokens<'a> {
    tokenizer: &'a Tokenizer,
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl Tokens<'_> {
    /// Next raw token as a byte range, before normalization.
    fn next_raw(&mut self) -> Option<(usize, usize)> {
        let start = loop {
            let (i, c) = self.chars.next()?;
            if c.is_alphanumeric() {
                break i;
            }
        };

        let mut end = self.text.len();
        let mut joined = false;
        while let Some(&(i, c)) = self.chars.peek() {
            if c.is_alphanumeric() {
                self.chars.next();
                continue;
            }
            if APOSTROPHES.contains(&c) && !joined {
                let after = self.text[i + c.len_utf8()..].chars().next();
                if after.is_some_and(char::is_alphanumeric) {
                    joined = true;
                    self.chars.next();
                    continue;
                }
            }
            end = i;
            break;
        }
        Some((start, end))
    }
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let (start, end) = self.next_raw()?;
            let mut term = self.text[start..end].to_lowercase();
            if !term.is_ascii() && term.contains(APOSTROPHES) {
                term = term.replace(APOSTROPHES, "'");
            }
            if self.tokenizer.fold_accents && !term.is_ascii() {
                term = fold_accents(&term);
            }
            if self.tokenizer.keep(&term) {
                return Some(term);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(text: &str) -> Vec<String> {
        Tokenizer::default().tokens(text).collect()
    }

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(
            terms("Led Kubernetes migration; cut costs (by 30%)."),
            vec!["led", "kubernetes", "migration", "cut", "costs"]
        );
    }

    #[test]
    fn drops_stopwords_and_short_tokens() {
        assert_eq!(terms("I am a developer of x"), vec!["developer"]);
    }

    #[test]
    fn whitelisted_single_letters_survive() {
        assert_eq!(terms("Wrote C and R code"), vec!["wrote", "c", "r", "code"]);
    }

    #[test]
    fn symbols_split_tokens() {
        assert_eq!(terms("C++17, C#, node.js"), vec!["c", "c", "node", "js"]);
    }

    #[test]
    fn internal_apostrophe_joins_once() {
        assert_eq!(terms("O'Reilly rock'n'roll"), vec!["o'reilly", "rock'n", "roll"]);
        // contractions are stopwords as whole tokens
        assert!(terms("don't").is_empty());
    }

    #[test]
    fn typographic_apostrophe_matches_ascii() {
        assert_eq!(terms("O\u{2019}Reilly"), vec!["o'reilly"]);
        assert!(terms("don\u{2019}t").is_empty());
    }

    #[test]
    fn trailing_apostrophe_is_a_separator() {
        assert_eq!(terms("engineers' tools"), vec!["engineers", "tools"]);
    }

    #[test]
    fn numbers_dropped_unless_kept() {
        assert_eq!(terms("2019 2021 rust"), vec!["rust"]);

        let config = TokenizerConfig {
            keep_numeric: true,
            ..TokenizerConfig::default()
        };
        let kept: Vec<String> = Tokenizer::new(&config).tokens("2019 rust").collect();
        assert_eq!(kept, vec!["2019", "rust"]);
    }

    #[test]
    fn mixed_alphanumerics_are_not_numeric() {
        assert_eq!(terms("s3 ec2 k8s"), vec!["s3", "ec2", "k8s"]);
    }

    #[test]
    fn custom_stopwords_replace_builtin() {
        let config = TokenizerConfig {
            stopwords: Some(vec!["Rust".into()]),
            ..TokenizerConfig::default()
        };
        let tokenizer = Tokenizer::new(&config);
        let out: Vec<String> = tokenizer.tokens("the rust book").collect();
        assert_eq!(out, vec!["the", "book"]);
        assert!(tokenizer.is_stopword("rust"));
    }

    #[test]
    fn extra_stopwords_extend_builtin() {
        let config = TokenizerConfig {
            extra_stopwords: vec!["resume".into()],
            ..TokenizerConfig::default()
        };
        let out: Vec<String> = Tokenizer::new(&config)
            .tokens("The resume of an engineer")
            .collect();
        assert_eq!(out, vec!["engineer"]);
    }

    #[test]
    fn tokenization_is_deterministic() {
        let text = "Designed distributed systems; mentored 4 engineers at Acme Corp.";
        assert_eq!(terms(text), terms(text));
    }

    #[test]
    fn empty_and_symbol_only_input() {
        assert!(terms("").is_empty());
        assert!(terms("  --- *** ... ").is_empty());
    }

    #[test]
    fn accented_letters_fold_to_ascii() {
        assert_eq!(terms("Zürich café naïve Straße"), vec!["zurich", "cafe", "naive", "strasse"]);
        assert_eq!(terms("Zurich"), terms("ZÜRICH"));
    }

    #[test]
    fn folding_can_be_disabled() {
        let config = TokenizerConfig {
            fold_accents: false,
            ..TokenizerConfig::default()
        };
        let out: Vec<String> = Tokenizer::new(&config).tokens("Zürich café").collect();
        assert_eq!(out, vec!["zürich", "café"]);
    }

    #[test]
    fn non_latin_letters_are_token_characters() {
        assert_eq!(terms("Москва 東京"), vec!["москва", "東京"]);
    }

    #[test]
    fn combining_marks_separate_like_symbols() {
        // "cafe" followed by U+0301 COMBINING ACUTE ACCENT
        assert_eq!(terms("cafe\u{301} menu"), vec!["cafe", "menu"]);
    }
}
