use lazy_static::lazy_static;
use regex::{Matches, Regex};

lazy_static! {
    // Same class as `char::is_alphanumeric`: Alphabetic plus every Numeric category.
    static ref RE: Regex = Regex::new(r"[\p{Alphabetic}\p{N}]+").expect("valid regex");
}

/// A single token cut out of a line of text.
///
/// `start` and `end` are character (not byte) offsets into the original text,
/// `end` being exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub term: String,
    pub start: usize,
    pub end: usize,
}

/// Lazy token stream returned by [`tokenize`].
pub struct Tokens<'t> {
    text: &'t str,
    matches: Matches<'static, 't>,
    byte_cursor: usize,
    char_cursor: usize,
}

impl<'t> Iterator for Tokens<'t> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let m = self.matches.next()?;
        // Advance the char counter over the separator run, then over the token.
        self.char_cursor += self.text[self.byte_cursor..m.start()].chars().count();
        let start = self.char_cursor;
        self.char_cursor += m.as_str().chars().count();
        self.byte_cursor = m.end();
        Some(Token { term: m.as_str().to_lowercase(), start, end: self.char_cursor })
    }
}

/// Split text into lowercase alphanumeric runs with their character offsets.
///
/// Every run is kept: no stopword removal, no length filter, no stemming. The
/// highlighter relies on this to find each indexed term again.
pub fn tokenize(text: &str) -> Tokens<'_> {
    Tokens { text, matches: RE.find_iter(text), byte_cursor: 0, char_cursor: 0 }
}

/// Terms only, in order of occurrence (duplicates kept).
pub fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
    tokenize(text).map(|t| t.term)
}
