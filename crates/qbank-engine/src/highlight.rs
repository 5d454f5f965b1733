//! Search-term tokenization and highlighting.
//!
//! The text filter and the highlighter share one `SearchPattern`, so a
//! question passes the filter exactly when its content has at least one
//! highlighted span.

use regex::{Regex, RegexBuilder};

/// A run of content, either matched by the search or verbatim.
///
/// Concatenating the spans of one `highlight` call reproduces the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    pub text: &'a str,
    pub highlighted: bool,
}

impl<'a> Span<'a> {
    fn plain(text: &'a str) -> Self {
        Self {
            text,
            highlighted: false,
        }
    }

    fn matched(text: &'a str) -> Self {
        Self {
            text,
            highlighted: true,
        }
    }
}

/// Split search text on whitespace and punctuation, dropping empty tokens.
pub fn tokenize(search: &str) -> Vec<&str> {
    search
        .split(is_separator)
        .filter(|token| !token.is_empty())
        .collect()
}

fn is_separator(c: char) -> bool {
    c.is_whitespace()
        || c.is_ascii_punctuation()
        || matches!(c,
            '\u{2000}'..='\u{206F}'     // general punctuation
            | '\u{3000}'..='\u{303F}'   // CJK symbols and punctuation
            | '\u{FF01}'..='\u{FF0F}'   // fullwidth ! through /
            | '\u{FF1A}'..='\u{FF20}'   // fullwidth : through @
            | '\u{FF3B}'..='\u{FF40}'
            | '\u{FF5B}'..='\u{FF65}')
}

/// Case-insensitive alternation over the tokens of a search text.
#[derive(Debug, Clone)]
pub struct SearchPattern {
    regex: Regex,
}

impl SearchPattern {
    /// Build a pattern, or `None` when the search has no tokens.
    pub fn new(search: &str) -> Option<Self> {
        let mut tokens = tokenize(search);
        if tokens.is_empty() {
            return None;
        }
        // Longest first so "abc" wins over "ab" at the same position.
        tokens.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        tokens.dedup();

        let alternation = tokens
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");

        match RegexBuilder::new(&alternation).case_insensitive(true).build() {
            Ok(regex) => Some(Self { regex }),
            Err(e) => {
                tracing::warn!("Search pattern rejected, not filtering: {}", e);
                None
            }
        }
    }

    /// Whether any token occurs in `content`.
    pub fn is_match(&self, content: &str) -> bool {
        self.regex.is_match(content)
    }

    /// Split `content` into plain and highlighted spans, left to right.
    pub fn spans<'a>(&self, content: &'a str) -> Vec<Span<'a>> {
        let mut spans = Vec::new();
        let mut last = 0;

        for m in self.regex.find_iter(content) {
            if m.start() > last {
                spans.push(Span::plain(&content[last..m.start()]));
            }
            spans.push(Span::matched(m.as_str()));
            last = m.end();
        }
        if last < content.len() {
            spans.push(Span::plain(&content[last..]));
        }

        spans
    }
}

/// Highlight every occurrence of any search token in `content`.
///
/// With no tokens the content comes back as a single plain span.
pub fn highlight<'a>(content: &'a str, search: &str) -> Vec<Span<'a>> {
    match SearchPattern::new(search) {
        Some(pattern) => pattern.spans(content),
        None if content.is_empty() => Vec::new(),
        None => vec![Span::plain(content)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concat(spans: &[Span<'_>]) -> String {
        spans.iter().map(|s| s.text).collect()
    }

    fn highlighted<'a>(spans: &[Span<'a>]) -> Vec<&'a str> {
        spans.iter().filter(|s| s.highlighted).map(|s| s.text).collect()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("  apple, banana!cherry "), vec!["apple", "banana", "cherry"]);
        assert_eq!(tokenize("数学，物理。化学"), vec!["数学", "物理", "化学"]);
        assert!(tokenize(" ,.; ").is_empty());
    }

    #[test]
    fn test_no_tokens_is_plain() {
        let spans = highlight("Apple pie", " ... ");
        assert_eq!(spans, vec![Span::plain("Apple pie")]);
        assert!(highlight("", "").is_empty());
    }

    #[test]
    fn test_case_insensitive_multiple_tokens() {
        let content = "Apple and BANANA and apple";
        let spans = highlight(content, "apple banana");

        assert_eq!(highlighted(&spans), vec!["Apple", "BANANA", "apple"]);
        assert_eq!(concat(&spans), content);
    }

    #[test]
    fn test_punctuation_in_search_splits_tokens() {
        let content = "Solve (a+b)*c for c";
        let spans = highlight(content, "(a+b)*c");

        // Punctuation splits the search into "a", "b" and "c".
        assert!(highlighted(&spans).iter().all(|t| ["a", "b", "c"].contains(t)));
        assert_eq!(concat(&spans), content);
    }

    #[test]
    fn test_longest_token_wins() {
        let spans = highlight("abcdef", "ab abcd");
        assert_eq!(highlighted(&spans), vec!["abcd"]);
    }

    #[test]
    fn test_spans_reconstruct_content() {
        let cases = [
            ("", "x"),
            ("x", "x"),
            ("xxx", "x"),
            ("no match here", "zzz"),
            ("Ünïcödé text, ÜNÏ", "ünï"),
            ("函数的定义域是什么？", "定义域"),
            ("edge at end", "end"),
            ("start edge", "start"),
        ];
        for (content, search) in cases {
            let spans = highlight(content, search);
            assert_eq!(concat(&spans), content, "search {search:?}");
            assert!(spans.iter().all(|s| !s.text.is_empty()));
        }
    }

    #[test]
    fn test_pattern_matches_iff_highlighted() {
        let pattern = SearchPattern::new("derivative").unwrap();
        assert!(pattern.is_match("The DERIVATIVE of x^2"));
        assert!(!pattern.is_match("The integral of x^2"));
        assert!(SearchPattern::new("   ").is_none());
    }
}
