//! Substring search used by the NovaSuite applets and CLI.
//!
//! The applets only ever need "highlight every occurrence" plus a
//! find-next traversal, so the engine is a single-buffer scanner: plain
//! or regex patterns, optional case sensitivity and whole-word
//! filtering, wrap-around iteration, and a replace-all helper for the
//! command line.

use std::ops::Range;

use regex::RegexBuilder;
use thiserror::Error;

/// Error conditions raised by the search engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("search pattern cannot be empty")]
    EmptyPattern,
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}

/// Determines how the pattern is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchMode {
    #[default]
    Plain,
    Regex,
}

/// Options supplied to the search engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOptions {
    pub pattern: String,
    pub mode: SearchMode,
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub wrap_around: bool,
}

impl SearchOptions {
    /// Creates an option set for the given pattern with the applets' defaults:
    /// plain text, case-insensitive, wrapping.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            mode: SearchMode::Plain,
            case_sensitive: false,
            whole_word: false,
            wrap_around: true,
        }
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.pattern.is_empty() {
            return Err(SearchError::EmptyPattern);
        }
        Ok(())
    }
}

/// A single match with the position metadata the UIs display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchMatch {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
    pub matched: String,
}

impl SearchMatch {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Outcome of a `replace_all` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub replaced_text: String,
    pub replacements: usize,
}

/// Search engine bound to one text buffer.
pub struct Searcher<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> Searcher<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        for (idx, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        Self { text, line_starts }
    }

    /// Every match in the buffer, in order. This is the "highlight all
    /// occurrences" primitive behind the applets' search buttons.
    pub fn find_all(&self, options: &SearchOptions) -> Result<Vec<SearchMatch>, SearchError> {
        options.validate()?;
        let regex = build_regex(options)?;
        let mut matches = Vec::new();
        for found in regex.find_iter(self.text) {
            if options.whole_word && !self.is_whole_word(found.start(), found.end()) {
                continue;
            }
            matches.push(self.build_match(found.start(), found.end(), found.as_str()));
        }
        Ok(matches)
    }

    /// First match at or after `from`, wrapping to the top when allowed.
    pub fn find_from(
        &self,
        from: usize,
        options: &SearchOptions,
    ) -> Result<Option<SearchMatch>, SearchError> {
        let matches = self.find_all(options)?;
        if matches.is_empty() {
            return Ok(None);
        }
        if let Some(found) = matches.iter().find(|m| m.start >= from) {
            return Ok(Some(found.clone()));
        }
        if options.wrap_around {
            return Ok(matches.into_iter().next());
        }
        Ok(None)
    }

    /// Replaces every match, expanding capture references in regex mode.
    pub fn replace_all(
        &self,
        replacement: &str,
        options: &SearchOptions,
    ) -> Result<ReplaceOutcome, SearchError> {
        options.validate()?;
        let regex = build_regex(options)?;
        let mut result = String::with_capacity(self.text.len());
        let mut replacements = 0;
        let mut last = 0;
        for caps in regex.captures_iter(self.text) {
            let found = caps
                .get(0)
                .expect("captures_iter always yields group 0");
            if options.whole_word && !self.is_whole_word(found.start(), found.end()) {
                continue;
            }
            result.push_str(&self.text[last..found.start()]);
            match options.mode {
                SearchMode::Regex => caps.expand(replacement, &mut result),
                SearchMode::Plain => result.push_str(replacement),
            }
            last = found.end();
            replacements += 1;
        }
        result.push_str(&self.text[last..]);
        Ok(ReplaceOutcome {
            replaced_text: result,
            replacements,
        })
    }

    fn build_match(&self, start: usize, end: usize, matched: &str) -> SearchMatch {
        let line_idx = match self.line_starts.binary_search(&start) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line_start = self.line_starts[line_idx];
        let column = self.text[line_start..start].chars().count();
        SearchMatch {
            start,
            end,
            line: line_idx + 1,
            column,
            matched: matched.to_owned(),
        }
    }

    fn is_whole_word(&self, start: usize, end: usize) -> bool {
        let before = self.text[..start].chars().next_back();
        let after = self.text[end..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn build_regex(options: &SearchOptions) -> Result<regex::Regex, SearchError> {
    let pattern = match options.mode {
        SearchMode::Plain => regex::escape(&options.pattern),
        SearchMode::Regex => options.pattern.clone(),
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .build()
        .map_err(|err| SearchError::InvalidPattern(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_all_reports_positions() {
        let text = "red fish\nblue fish\n";
        let searcher = Searcher::new(text);
        let matches = searcher.find_all(&SearchOptions::new("fish")).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].range(), 4..8);
        assert_eq!((matches[0].line, matches[0].column), (1, 4));
        assert_eq!((matches[1].line, matches[1].column), (2, 5));
    }

    #[test]
    fn plain_mode_escapes_metacharacters() {
        let searcher = Searcher::new("1+1=2");
        let matches = searcher.find_all(&SearchOptions::new("1+1")).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].range(), 0..3);
    }

    #[test]
    fn search_is_case_insensitive_by_default() {
        let searcher = Searcher::new("Alpha alpha ALPHA");
        let matches = searcher.find_all(&SearchOptions::new("alpha")).unwrap();
        assert_eq!(matches.len(), 3);

        let mut options = SearchOptions::new("alpha");
        options.case_sensitive = true;
        assert_eq!(searcher.find_all(&options).unwrap().len(), 1);
    }

    #[test]
    fn whole_word_filters_substrings() {
        let searcher = Searcher::new("cat catalog concat cat");
        let mut options = SearchOptions::new("cat");
        options.whole_word = true;
        let matches = searcher.find_all(&options).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].range(), 0..3);
        assert_eq!(matches[1].range(), 19..22);
    }

    #[test]
    fn find_from_wraps_around() {
        let searcher = Searcher::new("abc abc abc");
        let options = SearchOptions::new("abc");
        let second = searcher.find_from(2, &options).unwrap().unwrap();
        assert_eq!(second.start, 4);

        let wrapped = searcher.find_from(9, &options).unwrap().unwrap();
        assert_eq!(wrapped.start, 0);

        let mut no_wrap = options.clone();
        no_wrap.wrap_around = false;
        assert!(searcher.find_from(9, &no_wrap).unwrap().is_none());
    }

    #[test]
    fn replace_all_plain() {
        let searcher = Searcher::new("one fish two fish");
        let outcome = searcher
            .replace_all("whale", &SearchOptions::new("fish"))
            .unwrap();
        assert_eq!(outcome.replaced_text, "one whale two whale");
        assert_eq!(outcome.replacements, 2);
    }

    #[test]
    fn replace_all_regex_expands_captures() {
        let searcher = Searcher::new("name: nova");
        let mut options = SearchOptions::new(r"name: (\w+)");
        options.mode = SearchMode::Regex;
        options.case_sensitive = true;
        let outcome = searcher.replace_all("id=$1", &options).unwrap();
        assert_eq!(outcome.replaced_text, "id=nova");
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let searcher = Searcher::new("text");
        assert_eq!(
            searcher.find_all(&SearchOptions::new("")).unwrap_err(),
            SearchError::EmptyPattern
        );
    }

    #[test]
    fn invalid_regex_is_reported() {
        let searcher = Searcher::new("text");
        let mut options = SearchOptions::new("(unclosed");
        options.mode = SearchMode::Regex;
        assert!(matches!(
            searcher.find_all(&options),
            Err(SearchError::InvalidPattern(_))
        ));
    }
}
