use std::collections::HashSet;
use std::fs;
use std::path::Path;

use thiserror::Error;

/// Failure of the validity check itself, as opposed to a "not a word" answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("word check transport failed: {0}")]
    Transport(String),
    #[error("word check response could not be parsed: {0}")]
    Parse(String),
}

/// Injected capability answering "is this a real word?".
///
/// Implementations may block; the runtime calls them off the UI thread.
pub trait WordChecker: Send + Sync {
    fn check(&self, word: &str) -> Result<bool, CheckError>;
}

/// Collapse a check result into accept/reject. Errors are accepted so an
/// unreliable checker never blocks play.
pub fn accepts(result: &Result<bool, CheckError>) -> bool {
    match result {
        Ok(valid) => *valid,
        Err(err) => {
            log::warn!("word check failed, accepting guess: {err}");
            true
        }
    }
}

/// Accepts every word.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl WordChecker for AcceptAll {
    fn check(&self, _word: &str) -> Result<bool, CheckError> {
        Ok(true)
    }
}

/// Word-list backed checker. Entries are compared uppercased.
#[derive(Debug, Clone, Default)]
pub struct DictionaryChecker {
    words: HashSet<String>,
}

impl DictionaryChecker {
    /// Build from newline separated text. Blank lines and `#` comments are skipped.
    pub fn from_text(text: &str) -> Self {
        let words = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_uppercase)
            .collect();
        Self { words }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_text(&text))
    }

    /// Add words that must always be accepted, such as the puzzle answers.
    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words
            .extend(words.into_iter().map(|w| w.as_ref().to_uppercase()));
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl WordChecker for DictionaryChecker {
    fn check(&self, word: &str) -> Result<bool, CheckError> {
        Ok(self.words.contains(&word.to_uppercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    struct Broken;

    impl WordChecker for Broken {
        fn check(&self, _word: &str) -> Result<bool, CheckError> {
            Err(CheckError::Transport("connection reset".into()))
        }
    }

    #[test]
    fn test_accepts_fails_open() {
        assert!(accepts(&Ok(true)));
        assert!(!accepts(&Ok(false)));
        assert!(accepts(&Broken.check("CRANE")));
        assert!(accepts(&Err(CheckError::Parse("not json".into()))));
    }

    #[test]
    fn test_dictionary_is_case_insensitive() {
        let dict = DictionaryChecker::from_text("crane\n# comment\n\n  Slate  \n");
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.check("CRANE"), Ok(true));
        assert_eq!(dict.check("slate"), Ok(true));
        assert_eq!(dict.check("QWXYZ"), Ok(false));
    }

    #[test]
    fn test_dictionary_extend_with_answers() {
        let mut dict = DictionaryChecker::default();
        assert!(dict.is_empty());
        dict.extend(["llama", "sol"]);
        assert_eq!(dict.check("LLAMA"), Ok(true));
        assert_eq!(dict.check("Sol"), Ok(true));
    }

    #[test]
    fn test_dictionary_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "piano\nrobot").unwrap();
        let dict = DictionaryChecker::from_path(file.path()).unwrap();
        assert_eq!(dict.check("ROBOT"), Ok(true));
        assert!(DictionaryChecker::from_path("/definitely/not/here.txt").is_err());
    }

    #[test]
    fn test_accept_all() {
        assert_eq!(AcceptAll.check("ZZZZZ"), Ok(true));
    }
}
