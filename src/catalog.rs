use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use thiserror::Error;

static ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets");

pub const MIN_WORD_LEN: usize = 3;
pub const MAX_WORD_LEN: usize = 8;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordError {
    #[error("word must be 3-8 letters, got {0}")]
    InvalidLength(usize),
    #[error("word may only contain letters: {0:?}")]
    InvalidCharacters(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("embedded asset {0} is missing")]
    MissingAsset(&'static str),
}

/// Uppercase and validate a puzzle word, returning its letters.
pub fn normalize_word(word: &str) -> Result<Vec<char>, WordError> {
    let letters: Vec<char> = word.trim().to_uppercase().chars().collect();
    if let Some(bad) = letters.iter().find(|c| !c.is_alphabetic()) {
        return Err(WordError::InvalidCharacters(bad.to_string()));
    }
    if !(MIN_WORD_LEN..=MAX_WORD_LEN).contains(&letters.len()) {
        return Err(WordError::InvalidLength(letters.len()));
    }
    Ok(letters)
}

/// One dated puzzle: the answer and the hint offered for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleDefinition {
    pub date: NaiveDate,
    pub word: String,
    pub hint: String,
}

impl PuzzleDefinition {
    pub fn new(date: NaiveDate, word: &str, hint: &str) -> Result<Self, WordError> {
        let letters = normalize_word(word)?;
        Ok(Self {
            date,
            word: letters.into_iter().collect(),
            hint: hint.to_string(),
        })
    }

    pub fn letters(&self) -> Vec<char> {
        self.word.chars().collect()
    }

    pub fn word_len(&self) -> usize {
        self.word.chars().count()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    words: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    date: String,
    word: String,
    #[serde(default)]
    hint: String,
}

/// Ordered collection of dated puzzles, looked up by exact date.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<PuzzleDefinition>,
}

impl Catalog {
    pub fn new(entries: Vec<PuzzleDefinition>) -> Self {
        let mut catalog = Self::default();
        for entry in entries {
            catalog.push(entry);
        }
        catalog
    }

    /// Parse `{ "words": [ { "date", "word", "hint" } ] }`.
    ///
    /// Entries with an unparsable date or an invalid word are skipped, and when a
    /// date repeats the first entry wins.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let mut catalog = Self::default();

        for raw in file.words {
            let date = match NaiveDate::parse_from_str(raw.date.trim(), DATE_FORMAT) {
                Ok(date) => date,
                Err(err) => {
                    log::warn!("skipping catalog entry with bad date {:?}: {err}", raw.date);
                    continue;
                }
            };
            match PuzzleDefinition::new(date, &raw.word, &raw.hint) {
                Ok(puzzle) => catalog.push(puzzle),
                Err(err) => log::warn!("skipping catalog entry for {date}: {err}"),
            }
        }

        log::info!("loaded catalog with {} puzzles", catalog.len());
        Ok(catalog)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The catalog shipped inside the binary.
    pub fn embedded() -> Result<Self, CatalogError> {
        let json = embedded_asset("catalog.json")?;
        Self::from_json(json)
    }

    fn push(&mut self, puzzle: PuzzleDefinition) {
        if self.get(puzzle.date).is_some() {
            log::warn!("duplicate catalog date {}, keeping the first entry", puzzle.date);
            return;
        }
        self.entries.push(puzzle);
    }

    pub fn get(&self, date: NaiveDate) -> Option<&PuzzleDefinition> {
        self.entries.iter().find(|p| p.date == date)
    }

    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.entries.iter().map(|p| p.date).min()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.entries.iter().map(|p| p.date).max()
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|p| p.word.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PuzzleDefinition> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Text of a file from the embedded `assets/` directory.
pub fn embedded_asset(name: &'static str) -> Result<&'static str, CatalogError> {
    ASSETS
        .get_file(name)
        .and_then(|f| f.contents_utf8())
        .ok_or(CatalogError::MissingAsset(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_normalize_word() {
        assert_eq!(normalize_word("crane").unwrap(), vec!['C', 'R', 'A', 'N', 'E']);
        assert_eq!(normalize_word(" Sol ").unwrap(), vec!['S', 'O', 'L']);
        assert_eq!(normalize_word("año").unwrap(), vec!['A', 'Ñ', 'O']);
        assert_matches!(normalize_word("ab"), Err(WordError::InvalidLength(2)));
        assert_matches!(normalize_word("abcdefghi"), Err(WordError::InvalidLength(9)));
        assert_matches!(normalize_word("cr4ne"), Err(WordError::InvalidCharacters(_)));
        assert_matches!(normalize_word("ice cream"), Err(WordError::InvalidCharacters(_)));
    }

    #[test]
    fn test_from_json_and_lookup() {
        let json = r#"{ "words": [
            { "date": "2026-10-18", "word": "llama", "hint": "Andean animal" },
            { "date": "2026-10-19", "word": "Crane", "hint": "Bird or machine" }
        ] }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);

        let today = catalog.get(date("2026-10-19")).unwrap();
        assert_eq!(today.word, "CRANE");
        assert_eq!(today.hint, "Bird or machine");
        assert!(catalog.get(date("2026-10-20")).is_none());
        assert_eq!(catalog.earliest_date(), Some(date("2026-10-18")));
        assert_eq!(catalog.latest_date(), Some(date("2026-10-19")));
    }

    #[test]
    fn test_from_json_skips_bad_entries_and_duplicates() {
        let json = r#"{ "words": [
            { "date": "2026-13-01", "word": "crane", "hint": "" },
            { "date": "2026-10-01", "word": "no", "hint": "too short" },
            { "date": "2026-10-02", "word": "r2d2", "hint": "droid" },
            { "date": "2026-10-03", "word": "piano", "hint": "first" },
            { "date": "2026-10-03", "word": "robot", "hint": "second" },
            { "date": "2026-10-04", "word": "sol" }
        ] }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(date("2026-10-03")).unwrap().word, "PIANO");
        assert_eq!(catalog.get(date("2026-10-04")).unwrap().hint, "");
    }

    #[test]
    fn test_from_json_rejects_wrong_shape() {
        assert_matches!(Catalog::from_json("[1, 2, 3]"), Err(CatalogError::Json(_)));
        assert_matches!(Catalog::load("/no/such/catalog.json"), Err(CatalogError::Io(_)));
    }

    #[test]
    fn test_embedded_catalog_is_valid() {
        let catalog = Catalog::embedded().unwrap();
        assert!(!catalog.is_empty());
        for puzzle in catalog.iter() {
            assert!(normalize_word(&puzzle.word).is_ok());
        }
    }

    #[test]
    fn test_puzzle_definition_letters() {
        let puzzle = PuzzleDefinition::new(date("2026-10-19"), "sol", "star").unwrap();
        assert_eq!(puzzle.letters(), vec!['S', 'O', 'L']);
        assert_eq!(puzzle.word_len(), 3);
    }
}
