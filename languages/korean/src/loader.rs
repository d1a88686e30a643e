use std::collections::HashSet;
use std::path::{Path, PathBuf};

use kvocab_core::preprocess::{DefaultPreprocessor, Preprocessor};
use kvocab_types::{Rank, RankedTerm};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read frequency list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("line {line}: expected `<rank>. <term>`, got {content:?}")]
    Malformed { line: usize, content: String },

    #[error("line {line}: rank {rank} already used")]
    DuplicateRank { line: usize, rank: Rank },
}

/// Reads ranked frequency lists, one `<rank>. <term>` per line
pub struct FrequencyListLoader;

impl FrequencyListLoader {
    pub fn load_from_file(path: &Path) -> Result<Vec<RankedTerm>, IngestError> {
        tracing::info!("Loading frequency list from file: {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let terms = Self::parse(&text)?;
        tracing::info!("Loaded {} ranked terms", terms.len());
        Ok(terms)
    }

    /// Parse list text. Blank lines are skipped; any other bad line is fatal.
    pub fn parse(text: &str) -> Result<Vec<RankedTerm>, IngestError> {
        let mut seen = HashSet::new();
        let mut terms = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            if raw.trim().is_empty() {
                continue;
            }

            let term = parse_line(raw).ok_or_else(|| IngestError::Malformed {
                line,
                content: raw.to_string(),
            })?;

            if !seen.insert(term.rank) {
                return Err(IngestError::DuplicateRank {
                    line,
                    rank: term.rank,
                });
            }
            terms.push(term);
        }

        Ok(terms)
    }
}

fn parse_line(raw: &str) -> Option<RankedTerm> {
    let (rank, term) = raw.trim().split_once('.')?;
    let rank: Rank = rank.trim().parse().ok().filter(|rank| *rank > 0)?;
    let term = DefaultPreprocessor.process(term);

    if term.is_empty() {
        return None;
    }

    Some(RankedTerm { rank, term })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ranked(rank: Rank, term: &str) -> RankedTerm {
        RankedTerm {
            rank,
            term: term.to_string(),
        }
    }

    #[test]
    fn parses_ranked_lines_and_skips_blanks() {
        let text = "1. 것\n2. 하다\n\n  3.  있다  \n";

        assert_eq!(
            FrequencyListLoader::parse(text).unwrap(),
            vec![ranked(1, "것"), ranked(2, "하다"), ranked(3, "있다")]
        );
    }

    #[test]
    fn terms_are_composed() {
        // 가다 with a decomposed first syllable
        let terms = FrequencyListLoader::parse("7. \u{1100}\u{1161}다").unwrap();
        assert_eq!(terms, vec![ranked(7, "가다")]);
    }

    #[test]
    fn malformed_line_is_fatal() {
        let err = FrequencyListLoader::parse("1. 것\n하다\n").unwrap_err();
        assert!(matches!(err, IngestError::Malformed { line: 2, .. }));

        for bad in ["0. 것", "x. 것", "3.   "] {
            assert!(FrequencyListLoader::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn duplicate_rank_is_fatal() {
        let err = FrequencyListLoader::parse("1. 것\n1. 하다").unwrap_err();
        assert!(matches!(err, IngestError::DuplicateRank { line: 2, rank: 1 }));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("freq.txt");
        std::fs::write(&path, "1. 사람\n2. 때\n").unwrap();

        let terms = FrequencyListLoader::load_from_file(&path).unwrap();
        assert_eq!(terms.len(), 2);

        let err = FrequencyListLoader::load_from_file(&dir.path().join("missing.txt")).unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }
}
