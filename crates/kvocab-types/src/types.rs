use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position of a term in the frequency list, 1-based
pub type Rank = u32;

/// One line of an ingested frequency list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedTerm {
    pub rank: Rank,
    pub term: String,
}

/// Full enrichment record of one vocabulary item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub rank: Rank,
    pub term: String,
    /// Absent when the lemma equals the term or was not computed yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Pos>,
    #[serde(default)]
    pub def: Option<String>,
    #[serde(default)]
    pub def_request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_check_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub concerns: Vec<Concern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eng: Option<String>,
}

impl Entry {
    /// Entry as created at ingestion: only rank and term are known
    pub fn placeholder(rank: Rank, term: impl Into<String>) -> Self {
        Self {
            rank,
            term: term.into(),
            lemma: None,
            pos: None,
            def: None,
            def_request_id: String::new(),
            created_at: None,
            llm_check_on: None,
            concerns: Vec::new(),
            eng: None,
        }
    }

    /// Lemma if known, otherwise the surface term
    pub fn headword(&self) -> &str {
        self.lemma.as_deref().unwrap_or(&self.term)
    }

    pub fn has_def(&self) -> bool {
        self.def.is_some()
    }

    /// Audit status derived from the stored fields
    pub fn audit_status(&self) -> AuditStatus {
        match (&self.def, &self.llm_check_on) {
            (None, _) => AuditStatus::Undefined,
            (Some(_), None) => AuditStatus::Unaudited,
            (Some(_), Some(_)) if self.concerns.is_empty() => AuditStatus::Clean,
            (Some(_), Some(_)) => AuditStatus::Flagged,
        }
    }
}

/// Open audit finding attached to an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concern {
    pub rank: Rank,
    pub key: ConcernKey,
    pub why: String,
}

/// Field an audit finding is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcernKey {
    Def,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AuditStatus {
    /// No definition to audit
    Undefined,
    Unaudited,
    Clean,
    Flagged,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Undefined => "undefined",
            AuditStatus::Unaudited => "unaudited",
            AuditStatus::Clean => "clean",
            AuditStatus::Flagged => "flagged",
        }
    }
}

/// Part-of-speech tag set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Pos {
    Adj,
    Adv,
    Conj,
    Noun,
    Verb,
    Affix,
    Det,
    Num,
    Pron,
    Prt,
    Punct,
    X,
}

impl Pos {
    pub const ALL: [Pos; 12] = [
        Pos::Adj,
        Pos::Adv,
        Pos::Conj,
        Pos::Noun,
        Pos::Verb,
        Pos::Affix,
        Pos::Det,
        Pos::Num,
        Pos::Pron,
        Pos::Prt,
        Pos::Punct,
        Pos::X,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pos::Adj => "ADJ",
            Pos::Adv => "ADV",
            Pos::Conj => "CONJ",
            Pos::Noun => "NOUN",
            Pos::Verb => "VERB",
            Pos::Affix => "AFFIX",
            Pos::Det => "DET",
            Pos::Num => "NUM",
            Pos::Pron => "PRON",
            Pos::Prt => "PRT",
            Pos::Punct => "PUNCT",
            Pos::X => "X",
        }
    }

    /// Map a tag reported by an external tagger; unknown tags become `X`
    pub fn from_service_tag(tag: &str) -> Self {
        tag.parse().unwrap_or(Pos::X)
    }
}

impl FromStr for Pos {
    type Err = UnknownPos;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Pos::ALL
            .into_iter()
            .find(|pos| pos.as_str() == upper)
            .ok_or_else(|| UnknownPos(s.to_string()))
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPos(pub String);

impl fmt::Display for UnknownPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown part-of-speech tag: {}", self.0)
    }
}

impl std::error::Error for UnknownPos {}
