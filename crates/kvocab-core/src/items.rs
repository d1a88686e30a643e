//! Response items of the structured-output operations and their schemas.

use kvocab_types::{ConcernKey, Pos, Rank};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::validator::ResponseItem;

fn non_blank(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("`{field}` is blank"))
    } else {
        Ok(())
    }
}

fn pos_tags() -> Vec<&'static str> {
    Pos::ALL.iter().map(Pos::as_str).collect()
}

/// Generated definition; `def: null` rejects the term as not definable
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawDefinitionItem")]
pub struct DefinitionItem {
    pub rank: Rank,
    pub def: Option<String>,
}

/// Wire form keeping an absent `def` apart from an explicit null
#[derive(Deserialize)]
struct RawDefinitionItem {
    rank: Rank,
    #[serde(default, deserialize_with = "present")]
    def: Option<Option<String>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl TryFrom<RawDefinitionItem> for DefinitionItem {
    type Error = String;

    fn try_from(raw: RawDefinitionItem) -> Result<Self, Self::Error> {
        let def = raw.def.ok_or_else(|| "missing field `def`".to_string())?;
        Ok(DefinitionItem {
            rank: raw.rank,
            def,
        })
    }
}

impl ResponseItem for DefinitionItem {
    const FIELD: &'static str = "definitions";

    fn rank(&self) -> Rank {
        self.rank
    }

    fn check(&self) -> Result<(), String> {
        match &self.def {
            Some(def) => non_blank("def", def),
            None => Ok(()),
        }
    }

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "definitions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "rank": { "type": "integer" },
                            "def": { "type": "string", "nullable": true }
                        },
                        "required": ["rank", "def"]
                    }
                }
            },
            "required": ["definitions"]
        })
    }
}

/// Audit finding. `key: pos` carries the corrected tag in `fix`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuditItem {
    pub rank: Rank,
    pub key: ConcernKey,
    pub why: String,
    #[serde(default)]
    pub fix: Option<String>,
}

impl AuditItem {
    /// Corrected POS tag of a `key: pos` finding
    pub fn pos_fix(&self) -> Option<Pos> {
        match self.key {
            ConcernKey::Pos => self.fix.as_deref().and_then(|tag| tag.parse().ok()),
            ConcernKey::Def => None,
        }
    }
}

impl ResponseItem for AuditItem {
    const FIELD: &'static str = "issues";

    fn rank(&self) -> Rank {
        self.rank
    }

    fn check(&self) -> Result<(), String> {
        match self.key {
            ConcernKey::Def => non_blank("why", &self.why),
            ConcernKey::Pos if self.pos_fix().is_none() => Err(format!(
                "pos finding without a valid tag: {:?}",
                self.fix
            )),
            ConcernKey::Pos => Ok(()),
        }
    }

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "issues": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "rank": { "type": "integer" },
                            "key": { "type": "string", "enum": ["def", "pos"] },
                            "why": { "type": "string" },
                            "fix": { "type": "string", "nullable": true, "enum": pos_tags() }
                        },
                        "required": ["rank", "key", "why"]
                    }
                }
            },
            "required": ["issues"]
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionAction {
    Replace,
    Keep,
    Null,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CorrectionItem {
    pub rank: Rank,
    pub action: CorrectionAction,
    #[serde(default)]
    pub def: Option<String>,
}

impl ResponseItem for CorrectionItem {
    const FIELD: &'static str = "corrections";

    fn rank(&self) -> Rank {
        self.rank
    }

    fn check(&self) -> Result<(), String> {
        match (self.action, &self.def) {
            (CorrectionAction::Replace, Some(def)) => non_blank("def", def),
            (CorrectionAction::Replace, None) => Err("replace without `def`".to_string()),
            _ => Ok(()),
        }
    }

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "corrections": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "rank": { "type": "integer" },
                            "action": { "type": "string", "enum": ["replace", "keep", "null"] },
                            "def": { "type": "string", "nullable": true }
                        },
                        "required": ["rank", "action"]
                    }
                }
            },
            "required": ["corrections"]
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TranslationItem {
    pub rank: Rank,
    pub eng: String,
}

impl ResponseItem for TranslationItem {
    const FIELD: &'static str = "translations";

    fn rank(&self) -> Rank {
        self.rank
    }

    fn check(&self) -> Result<(), String> {
        non_blank("eng", &self.eng)
    }

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "translations": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "rank": { "type": "integer" },
                            "eng": { "type": "string" }
                        },
                        "required": ["rank", "eng"]
                    }
                }
            },
            "required": ["translations"]
        })
    }
}

/// Lemma and tag for one term, from the syntax analysis service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LemmaItem {
    pub rank: Rank,
    pub lemma: String,
    pub pos: Pos,
}
