use std::collections::BTreeSet;

use kvocab_types::Rank;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// One element of a service response array
pub trait ResponseItem: DeserializeOwned + Send {
    /// Name of the top-level array field holding the items
    const FIELD: &'static str;

    fn rank(&self) -> Rank;

    /// Checks across fields that deserialization cannot express
    fn check(&self) -> Result<(), String> {
        Ok(())
    }

    /// JSON schema handed to the service alongside the prompt
    fn schema() -> Value;
}

/// Why a single response element was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemRejection {
    /// `rank` is set when the element carried a readable one
    Invalid {
        index: usize,
        rank: Option<Rank>,
        reason: String,
    },
    OutOfBatch { index: usize, rank: Rank },
}

#[derive(Debug)]
pub struct Validated<T> {
    pub items: Vec<T>,
    pub rejected: Vec<ItemRejection>,
}

/// The response broke the contract as a whole
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct MalformedResponse(pub String);

/// Parse a raw response body into items addressed to `batch`.
///
/// Bad elements are dropped and reported in `rejected`; only an unparseable
/// body or a missing top-level array fails.
pub fn parse<T: ResponseItem>(
    raw: &str,
    batch: &BTreeSet<Rank>,
) -> Result<Validated<T>, MalformedResponse> {
    let body: Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| MalformedResponse(format!("response is not JSON: {e}")))?;

    let elements = body
        .get(T::FIELD)
        .and_then(Value::as_array)
        .ok_or_else(|| MalformedResponse(format!("missing array field `{}`", T::FIELD)))?;

    let mut items = Vec::with_capacity(elements.len());
    let mut rejected = Vec::new();

    for (index, element) in elements.iter().enumerate() {
        let item = match T::deserialize(element) {
            Ok(item) => item,
            Err(e) => {
                rejected.push(ItemRejection::Invalid {
                    index,
                    rank: element_rank(element),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if let Err(reason) = item.check() {
            rejected.push(ItemRejection::Invalid {
                index,
                rank: Some(item.rank()),
                reason,
            });
            continue;
        }

        if !batch.contains(&item.rank()) {
            rejected.push(ItemRejection::OutOfBatch {
                index,
                rank: item.rank(),
            });
            continue;
        }

        items.push(item);
    }

    Ok(Validated { items, rejected })
}

fn element_rank(element: &Value) -> Option<Rank> {
    element
        .get("rank")
        .and_then(Value::as_u64)
        .and_then(|rank| Rank::try_from(rank).ok())
}

/// Models sometimes wrap JSON in a markdown fence
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Gloss {
        rank: Rank,
        kind: Kind,
        text: Option<String>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "lowercase")]
    enum Kind {
        Short,
        Long,
    }

    impl ResponseItem for Gloss {
        const FIELD: &'static str = "glosses";

        fn rank(&self) -> Rank {
            self.rank
        }

        fn check(&self) -> Result<(), String> {
            match (&self.kind, &self.text) {
                (Kind::Long, None) => Err("long gloss needs text".to_string()),
                _ => Ok(()),
            }
        }

        fn schema() -> Value {
            json!({})
        }
    }

    fn batch(ranks: &[Rank]) -> BTreeSet<Rank> {
        ranks.iter().copied().collect()
    }

    #[test]
    fn wrong_typed_item_is_dropped() {
        let raw = r#"{"glosses": [
            {"rank": 1, "kind": "short", "text": "a"},
            {"rank": "2", "kind": "short", "text": "b"}
        ]}"#;

        let validated = parse::<Gloss>(raw, &batch(&[1, 2])).unwrap();

        assert_eq!(validated.items.len(), 1);
        assert_eq!(validated.items[0].rank, 1);
        assert!(matches!(
            validated.rejected[0],
            ItemRejection::Invalid { index: 1, rank: None, .. }
        ));
    }

    #[test]
    fn closed_set_and_cross_field_rules_apply() {
        let raw = r#"{"glosses": [
            {"rank": 1, "kind": "medium", "text": "a"},
            {"rank": 2, "kind": "long", "text": null},
            {"rank": 3, "kind": "long", "text": "ok"}
        ]}"#;

        let validated = parse::<Gloss>(raw, &batch(&[1, 2, 3])).unwrap();

        assert_eq!(validated.items.len(), 1);
        assert_eq!(validated.items[0].rank, 3);
        let ranks: Vec<Option<Rank>> = validated
            .rejected
            .iter()
            .map(|r| match r {
                ItemRejection::Invalid { rank, .. } => *rank,
                ItemRejection::OutOfBatch { rank, .. } => Some(*rank),
            })
            .collect();
        assert_eq!(ranks, vec![Some(1), Some(2)]);
    }

    #[test]
    fn out_of_batch_rank_is_dropped() {
        let raw = r#"{"glosses": [{"rank": 9, "kind": "short", "text": null}]}"#;

        let validated = parse::<Gloss>(raw, &batch(&[1, 2])).unwrap();

        assert!(validated.items.is_empty());
        assert_eq!(
            validated.rejected,
            vec![ItemRejection::OutOfBatch { index: 0, rank: 9 }]
        );
    }

    #[test]
    fn missing_array_is_malformed() {
        let err = parse::<Gloss>(r#"{"items": []}"#, &batch(&[1])).unwrap_err();
        assert!(err.0.contains("glosses"));

        let err = parse::<Gloss>(r#"{"glosses": {"rank": 1}}"#, &batch(&[1])).unwrap_err();
        assert!(err.0.contains("glosses"));
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(parse::<Gloss>("Sure! Here are the glosses", &batch(&[1])).is_err());
    }

    #[test]
    fn empty_array_is_not_an_error() {
        let validated = parse::<Gloss>(r#"{"glosses": []}"#, &batch(&[1])).unwrap();
        assert!(validated.items.is_empty());
        assert!(validated.rejected.is_empty());
    }

    #[test]
    fn fenced_json_is_accepted() {
        let raw = "```json\n{\"glosses\": [{\"rank\": 1, \"kind\": \"short\", \"text\": \"a\"}]}\n```";

        let validated = parse::<Gloss>(raw, &batch(&[1])).unwrap();
        assert_eq!(validated.items.len(), 1);
    }
}
