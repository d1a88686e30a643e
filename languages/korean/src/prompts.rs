use kvocab_core::prompt::PromptSet;
use kvocab_types::Entry;
use serde_json::{Value, json};

const DEFINITIONS: &str = "\
You write definitions for a Korean learner's dictionary.
For each entry write one short sentence in simple Korean that explains the headword \
using only common, high-frequency vocabulary. Do not use the headword itself in the definition.
If the term is not a real word of the given part of speech (a fragment, a name, a typo), \
return null for `def`.
Answer with one item per entry, keyed by `rank`.";

const AUDIT: &str = "\
You review a Korean learner's dictionary.
Report only real problems. Use key `def` when the definition is wrong, circular, \
too hard for a learner or does not match the part of speech, and explain why in `why`. \
Use key `pos` when the part-of-speech tag is wrong and put the correct tag in `fix`.
Entries without problems must not appear in the answer.";

const CORRECTION: &str = "\
You fix flagged entries of a Korean learner's dictionary.
Each entry lists the concerns raised by a reviewer. For each entry choose an action:
`replace` with a new one-sentence definition in simple Korean in `def`,
`keep` when the concerns do not hold,
or `null` when the term should not be defined at all.";

const TRANSLATION: &str = "\
Give a short English gloss for each Korean headword, guided by its Korean definition \
and part of speech. Use the dictionary form (\"to go\" for verbs) and at most a few words.";

/// Prompt wording for a Korean learner dictionary
#[derive(Debug, Clone, Copy, Default)]
pub struct KoreanPrompts;

fn listing(entries: &[&Entry], row: impl Fn(&Entry) -> Value) -> String {
    entries
        .iter()
        .map(|entry| row(entry).to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn pos(entry: &Entry) -> Value {
    json!(entry.pos.map(|p| p.as_str()))
}

fn compose(instructions: &str, entries: String) -> String {
    format!("{instructions}\n\nEntries:\n{entries}")
}

impl PromptSet for KoreanPrompts {
    fn definitions(&self, entries: &[&Entry]) -> String {
        let rows = listing(entries, |e| {
            json!({ "rank": e.rank, "term": e.headword(), "pos": pos(e) })
        });
        compose(DEFINITIONS, rows)
    }

    fn audit(&self, entries: &[&Entry]) -> String {
        let rows = listing(entries, |e| {
            json!({ "rank": e.rank, "term": e.headword(), "pos": pos(e), "def": e.def })
        });
        compose(AUDIT, rows)
    }

    fn correction(&self, entries: &[&Entry]) -> String {
        let rows = listing(entries, |e| {
            let concerns: Vec<&str> = e.concerns.iter().map(|c| c.why.as_str()).collect();
            json!({
                "rank": e.rank,
                "term": e.headword(),
                "pos": pos(e),
                "def": e.def,
                "concerns": concerns
            })
        });
        compose(CORRECTION, rows)
    }

    fn translation(&self, entries: &[&Entry]) -> String {
        let rows = listing(entries, |e| {
            json!({ "rank": e.rank, "term": e.headword(), "pos": pos(e), "def": e.def })
        });
        compose(TRANSLATION, rows)
    }
}

#[cfg(test)]
mod tests {
    use kvocab_types::{Concern, ConcernKey, Pos};

    use super::*;

    fn entry(rank: u32, term: &str, lemma: Option<&str>) -> Entry {
        let mut entry = Entry::placeholder(rank, term);
        entry.lemma = lemma.map(str::to_string);
        entry.pos = Some(Pos::Verb);
        entry
    }

    #[test]
    fn definitions_list_one_entry_per_line() {
        let went = entry(3, "갔다", Some("가다"));
        let come = entry(4, "오다", None);

        let prompt = KoreanPrompts.definitions(&[&went, &come]);
        let rows: Vec<Value> = prompt
            .split_once("Entries:\n")
            .unwrap()
            .1
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], json!({ "rank": 3, "term": "가다", "pos": "VERB" }));
        assert_eq!(rows[1]["term"], "오다");
    }

    #[test]
    fn correction_includes_concerns() {
        let mut flagged = entry(9, "보다", None);
        flagged.def = Some("보는 것이다.".to_string());
        flagged.concerns.push(Concern {
            rank: 9,
            key: ConcernKey::Def,
            why: "circular".to_string(),
        });

        let prompt = KoreanPrompts.correction(&[&flagged]);

        assert!(prompt.contains(r#""concerns":["circular"]"#));
        assert!(prompt.contains("보는 것이다."));
    }
}
