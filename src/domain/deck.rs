//! Card decks and comparison results
//!
//! A deck holds three parallel card sets. Comparison `i` shows card `i` of
//! every set; each comparison is scored 0-10 per card.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use tracing::debug;

pub const MAX_SCORE: u8 = 10;

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("Invalid deck JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Card sets must be non-empty and have equal lengths (A: {a}, B: {b}, C: {c})")]
    UnequalSets { a: usize, b: usize, c: usize },

    #[error("No card with id '{id}' in set {set}")]
    UnknownCard { set: CardSet, id: String },

    #[error("Comparison {index} is out of range ({total} comparisons)")]
    ComparisonOutOfRange { index: usize, total: usize },

    #[error("Score for card {set} must be between 0 and {max}, got {score:?}")]
    InvalidScore {
        set: CardSet,
        score: Option<i64>,
        max: u8,
    },

    #[error("Edited card must be an object")]
    NotAnObject,

    #[error("Edited card changes id from '{expected}' to '{found}'")]
    IdMismatch { expected: String, found: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum CardSet {
    A,
    B,
    C,
}

impl CardSet {
    pub const ALL: [CardSet; 3] = [CardSet::A, CardSet::B, CardSet::C];
}

impl fmt::Display for CardSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardSet::A => "A",
            CardSet::B => "B",
            CardSet::C => "C",
        };
        f.write_str(name)
    }
}

/// A card with an id but no name is shown without details and cannot be scored.
pub fn is_minimal_card(card: &Value) -> bool {
    card.get("id").is_some() && card.get("name").is_none()
}

/// Card id as text, whether stored as a string or a number
pub fn card_id(card: &Value) -> Option<String> {
    match card.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDeck {
    pub cards_a: Vec<Value>,
    pub cards_b: Vec<Value>,
    pub cards_c: Vec<Value>,
}

impl CardDeck {
    /// Parse and validate a deck document.
    pub fn from_json(raw: &str) -> Result<Self, DeckError> {
        let deck: CardDeck = serde_json::from_str(raw)?;
        deck.validate()?;
        Ok(deck)
    }

    pub fn validate(&self) -> Result<(), DeckError> {
        let (a, b, c) = (self.cards_a.len(), self.cards_b.len(), self.cards_c.len());
        if a == 0 || a != b || a != c {
            return Err(DeckError::UnequalSets { a, b, c });
        }
        Ok(())
    }

    /// Number of comparisons, one per card position
    pub fn comparisons(&self) -> usize {
        self.cards_a.len()
    }

    pub fn set(&self, set: CardSet) -> &[Value] {
        match set {
            CardSet::A => &self.cards_a,
            CardSet::B => &self.cards_b,
            CardSet::C => &self.cards_c,
        }
    }

    fn set_mut(&mut self, set: CardSet) -> &mut Vec<Value> {
        match set {
            CardSet::A => &mut self.cards_a,
            CardSet::B => &mut self.cards_b,
            CardSet::C => &mut self.cards_c,
        }
    }

    pub fn card(&self, set: CardSet, id: &str) -> Option<&Value> {
        self.set(set)
            .iter()
            .find(|card| card_id(card).as_deref() == Some(id))
    }

    /// Merge an edited record into the stored card with the same id.
    ///
    /// Keys in `edited` overwrite the card's keys; other keys are kept.
    pub fn merge_edited(&mut self, set: CardSet, id: &str, edited: Value) -> Result<(), DeckError> {
        let Value::Object(edited) = edited else {
            return Err(DeckError::NotAnObject);
        };
        if let Some(raw) = edited.get("id") {
            let found = match raw {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if found != id {
                return Err(DeckError::IdMismatch {
                    expected: id.to_string(),
                    found,
                });
            }
        }

        let card = self
            .set_mut(set)
            .iter_mut()
            .find(|card| card_id(card).as_deref() == Some(id))
            .ok_or_else(|| DeckError::UnknownCard {
                set,
                id: id.to_string(),
            })?;

        if !card.is_object() {
            *card = Value::Object(Map::new());
        }
        if let Value::Object(stored) = card {
            let keys = edited.len();
            stored.extend(edited);
            debug!(set = %set, id, keys, "merged edited card");
        }
        Ok(())
    }

    /// Score comparison `index`. Scores are given in A, B, C order; minimal
    /// cards always score 0.
    pub fn score_comparison(
        &self,
        index: usize,
        scores: [Option<i64>; 3],
    ) -> Result<ComparisonResult, DeckError> {
        self.validate()?;
        let total = self.comparisons();
        if index >= total {
            return Err(DeckError::ComparisonOutOfRange { index, total });
        }

        let mut checked = [0u8; 3];
        for (slot, (set, score)) in CardSet::ALL.into_iter().zip(scores).enumerate() {
            if is_minimal_card(&self.set(set)[index]) {
                continue;
            }
            checked[slot] = score
                .and_then(|s| u8::try_from(s).ok())
                .filter(|s| *s <= MAX_SCORE)
                .ok_or(DeckError::InvalidScore {
                    set,
                    score,
                    max: MAX_SCORE,
                })?;
        }

        Ok(ComparisonResult {
            comparison_index: index,
            card_a: self.cards_a[index].clone(),
            card_b: self.cards_b[index].clone(),
            card_c: self.cards_c[index].clone(),
            score_a: checked[0],
            score_b: checked[1],
            score_c: checked[2],
            timestamp: Utc::now(),
        })
    }
}

/// One scored comparison, in the shape the results endpoint accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub comparison_index: usize,
    pub card_a: Value,
    pub card_b: Value,
    pub card_c: Value,
    pub score_a: u8,
    pub score_b: u8,
    pub score_c: u8,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deck() -> CardDeck {
        CardDeck {
            cards_a: vec![json!({"id": 1, "name": "Ace", "power": 3}), json!({"id": 2, "name": "Two"})],
            cards_b: vec![json!({"id": "b1", "name": "Bee"}), json!({"id": "b2"})],
            cards_c: vec![json!({"id": "c1", "name": "Sea"}), json!({"id": "c2", "name": "See"})],
        }
    }

    #[test]
    fn test_validate_lengths() {
        assert!(deck().validate().is_ok());

        let mut uneven = deck();
        uneven.cards_c.pop();
        assert!(matches!(
            uneven.validate(),
            Err(DeckError::UnequalSets { a: 2, b: 2, c: 1 })
        ));

        let empty = CardDeck {
            cards_a: vec![],
            cards_b: vec![],
            cards_c: vec![],
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_from_json_requires_all_sets() {
        assert!(matches!(
            CardDeck::from_json(r#"{"cardsA": [{}], "cardsB": [{}]}"#),
            Err(DeckError::Parse(_))
        ));
        let parsed = CardDeck::from_json(r#"{"cardsA": [{}], "cardsB": [{}], "cardsC": [{}]}"#).unwrap();
        assert_eq!(parsed.comparisons(), 1);
    }

    #[test]
    fn test_minimal_cards() {
        assert!(is_minimal_card(&json!({"id": "x"})));
        assert!(!is_minimal_card(&json!({"id": "x", "name": "X"})));
        assert!(!is_minimal_card(&json!({"name": "X"})));
    }

    #[test]
    fn test_card_lookup_by_numeric_or_string_id() {
        let deck = deck();
        assert_eq!(deck.card(CardSet::A, "1").unwrap()["name"], "Ace");
        assert_eq!(deck.card(CardSet::B, "b2").unwrap()["id"], "b2");
        assert!(deck.card(CardSet::C, "b1").is_none());
    }

    #[test]
    fn test_merge_edited_keeps_unedited_keys() {
        let mut deck = deck();
        deck.merge_edited(CardSet::A, "1", json!({"name": "Ace of Spades", "tags": ["rare"]}))
            .unwrap();
        assert_eq!(
            deck.cards_a[0],
            json!({"id": 1, "name": "Ace of Spades", "power": 3, "tags": ["rare"]})
        );

        assert!(matches!(
            deck.merge_edited(CardSet::A, "1", json!({"id": 9})),
            Err(DeckError::IdMismatch { .. })
        ));
        assert!(matches!(
            deck.merge_edited(CardSet::A, "404", json!({})),
            Err(DeckError::UnknownCard { .. })
        ));
        assert!(matches!(
            deck.merge_edited(CardSet::A, "1", json!([1])),
            Err(DeckError::NotAnObject)
        ));
    }

    #[test]
    fn test_score_comparison() {
        let deck = deck();
        let result = deck.score_comparison(0, [Some(7), Some(10), Some(0)]).unwrap();
        assert_eq!((result.score_a, result.score_b, result.score_c), (7, 10, 0));
        assert_eq!(result.card_b["id"], "b1");

        // B's second card is minimal, so its score is ignored
        let result = deck.score_comparison(1, [Some(1), None, Some(2)]).unwrap();
        assert_eq!(result.score_b, 0);

        assert!(matches!(
            deck.score_comparison(0, [Some(11), Some(1), Some(1)]),
            Err(DeckError::InvalidScore { set: CardSet::A, .. })
        ));
        assert!(matches!(
            deck.score_comparison(0, [Some(1), Some(-1), Some(1)]),
            Err(DeckError::InvalidScore { set: CardSet::B, .. })
        ));
        assert!(matches!(
            deck.score_comparison(0, [Some(1), Some(1), None]),
            Err(DeckError::InvalidScore { set: CardSet::C, .. })
        ));
        assert!(matches!(
            deck.score_comparison(2, [None, None, None]),
            Err(DeckError::ComparisonOutOfRange { index: 2, total: 2 })
        ));
    }

    #[test]
    fn test_score_uneven_deck_fails() {
        let uneven: CardDeck = serde_json::from_value(json!({
            "cardsA": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}],
            "cardsB": [{"id": 3, "name": "c"}],
            "cardsC": [{"id": 4, "name": "d"}, {"id": 5, "name": "e"}]
        }))
        .unwrap();
        assert!(matches!(
            uneven.score_comparison(1, [Some(1), Some(1), Some(1)]),
            Err(DeckError::UnequalSets { a: 2, b: 1, c: 2 })
        ));
    }

    #[test]
    fn test_result_wire_format() {
        let deck = deck();
        let result = deck.score_comparison(0, [Some(1), Some(2), Some(3)]).unwrap();
        let wire = serde_json::to_value(&result).unwrap();
        assert_eq!(wire["comparisonIndex"], 0);
        assert_eq!(wire["scoreC"], 3);
        assert!(wire["timestamp"].is_string());
    }
}
