//! Domain records edited through generated forms

pub mod deck;

pub use deck::{is_minimal_card, CardDeck, CardSet, ComparisonResult, DeckError};
