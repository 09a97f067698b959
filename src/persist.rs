use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{mult, Card, CardCount, CardState, Coord, Deck, FaceId, GameStats, MatchEngine};

/// A saved game could not be decoded; the caller should fall back to a fresh
/// round instead of failing.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed save blob: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("save does not describe a playable grid")]
    InvalidShape,
    #[error("save violates the pairing invariant")]
    UnpairedFace,
}

/// One card in the save. `revealed` is part of the on-disk schema but an
/// unresolved reveal is never written as true: on reload anything that is
/// not matched comes back face down.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCard {
    pub face_id: FaceId,
    #[serde(default)]
    pub matched: bool,
    #[serde(default)]
    pub revealed: bool,
}

/// Full snapshot of a round as stored in the key-value store.
///
/// The JSON field names match the historical save schema (`faceId`,
/// `totalMatches`, ...); `totalMatches` also accepts the legacy `score` key
/// and both counters default to zero when absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub rows: Coord,
    pub cols: Coord,
    pub cards: Vec<PersistedCard>,
    #[serde(default, alias = "score")]
    pub total_matches: CardCount,
    #[serde(default)]
    pub total_turns: u32,
}

impl PersistedState {
    /// Snapshot a live engine. Pending reveals are deliberately dropped.
    pub fn snapshot(rows: Coord, cols: Coord, engine: &MatchEngine) -> Self {
        let cards = engine
            .cards()
            .iter()
            .map(|card| PersistedCard {
                face_id: card.face(),
                matched: card.state().is_matched(),
                revealed: false,
            })
            .collect();
        let stats = engine.stats();
        Self {
            rows,
            cols,
            cards,
            total_matches: stats.total_matches,
            total_turns: stats.total_turns,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(blob: &str) -> Result<Self, DecodeError> {
        let state: Self = serde_json::from_str(blob)?;
        state.validate()?;
        Ok(state)
    }

    pub fn stats(&self) -> GameStats {
        GameStats {
            total_matches: self.total_matches,
            total_turns: self.total_turns,
        }
    }

    /// Rebuild the deck for [`MatchEngine::restore`]. Matched cards come
    /// back locked, everything else face down.
    pub fn into_deck(self) -> Result<Deck, DecodeError> {
        let cards = self
            .cards
            .into_iter()
            .map(|card| {
                let state = if card.matched {
                    CardState::Matched
                } else {
                    CardState::FaceDown
                };
                Card::with_state(card.face_id, state)
            })
            .collect();
        Deck::from_cards(cards).map_err(|_| DecodeError::UnpairedFace)
    }

    fn validate(&self) -> Result<(), DecodeError> {
        let total = mult(self.rows, self.cols) as usize;
        if total == 0 || total % 2 != 0 || total != self.cards.len() {
            return Err(DecodeError::InvalidShape);
        }

        let mut face_counts: BTreeMap<FaceId, u8> = BTreeMap::new();
        for card in &self.cards {
            *face_counts.entry(card.face_id).or_default() += 1;
        }
        if face_counts.values().any(|&count| count != 2) {
            return Err(DecodeError::UnpairedFace);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Deck;

    fn mid_game_engine() -> MatchEngine {
        let mut engine = MatchEngine::new(Deck::from_faces([0, 0, 1, 1]).unwrap());
        engine.reveal(0).unwrap();
        engine.reveal(1).unwrap();
        engine.resolve();
        engine
    }

    #[test]
    fn round_trip_preserves_mid_game_state() {
        let engine = mid_game_engine();
        let state = PersistedState::snapshot(2, 2, &engine);

        let blob = state.to_json().unwrap();
        let loaded = PersistedState::from_json(&blob).unwrap();

        assert_eq!(loaded, state);
        assert_eq!(
            loaded.stats(),
            GameStats {
                total_matches: 1,
                total_turns: 1
            }
        );
    }

    #[test]
    fn round_trip_preserves_zero_turn_state() {
        let engine = MatchEngine::new(Deck::from_faces([4, 4, 9, 9]).unwrap());
        let state = PersistedState::snapshot(2, 2, &engine);

        let blob = state.to_json().unwrap();
        assert_eq!(PersistedState::from_json(&blob).unwrap(), state);
    }

    #[test]
    fn json_uses_historical_field_names() {
        let engine = mid_game_engine();
        let blob = PersistedState::snapshot(2, 2, &engine).to_json().unwrap();

        assert!(blob.contains("\"faceId\""));
        assert!(blob.contains("\"totalMatches\""));
        assert!(blob.contains("\"totalTurns\""));
    }

    #[test]
    fn pending_reveals_are_never_persisted() {
        let mut engine = MatchEngine::new(Deck::from_faces([0, 0, 1, 1]).unwrap());
        engine.reveal(0).unwrap();

        let state = PersistedState::snapshot(2, 2, &engine);
        assert!(state.cards.iter().all(|card| !card.revealed));
    }

    #[test]
    fn legacy_score_schema_loads_with_defaults() {
        let blob = r#"{
            "rows": 2, "cols": 2,
            "cards": [
                {"faceId": 0, "matched": true},
                {"faceId": 0, "matched": true},
                {"faceId": 1},
                {"faceId": 1}
            ],
            "score": 1
        }"#;

        let state = PersistedState::from_json(blob).unwrap();
        assert_eq!(state.total_matches, 1);
        assert_eq!(state.total_turns, 0);
        assert!(!state.cards[2].matched);
    }

    #[test]
    fn corrupt_blob_is_a_decode_error() {
        assert!(matches!(
            PersistedState::from_json("not even json"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let blob = r#"{"rows": 2, "cols": 2, "cards": [{"faceId": 0}, {"faceId": 0}]}"#;
        assert!(matches!(
            PersistedState::from_json(blob),
            Err(DecodeError::InvalidShape)
        ));
    }

    #[test]
    fn unpaired_save_is_rejected() {
        let blob = r#"{
            "rows": 1, "cols": 2,
            "cards": [{"faceId": 0}, {"faceId": 1}]
        }"#;
        assert!(matches!(
            PersistedState::from_json(blob),
            Err(DecodeError::UnpairedFace)
        ));
    }

    #[test]
    fn into_deck_restores_card_states() {
        let engine = mid_game_engine();
        let state = PersistedState::snapshot(2, 2, &engine);
        let stats = state.stats();

        let restored = MatchEngine::restore(state.into_deck().unwrap(), stats);
        assert_eq!(restored.cards(), engine.cards());
        assert_eq!(restored.stats(), engine.stats());
    }
}
