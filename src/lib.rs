//! Core rules for a memory-matching ("pairs") card game: deck generation,
//! grid layout math, the two-card match-resolution state machine, and save
//! persistence. Rendering, animation, audio, and input wiring belong to the
//! embedding layer; this crate only exposes plain transition functions and
//! outcome values for it to act on.

use serde::{Deserialize, Serialize};

pub use card::*;
pub use deck::*;
pub use engine::*;
pub use error::*;
pub use layout::*;
pub use persist::*;
pub use session::*;
pub use types::*;

mod card;
mod deck;
mod engine;
mod error;
mod layout;
mod persist;
mod session;
mod types;

/// Grid configuration supplied by the embedding application.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub rows: Coord,
    pub cols: Coord,
    /// Size of the face-image set cards draw their identities from.
    pub face_count: FaceId,
}

impl GameConfig {
    pub const fn new(rows: Coord, cols: Coord, face_count: FaceId) -> Self {
        Self {
            rows,
            cols,
            face_count,
        }
    }

    pub const fn total_cards(&self) -> CardCount {
        mult(self.rows, self.cols)
    }

    pub const fn total_pairs(&self) -> CardCount {
        self.total_cards() / 2
    }

    /// Odd totals and face sets too small for the grid are hard errors; no
    /// partial deck is ever produced from an invalid configuration.
    pub fn validate(&self) -> Result<()> {
        let total = self.total_cards();
        if total == 0 {
            return Err(GameError::EmptyGrid);
        }
        if total % 2 != 0 {
            return Err(GameError::OddCardCount);
        }
        if self.total_pairs() > self.face_count as CardCount {
            return Err(GameError::NotEnoughFaces);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_even_grids_with_enough_faces() {
        assert_eq!(GameConfig::new(4, 4, 8).validate(), Ok(()));
        assert_eq!(GameConfig::new(2, 3, 3).validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_bad_configurations() {
        assert_eq!(GameConfig::new(3, 3, 20).validate(), Err(GameError::OddCardCount));
        assert_eq!(GameConfig::new(4, 4, 7).validate(), Err(GameError::NotEnoughFaces));
        assert_eq!(GameConfig::new(0, 5, 20).validate(), Err(GameError::EmptyGrid));
    }

    #[test]
    fn pair_count_is_half_the_cards() {
        let config = GameConfig::new(4, 5, 12);
        assert_eq!(config.total_cards(), 20);
        assert_eq!(config.total_pairs(), 10);
    }
}
