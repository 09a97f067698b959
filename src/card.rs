use serde::{Deserialize, Serialize};

use crate::FaceId;

/// Player-visible state of a single card.
///
/// Valid transitions:
/// - FaceDown -> Revealed
/// - Revealed -> Matched
/// - Revealed -> FaceDown (mismatch reset)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardState {
    FaceDown,
    Revealed,
    Matched,
}

impl CardState {
    pub const fn is_face_down(self) -> bool {
        matches!(self, Self::FaceDown)
    }

    pub const fn is_revealed(self) -> bool {
        matches!(self, Self::Revealed)
    }

    /// Matched is terminal, the card accepts no further transitions.
    pub const fn is_matched(self) -> bool {
        matches!(self, Self::Matched)
    }
}

impl Default for CardState {
    fn default() -> Self {
        Self::FaceDown
    }
}

/// Outcome of requesting a card transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlipOutcome {
    NoChange,
    Flipped,
}

impl FlipOutcome {
    /// Whether this outcome could have caused an update to the game
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Flipped => true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    face: FaceId,
    state: CardState,
}

impl Card {
    pub const fn new(face: FaceId) -> Self {
        Self {
            face,
            state: CardState::FaceDown,
        }
    }

    pub(crate) const fn with_state(face: FaceId, state: CardState) -> Self {
        Self { face, state }
    }

    pub const fn face(&self) -> FaceId {
        self.face
    }

    pub const fn state(&self) -> CardState {
        self.state
    }

    /// Flip the card face up. No-op unless the card is face-down; duplicate
    /// taps on a revealed or matched card are benign events, not errors.
    pub fn reveal(&mut self) -> FlipOutcome {
        use CardState::*;
        use FlipOutcome::*;

        match self.state {
            FaceDown => {
                self.state = Revealed;
                Flipped
            }
            Revealed | Matched => NoChange,
        }
    }

    /// Lock the card as part of a matched pair. Legal only from Revealed.
    pub fn lock_as_matched(&mut self) -> FlipOutcome {
        use CardState::*;
        use FlipOutcome::*;

        match self.state {
            Revealed => {
                self.state = Matched;
                Flipped
            }
            FaceDown | Matched => NoChange,
        }
    }

    /// Return a revealed card to face-down after a mismatch.
    pub fn reset_to_face_down(&mut self) -> FlipOutcome {
        use CardState::*;
        use FlipOutcome::*;

        match self.state {
            Revealed => {
                self.state = FaceDown;
                Flipped
            }
            FaceDown | Matched => NoChange,
        }
    }
}
