use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Grid must contain at least one pair")]
    EmptyGrid,
    #[error("Card count must be even to form pairs")]
    OddCardCount,
    #[error("Not enough distinct faces for the requested grid")]
    NotEnoughFaces,
    #[error("Every face in a deck must appear exactly twice")]
    UnpairedFace,
    #[error("Container too small for the requested grid")]
    ContainerTooSmall,
    #[error("Card index out of range")]
    InvalidIndex,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
}

pub type Result<T> = core::result::Result<T, GameError>;
