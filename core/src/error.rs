use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board dimensions out of range")]
    InvalidSize,
    #[error("Too many mines")]
    TooManyMines,
    #[error("At least one mine is required")]
    TooFewMines,
    #[error("Hold-to-flag duration out of range")]
    InvalidHoldDuration,
    #[error("Mine layout overlaps the first click safety zone")]
    UnsafeLayout,
    #[error("Malformed preferences document")]
    MalformedPreferences,
}

pub type Result<T> = core::result::Result<T, GameError>;
