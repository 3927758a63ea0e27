use serde::{Deserialize, Serialize};

/// Player-visible state of a cell. The only part of a [`Cell`] that changes after generation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Closed,
    Opened,
    Flagged,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub is_mine: bool,
    pub state: CellState,
    pub adjacent_mines: u8,
}

impl Cell {
    pub const fn is_closed(self) -> bool {
        matches!(self.state, CellState::Closed)
    }

    pub const fn is_opened(self) -> bool {
        matches!(self.state, CellState::Opened)
    }

    pub const fn is_flagged(self) -> bool {
        matches!(self.state, CellState::Flagged)
    }
}

/// What a renderer should draw for a cell, end-of-game distinctions included.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellView {
    Closed,
    Opened(u8),
    Flagged,
    /// Mine exposed when the game was lost.
    Mine,
    /// The mine whose reveal lost the game.
    TriggeredMine,
    /// Flag placed on a safe cell, only shown after a loss.
    Misflagged,
}
