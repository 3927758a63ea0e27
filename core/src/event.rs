use alloc::sync::Arc;
use smallvec::SmallVec;

use crate::*;

/// Notifications for presentation and audio collaborators. Board events carry the snapshot
/// taken right after the change, so a renderer never has to re-derive engine state.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    CellOpened { coords: Coord2, board: Arc<Board> },
    CellFlagged { coords: Coord2, board: Arc<Board> },
    CellUnflagged { coords: Coord2, board: Arc<Board> },
    GameOver { triggered: Option<Coord2>, board: Arc<Board> },
    GameWon { board: Arc<Board> },
    /// Configuration changed; a settings store may persist the new preferences.
    ConfigChanged(Preferences),
}

impl GameEvent {
    pub fn board(&self) -> Option<&Arc<Board>> {
        use GameEvent::*;
        match self {
            CellOpened { board, .. }
            | CellFlagged { board, .. }
            | CellUnflagged { board, .. }
            | GameOver { board, .. }
            | GameWon { board } => Some(board),
            ConfigChanged(_) => None,
        }
    }
}

/// Events produced by a single action, most actions emit one or two.
pub type GameEvents = SmallVec<[GameEvent; 2]>;
