use alloc::vec::Vec;
use core::num::Saturating;
use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Lifecycle of a generated board. There is no "ready" state: a board only exists once the first
/// cell has been revealed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardState {
    #[default]
    Active,
    Won,
    Lost,
}

impl BoardState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Grid of cells plus the bookkeeping derived from it. All gameplay operations are synchronous
/// and leave the board in a consistent state when they return.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<Cell>,
    mine_count: CellCount,
    flag_count: Saturating<CellCount>,
    state: BoardState,
    triggered_mine: Option<Coord2>,
}

impl Board {
    /// Builds a board from a mine mask. Each side must fit in a [`Coord`].
    pub fn from_mine_mask(mine_mask: &Array2<bool>) -> Result<Self> {
        let (rows, cols) = mine_mask.dim();
        if Coord::try_from(rows).is_err() || Coord::try_from(cols).is_err() {
            return Err(GameError::InvalidSize);
        }

        let cells = Array2::from_shape_fn(mine_mask.dim(), |(row, col)| {
            let is_mine = mine_mask[[row, col]];
            let adjacent_mines = if is_mine {
                0
            } else {
                mine_mask
                    .iter_neighbors((row as Coord, col as Coord))
                    .filter(|&pos| mine_mask[pos.to_nd_index()])
                    .count() as u8
            };
            Cell {
                is_mine,
                state: CellState::Closed,
                adjacent_mines,
            }
        });
        let mine_count = mine_mask.iter().filter(|&&is_mine| is_mine).count();

        Ok(Self {
            cells,
            mine_count: CellCount::try_from(mine_count).unwrap_or(CellCount::MAX),
            flag_count: Saturating(0),
            state: BoardState::Active,
            triggered_mine: None,
        })
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::InvalidCoords);
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Self::from_mine_mask(&mine_mask)
    }

    pub fn size(&self) -> Coord2 {
        let (rows, cols) = self.cells.dim();
        (rows as Coord, cols as Coord)
    }

    pub fn contains(&self, coords: Coord2) -> bool {
        let (rows, cols) = self.size();
        coords.0 < rows && coords.1 < cols
    }

    pub fn cell(&self, coords: Coord2) -> Option<Cell> {
        self.contains(coords).then(|| self[coords])
    }

    /// All cells in row-major order.
    pub fn iter_cells(&self) -> impl Iterator<Item = (Coord2, Cell)> + '_ {
        self.cells
            .indexed_iter()
            .map(|((row, col), &cell)| ((row as Coord, col as Coord), cell))
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn flag_count(&self) -> CellCount {
        self.flag_count.0
    }

    /// Mines minus flags, negative when the player over-flags.
    pub fn mines_left(&self) -> isize {
        (self.mine_count as isize) - (self.flag_count.0 as isize)
    }

    pub fn state(&self) -> BoardState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn cell_view(&self, coords: Coord2) -> Option<CellView> {
        let cell = self.cell(coords)?;
        let lost = matches!(self.state, BoardState::Lost);

        Some(match cell.state {
            CellState::Closed => CellView::Closed,
            CellState::Flagged if lost && !cell.is_mine => CellView::Misflagged,
            CellState::Flagged => CellView::Flagged,
            CellState::Opened if self.triggered_mine == Some(coords) => CellView::TriggeredMine,
            CellState::Opened if cell.is_mine => CellView::Mine,
            CellState::Opened => CellView::Opened(cell.adjacent_mines),
        })
    }

    pub fn can_chord_reveal_at(&self, coords: Coord2) -> bool {
        if self.is_finished() {
            return false;
        }

        match self.cell(coords) {
            Some(cell) if cell.is_opened() => {
                cell.adjacent_mines == self.count_flagged_neighbors(coords)
            }
            _ => false,
        }
    }

    /// Flags a closed cell or clears a flag. Opened cells and finished games are left alone.
    pub fn toggle_flag(&mut self, coords: Coord2) -> MarkOutcome {
        if !self.contains(coords) || self.is_finished() {
            log::trace!("flag ignored at {:?}", coords);
            return MarkOutcome::NoChange;
        }

        let cell = self.cell_mut(coords);
        match cell.state {
            CellState::Closed => {
                cell.state = CellState::Flagged;
                self.flag_count += 1;
                MarkOutcome::Flagged
            }
            CellState::Flagged => {
                cell.state = CellState::Closed;
                self.flag_count -= 1;
                MarkOutcome::Unflagged
            }
            CellState::Opened => MarkOutcome::NoChange,
        }
    }

    /// Opens a closed cell, flooding outwards through zero-count cells.
    pub fn reveal(&mut self, coords: Coord2) -> RevealOutcome {
        if !self.contains(coords) || self.is_finished() || !self[coords].is_closed() {
            log::trace!("reveal ignored at {:?}", coords);
            return RevealOutcome::NoChange;
        }

        let outcome = self.open_from(coords);
        self.settle(outcome)
    }

    /// Opens every closed neighbour of a numbered cell once the flags around it match its count.
    /// Stops at the first mine it opens; the remaining neighbours stay closed.
    pub fn chord_reveal(&mut self, coords: Coord2) -> RevealOutcome {
        if !self.can_chord_reveal_at(coords) {
            log::trace!("chord ignored at {:?}", coords);
            return RevealOutcome::NoChange;
        }

        let mut outcome = RevealOutcome::NoChange;
        for pos in self.cells.iter_neighbors(coords) {
            if !self[pos].is_closed() {
                continue;
            }
            outcome = outcome | self.open_from(pos);
            if outcome == RevealOutcome::HitMine {
                return outcome;
            }
        }

        self.settle(outcome)
    }

    /// Opens every mine that is not flagged. Flags stay put whether or not they are correct.
    pub fn reveal_all_mines(&mut self) {
        for cell in self.cells.iter_mut() {
            if cell.is_mine && !cell.is_flagged() {
                cell.state = CellState::Opened;
            }
        }
    }

    /// True once every safe cell is open. Flags are irrelevant.
    pub fn check_win(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_mine || cell.is_opened())
    }

    fn open_from(&mut self, coords: Coord2) -> RevealOutcome {
        if self[coords].is_mine {
            self.lose(coords);
            return RevealOutcome::HitMine;
        }

        // cells already opened act as the visited set
        let mut to_visit: Vec<Coord2> = alloc::vec![coords];
        while let Some(visit_coords) = to_visit.pop() {
            let cell = self.cell_mut(visit_coords);
            if !cell.is_closed() {
                continue;
            }
            cell.state = CellState::Opened;

            if cell.adjacent_mines == 0 && !cell.is_mine {
                to_visit.extend(
                    self.cells
                        .iter_neighbors(visit_coords)
                        .filter(|&pos| self[pos].is_closed()),
                );
            }
        }

        RevealOutcome::Revealed
    }

    fn settle(&mut self, outcome: RevealOutcome) -> RevealOutcome {
        match outcome {
            RevealOutcome::Revealed if self.check_win() => {
                log::debug!("board cleared");
                self.state = BoardState::Won;
                RevealOutcome::Won
            }
            outcome => outcome,
        }
    }

    fn lose(&mut self, coords: Coord2) {
        log::debug!("mine hit at {:?}", coords);
        self.cell_mut(coords).state = CellState::Opened;
        self.triggered_mine = Some(coords);
        self.reveal_all_mines();
        self.state = BoardState::Lost;
    }

    fn count_flagged_neighbors(&self, coords: Coord2) -> u8 {
        self.cells
            .iter_neighbors(coords)
            .filter(|&pos| self[pos].is_flagged())
            .count() as u8
    }

    fn cell_mut(&mut self, coords: Coord2) -> &mut Cell {
        &mut self.cells[coords.to_nd_index()]
    }
}

impl Index<Coord2> for Board {
    type Output = Cell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}
