use alloc::vec::Vec;
use ndarray::Array2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::*;

/// Produces the board for a game at the moment of the first reveal.
pub trait BoardGenerator {
    fn generate(&mut self, config: GameConfig, first_click: Coord2) -> Result<Board>;
}

/// Places `config.mines` mines uniformly at random, never on or next to `first_click`.
pub fn generate<R: Rng>(
    config: GameConfig,
    first_click: Coord2,
    rng: &mut R,
) -> Result<Board> {
    let size = config.size();
    if first_click.0 >= size.0 || first_click.1 >= size.1 {
        return Err(GameError::InvalidCoords);
    }

    let mut candidates: Vec<Coord2> = (0..size.0)
        .flat_map(|row| (0..size.1).map(move |col| (row, col)))
        .filter(|&pos| !is_within_one(pos, first_click))
        .collect();

    if usize::from(config.mines) > candidates.len() {
        log::warn!(
            "Cannot place {} mines outside the safe zone, only {} cells available",
            config.mines,
            candidates.len()
        );
        return Err(GameError::TooManyMines);
    }

    let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());
    for _ in 0..config.mines {
        let pick = rng.random_range(0..candidates.len());
        mine_mask[candidates.swap_remove(pick).to_nd_index()] = true;
    }

    log::debug!(
        "generated {}x{} board with {} mines around {:?}",
        size.0,
        size.1,
        config.mines,
        first_click
    );
    Board::from_mine_mask(&mine_mask)
}

/// Random placement from a fixed seed, so a game can be reproduced.
#[derive(Clone, Debug)]
pub struct SeededGenerator {
    seed: u64,
    rng: SmallRng,
}

impl SeededGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl BoardGenerator for SeededGenerator {
    fn generate(&mut self, config: GameConfig, first_click: Coord2) -> Result<Board> {
        generate(config, first_click, &mut self.rng)
    }
}

/// Uses a known set of mine positions instead of random placement.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedLayout {
    mines: Vec<Coord2>,
}

impl FixedLayout {
    pub fn new(mines: impl Into<Vec<Coord2>>) -> Self {
        Self {
            mines: mines.into(),
        }
    }
}

impl BoardGenerator for FixedLayout {
    fn generate(&mut self, config: GameConfig, first_click: Coord2) -> Result<Board> {
        if self
            .mines
            .iter()
            .any(|&mine| is_within_one(mine, first_click))
        {
            return Err(GameError::UnsafeLayout);
        }

        let board = Board::from_mine_coords(config.size(), &self.mines)?;
        if board.mine_count() != config.mines {
            log::warn!(
                "Fixed layout mine count mismatch, actual: {}, requested: {}",
                board.mine_count(),
                config.mines
            );
        }
        Ok(board)
    }
}
