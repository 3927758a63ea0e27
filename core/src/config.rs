use alloc::string::String;
use core::time::Duration;
use serde::{Deserialize, Serialize};

use crate::*;

/// Smallest accepted row or column count.
pub const MIN_SIDE: Coord = 5;
/// Largest accepted row or column count.
pub const MAX_SIDE: Coord = 30;
/// Cells kept free of mines around the first click (3×3 block).
pub const SAFE_ZONE_CELLS: CellCount = 9;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Expert,
    Custom,
}

impl Difficulty {
    /// Preset dimensions, `None` for [`Difficulty::Custom`].
    pub const fn preset(self) -> Option<GameConfig> {
        match self {
            Self::Beginner => Some(GameConfig::new_unchecked(9, 9, 10)),
            Self::Intermediate => Some(GameConfig::new_unchecked(16, 16, 40)),
            Self::Expert => Some(GameConfig::new_unchecked(16, 30, 99)),
            Self::Custom => None,
        }
    }

    /// Finds the preset matching `config`, falling back to `Custom`.
    pub fn of(config: GameConfig) -> Self {
        [Self::Beginner, Self::Intermediate, Self::Expert]
            .into_iter()
            .find(|difficulty| difficulty.preset() == Some(config))
            .unwrap_or(Self::Custom)
    }
}

/// Board dimensions and mine count. Always leaves room for the first click safety zone.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub rows: Coord,
    pub cols: Coord,
    pub mines: CellCount,
}

impl GameConfig {
    pub(crate) const fn new_unchecked(rows: Coord, cols: Coord, mines: CellCount) -> Self {
        Self { rows, cols, mines }
    }

    pub fn new(rows: Coord, cols: Coord, mines: CellCount) -> Result<Self> {
        let side_range = MIN_SIDE..=MAX_SIDE;
        if !side_range.contains(&rows) || !side_range.contains(&cols) {
            return Err(GameError::InvalidSize);
        }
        if mines == 0 {
            return Err(GameError::TooFewMines);
        }
        if mines > Self::max_mines(rows, cols) {
            return Err(GameError::TooManyMines);
        }
        Ok(Self::new_unchecked(rows, cols, mines))
    }

    /// Pulls every field into range instead of rejecting. The mine count is clamped against the
    /// already clamped dimensions, so the result always leaves the safety zone free.
    pub fn clamped(rows: Coord, cols: Coord, mines: CellCount) -> Self {
        let rows = rows.clamp(MIN_SIDE, MAX_SIDE);
        let cols = cols.clamp(MIN_SIDE, MAX_SIDE);
        let mines = mines.clamp(1, Self::max_mines(rows, cols));
        Self::new_unchecked(rows, cols, mines)
    }

    pub const fn max_mines(rows: Coord, cols: Coord) -> CellCount {
        mult(rows, cols).saturating_sub(SAFE_ZONE_CELLS)
    }

    pub const fn size(&self) -> Coord2 {
        (self.rows, self.cols)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.rows, self.cols)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new_unchecked(9, 9, 10)
    }
}

/// How long a press must be held before it turns into a flag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldDuration(u16);

impl HoldDuration {
    pub const MIN_MS: u16 = 100;
    pub const MAX_MS: u16 = 2000;
    pub const DEFAULT_MS: u16 = 300;

    pub fn new(ms: u32) -> Result<Self> {
        u16::try_from(ms)
            .ok()
            .filter(|ms| (Self::MIN_MS..=Self::MAX_MS).contains(ms))
            .map(Self)
            .ok_or(GameError::InvalidHoldDuration)
    }

    pub fn clamped(ms: u32) -> Self {
        let ms = ms.clamp(Self::MIN_MS.into(), Self::MAX_MS.into());
        Self(ms as u16)
    }

    pub const fn as_millis(self) -> u16 {
        self.0
    }

    pub const fn as_duration(self) -> Duration {
        Duration::from_millis(self.0 as u64)
    }
}

impl Default for HoldDuration {
    fn default() -> Self {
        Self(Self::DEFAULT_MS)
    }
}

/// The shape an external settings store persists. Missing fields fall back to defaults, so a
/// partial document merges over them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub rows: Coord,
    pub cols: Coord,
    pub mines: CellCount,
    pub show_flag_animation: bool,
    pub hold_to_flag_duration_ms: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        let config = GameConfig::default();
        Self {
            rows: config.rows,
            cols: config.cols,
            mines: config.mines,
            show_flag_animation: true,
            hold_to_flag_duration_ms: HoldDuration::DEFAULT_MS.into(),
        }
    }
}

impl Preferences {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| {
            log::debug!("Could not parse preferences: {}", err);
            GameError::MalformedPreferences
        })
    }

    pub fn from_json_or_default(json: &str) -> Self {
        Self::from_json(json).unwrap_or_else(|_| {
            log::warn!("Failed to load preferences, using defaults");
            Self::default()
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|_| GameError::MalformedPreferences)
    }

    pub fn game_config(&self) -> GameConfig {
        let config = GameConfig::clamped(self.rows, self.cols, self.mines);
        if (config.rows, config.cols, config.mines) != (self.rows, self.cols, self.mines) {
            log::warn!(
                "Stored board {}x{}/{} out of range, using {}x{}/{}",
                self.rows,
                self.cols,
                self.mines,
                config.rows,
                config.cols,
                config.mines
            );
        }
        config
    }

    pub fn hold_duration(&self) -> HoldDuration {
        HoldDuration::new(self.hold_to_flag_duration_ms).unwrap_or_else(|_| {
            log::warn!(
                "Stored hold duration {}ms out of range",
                self.hold_to_flag_duration_ms
            );
            HoldDuration::clamped(self.hold_to_flag_duration_ms)
        })
    }

    pub(crate) fn set_game_config(&mut self, config: GameConfig) {
        self.rows = config.rows;
        self.cols = config.cols;
        self.mines = config.mines;
    }
}
