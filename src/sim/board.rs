//! Board state: cell values, move budget, game phase
//!
//! The board is the single source of truth for every cell value. It has no
//! notion of time; the cascade engine drives it.

use std::fmt;

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::direction::Direction;
use super::error::GameError;

/// Current phase of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// No game started yet
    #[default]
    NotStarted,
    /// Accepting taps
    Playing,
    /// Every cell reached zero
    Won,
    /// Move budget ran out with values left on the board
    Lost,
}

impl GamePhase {
    pub fn is_over(self) -> bool {
        matches!(self, GamePhase::Won | GamePhase::Lost)
    }
}

/// A single grid cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub value: u32,
    pub row: usize,
    pub col: usize,
    /// Pop animation running (presentation only)
    #[serde(skip)]
    pub is_popping: bool,
    /// Drop trails leaving this cell (presentation only)
    #[serde(skip)]
    pub active_drops: Vec<Direction>,
}

impl Cell {
    pub fn new(row: usize, col: usize, value: u32) -> Self {
        Self {
            value,
            row,
            col,
            is_popping: false,
            active_drops: Vec::new(),
        }
    }
}

/// Grid of cells plus the move budget
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    height: usize,
    width: usize,
    /// Row-major cells
    cells: Vec<Cell>,
    moves_remaining: u32,
    phase: GamePhase,
}

impl Board {
    /// Refill the grid with uniform random values in `[min_value, max_value]`.
    ///
    /// Callers validate the configuration first; `min_value > max_value` is a
    /// programming error.
    pub fn reset<R: Rng>(
        &mut self,
        height: usize,
        width: usize,
        min_value: u32,
        max_value: u32,
        initial_moves: u32,
        rng: &mut R,
    ) {
        assert!(min_value <= max_value, "min_value above max_value");
        self.height = height;
        self.width = width;
        self.cells = (0..height * width)
            .map(|i| Cell::new(i / width, i % width, rng.random_range(min_value..=max_value)))
            .collect();
        self.moves_remaining = initial_moves;
        self.phase = GamePhase::Playing;
    }

    /// Build a playing board from explicit row values
    pub fn from_values(rows: &[Vec<u32>], initial_moves: u32) -> Result<Self, GameError> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(GameError::InvalidConfiguration(
                "board must have at least one row and one column".into(),
            ));
        }
        if rows.iter().any(|r| r.len() != width) {
            return Err(GameError::InvalidConfiguration(
                "all board rows must have the same length".into(),
            ));
        }

        let cells = rows
            .iter()
            .enumerate()
            .flat_map(|(row, values)| {
                values
                    .iter()
                    .enumerate()
                    .map(move |(col, &value)| Cell::new(row, col, value))
            })
            .collect();

        Ok(Self {
            height,
            width,
            cells,
            moves_remaining: initial_moves,
            phase: GamePhase::Playing,
        })
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn moves_remaining(&self) -> u32 {
        self.moves_remaining
    }

    #[inline]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: GamePhase) {
        self.phase = phase;
    }

    /// Row-major view of all cells
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.height && col < self.width).then(|| row * self.width + col)
    }

    /// Grid-space position to `(row, col)`, if on the grid
    pub fn locate(&self, pos: IVec2) -> Option<(usize, usize)> {
        let row = usize::try_from(pos.y).ok()?;
        let col = usize::try_from(pos.x).ok()?;
        self.index(row, col).map(|_| (row, col))
    }

    #[inline]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.index(row, col).is_some()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.index(row, col).map(|i| &self.cells[i])
    }

    pub(crate) fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.index(row, col).map(|i| &mut self.cells[i])
    }

    pub fn value(&self, row: usize, col: usize) -> Option<u32> {
        self.cell(row, col).map(|c| c.value)
    }

    /// Add one to a cell and return the new value
    pub fn increment(&mut self, row: usize, col: usize) -> Result<u32, GameError> {
        let cell = self
            .cell_mut(row, col)
            .ok_or_else(|| GameError::out_of_bounds(row, col))?;
        cell.value = cell
            .value
            .checked_add(1)
            .ok_or(GameError::ValueOverflow { row, col })?;
        Ok(cell.value)
    }

    /// Reset a cell to the zero floor
    pub fn clear(&mut self, row: usize, col: usize) -> Result<(), GameError> {
        let cell = self
            .cell_mut(row, col)
            .ok_or_else(|| GameError::out_of_bounds(row, col))?;
        cell.value = 0;
        Ok(())
    }

    /// Spend one move on a tap. The cell itself is left untouched.
    pub fn apply_player_move(&mut self, row: usize, col: usize) -> Result<(), GameError> {
        if !self.contains(row, col) {
            return Err(GameError::out_of_bounds(row, col));
        }
        if self.moves_remaining == 0 {
            return Err(GameError::NoMovesRemaining);
        }
        self.moves_remaining -= 1;
        Ok(())
    }

    /// Bonus move for a chain pop
    pub fn refund_move(&mut self) {
        self.moves_remaining = self.moves_remaining.saturating_add(1);
    }

    pub fn is_won(&self) -> bool {
        self.cells.iter().all(|c| c.value == 0)
    }

    /// Win takes precedence: clearing the board on the last move is a win
    pub fn is_lost(&self) -> bool {
        self.moves_remaining == 0 && !self.is_won()
    }

    /// Values as nested rows
    pub fn rows(&self) -> Vec<Vec<u32>> {
        self.cells
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(|c| c.value).collect())
            .collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width.max(1)) {
            let line: Vec<String> = row.iter().map(|c| c.value.to_string()).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        write!(f, "moves: {}", self.moves_remaining)
    }
}
