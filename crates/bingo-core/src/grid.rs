//! The 5x5 bingo grid and line detection
//!
//! Each cell holds a distinct call number in `1..=25` until it is marked,
//! at which point it holds `0`. A cell is marked if and only if its value
//! is `0`.

use crate::error::{BingoError, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid side length
pub const GRID_SIZE: usize = 5;

/// Number of cells on the grid
pub const CELL_COUNT: usize = GRID_SIZE * GRID_SIZE;

/// Number of scoring lines (5 rows, 5 columns, 2 diagonals)
pub const LINE_COUNT: usize = 2 * GRID_SIZE + 2;

/// A match is won once strictly more lines than this are complete at once
pub const WIN_LINE_THRESHOLD: usize = 4;

/// Upper bound of the line indicator shown to players
pub const MAX_MARKERS: usize = 5;

/// Value held by a marked cell
const MARKED: u8 = 0;

/// A cell coordinate on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    /// Create a position, returning `None` when it falls outside the grid
    pub fn new(row: usize, col: usize) -> Option<Self> {
        (row < GRID_SIZE && col < GRID_SIZE).then_some(Self { row, col })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The shared number grid with per-cell mark status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: [[u8; GRID_SIZE]; GRID_SIZE],
}

impl Grid {
    /// Create a freshly populated grid using the thread RNG
    pub fn new() -> Self {
        let mut grid = Self {
            cells: [[MARKED; GRID_SIZE]; GRID_SIZE],
        };
        grid.populate();
        grid
    }

    /// Build a grid from explicit rows.
    ///
    /// Every value must be non-zero and distinct; a `0` would read as an
    /// already-marked cell.
    pub fn from_rows(rows: [[u8; GRID_SIZE]; GRID_SIZE]) -> Result<Self> {
        let mut seen = [false; u8::MAX as usize + 1];
        for &value in rows.iter().flatten() {
            if value == MARKED {
                return Err(BingoError::InvalidInput(
                    "grid values must be non-zero".into(),
                ));
            }
            if std::mem::replace(&mut seen[value as usize], true) {
                return Err(BingoError::InvalidInput(format!(
                    "duplicate grid value {}",
                    value
                )));
            }
        }
        Ok(Self { cells: rows })
    }

    /// Assign a fresh permutation of `1..=25`, all unmarked
    pub fn populate(&mut self) {
        self.populate_with(&mut rand::rng());
    }

    /// Assign a fresh permutation of `1..=25` drawn from `rng`
    pub fn populate_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut values: Vec<u8> = (1..=CELL_COUNT as u8).collect();
        values.shuffle(rng);

        for (cell, value) in self.cells.iter_mut().flatten().zip(values) {
            *cell = value;
        }
    }

    /// Find the unmarked cell holding `call_number`
    pub fn locate(&self, call_number: u8) -> Result<Position> {
        if call_number == MARKED {
            return Err(BingoError::NotFound(call_number));
        }

        // Linear scan; the grid is tiny and lookups happen once per move
        for (row, cells) in self.cells.iter().enumerate() {
            for (col, &value) in cells.iter().enumerate() {
                if value == call_number {
                    return Ok(Position { row, col });
                }
            }
        }
        Err(BingoError::NotFound(call_number))
    }

    /// Current value of a cell, or `None` when off the grid
    pub fn cell(&self, pos: Position) -> Option<u8> {
        self.cells.get(pos.row)?.get(pos.col).copied()
    }

    /// Mark a cell, returning the call number it held.
    ///
    /// Returns `None` if the position is off the grid or already marked.
    pub fn mark(&mut self, pos: Position) -> Option<u8> {
        let cell = self.cells.get_mut(pos.row)?.get_mut(pos.col)?;
        if *cell == MARKED {
            return None;
        }
        Some(std::mem::replace(cell, MARKED))
    }

    pub fn is_marked(&self, pos: Position) -> bool {
        self.cell(pos) == Some(MARKED)
    }

    /// Number of unmarked cells left
    pub fn remaining(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&value| value != MARKED)
            .count()
    }

    /// Count rows, columns and diagonals whose cells are all marked
    pub fn count_complete_lines(&self) -> usize {
        let marked = |row: usize, col: usize| self.cells[row][col] == MARKED;

        let rows = (0..GRID_SIZE)
            .filter(|&row| (0..GRID_SIZE).all(|col| marked(row, col)))
            .count();
        let cols = (0..GRID_SIZE)
            .filter(|&col| (0..GRID_SIZE).all(|row| marked(row, col)))
            .count();
        let main_diagonal = (0..GRID_SIZE).all(|i| marked(i, i));
        let anti_diagonal = (0..GRID_SIZE).all(|i| marked(i, GRID_SIZE - 1 - i));

        rows + cols + usize::from(main_diagonal) + usize::from(anti_diagonal)
    }

    /// Number of line indicators to light, capped at [`MAX_MARKERS`]
    pub fn markers(&self) -> usize {
        self.count_complete_lines().min(MAX_MARKERS)
    }

    /// Whether enough lines are complete to claim the match
    pub fn has_won(&self) -> bool {
        self.count_complete_lines() > WIN_LINE_THRESHOLD
    }

    /// Iterate over `(position, value)` for every cell in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (Position, u8)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .map(move |(col, &value)| (Position { row, col }, value))
        })
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;
    use tokio_test::{assert_err, assert_ok};

    fn sequential() -> Grid {
        let mut rows = [[0u8; GRID_SIZE]; GRID_SIZE];
        for (i, cell) in rows.iter_mut().flatten().enumerate() {
            *cell = i as u8 + 1;
        }
        Grid::from_rows(rows).unwrap()
    }

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col).unwrap()
    }

    #[test]
    fn test_populate_yields_distinct_values() {
        let mut grid = sequential();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            grid.populate_with(&mut rng);
            let values: HashSet<u8> = grid.iter().map(|(_, v)| v).collect();
            assert_eq!(values.len(), CELL_COUNT);
            assert!(values.iter().all(|&v| (1..=CELL_COUNT as u8).contains(&v)));
            assert_eq!(grid.remaining(), CELL_COUNT);
        }
    }

    #[test]
    fn test_populate_clears_marks() {
        let mut grid = Grid::new();
        for (p, _) in grid.clone().iter() {
            grid.mark(p);
        }
        assert_eq!(grid.remaining(), 0);

        grid.populate();
        assert_eq!(grid.remaining(), CELL_COUNT);
        assert_eq!(grid.count_complete_lines(), 0);
    }

    #[test]
    fn test_from_rows_rejects_duplicates_and_zero() {
        let mut rows = [[0u8; GRID_SIZE]; GRID_SIZE];
        for (i, cell) in rows.iter_mut().flatten().enumerate() {
            *cell = i as u8 + 1;
        }
        rows[4][4] = 1;
        assert_err!(Grid::from_rows(rows));

        rows[4][4] = 0;
        assert_err!(Grid::from_rows(rows));
    }

    #[test]
    fn test_locate_then_mark() {
        let mut grid = sequential();
        let p = assert_ok!(grid.locate(7));
        assert_eq!(p, pos(1, 1));

        assert_eq!(grid.mark(p), Some(7));
        assert!(grid.is_marked(p));

        match grid.locate(7) {
            Err(BingoError::NotFound(7)) => {}
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_locate_zero_is_not_found() {
        let grid = sequential();
        assert_err!(grid.locate(0));
        assert_err!(grid.locate(26));
    }

    #[test]
    fn test_mark_twice_is_rejected() {
        let mut grid = sequential();
        assert_eq!(grid.mark(pos(0, 0)), Some(1));
        assert_eq!(grid.mark(pos(0, 0)), None);
    }

    #[test]
    fn test_position_bounds() {
        assert!(Position::new(4, 4).is_some());
        assert!(Position::new(5, 0).is_none());
        assert!(Position::new(0, 5).is_none());
        assert_eq!(sequential().cell(Position { row: 9, col: 9 }), None);
    }

    #[test]
    fn test_lines_monotonic_and_full_board_is_twelve() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut grid = sequential();
        let mut order: Vec<Position> = grid.iter().map(|(p, _)| p).collect();
        order.shuffle(&mut rng);

        let mut previous = 0;
        for p in order {
            grid.mark(p);
            let lines = grid.count_complete_lines();
            assert!(lines >= previous);
            previous = lines;
        }
        assert_eq!(grid.count_complete_lines(), LINE_COUNT);
        assert_eq!(grid.markers(), MAX_MARKERS);
    }

    #[test]
    fn test_counts_rows_columns_and_diagonals() {
        let mut grid = sequential();
        for col in 0..GRID_SIZE {
            grid.mark(pos(2, col));
        }
        assert_eq!(grid.count_complete_lines(), 1);

        for row in 0..GRID_SIZE {
            grid.mark(pos(row, 2));
        }
        assert_eq!(grid.count_complete_lines(), 2);

        for i in 0..GRID_SIZE {
            grid.mark(pos(i, i));
            grid.mark(pos(i, GRID_SIZE - 1 - i));
        }
        assert_eq!(grid.count_complete_lines(), 4);
    }

    /// The win rule is load-bearing: five simultaneous lines, not one.
    #[test]
    fn test_win_requires_more_than_four_lines() {
        let mut grid = sequential();

        // A single complete row is not a win
        for col in 0..GRID_SIZE {
            grid.mark(pos(0, col));
        }
        assert_eq!(grid.count_complete_lines(), 1);
        assert!(!grid.has_won());

        // Four rows: still not a win
        for row in 1..4 {
            for col in 0..GRID_SIZE {
                grid.mark(pos(row, col));
            }
        }
        assert_eq!(grid.count_complete_lines(), 4);
        assert_eq!(grid.markers(), 4);
        assert!(!grid.has_won());

        // Marking (4, 0) completes column 0 and the anti-diagonal
        grid.mark(pos(4, 0));
        assert_eq!(grid.count_complete_lines(), 6);
        assert_eq!(grid.markers(), MAX_MARKERS);
        assert!(grid.has_won());
    }
}
