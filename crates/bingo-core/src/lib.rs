//! # bingo-core
//!
//! Core types for the two-player bingo match engine.
//!
//! This crate provides the foundational types used across the engine:
//! - The 5x5 grid model and line detection
//! - Room roles and turn ownership
//! - The error taxonomy

pub mod error;
pub mod grid;
pub mod role;

pub use error::{BingoError, Result};
pub use grid::{
    CELL_COUNT, GRID_SIZE, Grid, LINE_COUNT, MAX_MARKERS, Position, WIN_LINE_THRESHOLD,
};
pub use role::{Role, Side, TurnOwner};
