//! Components - the grid widget and its building blocks.

pub mod cell;
pub mod grid;
pub mod stepper;
