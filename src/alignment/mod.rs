//! Resampling and multi-signal alignment
//!
//! - `resampler`: one irregular series → uniform grid (forward-fill by default)
//! - `aligner`: N series → one matrix on the finest common interval
//! - `matrix`: the aligned output, as a labeled table or a numeric array

mod aligner;
mod matrix;
mod resampler;

pub use aligner::Aligner;
pub use matrix::{AlignedMatrix, AlignedRow};
pub use resampler::{GapFill, Resampler};
