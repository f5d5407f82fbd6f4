//! Core value types shared by every analysis stage
//!
//! - `Timeseries`: irregular `(timestamp, value)` readings as delivered by storage
//! - `SampleInterval`: inferred whole-second sampling period
//! - `UniformSignal`: gap-free signal on `start + k * interval`

mod interval;
mod timeseries;
mod uniform;

pub use interval::*;
pub use timeseries::*;
pub use uniform::*;
