//! Statistics

mod accumulator;

pub use accumulator::*;
