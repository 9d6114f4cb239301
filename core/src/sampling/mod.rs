//! Sampling

mod bokeh;
mod common;

// Re-export
pub use bokeh::*;
pub use common::*;
