//! Core

#[macro_use]
extern crate hexf;

#[macro_use]
extern crate log;

// Re-export.
pub mod camera;
pub mod geometry;
pub mod image_io;
pub mod optics;
pub mod paramset;
pub mod pbrt;
pub mod rng;
pub mod sampling;
pub mod stats;
