//! Lens

mod image_distance;
mod prescription;
mod surface;
mod tracer;

// Re-export
pub use prescription::*;
pub use surface::*;
pub use tracer::*;
