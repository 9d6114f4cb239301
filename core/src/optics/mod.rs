//! Geometric Optics

mod intersection;
mod refraction;

// Re-export.
pub use intersection::*;
pub use refraction::*;

/// Direction a ray travels along the optical axis. Lens space puts the
/// sensor at z = 0 with the scene towards +z.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Propagation {
    /// Rays leave the sensor and travel towards +z.
    SensorToScene,

    /// Rays leave an object in the scene and travel towards -z.
    SceneToSensor,
}
