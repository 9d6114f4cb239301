//! Camera

use crate::geometry::*;
use crate::pbrt::*;
use crate::stats::*;
use std::fmt;

/// Camera trait provides the renderer boundary: one call per sample, never
/// failing.
pub trait Camera {
    /// Returns a ray corresponding to a given sample. Invalid samples and
    /// vignetted rays come back with a weight of 0.
    ///
    /// * `sample` - The sample.
    fn generate_ray(&self, sample: &CameraSample) -> CameraRay;

    /// Report end-of-run diagnostics.
    ///
    /// * `stats` - Accumulates the statistics.
    fn report_stats(&self, _stats: &mut StatsAccumulator) {}
}

/// Stores all of the sample values needed to specify a camera ray.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CameraSample {
    /// Normalized position on the sensor in [-1, 1]^2.
    pub p_film: Point2f,

    /// Lens sample in [0, 1)^2.
    pub p_lens: Point2f,
}

impl CameraSample {
    /// Create a new `CameraSample`.
    ///
    /// * `p_film` - Normalized position on the sensor in [-1, 1]^2.
    /// * `p_lens` - Lens sample in [0, 1)^2.
    pub fn new(p_film: Point2f, p_lens: Point2f) -> Self {
        Self { p_film, p_lens }
    }
}

impl fmt::Display for CameraSample {
    /// Formats the value using the given formatter.
    ///
    /// * `f` - Formatter.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CameraSample<p_film: {}, p_lens: {}>", self.p_film, self.p_lens)
    }
}

/// A ray leaving the camera in camera space, looking down -z.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraRay {
    /// Ray origin.
    pub origin: Point3f,

    /// Ray direction.
    pub direction: Vector3f,

    /// How much radiance carried along the ray contributes to the image.
    pub weight: Float,
}

impl CameraRay {
    /// Create a new `CameraRay`.
    ///
    /// * `origin`    - Ray origin.
    /// * `direction` - Ray direction.
    /// * `weight`    - Ray weight.
    pub fn new(origin: Point3f, direction: Vector3f, weight: Float) -> Self {
        Self {
            origin,
            direction,
            weight,
        }
    }

    /// Returns a zero-weight ray from the origin straight down the view axis.
    pub fn blocked() -> Self {
        Self::new(Point3f::zero(), Vector3f::new(0.0, 0.0, -1.0), 0.0)
    }

    /// Returns true if the ray carries no radiance.
    pub fn is_blocked(&self) -> bool {
        self.weight == 0.0
    }
}

impl Default for CameraRay {
    fn default() -> Self {
        Self::blocked()
    }
}

impl fmt::Display for CameraRay {
    /// Formats the value using the given formatter.
    ///
    /// * `f` - Formatter.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CameraRay<origin: {}, direction: {}, weight: {}>",
            self.origin, self.direction, self.weight
        )
    }
}
