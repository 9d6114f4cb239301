//! Lens Surfaces

use lens_core::geometry::*;
use lens_core::optics::*;
use lens_core::pbrt::*;
use std::fmt;

/// Legacy curvature radius that marks a flat aperture plane in lens tables.
pub const FLAT_SENTINEL_RADIUS: Float = 99999.0;

/// The geometric form of a lens surface.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SurfaceShape {
    /// Spherical cap with a signed radius of curvature. A positive radius
    /// puts the centre of curvature on the sensor side of the vertex.
    Spherical { radius: Float },

    /// Flat refracting surface.
    Flat,

    /// Flat aperture stop. Rays outside the stop radius are vignetted.
    ApertureStop,
}

/// One interface of a lens prescription.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LensSurface {
    /// Surface shape.
    pub shape: SurfaceShape,

    /// Axial distance to the next surface towards the sensor, in mm. For the
    /// rearmost surface this is the distance to the sensor.
    pub thickness: Float,

    /// Index of refraction of the medium between this surface and the next
    /// one towards the sensor.
    pub eta: Float,

    /// Half the clear aperture, in mm.
    pub aperture_radius: Float,
}

impl LensSurface {
    /// Create a new `LensSurface`.
    ///
    /// * `shape`           - Surface shape.
    /// * `thickness`       - Axial distance to the next surface in mm.
    /// * `eta`             - Index of refraction behind the surface.
    /// * `aperture_radius` - Half the clear aperture in mm.
    pub fn new(shape: SurfaceShape, thickness: Float, eta: Float, aperture_radius: Float) -> Self {
        Self {
            shape,
            thickness,
            eta,
            aperture_radius,
        }
    }

    /// Create a `LensSurface` from one row of a lens table. A radius of 0 or
    /// the legacy flat sentinel is an aperture stop, an infinite radius is a
    /// flat surface and an index of refraction of 0 means air.
    ///
    /// * `radius`            - Signed radius of curvature in mm.
    /// * `thickness`         - Axial distance to the next surface in mm.
    /// * `eta`               - Index of refraction behind the surface.
    /// * `aperture_diameter` - Clear aperture in mm.
    pub fn from_table_row(
        radius: Float,
        thickness: Float,
        eta: Float,
        aperture_diameter: Float,
    ) -> Self {
        let shape = if radius == 0.0 || radius.abs() == FLAT_SENTINEL_RADIUS {
            SurfaceShape::ApertureStop
        } else if radius.is_infinite() {
            SurfaceShape::Flat
        } else {
            SurfaceShape::Spherical { radius }
        };

        let eta = if eta == 0.0 { 1.0 } else { eta };

        Self::new(shape, thickness, eta, aperture_diameter / 2.0)
    }

    /// Returns true if the surface is an aperture stop.
    pub fn is_aperture_stop(&self) -> bool {
        self.shape == SurfaceShape::ApertureStop
    }

    /// Returns the signed radius of curvature. Flat surfaces and stops
    /// report 0.
    pub fn radius(&self) -> Float {
        match self.shape {
            SurfaceShape::Spherical { radius } => radius,
            SurfaceShape::Flat | SurfaceShape::ApertureStop => 0.0,
        }
    }

    /// Intersect a ray with the surface and return the hit point together
    /// with the surface normal facing against the ray.
    ///
    /// * `origin`      - Ray origin.
    /// * `direction`   - Ray direction.
    /// * `vertex_z`    - Axial position of the surface vertex.
    /// * `propagation` - Which way the ray travels along the optical axis.
    pub fn intersect(
        &self,
        origin: &Point3f,
        direction: &Vector3f,
        vertex_z: Float,
        propagation: Propagation,
    ) -> Option<(Point3f, Vector3f)> {
        match self.shape {
            SurfaceShape::Spherical { radius } => {
                let center = Point3f::new(0.0, 0.0, vertex_z - radius);
                let hit = ray_sphere_intersection(direction, origin, &center, radius, propagation)?;
                let normal = match propagation {
                    Propagation::SensorToScene => intersection_normal(&hit, &center, radius),
                    Propagation::SceneToSensor => intersection_normal(&hit, &center, -radius),
                };
                Some((hit, normal))
            }
            SurfaceShape::Flat | SurfaceShape::ApertureStop => {
                let hit = ray_plane_intersection(direction, origin, vertex_z)?;
                let normal = match propagation {
                    Propagation::SensorToScene => Vector3f::new(0.0, 0.0, -1.0),
                    Propagation::SceneToSensor => Vector3f::new(0.0, 0.0, 1.0),
                };
                Some((hit, normal))
            }
        }
    }
}

impl fmt::Display for LensSurface {
    /// Formats the surface as a lens table row.
    ///
    /// * `f` - Formatter.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let radius = match self.shape {
            SurfaceShape::Spherical { radius } => format!("{radius:10.4}"),
            SurfaceShape::Flat => format!("{:>10}", "flat"),
            SurfaceShape::ApertureStop => format!("{:>10}", "stop"),
        };
        write!(
            f,
            "{radius} {:10.4} {:8.4} {:10.4}",
            self.thickness,
            self.eta,
            2.0 * self.aperture_radius
        )
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    #[test]
    fn table_row_mapping() {
        let s = LensSurface::from_table_row(0.0, 5.0, 0.0, 20.0);
        assert_eq!(s.shape, SurfaceShape::ApertureStop);
        assert_eq!(s.eta, 1.0);
        assert_eq!(s.aperture_radius, 10.0);

        let s = LensSurface::from_table_row(-99999.0, 5.0, 1.5, 20.0);
        assert!(s.is_aperture_stop());
        assert_eq!(s.radius(), 0.0);

        let s = LensSurface::from_table_row(Float::INFINITY, 5.0, 1.5, 20.0);
        assert_eq!(s.shape, SurfaceShape::Flat);

        let s = LensSurface::from_table_row(-42.0, 5.0, 1.5, 20.0);
        assert_eq!(s.radius(), -42.0);
    }

    #[test]
    fn spherical_hit_on_axis() {
        let s = LensSurface::new(SurfaceShape::Spherical { radius: 30.0 }, 5.0, 1.5, 10.0);
        let (hit, normal) = s
            .intersect(
                &Point3f::zero(),
                &Vector3f::new(0.0, 0.0, 1.0),
                12.0,
                Propagation::SensorToScene,
            )
            .unwrap();
        assert!(approx_eq!(f64, hit.z, 12.0, epsilon = 1e-9));
        assert_eq!(hit.radial_distance(), 0.0);
        assert!(approx_eq!(f64, normal.z, -1.0, epsilon = 1e-12));

        let (hit, normal) = s
            .intersect(
                &Point3f::new(0.0, 0.0, 100.0),
                &Vector3f::new(0.0, 0.0, -1.0),
                12.0,
                Propagation::SceneToSensor,
            )
            .unwrap();
        assert!(approx_eq!(f64, hit.z, 12.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, normal.z, 1.0, epsilon = 1e-12));
    }

    #[test]
    fn stop_hits_plane() {
        let s = LensSurface::new(SurfaceShape::ApertureStop, 5.0, 1.0, 10.0);
        let (hit, _) = s
            .intersect(
                &Point3f::new(1.0, 0.0, 0.0),
                &Vector3f::new(0.1, 0.0, 1.0),
                20.0,
                Propagation::SensorToScene,
            )
            .unwrap();
        assert!(approx_eq!(f64, hit.x, 3.0, epsilon = 1e-12));
        assert_eq!(hit.z, 20.0);
    }
}
