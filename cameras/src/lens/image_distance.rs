//! Image Distance

use super::prescription::*;
use crate::error::*;
use lens_core::geometry::*;
use lens_core::optics::*;
use lens_core::pbrt::*;

/// Height of the calibration ray at the front vertex plane as a fraction of
/// the front element's clear aperture.
const PARAXIAL_HEIGHT: Float = 0.01;

impl LensPrescription {
    /// Returns the axial distance from the sensor plane at which an on-axis
    /// object point is imaged by the lens. A paraxial ray from the object is
    /// traced from the front element towards the sensor and intersected with
    /// the optical axis.
    ///
    /// * `object_distance` - Distance of the object from the sensor in mm.
    pub fn image_distance(&self, object_distance: Float) -> Result<Float, LensError> {
        let surfaces = self.surfaces();
        let vertices = self.vertex_positions();
        let front = surfaces.len() - 1;

        let mut origin = Point3f::new(0.0, 0.0, object_distance);
        let mut direction = Vector3f::new(
            0.0,
            PARAXIAL_HEIGHT * surfaces[front].aperture_radius,
            vertices[front] - object_distance,
        );

        let mut eta_i = 1.0;
        let mut normal = Vector3f::new(0.0, 0.0, 1.0);
        for i in (0..=front).rev() {
            let (hit, n) = surfaces[i]
                .intersect(&origin, &direction, vertices[i], Propagation::SceneToSensor)
                .ok_or_else(|| {
                    LensError::DegenerateCalibration(format!("ray misses surface {}", i))
                })?;

            let eta_t = surfaces[i].eta;
            if eta_t != eta_i {
                direction = transmission_vector(eta_i, eta_t, &direction, &n).ok_or_else(|| {
                    LensError::DegenerateCalibration(format!(
                        "total internal reflection at surface {}",
                        i
                    ))
                })?;
            }

            trace!("Calibration ray at surface {}: {} -> {}", i, hit, direction);

            origin = hit;
            normal = n;
            eta_i = eta_t;
        }

        // Leave the rearmost medium into air.
        if eta_i != 1.0 {
            direction = transmission_vector(eta_i, 1.0, &direction, &normal).ok_or_else(|| {
                LensError::DegenerateCalibration(String::from(
                    "total internal reflection leaving the lens",
                ))
            })?;
        }

        let p = line_line_intersection(
            &Point2f::new(origin.z, origin.y),
            &Point2f::new(origin.z + direction.z, origin.y + direction.y),
            &Point2f::new(0.0, 0.0),
            &Point2f::new(1.0, 0.0),
        )
        .ok_or_else(|| {
            LensError::DegenerateCalibration(String::from("exit ray is parallel to the axis"))
        })?;

        debug!(
            "Image distance for object at {} mm is {} mm",
            object_distance, p.x
        );

        Ok(p.x)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::super::surface::*;
    use super::*;
    use float_cmp::*;

    /// Biconvex singlet with radii of 50 mm, 5 mm thick, n = 1.5, front
    /// vertex 107 mm from the sensor.
    fn singlet() -> LensPrescription {
        LensPrescription::new(vec![
            LensSurface::new(SurfaceShape::Spherical { radius: 50.0 }, 5.0, 1.5, 10.0),
            LensSurface::new(SurfaceShape::Spherical { radius: -50.0 }, 2.0, 1.0, 10.0),
            LensSurface::new(SurfaceShape::ApertureStop, 100.0, 1.0, 8.0),
        ])
        .unwrap()
    }

    /// Paraxial image position of the singlet using the thick lens equations.
    fn paraxial_image(object_distance: Float) -> Float {
        let (n, r1, r2, d) = (1.5, 50.0, -50.0, 5.0);
        let (front_vertex, rear_vertex) = (107.0, 102.0);

        let power = (n - 1.0) * (1.0 / r1 - 1.0 / r2 + (n - 1.0) * d / (n * r1 * r2));
        let f = 1.0 / power;

        // Principal planes measured from the vertices along the light path.
        let h1 = -f * (n - 1.0) * d / (n * r2);
        let h2 = -f * (n - 1.0) * d / (n * r1);
        let front_principal = front_vertex - h1;
        let rear_principal = rear_vertex - h2;

        let s = object_distance - front_principal;
        let s_image = 1.0 / (1.0 / f - 1.0 / s);
        rear_principal - s_image
    }

    #[test]
    fn singlet_matches_paraxial_optics() {
        let lens = singlet();
        for object_distance in [500.0, 3000.0, 10000.0] {
            let z = lens.image_distance(object_distance).unwrap();
            let expected = paraxial_image(object_distance);
            assert!(
                approx_eq!(f64, z, expected, epsilon = 0.05),
                "object {}: traced {} expected {}",
                object_distance,
                z,
                expected
            );
        }
    }

    #[test]
    fn farther_objects_focus_closer_to_lens() {
        let lens = singlet();
        let near = lens.image_distance(500.0).unwrap();
        let far = lens.image_distance(10000.0).unwrap();
        assert!(far < near);
    }

    #[test]
    fn flat_plate_shifts_virtual_image() {
        let lens = LensPrescription::new(vec![
            LensSurface::new(SurfaceShape::Flat, 5.0, 1.5, 10.0),
            LensSurface::new(SurfaceShape::Flat, 50.0, 1.0, 10.0),
        ])
        .unwrap();

        // A plate does not focus. The exit ray points back to the object seen
        // through the glass, d (1 - 1/n) nearer.
        let z = lens.image_distance(1000.0).unwrap();
        assert!(approx_eq!(f64, z, 1000.0 - 5.0 / 3.0, epsilon = 1e-3));
    }

    #[test]
    fn miss_is_degenerate_calibration() {
        // The calibration ray passes far outside a tiny, strongly curved
        // front surface.
        let lens = LensPrescription::new(vec![
            LensSurface::new(SurfaceShape::Spherical { radius: 0.001 }, 5.0, 1.5, 10.0),
            LensSurface::new(SurfaceShape::Flat, 50.0, 1.0, 10.0),
        ])
        .unwrap();
        assert!(matches!(
            lens.image_distance(1000.0),
            Err(LensError::DegenerateCalibration(_))
        ));
    }
}
