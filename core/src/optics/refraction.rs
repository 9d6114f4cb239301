//! Refraction

use crate::geometry::*;
use crate::pbrt::*;

/// Returns the unit normal of a spherical surface at a hit point. The sign of
/// the radius flips it so that it faces against the incoming ray.
///
/// * `hit`    - Point on the surface.
/// * `center` - Centre of curvature.
/// * `radius` - Signed radius of curvature.
pub fn intersection_normal(hit: &Point3f, center: &Point3f, radius: Float) -> Vector3f {
    (*center - *hit).normalize() * sign(radius)
}

/// Computes the direction of a ray refracted at an interface using the
/// vector form of Snell's law.
///
/// Returns `None` on total internal reflection.
///
/// * `eta_i`    - Index of refraction on the incident side.
/// * `eta_t`    - Index of refraction on the transmitted side.
/// * `incident` - Incident direction.
/// * `normal`   - Surface normal facing against `incident`.
pub fn transmission_vector(
    eta_i: Float,
    eta_t: Float,
    incident: &Vector3f,
    normal: &Vector3f,
) -> Option<Vector3f> {
    let i = incident.normalize();
    let n = normal.normalize();
    let eta = eta_i / eta_t;

    let cos_i = -i.dot(&n);
    let cos_t2 = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if cos_t2 < 0.0 {
        return None;
    }

    let t = i * eta + n * (eta * cos_i - cos_t2.sqrt());
    if t.has_nans() {
        None
    } else {
        Some(t)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use proptest::prelude::*;

    #[test]
    fn on_axis_normal_is_axial() {
        let n = intersection_normal(
            &Point3f::new(0.0, 0.0, 10.0),
            &Point3f::new(0.0, 0.0, -40.0),
            50.0,
        );
        assert_eq!((n.x, n.y), (0.0, 0.0));
        assert!(approx_eq!(f64, n.z, -1.0, epsilon = 1e-12));

        let n = intersection_normal(
            &Point3f::new(0.0, 0.0, 10.0),
            &Point3f::new(0.0, 0.0, 60.0),
            -50.0,
        );
        assert_eq!((n.x, n.y), (0.0, 0.0));
        assert!(approx_eq!(f64, n.z, -1.0, epsilon = 1e-12));
    }

    #[test]
    fn normal_incidence_does_not_bend() {
        let i = Vector3f::new(0.0, 0.0, 1.0);
        let n = Vector3f::new(0.0, 0.0, -1.0);
        for (eta_i, eta_t) in [(1.0, 1.5), (1.5, 1.0), (1.7, 1.2)] {
            let t = transmission_vector(eta_i, eta_t, &i, &n).unwrap();
            assert!(approx_eq!(f64, t.x, 0.0, epsilon = 1e-12));
            assert!(approx_eq!(f64, t.y, 0.0, epsilon = 1e-12));
            assert!(t.z > 0.0);
        }
    }

    #[test]
    fn total_internal_reflection_is_none() {
        // 60 degrees from glass into air is past the critical angle.
        let i = Vector3f::new(sin(PI / 3.0), 0.0, cos(PI / 3.0));
        let n = Vector3f::new(0.0, 0.0, -1.0);
        assert!(transmission_vector(1.5, 1.0, &i, &n).is_none());
    }

    proptest! {
        #[test]
        fn snells_law_holds(theta in 0.0..1.2f64, eta_t in 1.0..2.0f64) {
            let i = Vector3f::new(sin(theta), 0.0, cos(theta));
            let n = Vector3f::new(0.0, 0.0, -1.0);
            let t = transmission_vector(1.0, eta_t, &i, &n).unwrap().normalize();
            let sin_t = (t.x * t.x + t.y * t.y).sqrt();
            prop_assert!(approx_eq!(f64, sin(theta), eta_t * sin_t, epsilon = 1e-9));
        }
    }
}
