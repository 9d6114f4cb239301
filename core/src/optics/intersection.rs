//! Ray/Surface Intersections

use super::Propagation;
use crate::geometry::*;
use crate::pbrt::*;

/// Intersect a ray with a spherical lens surface and return the hit point.
///
/// The radius is signed. A positive radius puts the centre of curvature on
/// the sensor side of the surface vertex. The root is picked so that a ray
/// crosses the surface cap nearest the vertex for the given propagation
/// direction.
///
/// Returns `None` when the ray misses the sphere.
///
/// * `direction`   - Ray direction (need not be normalized).
/// * `origin`      - Ray origin.
/// * `center`      - Centre of curvature.
/// * `radius`      - Signed radius of curvature.
/// * `propagation` - Which way the ray travels along the optical axis.
pub fn ray_sphere_intersection(
    direction: &Vector3f,
    origin: &Point3f,
    center: &Point3f,
    radius: Float,
    propagation: Propagation,
) -> Option<Point3f> {
    let d = direction.normalize();
    if d.has_nans() {
        return None;
    }

    let l = *center - *origin;
    let tca = l.dot(&d);
    let d2 = l.dot(&l) - tca * tca;
    let radius2 = radius * radius;
    if d2 > radius2 {
        return None;
    }

    let thc = (radius2 - d2).sqrt();
    let t = match propagation {
        Propagation::SensorToScene => tca + thc * sign(radius),
        Propagation::SceneToSensor => tca - thc * sign(radius),
    };

    Some(*origin + d * t)
}

/// Intersect a ray with the plane `z = plane_z`, used for flat surfaces and
/// aperture stops.
///
/// Returns `None` when the ray runs parallel to the plane.
///
/// * `direction` - Ray direction.
/// * `origin`    - Ray origin.
/// * `plane_z`   - Axial position of the plane.
pub fn ray_plane_intersection(
    direction: &Vector3f,
    origin: &Point3f,
    plane_z: Float,
) -> Option<Point3f> {
    if direction.z.abs() < MACHINE_EPSILON {
        return None;
    }

    let t = (plane_z - origin.z) / direction.z;
    Some(*origin + *direction * t)
}

/// Intersect two infinite 2-D lines, each given by two points on it.
///
/// Returns `None` when the lines are parallel or either line is degenerate.
///
/// * `p1` - First point on line `p`.
/// * `p2` - Second point on line `p`.
/// * `q1` - First point on line `q`.
/// * `q2` - Second point on line `q`.
pub fn line_line_intersection(
    p1: &Point2f,
    p2: &Point2f,
    q1: &Point2f,
    q2: &Point2f,
) -> Option<Point2f> {
    let a1 = p2.y - p1.y;
    let b1 = p1.x - p2.x;
    let c1 = a1 * p1.x + b1 * p1.y;

    let a2 = q2.y - q1.y;
    let b2 = q1.x - q2.x;
    let c2 = a2 * q1.x + b2 * q1.y;

    let det = a1 * b2 - a2 * b1;
    if det == 0.0 || !det.is_finite() {
        return None;
    }

    Some(Point2f::new(
        (b2 * c1 - b1 * c2) / det,
        (a1 * c2 - a2 * c1) / det,
    ))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    #[test]
    fn on_axis_sphere_hit_stays_on_axis() {
        // Convex surface with its vertex at z = 10 and centre behind it.
        let center = Point3f::new(0.0, 0.0, -40.0);
        let hit = ray_sphere_intersection(
            &Vector3f::new(0.0, 0.0, 1.0),
            &Point3f::zero(),
            &center,
            50.0,
            Propagation::SensorToScene,
        );

        let hit = hit.unwrap();
        assert_eq!(hit.x, 0.0);
        assert_eq!(hit.y, 0.0);
        assert!(approx_eq!(f64, hit.z, 10.0, epsilon = 1e-9));
    }

    #[test]
    fn negative_radius_picks_near_cap() {
        // Vertex at z = 10 with the centre ahead of it.
        let center = Point3f::new(0.0, 0.0, 60.0);
        let hit = ray_sphere_intersection(
            &Vector3f::new(0.0, 0.0, 1.0),
            &Point3f::zero(),
            &center,
            -50.0,
            Propagation::SensorToScene,
        )
        .unwrap();
        assert!(approx_eq!(f64, hit.z, 10.0, epsilon = 1e-9));
    }

    #[test]
    fn scene_to_sensor_picks_front_cap() {
        // Vertex at z = 10 with the centre behind it, approached from +z.
        let center = Point3f::new(0.0, 0.0, -40.0);
        let hit = ray_sphere_intersection(
            &Vector3f::new(0.0, 0.0, -1.0),
            &Point3f::new(0.0, 0.0, 100.0),
            &center,
            50.0,
            Propagation::SceneToSensor,
        )
        .unwrap();
        assert!(approx_eq!(f64, hit.z, 10.0, epsilon = 1e-9));
    }

    #[test]
    fn sphere_miss_is_none() {
        let hit = ray_sphere_intersection(
            &Vector3f::new(0.0, 0.0, 1.0),
            &Point3f::new(20.0, 0.0, 0.0),
            &Point3f::new(0.0, 0.0, 30.0),
            5.0,
            Propagation::SensorToScene,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn plane_hit() {
        let hit = ray_plane_intersection(
            &Vector3f::new(1.0, 0.0, 2.0),
            &Point3f::new(0.0, 1.0, 0.0),
            4.0,
        )
        .unwrap();
        assert_eq!(hit, Point3f::new(2.0, 1.0, 4.0));
    }

    #[test]
    fn plane_parallel_is_none() {
        let hit = ray_plane_intersection(
            &Vector3f::new(1.0, 0.0, 0.0),
            &Point3f::zero(),
            4.0,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn line_line_crossing() {
        let p = line_line_intersection(
            &Point2f::new(0.0, 0.0),
            &Point2f::new(2.0, 2.0),
            &Point2f::new(0.0, 2.0),
            &Point2f::new(2.0, 0.0),
        )
        .unwrap();
        assert!(approx_eq!(f64, p.x, 1.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, p.y, 1.0, epsilon = 1e-12));
    }

    #[test]
    fn line_line_parallel_is_none() {
        let p = line_line_intersection(
            &Point2f::new(0.0, 0.0),
            &Point2f::new(1.0, 1.0),
            &Point2f::new(0.0, 1.0),
            &Point2f::new(1.0, 2.0),
        );
        assert!(p.is_none());
    }
}
