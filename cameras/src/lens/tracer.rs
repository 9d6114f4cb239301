//! Lens Ray Tracer

use super::prescription::*;
use lens_core::geometry::*;
use lens_core::optics::*;
use lens_core::pbrt::*;
use std::fmt;

/// A ray travelling through the lens stack.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayState {
    /// Ray origin in lens space (mm).
    pub origin: Point3f,

    /// Ray direction.
    pub direction: Vector3f,

    /// Ray weight. 0 once the ray is blocked.
    pub weight: Float,
}

impl RayState {
    /// Create a new `RayState`.
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
}

impl fmt::Display for RayState {
    /// Formats the value using the given formatter.
    ///
    /// * `f` - Formatter.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RayState<origin: {}, direction: {}, weight: {}>",
            self.origin, self.direction, self.weight
        )
    }
}

impl LensPrescription {
    /// Trace a ray leaving the sensor through every surface towards the
    /// scene and return it as it leaves the front element.
    ///
    /// A ray that passes outside a clear aperture or the stop opening keeps
    /// travelling with a weight of 0. A ray that misses a surface or is
    /// totally internally reflected stops at the last surface it reached.
    ///
    /// * `ray` - Ray on the sensor plane heading towards +z.
    pub fn trace(&self, ray: RayState) -> RayState {
        let surfaces = self.surfaces();
        let last = surfaces.len() - 1;

        let mut ray = ray;
        let mut vignetted = false;
        let mut vertex_z = 0.0;

        for (i, surface) in surfaces.iter().enumerate() {
            vertex_z += surface.thickness;

            let (hit, normal) = match surface.intersect(
                &ray.origin,
                &ray.direction,
                vertex_z,
                Propagation::SensorToScene,
            ) {
                Some(intersection) => intersection,
                None => {
                    ray.weight = 0.0;
                    vignetted = true;
                    break;
                }
            };

            let r = hit.radial_distance();
            if r > surface.aperture_radius
                || (surface.is_aperture_stop() && r > self.stop_radius())
            {
                ray.weight = 0.0;
                vignetted = true;
            }

            let eta_i = surface.eta;
            let eta_t = if i < last { surfaces[i + 1].eta } else { 1.0 };
            ray.origin = hit;

            if eta_i != eta_t || i == last {
                match transmission_vector(eta_i, eta_t, &ray.direction, &normal) {
                    Some(direction) => ray.direction = direction,
                    None => {
                        ray.weight = 0.0;
                        vignetted = true;
                        break;
                    }
                }
            }
        }

        let counters = self.counters();
        counters.record_traced();
        if vignetted {
            counters.record_vignetted();
        }

        ray
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
    use proptest::prelude::*;

    /// Biconvex singlet behind which sits an aperture stop 100 mm from the
    /// sensor.
    fn singlet() -> LensPrescription {
        LensPrescription::new(vec![
            LensSurface::new(SurfaceShape::Spherical { radius: 50.0 }, 5.0, 1.5, 10.0),
            LensSurface::new(SurfaceShape::Spherical { radius: -50.0 }, 2.0, 1.0, 10.0),
            LensSurface::new(SurfaceShape::ApertureStop, 100.0, 1.0, 8.0),
        ])
        .unwrap()
    }

    fn towards(target: Point3f) -> RayState {
        RayState::new(Point3f::zero(), target - Point3f::zero(), 1.0)
    }

    #[test]
    fn axial_ray_passes_straight() {
        let lens = singlet();
        let out = lens.trace(towards(Point3f::new(0.0, 0.0, 100.0)));

        assert_eq!(out.weight, 1.0);
        assert!(approx_eq!(f64, out.origin.z, 107.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, out.direction.x, 0.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, out.direction.y, 0.0, epsilon = 1e-12));
        assert!(out.direction.z > 0.0);
        assert_eq!(lens.counters().traced(), 1);
        assert_eq!(lens.counters().vignetted(), 0);
    }

    #[test]
    fn off_axis_ray_is_bent_towards_axis() {
        let lens = singlet();
        let out = lens.trace(towards(Point3f::new(0.0, 4.0, 100.0)));

        assert_eq!(out.weight, 1.0);
        // A positive lens bends a diverging ray back towards the axis.
        let slope_in = 4.0 / 100.0;
        let slope_out = out.direction.y / out.direction.z;
        assert!(slope_out < slope_in);
    }

    #[test]
    fn ray_outside_stop_is_vignetted() {
        let lens = singlet();
        let out = lens.trace(towards(Point3f::new(9.0, 0.0, 100.0)));

        assert_eq!(out.weight, 0.0);
        assert_eq!(lens.counters().traced(), 1);
        assert_eq!(lens.counters().vignetted(), 1);
    }

    #[test]
    fn narrowed_stop_vignettes_inside_clear_aperture() {
        let mut lens = singlet();
        lens.set_stop_radius(2.0).unwrap();

        assert_eq!(lens.trace(towards(Point3f::new(1.5, 0.0, 100.0))).weight, 1.0);
        assert_eq!(lens.trace(towards(Point3f::new(3.0, 0.0, 100.0))).weight, 0.0);
        assert_eq!(lens.counters().traced(), 2);
        assert_eq!(lens.counters().vignetted(), 1);
    }

    #[test]
    fn missed_surface_is_counted_once() {
        let lens = singlet();
        let out = lens.trace(RayState::new(
            Point3f::zero(),
            Vector3f::new(1.0, 0.0, 0.01),
            1.0,
        ));

        assert_eq!(out.weight, 0.0);
        assert_eq!(lens.counters().traced(), 1);
        assert_eq!(lens.counters().vignetted(), 1);
    }

    #[test]
    fn counters_under_concurrent_tracing() {
        let lens = singlet();
        std::thread::scope(|scope| {
            for t in 0..4 {
                let lens = &lens;
                scope.spawn(move || {
                    for i in 0..250 {
                        let x = if (i + t) % 2 == 0 { 0.0 } else { 9.0 };
                        lens.trace(towards(Point3f::new(x, 0.0, 100.0)));
                    }
                });
            }
        });

        assert_eq!(lens.counters().traced(), 1000);
        assert_eq!(lens.counters().vignetted(), 500);
    }

    proptest! {
        #[test]
        fn weight_is_all_or_nothing(x in -12.0..12.0f64, y in -12.0..12.0f64) {
            let lens = singlet();
            let out = lens.trace(towards(Point3f::new(x, y, 100.0)));

            prop_assert!(out.weight == 0.0 || out.weight == 1.0);
            if x.hypot(y) > 8.0 {
                prop_assert_eq!(out.weight, 0.0);
            }
            prop_assert_eq!(lens.counters().traced(), 1);
        }
    }
}
