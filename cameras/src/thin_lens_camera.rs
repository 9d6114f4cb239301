//! Thin Lens Camera

use crate::options::*;
use lens_core::camera::*;
use lens_core::geometry::*;
use lens_core::pbrt::*;
use lens_core::sampling::*;

/// Closed-form camera model: a pinhole, or a thin lens with depth of field,
/// bokeh shaping and optical vignetting.
#[derive(Debug)]
pub struct ThinLensCamera {
    /// Tangent of half the field of view.
    tan_half_fov: Float,

    /// Enables depth of field.
    use_dof: bool,

    /// Radius of the lens aperture in cm.
    aperture_radius: Float,

    /// Distance of the plane in focus in cm.
    focal_distance: Float,

    /// Distance of the virtual aperture. 0 disables optical vignetting.
    optical_vignetting_distance: Float,

    /// Radius of the virtual aperture as a multiple of the aperture radius.
    optical_vignetting_radius: Float,

    /// Width of the highlight band.
    highlight_width: Float,

    /// Brightening inside the highlight band.
    highlight_strength: Float,

    /// Lens sampling distribution. Disk sampling is used when absent.
    bokeh: Option<BokehDistribution>,
}

impl ThinLensCamera {
    /// Create a new `ThinLensCamera`.
    ///
    /// * `options` - Camera options.
    /// * `bokeh`   - Bokeh distribution for shaped apertures.
    pub fn new(options: &CameraOptions, bokeh: Option<BokehDistribution>) -> Self {
        // Focal length is given in mm and the sensor in cm.
        let focal_length = options.focal_length / 10.0;
        let fov = 2.0 * atan(options.sensor_width / (2.0 * focal_length));
        let aperture_radius = focal_length / (2.0 * options.f_stop);

        info!(
            "Thin lens: fov {:.3} deg, aperture radius {:.4} cm, focus at {} cm",
            fov.to_degrees(),
            aperture_radius,
            options.focal_distance
        );

        Self {
            tan_half_fov: tan(fov / 2.0),
            use_dof: options.use_dof,
            aperture_radius,
            focal_distance: options.focal_distance,
            optical_vignetting_distance: options.optical_vignetting_distance,
            optical_vignetting_radius: options.optical_vignetting_radius,
            highlight_width: options.highlight_width,
            highlight_strength: options.highlight_strength,
            bokeh,
        }
    }

    /// Returns the bokeh distribution if image sampling is in use.
    pub fn bokeh(&self) -> Option<&BokehDistribution> {
        self.bokeh.as_ref()
    }

    /// Returns the lens aperture radius in cm.
    pub fn aperture_radius(&self) -> Float {
        self.aperture_radius
    }

    /// Returns a camera space ray looking down -z for a sample.
    ///
    /// * `sample` - The sample.
    pub fn generate_ray(&self, sample: &CameraSample) -> CameraRay {
        let (sx, sy) = (sample.p_film.x, sample.p_film.y);

        let mut direction =
            Vector3f::new(sx * self.tan_half_fov, sy * self.tan_half_fov, 1.0).normalize();
        direction.z = -direction.z;

        if !self.use_dof {
            return CameraRay::new(Point3f::zero(), direction, 1.0);
        }

        // Sample a point on the lens.
        let lens = match &self.bokeh {
            Some(bokeh) => bokeh.sample(&sample.p_lens),
            None => concentric_sample_disk(&sample.p_lens),
        } * self.aperture_radius;
        let origin = Point3f::new(lens.x, lens.y, 0.0);

        // Re-aim at the point on the plane of focus.
        let ft = abs(self.focal_distance / direction.z);
        let p_focus = Point3f::zero() + direction * ft;
        let direction = (p_focus - origin).normalize();

        let mut weight = 1.0;
        if self.optical_vignetting_distance > 0.0 {
            let p = direction * self.optical_vignetting_distance - Vector3f::from(origin);
            let p_radius = p.x.hypot(p.y);
            let r = self.aperture_radius * self.optical_vignetting_radius;

            if p_radius > r {
                weight = 0.0;
            } else if p_radius > r - self.highlight_width && p_radius < r {
                weight *= self.highlight_strength
                    * (1.0 - (r - p_radius))
                    * (sx * sx + sy * sy).sqrt();
            }
        }

        CameraRay::new(origin, direction, weight)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use lens_core::image_io::*;
    use lens_core::rng::*;
    use float_cmp::*;

    #[test]
    fn pinhole_ignores_lens_samples() {
        let options = CameraOptions {
            use_dof: false,
            ..CameraOptions::default()
        };
        let camera = ThinLensCamera::new(&options, None);
        let mut rng = RNG::new(7);

        for j in -4..=4 {
            for i in -4..=4 {
                let p_film = Point2f::new(i as Float / 4.0, j as Float / 4.0);
                let a = camera.generate_ray(&CameraSample::new(p_film, rng.uniform_2d()));
                let b = camera.generate_ray(&CameraSample::new(p_film, rng.uniform_2d()));
                assert_eq!(a, b);
                assert_eq!(a.weight, 1.0);
                assert_eq!(a.origin, Point3f::zero());
                assert!(a.direction.z < 0.0);
            }
        }
    }

    #[test]
    fn pinhole_field_of_view() {
        let options = CameraOptions {
            use_dof: false,
            ..CameraOptions::default()
        };
        let camera = ThinLensCamera::new(&options, None);

        let centre = camera.generate_ray(&CameraSample::default());
        assert_eq!(centre.direction, Vector3f::new(0.0, 0.0, -1.0));

        // The sensor edge sits at half the field of view: 1.8 / 6.5.
        let edge = camera.generate_ray(&CameraSample::new(Point2f::new(1.0, 0.0), Point2f::zero()));
        let slope = edge.direction.x / -edge.direction.z;
        assert!(approx_eq!(f64, slope, 1.8 / 6.5, epsilon = 1e-12));
    }

    #[test]
    fn depth_of_field_converges_at_focus() {
        let camera = ThinLensCamera::new(&CameraOptions::default(), None);
        let p_film = Point2f::new(0.3, -0.2);
        let mut rng = RNG::new(3);

        let mut focus: Option<Point3f> = None;
        for _ in 0..16 {
            let ray = camera.generate_ray(&CameraSample::new(p_film, rng.uniform_2d()));
            assert_eq!(ray.weight, 1.0);
            assert!(ray.origin.radial_distance() <= camera.aperture_radius() + 1e-12);

            let t = -110.0 / ray.direction.z;
            let p = ray.origin + ray.direction * t;
            match focus {
                Some(f) => {
                    assert!(approx_eq!(f64, p.x, f.x, epsilon = 1e-9));
                    assert!(approx_eq!(f64, p.y, f.y, epsilon = 1e-9));
                }
                None => focus = Some(p),
            }
        }
    }

    #[test]
    fn optical_vignetting_kills_off_axis_rays() {
        let options = CameraOptions {
            optical_vignetting_distance: 10.0,
            optical_vignetting_radius: 0.5,
            ..CameraOptions::default()
        };
        let camera = ThinLensCamera::new(&options, None);

        let centre =
            camera.generate_ray(&CameraSample::new(Point2f::zero(), Point2f::new(0.5, 0.5)));
        assert_eq!(centre.weight, 1.0);

        let corner =
            camera.generate_ray(&CameraSample::new(Point2f::new(1.0, 1.0), Point2f::zero()));
        assert_eq!(corner.weight, 0.0);
    }

    #[test]
    fn highlight_band_scales_weight() {
        let options = CameraOptions {
            optical_vignetting_distance: 10.0,
            optical_vignetting_radius: 0.5,
            ..CameraOptions::default()
        };
        let camera = ThinLensCamera::new(&options, None);
        let r = camera.aperture_radius() * 0.5;

        // Offset lens sample whose ray crosses the virtual aperture inside the
        // band (r - 0.2, r).
        let p_lens = Point2f::new(0.7, 0.5);
        let band_radius = |ray: &CameraRay| {
            let p = ray.direction * 10.0 - Vector3f::from(ray.origin);
            p.x.hypot(p.y)
        };

        let ray = camera.generate_ray(&CameraSample::new(Point2f::new(-0.02, 0.0), p_lens));
        let p_radius = band_radius(&ray);
        assert!(p_radius > r - 0.2 && p_radius < r, "{p_radius} vs {r}");
        let expected = 10.0 * (1.0 - (r - p_radius)) * 0.02;
        assert!(approx_eq!(f64, ray.weight, expected, epsilon = 1e-12));
        assert!(approx_eq!(f64, ray.weight, 0.1815, epsilon = 1e-3));

        // The band multiplier carries the sensor radius, so it vanishes at
        // the sensor centre.
        let ray = camera.generate_ray(&CameraSample::new(Point2f::zero(), p_lens));
        let p_radius = band_radius(&ray);
        assert!(p_radius > r - 0.2 && p_radius < r, "{p_radius} vs {r}");
        assert_eq!(ray.weight, 0.0);
    }

    #[test]
    fn bokeh_shapes_lens_samples() {
        // A single bright pixel in the top-left corner of a 3x3 image.
        let mut pixels = vec![0.0; 3 * 3 * 3];
        pixels[0..3].copy_from_slice(&[1.0, 1.0, 1.0]);
        let bokeh = BokehDistribution::new(&PixelBuffer::new(3, 3, 3, pixels)).unwrap();

        let camera = ThinLensCamera::new(&CameraOptions::default(), Some(bokeh));
        let mut rng = RNG::new(11);
        let expected = Point2f::new(-2.0 / 3.0, 2.0 / 3.0) * camera.aperture_radius();
        for _ in 0..32 {
            let ray = camera.generate_ray(&CameraSample::new(Point2f::zero(), rng.uniform_2d()));
            assert!(approx_eq!(f64, ray.origin.x, expected.x, epsilon = 1e-12));
            assert!(approx_eq!(f64, ray.origin.y, expected.y, epsilon = 1e-12));
        }
    }
}
