//! Lens Camera

use crate::error::*;
use crate::lens::*;
use crate::options::*;
use crate::thin_lens_camera::*;
use lens_core::camera::*;
use lens_core::geometry::*;
use lens_core::pbrt::*;
use lens_core::sampling::*;
use lens_core::stats::*;

/// How far sensor coordinates may stray outside [-1, 1] before a sample is
/// rejected.
const SENSOR_TOLERANCE: Float = 1e-6;

/// Ray generation model selected by the camera options.
#[derive(Debug)]
enum RayModel {
    /// Closed-form pinhole or thin lens.
    ThinLens(ThinLensCamera),

    /// Rays traced through a lens prescription.
    LensStack(LensStack),
}

/// Sensor and prescription used in lens-stack mode. Lengths are in mm.
#[derive(Debug)]
struct LensStack {
    /// Half the sensor width.
    half_width: Float,

    /// Half the sensor height.
    half_height: Float,

    /// Calibrated lens prescription.
    prescription: LensPrescription,
}

impl LensStack {
    /// Trace a ray from the sensor through the lens and return it as it
    /// leaves the front element, flipped into camera space.
    ///
    /// * `sample` - The sample.
    fn generate_ray(&self, sample: &CameraSample) -> CameraRay {
        let origin = Point3f::new(
            sample.p_film.x * self.half_width,
            sample.p_film.y * self.half_height,
            0.0,
        );

        // Aim at a point in the opening of the aperture stop.
        let p_stop = concentric_sample_disk(&sample.p_lens) * self.prescription.stop_radius();
        let target = Point3f::new(p_stop.x, p_stop.y, self.prescription.aperture_distance());

        let ray = self
            .prescription
            .trace(RayState::new(origin, target - origin, 1.0));

        // Lens space looks down +z; camera space looks down -z with the
        // image flipped upright.
        CameraRay::new(-ray.origin, (-ray.direction).normalize(), ray.weight)
    }
}

/// A camera emulating a physical or virtual lens. Configuration happens once
/// in `new`; afterwards rays can be generated from any number of threads.
#[derive(Debug)]
pub struct LensCamera {
    /// Options the camera was built from.
    options: CameraOptions,

    /// Ray generation model.
    model: RayModel,

    /// Weight multiplier from exposure compensation.
    exposure_scale: Float,
}

impl LensCamera {
    /// Create a new `LensCamera`. Loads the bokeh image or the lens
    /// prescription requested by the options and calibrates the lens.
    ///
    /// * `options` - Camera options.
    pub fn new(options: CameraOptions) -> Result<Self, CameraError> {
        let model = if options.lens_stack {
            let mut prescription = LensPrescription::read(&options.lens_file)?;
            prescription.set_stop_radius(options.focal_length / (2.0 * options.f_stop))?;
            prescription.calibrate(options.calibration_distance)?;

            RayModel::LensStack(LensStack {
                half_width: options.sensor_width * 10.0 / 2.0,
                half_height: options.sensor_height * 10.0 / 2.0,
                prescription,
            })
        } else {
            let bokeh = if options.use_dof && options.use_image {
                let bokeh = BokehDistribution::read(&options.bokeh_path)?;
                let (width, height) = bokeh.dimensions();
                info!(
                    "Bokeh image '{}': {}x{}, {} bytes",
                    options.bokeh_path,
                    width,
                    height,
                    bokeh.memory_bytes()
                );
                Some(bokeh)
            } else {
                None
            };
            RayModel::ThinLens(ThinLensCamera::new(&options, bokeh))
        };

        let exposure_scale = exposure_scale(options.exposure_control);

        Ok(Self {
            options,
            model,
            exposure_scale,
        })
    }

    /// Create a new `LensCamera`, falling back to disk sampling when the
    /// bokeh image cannot be used.
    ///
    /// * `options` - Camera options.
    pub fn with_bokeh_fallback(options: CameraOptions) -> Result<Self, CameraError> {
        match Self::new(options.clone()) {
            Err(CameraError::Bokeh(err)) => {
                warn!("{}. Falling back to disk sampling.", err);
                Self::new(CameraOptions {
                    use_image: false,
                    ..options
                })
            }
            result => result,
        }
    }

    /// Returns the options the camera was built from.
    pub fn options(&self) -> &CameraOptions {
        &self.options
    }

    /// Returns the lens prescription in lens-stack mode.
    pub fn prescription(&self) -> Option<&LensPrescription> {
        match &self.model {
            RayModel::LensStack(stack) => Some(&stack.prescription),
            RayModel::ThinLens(_) => None,
        }
    }
}

impl Camera for LensCamera {
    /// Returns a ray corresponding to a given sample. Invalid samples and
    /// degenerate rays come back with a weight of 0.
    ///
    /// * `sample` - The sample.
    fn generate_ray(&self, sample: &CameraSample) -> CameraRay {
        if !is_valid_sample(sample) {
            return CameraRay::blocked();
        }

        let mut ray = match &self.model {
            RayModel::ThinLens(camera) => camera.generate_ray(sample),
            RayModel::LensStack(stack) => stack.generate_ray(sample),
        };

        if ray.origin.has_nans() || ray.direction.has_nans() || ray.weight.is_nan() {
            return CameraRay::blocked();
        }

        ray.weight *= self.exposure_scale;
        ray
    }

    /// Report end-of-run diagnostics.
    ///
    /// * `stats` - Accumulates the statistics.
    fn report_stats(&self, stats: &mut StatsAccumulator) {
        match &self.model {
            RayModel::LensStack(stack) => {
                let counters = stack.prescription.counters();
                let (traced, vignetted) = (counters.traced(), counters.vignetted());
                stats.report_counter("Lens/Rays traced", traced);
                stats.report_counter("Lens/Vignetted rays", vignetted);
                stats.report_percentage("Lens/Vignetted rays", vignetted, traced);
            }
            RayModel::ThinLens(camera) => {
                if let Some(bokeh) = camera.bokeh() {
                    stats.report_memory_counter("Bokeh/Distribution", bokeh.memory_bytes() as u64);
                }
            }
        }
    }
}

/// Returns the weight multiplier for an exposure compensation value.
/// Opposite values cancel.
///
/// * `exposure` - Exposure compensation.
fn exposure_scale(exposure: Float) -> Float {
    let stops = 1.0 + exposure * exposure;
    if exposure > 0.0 {
        stops
    } else if exposure < 0.0 {
        1.0 / stops
    } else {
        1.0
    }
}

/// Returns true if sensor coordinates lie in [-1, 1]^2 and nothing is NaN.
///
/// * `sample` - The sample.
fn is_valid_sample(sample: &CameraSample) -> bool {
    let limit = 1.0 + SENSOR_TOLERANCE;
    !sample.p_film.has_nans()
        && !sample.p_lens.has_nans()
        && abs(sample.p_film.x) <= limit
        && abs(sample.p_film.y) <= limit
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
