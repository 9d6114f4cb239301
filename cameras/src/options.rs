//! Camera Options

use lens_core::paramset::*;
use lens_core::pbrt::*;

/// Strongly typed camera configuration. Lengths on the sensor and for the
/// focal length are in the units named below; the thin-lens model works in
/// centimetres and the lens stack in millimetres.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraOptions {
    /// Sensor width in cm.
    pub sensor_width: Float,

    /// Sensor height in cm.
    pub sensor_height: Float,

    /// Focal length in mm.
    pub focal_length: Float,

    /// Enables depth of field for the thin-lens model.
    pub use_dof: bool,

    /// Aperture as an f-number.
    pub f_stop: Float,

    /// Distance of the plane in focus in cm.
    pub focal_distance: Float,

    /// Distance of the virtual aperture used for optical vignetting. 0
    /// disables optical vignetting.
    pub optical_vignetting_distance: Float,

    /// Radius of the virtual aperture as a multiple of the lens aperture.
    pub optical_vignetting_radius: Float,

    /// Width of the band inside the virtual aperture edge that is brightened.
    pub highlight_width: Float,

    /// Brightening applied inside the highlight band.
    pub highlight_strength: Float,

    /// Shape the bokeh with an image instead of a disk.
    pub use_image: bool,

    /// Path to the bokeh image.
    pub bokeh_path: String,

    /// Exposure compensation. Positive values brighten, negative darken.
    pub exposure_control: Float,

    /// Trace rays through a lens prescription instead of the thin lens.
    pub lens_stack: bool,

    /// Path to the lens prescription.
    pub lens_file: String,

    /// Object distance in mm the lens stack is focused at.
    pub calibration_distance: Float,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            sensor_width: 3.6,
            sensor_height: 2.4,
            focal_length: 65.0,
            use_dof: true,
            f_stop: 1.4,
            focal_distance: 110.0,
            optical_vignetting_distance: 0.0,
            optical_vignetting_radius: 0.0,
            highlight_width: 0.2,
            highlight_strength: 10.0,
            use_image: false,
            bokeh_path: String::new(),
            exposure_control: 0.0,
            lens_stack: false,
            lens_file: String::new(),
            calibration_distance: 3000.0,
        }
    }
}

impl From<&ParamSet> for CameraOptions {
    /// Create `CameraOptions` from a parameter set. Missing values take their
    /// defaults; values out of range are replaced by the default.
    ///
    /// * `params` - Parameter set.
    fn from(params: &ParamSet) -> Self {
        let d = Self::default();

        let options = Self {
            sensor_width: positive(params, "sensorWidth", d.sensor_width),
            sensor_height: positive(params, "sensorHeight", d.sensor_height),
            focal_length: positive(params, "focalLength", d.focal_length),
            use_dof: params.find_one_bool("useDof", d.use_dof),
            f_stop: positive(params, "fStop", d.f_stop),
            focal_distance: positive(params, "focalDistance", d.focal_distance),
            optical_vignetting_distance: non_negative(
                params,
                "opticalVignettingDistance",
                d.optical_vignetting_distance,
            ),
            optical_vignetting_radius: non_negative(
                params,
                "opticalVignettingRadius",
                d.optical_vignetting_radius,
            ),
            highlight_width: non_negative(params, "highlightWidth", d.highlight_width),
            highlight_strength: non_negative(params, "highlightStrength", d.highlight_strength),
            use_image: params.find_one_bool("useImage", d.use_image),
            bokeh_path: params.find_one_string("bokehPath", d.bokeh_path),
            exposure_control: finite(params, "exposureControl", d.exposure_control),
            lens_stack: params.find_one_bool("lensStack", d.lens_stack),
            lens_file: params.find_one_string("lensFile", d.lens_file),
            calibration_distance: positive(params, "calibrationDistance", d.calibration_distance),
        };

        debug!("{:?}", options);
        options
    }
}

/// Returns a finite float parameter.
///
/// * `params`  - Parameter set.
/// * `name`    - Parameter name.
/// * `default` - Value when missing or invalid.
fn finite(params: &ParamSet, name: &str, default: Float) -> Float {
    checked(params, name, default, |v| v.is_finite(), "finite")
}

/// Returns a float parameter greater than 0.
///
/// * `params`  - Parameter set.
/// * `name`    - Parameter name.
/// * `default` - Value when missing or invalid.
fn positive(params: &ParamSet, name: &str, default: Float) -> Float {
    checked(params, name, default, |v| v.is_finite() && v > 0.0, "> 0")
}

/// Returns a float parameter that is at least 0.
///
/// * `params`  - Parameter set.
/// * `name`    - Parameter name.
/// * `default` - Value when missing or invalid.
fn non_negative(params: &ParamSet, name: &str, default: Float) -> Float {
    checked(params, name, default, |v| v.is_finite() && v >= 0.0, ">= 0")
}

fn checked<F>(params: &ParamSet, name: &str, default: Float, valid: F, expected: &str) -> Float
where
    F: Fn(Float) -> bool,
{
    let value = params.find_one_float(name, default);
    if valid(value) {
        value
    } else {
        warn!(
            "Parameter '{}' = {} should be {}. Using default {}.",
            name, value, expected, default
        );
        default
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
