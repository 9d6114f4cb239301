//! Application related stuff

use clap::Parser;
use lens_core::paramset::*;
use lens_core::pbrt::Float;

/// Command line options.
#[derive(Parser, Clone, Debug)]
#[command(
    author,
    version,
    about = "Generate camera rays and write their weights as an image.",
    long_about = None
)]
pub struct Options {
    /// Number of threads to use.
    #[arg(
        long = "nthreads",
        short = 't',
        value_name = "NUM",
        default_value_t = 1,
        help = "Use specified number of threads for ray generation."
    )]
    n_threads: usize,

    /// Path to the image file.
    #[arg(
        long = "outfile",
        short = 'o',
        value_name = "FILE",
        default_value = "ray-weights.exr",
        help = "Write the ray weight image to the given filename."
    )]
    pub image_file: String,

    /// Image width in pixels.
    #[arg(long, value_name = "NUM", default_value_t = 360)]
    pub width: usize,

    /// Image height in pixels.
    #[arg(long, value_name = "NUM", default_value_t = 240)]
    pub height: usize,

    /// Samples per pixel.
    #[arg(long = "spp", short = 's', value_name = "NUM", default_value_t = 16)]
    pub samples_per_pixel: usize,

    /// Tile size.
    #[arg(
        long = "tilesize",
        short = 'p',
        value_name = "NUM",
        default_value_t = 16,
        help = "Size in pixels of square tiles rendered per thread."
    )]
    pub tile_size: usize,

    /// Sensor width in cm.
    #[arg(long, value_name = "CM")]
    pub sensor_width: Option<Float>,

    /// Sensor height in cm.
    #[arg(long, value_name = "CM")]
    pub sensor_height: Option<Float>,

    /// Focal length in mm.
    #[arg(long, value_name = "MM")]
    pub focal_length: Option<Float>,

    /// Disable depth of field.
    #[arg(long)]
    pub no_dof: bool,

    /// Aperture as an f-number.
    #[arg(long, value_name = "N")]
    pub f_stop: Option<Float>,

    /// Distance of the plane in focus in cm.
    #[arg(long, value_name = "CM")]
    pub focal_distance: Option<Float>,

    /// Distance of the optical vignetting aperture.
    #[arg(long, value_name = "DIST")]
    pub vignetting_distance: Option<Float>,

    /// Radius of the optical vignetting aperture relative to the lens.
    #[arg(long, value_name = "SCALE")]
    pub vignetting_radius: Option<Float>,

    /// Width of the highlight band at the vignetting aperture edge.
    #[arg(long, value_name = "WIDTH")]
    pub highlight_width: Option<Float>,

    /// Brightening inside the highlight band.
    #[arg(long, value_name = "STRENGTH")]
    pub highlight_strength: Option<Float>,

    /// Bokeh image used to shape the aperture.
    #[arg(long, value_name = "FILE")]
    pub bokeh: Option<String>,

    /// Fall back to disk sampling if the bokeh image cannot be used.
    #[arg(long)]
    pub bokeh_fallback: bool,

    /// Exposure compensation.
    #[arg(long, value_name = "E", allow_negative_numbers = true)]
    pub exposure: Option<Float>,

    /// Lens prescription to trace rays through.
    #[arg(long, value_name = "FILE")]
    pub lens: Option<String>,

    /// Object distance in mm the lens prescription is focused at.
    #[arg(long, value_name = "MM")]
    pub calibration_distance: Option<Float>,
}

impl Options {
    /// Returns the number of threads to use.
    pub fn threads(&self) -> usize {
        let max_threads = num_cpus::get();
        match self.n_threads {
            0 => {
                warn!("Invalid nthreads");
                1
            }
            n if n > max_threads => {
                warn!("Num threads > max logical CPUs {}", max_threads);
                max_threads
            }
            n => n,
        }
    }

    /// Returns the camera parameters given on the command line. Anything not
    /// given is left for the camera to default.
    pub fn camera_params(&self) -> ParamSet {
        let mut params = ParamSet::new();

        let floats = [
            ("sensorWidth", self.sensor_width),
            ("sensorHeight", self.sensor_height),
            ("focalLength", self.focal_length),
            ("fStop", self.f_stop),
            ("focalDistance", self.focal_distance),
            ("opticalVignettingDistance", self.vignetting_distance),
            ("opticalVignettingRadius", self.vignetting_radius),
            ("highlightWidth", self.highlight_width),
            ("highlightStrength", self.highlight_strength),
            ("exposureControl", self.exposure),
            ("calibrationDistance", self.calibration_distance),
        ];
        for (name, value) in floats {
            if let Some(v) = value {
                params.add_float(name, &[v]);
            }
        }

        if self.no_dof {
            params.add_bool("useDof", &[false]);
        }
        if let Some(path) = self.bokeh.as_ref() {
            params.add_bool("useImage", &[true]);
            params.add_string("bokehPath", &[path.clone()]);
        }
        if let Some(path) = self.lens.as_ref() {
            params.add_bool("lensStack", &[true]);
            params.add_string("lensFile", &[path.clone()]);
        }

        params
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
