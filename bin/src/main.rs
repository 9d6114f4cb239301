#[macro_use]
extern crate log;

mod app;
mod render;

use app::*;
use cameras::*;
use clap::Parser;
use lens_core::camera::*;
use lens_core::image_io::*;
use lens_core::stats::*;
use render::*;

fn main() {
    // Initialize `env_logger`.
    env_logger::init();

    let options = Options::parse();

    if let Err(e) = run(&options) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(options: &Options) -> Result<(), String> {
    // Configure the camera before any rays are generated.
    let params = options.camera_params();
    debug!("Camera parameters:\n{params}");

    let camera_options = CameraOptions::from(&params);
    let camera = if options.bokeh_fallback {
        LensCamera::with_bokeh_fallback(camera_options)
    } else {
        LensCamera::new(camera_options)
    }
    .map_err(|e| e.to_string())?;

    let settings = RenderSettings {
        width: options.width,
        height: options.height,
        samples_per_pixel: options.samples_per_pixel,
        tile_size: options.tile_size,
        threads: options.threads(),
    };
    if settings.width == 0 || settings.height == 0 {
        return Err(format!(
            "Invalid image resolution {}x{}",
            settings.width, settings.height
        ));
    }

    let mut stats = StatsAccumulator::new();
    let image = render(&camera, &settings, &mut stats);

    info!("Writing '{}'", options.image_file);
    write_image(&options.image_file, &image.to_rgb(), image.width, image.height)?;

    camera.report_stats(&mut stats);
    stats.print();

    Ok(())
}
