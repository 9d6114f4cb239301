//! Ray Weight Rendering

use indicatif::{ProgressBar, ProgressStyle};
use lens_core::camera::*;
use lens_core::geometry::*;
use lens_core::pbrt::*;
use lens_core::rng::*;
use lens_core::stats::*;
use std::sync::Mutex;

/// Image of average camera ray weights.
pub struct WeightImage {
    /// Image width in pixels.
    pub width: usize,

    /// Image height in pixels.
    pub height: usize,

    /// Average ray weight per pixel, row major.
    pub pixels: Vec<Float>,
}

impl WeightImage {
    /// Returns the image as interleaved RGB.
    pub fn to_rgb(&self) -> Vec<Float> {
        self.pixels.iter().flat_map(|&w| [w, w, w]).collect()
    }
}

/// Rendering parameters.
#[derive(Copy, Clone, Debug)]
pub struct RenderSettings {
    /// Image width in pixels.
    pub width: usize,

    /// Image height in pixels.
    pub height: usize,

    /// Samples per pixel.
    pub samples_per_pixel: usize,

    /// Size in pixels of square tiles.
    pub tile_size: usize,

    /// Number of worker threads.
    pub threads: usize,
}

/// Result of rendering one tile.
struct Tile {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
    weights: Vec<Float>,
    blocked: u64,
}

/// Generate camera rays for every pixel on a pool of worker threads and
/// return the average weight per pixel.
///
/// * `camera`   - The camera.
/// * `settings` - Rendering parameters.
/// * `stats`    - Accumulates ray statistics.
pub fn render(
    camera: &(dyn Camera + Sync),
    settings: &RenderSettings,
    stats: &mut StatsAccumulator,
) -> WeightImage {
    let tile_size = settings.tile_size.max(1);
    let n_tiles = Point2::new(
        (settings.width + tile_size - 1) / tile_size,
        (settings.height + tile_size - 1) / tile_size,
    );
    let tile_count = n_tiles.x * n_tiles.y;

    info!("Rendering {}x{} tiles", n_tiles.x, n_tiles.y);

    let progress = create_progress_reporter(tile_count as u64);
    progress.set_message("Generating rays");

    let image = Mutex::new(vec![0.0; settings.width * settings.height]);
    let blocked = Mutex::new(0_u64);

    let threads = settings.threads.max(1);
    std::thread::scope(|scope| {
        let (tx, rx) = crossbeam_channel::bounded(threads);

        // Spawn worker threads.
        for _ in 0..threads {
            let rxc = rx.clone();
            let (progress, image, blocked) = (&progress, &image, &blocked);
            scope.spawn(move || {
                for tile_idx in rxc.iter() {
                    let tile = render_tile(camera, settings, tile_idx, n_tiles);
                    merge_tile(image, settings.width, &tile);
                    if let Ok(mut b) = blocked.lock() {
                        *b += tile.blocked;
                    }
                    progress.inc(1);
                }
            });
        }
        drop(rx); // Drop extra rx since we've cloned one for each worker.

        // Send work.
        for tile_idx in 0..tile_count {
            if tx.send(tile_idx).is_err() {
                error!("Ray generation workers exited early");
                break;
            }
        }
    });

    progress.finish_with_message("Rays generated");

    let total = (settings.width * settings.height * settings.samples_per_pixel) as u64;
    let blocked = blocked.into_inner().unwrap_or_else(|e| e.into_inner());
    stats.report_counter("Camera/Rays generated", total);
    stats.report_percentage("Camera/Blocked rays", blocked, total);

    WeightImage {
        width: settings.width,
        height: settings.height,
        pixels: image.into_inner().unwrap_or_else(|e| e.into_inner()),
    }
}

/// Render an image tile. Each tile has its own random sequence so results
/// do not depend on thread scheduling.
///
/// * `camera`   - The camera.
/// * `settings` - Rendering parameters.
/// * `tile_idx` - Unique tile index.
/// * `n_tiles`  - Number of tiles in (x, y) direction.
fn render_tile(
    camera: &(dyn Camera + Sync),
    settings: &RenderSettings,
    tile_idx: usize,
    n_tiles: Point2<usize>,
) -> Tile {
    let tile_x = tile_idx % n_tiles.x;
    let tile_y = tile_idx / n_tiles.x;

    let tile_size = settings.tile_size.max(1);
    let x0 = tile_x * tile_size;
    let x1 = min(x0 + tile_size, settings.width);
    let y0 = tile_y * tile_size;
    let y1 = min(y0 + tile_size, settings.height);

    debug!("Starting image tile ({tile_x}, {tile_y}) -> ({x0}, {y0}) - ({x1}, {y1})");

    let mut rng = RNG::new(tile_idx as u64);
    let spp = settings.samples_per_pixel.max(1);
    let (w, h) = (settings.width as Float, settings.height as Float);

    let mut weights = Vec::with_capacity((x1 - x0) * (y1 - y0));
    let mut blocked = 0;
    for y in y0..y1 {
        for x in x0..x1 {
            let mut sum = 0.0;
            for _ in 0..spp {
                let offset = rng.uniform_2d();
                let p_film = Point2f::new(
                    (x as Float + offset.x) / w * 2.0 - 1.0,
                    1.0 - (y as Float + offset.y) / h * 2.0,
                );
                let sample = CameraSample::new(p_film, rng.uniform_2d());

                let ray = camera.generate_ray(&sample);
                trace!("{sample} -> {ray}");
                if ray.is_blocked() {
                    blocked += 1;
                }
                sum += ray.weight;
            }
            weights.push(sum / spp as Float);
        }
    }

    Tile {
        x0,
        y0,
        x1,
        y1,
        weights,
        blocked,
    }
}

/// Copy a rendered tile into the image.
///
/// * `image` - The image.
/// * `width` - Image width in pixels.
/// * `tile`  - The tile.
fn merge_tile(image: &Mutex<Vec<Float>>, width: usize, tile: &Tile) {
    let mut image = image.lock().unwrap_or_else(|e| e.into_inner());
    let tile_width = tile.x1 - tile.x0;
    for (row, y) in (tile.y0..tile.y1).enumerate() {
        let src = &tile.weights[row * tile_width..(row + 1) * tile_width];
        image[y * width + tile.x0..y * width + tile.x1].copy_from_slice(src);
    }
}

/// Returns a progress bar for `count` units of work.
///
/// * `count` - Number of units of work.
fn create_progress_reporter(count: u64) -> ProgressBar {
    let progress = ProgressBar::new(count);
    if let Ok(style) = ProgressStyle::with_template(
        "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}",
    ) {
        progress.set_style(style.progress_chars("#>-"));
    }
    progress
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
