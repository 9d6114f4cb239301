//! Bokeh Image Distribution.

use crate::geometry::*;
use crate::image_io::*;
use crate::pbrt::*;
use ordered_float::OrderedFloat;
use std::mem::size_of;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Errors raised while building a `BokehDistribution`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BokehError {
    /// Image sampling was requested without an image path.
    #[error("bokeh image sampling is enabled but no image path was given")]
    MissingPath,

    /// The image could not be read or decoded.
    #[error("unable to read bokeh image: {0}")]
    Unreadable(String),

    /// The image has no pixels or fewer than 3 channels.
    #[error("invalid bokeh image {width}x{height} with {n_channels} channels")]
    InvalidImage {
        width: usize,
        height: usize,
        n_channels: usize,
    },

    /// The image luminance sums to zero (or is not finite).
    #[error("bokeh image has no usable luminance (total {0})")]
    ZeroLuminance(Float),
}

/// Importance sampler for lens positions driven by the luminance of a bokeh
/// image. Rows are picked from a marginal CDF and columns from the CDF of the
/// chosen row. Both orderings put the brightest entries first.
///
/// The default value is an invalid distribution. Sampling it returns the
/// lens centre.
#[derive(Debug, Default)]
pub struct BokehDistribution {
    /// Image width.
    width: usize,

    /// Image height.
    height: usize,

    /// Channels per pixel in the source image.
    n_channels: usize,

    /// Cumulative row masses in descending order of mass.
    cdf_row: Vec<Float>,

    /// Row index for each entry of `cdf_row`.
    row_indices: Vec<usize>,

    /// Cumulative column values per row (`width` entries per row) in
    /// descending order of value within that row.
    cdf_column: Vec<Float>,

    /// Column index within its row for each entry of `cdf_column`.
    column_indices: Vec<usize>,

    /// Set once the invalid-sample warning has been issued.
    warned: AtomicBool,
}

impl BokehDistribution {
    /// Load an image and build the distribution from it.
    ///
    /// * `path` - Path to the bokeh image.
    pub fn read(path: &str) -> Result<Self, BokehError> {
        if path.is_empty() {
            return Err(BokehError::MissingPath);
        }
        let image = read_image(path).map_err(BokehError::Unreadable)?;
        Self::new(&image)
    }

    /// Build the distribution from decoded pixels. Only the first three
    /// channels contribute.
    ///
    /// * `image` - Decoded image.
    pub fn new(image: &PixelBuffer) -> Result<Self, BokehError> {
        let PixelBuffer {
            width,
            height,
            n_channels,
            ..
        } = *image;

        if width * height * n_channels == 0
            || n_channels < 3
            || image.pixels.len() < width * height * n_channels
        {
            return Err(BokehError::InvalidImage {
                width,
                height,
                n_channels,
            });
        }

        info!("Bokeh image {width} x {height} x {n_channels}, {} pixels", width * height);

        // Luminance per pixel.
        let luminance: Vec<Float> = image
            .pixels
            .chunks_exact(n_channels)
            .take(width * height)
            .map(|p| 0.3 * p[0] as Float + 0.59 * p[1] as Float + 0.11 * p[2] as Float)
            .collect();

        let total: Float = luminance.iter().sum();
        trace!("Bokeh total luminance {total}");
        if !(total.is_finite() && total > 0.0) {
            return Err(BokehError::ZeroLuminance(total));
        }

        // Normalize so the image sums to 1 and total up each row.
        let inv_total = 1.0 / total;
        let normalized: Vec<Float> = luminance.iter().map(|l| l * inv_total).collect();
        let row_mass: Vec<Float> = normalized
            .chunks_exact(width)
            .map(|row| row.iter().sum())
            .collect();

        let row_indices = descending_order(&row_mass);
        let cdf_row = cumulative(row_indices.iter().map(|&r| row_mass[r]));
        for (r, c) in row_indices.iter().zip(cdf_row.iter()) {
            trace!("CDF row [{r}]: {c}");
        }

        // Column CDF of each row, conditioned on that row.
        let mut cdf_column = Vec::with_capacity(width * height);
        let mut column_indices = Vec::with_capacity(width * height);
        for (r, row) in normalized.chunks_exact(width).enumerate() {
            let conditional: Vec<Float> = row
                .iter()
                .map(|&v| if v != 0.0 && row_mass[r] != 0.0 { v / row_mass[r] } else { 0.0 })
                .collect();

            let order = descending_order(&conditional);
            cdf_column.extend(cumulative(order.iter().map(|&c| conditional[c])));
            column_indices.extend(order);
        }

        let distribution = Self {
            width,
            height,
            n_channels,
            cdf_row,
            row_indices,
            cdf_column,
            column_indices,
            warned: AtomicBool::new(false),
        };

        debug!(
            "Bokeh distribution uses {} bytes",
            distribution.memory_bytes()
        );

        Ok(distribution)
    }

    /// Returns true if the distribution was built from a usable image.
    pub fn is_valid(&self) -> bool {
        self.width * self.height * self.n_channels > 0
            && self.n_channels >= 3
            && self.cdf_row.len() == self.height
            && self.cdf_column.len() == self.width * self.height
    }

    /// Returns the image dimensions as `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns the number of bytes held by the derived arrays.
    pub fn memory_bytes(&self) -> usize {
        (self.cdf_row.capacity() + self.cdf_column.capacity()) * size_of::<Float>()
            + (self.row_indices.capacity() + self.column_indices.capacity()) * size_of::<usize>()
    }

    /// Release all derived arrays at once. The distribution becomes invalid.
    pub fn invalidate(&mut self) {
        self.width = 0;
        self.height = 0;
        self.n_channels = 0;
        self.cdf_row = Vec::new();
        self.row_indices = Vec::new();
        self.cdf_column = Vec::new();
        self.column_indices = Vec::new();
    }

    /// Sample a lens offset in approximately [-1, 1]^2 proportional to image
    /// luminance. The image centre maps to (0, 0), columns map to x and rows
    /// to -y so the image appears upright on the lens.
    ///
    /// * `u` - Random sample in [0, 1)^2; `u.x` picks the row and `u.y` the
    ///         column.
    pub fn sample(&self, u: &Point2f) -> Point2f {
        if !self.is_valid() {
            if !self.warned.swap(true, Ordering::Relaxed) {
                warn!("Invalid bokeh image data, sampling the lens centre instead.");
            }
            return Point2f::zero();
        }

        // Pick the row.
        let r = min(upper_bound(&self.cdf_row, u.x), self.height - 1);
        let row = self.row_indices[r];

        // Pick the column within that row.
        let start = row * self.width;
        let row_cdf = &self.cdf_column[start..start + self.width];
        let c = min(upper_bound(row_cdf, u.y), self.width - 1);
        let column = self.column_indices[start + c];

        // Recentre so the middle of the image is the origin.
        let x = column as Float - (self.width as Float - 1.0) / 2.0;
        let y = row as Float - (self.height as Float - 1.0) / 2.0;

        Point2f::new(x / self.width as Float * 2.0, -y / self.height as Float * 2.0)
    }
}

/// Returns the indices of `values` ordered by descending value. Ties keep
/// their original order.
///
/// * `values` - Values to order.
fn descending_order(values: &[Float]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by_key(|&i| std::cmp::Reverse(OrderedFloat(values[i])));
    indices
}

/// Returns the running sum of the values rescaled so that the last entry is
/// exactly 1. A sequence summing to 0 is returned unscaled.
///
/// * `values` - Values to accumulate.
fn cumulative<I: Iterator<Item = Float>>(values: I) -> Vec<Float> {
    let mut sum = 0.0;
    let mut cdf: Vec<Float> = values
        .map(|v| {
            sum += v;
            sum
        })
        .collect();

    if sum > 0.0 {
        for c in cdf.iter_mut() {
            *c /= sum;
        }
    }
    cdf
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
