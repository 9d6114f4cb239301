//! Image I/O

use crate::pbrt::*;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use exr::prelude as exrs;
use exr::prelude::*;
use image::*;
use regex::Regex;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::result::Result;
use std::sync::OnceLock;

/// Decoded image data as row-major interleaved floating point channels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PixelBuffer {
    /// Width in pixels.
    pub width: usize,

    /// Height in pixels.
    pub height: usize,

    /// Channels per pixel.
    pub n_channels: usize,

    /// `width * height * n_channels` values, top row first.
    pub pixels: Vec<f32>,
}

impl PixelBuffer {
    /// Creates a new `PixelBuffer`.
    ///
    /// * `width`      - Width of image.
    /// * `height`     - Height of image.
    /// * `n_channels` - Channels per pixel.
    /// * `pixels`     - Interleaved channel data.
    pub fn new(width: usize, height: usize, n_channels: usize, pixels: Vec<f32>) -> Self {
        debug_assert_eq!(width * height * n_channels, pixels.len());
        Self {
            width,
            height,
            n_channels,
            pixels,
        }
    }

    /// Returns the channels of the pixel at the given coordinates.
    ///
    /// * `x` - Column.
    /// * `y` - Row.
    pub fn pixel(&self, x: usize, y: usize) -> &[f32] {
        let offset = (y * self.width + x) * self.n_channels;
        &self.pixels[offset..offset + self.n_channels]
    }
}

/// Read an image. The format is chosen from the file extension: `.exr` and
/// `.pfm` are read as floating point and anything else goes through the
/// 8-bit decoders.
///
/// * `path` - Input file path.
pub fn read_image(path: &str) -> Result<PixelBuffer, String> {
    match get_extension_from_filename(path).as_deref() {
        Some(".exr") => read_exr(path),
        Some(".pfm") => read_pfm(path),
        Some(_extension) => read_8_bit(path),
        None => Err(format!("Can't determine file type from suffix of filename {path}.")),
    }
}

/// Read the RGB channels of the first valid layer of an OpenEXR file.
///
/// * `path` - Input file path.
fn read_exr(path: &str) -> Result<PixelBuffer, String> {
    let reader = exrs::read()
        .no_deep_data()
        .largest_resolution_level()
        .rgba_channels(
            |resolution, _channels| {
                let width = resolution.width();
                let height = resolution.height();
                PixelBuffer::new(width, height, 3, vec![0.0; width * height * 3])
            },
            |img, position, (r, g, b, _a): (f32, f32, f32, f32)| {
                let offset = 3 * (position.y() * img.width + position.x());
                img.pixels[offset..offset + 3].copy_from_slice(&[r, g, b]);
            },
        )
        .first_valid_layer()
        .all_attributes();

    match reader.from_file(path) {
        Ok(image) => {
            let pixels = image.layer_data.channel_data.pixels;
            info!("Read EXR image {path} ({} x {})", pixels.width, pixels.height);
            Ok(pixels)
        }
        Err(err) => Err(format!("Error reading EXR file '{path}': {err}")),
    }
}

// Reads a whitespace delimited header token from a PFM file.
//
// * `reader` - Source.
// * `len`    - Maximum number of bytes to read.
fn read_pfm_word<R: Read>(reader: &mut R, len: usize) -> Result<String, String> {
    let mut s = String::new();

    loop {
        let c = reader.read_u8().map_err(|e| format!("read_pfm_word(): {e}"))? as char;
        if c.is_ascii_whitespace() {
            if s.is_empty() {
                continue;
            }
            return Ok(s);
        }
        if s.len() == len {
            return Err("read_pfm_word(): filled buffer before finding whitespace.".to_string());
        }
        s.push(c);
    }
}

/// Read a PFM (Portable FloatMap) file. Greyscale files have a single
/// channel.
///
/// * `path` - Input file path.
fn read_pfm(path: &str) -> Result<PixelBuffer, String> {
    let file = File::open(path)
        .map_err(|e| format!("read_pfm(): Error reading PFM file '{path}': {e}"))?;
    let file_len = file
        .metadata()
        .map_err(|e| format!("read_pfm(): Error reading PFM file '{path}': {e}"))?
        .len();
    let mut reader = BufReader::new(file);

    // Read either "Pf" or "PF".
    let n_channels = match read_pfm_word(&mut reader, 2)?.as_str() {
        "Pf" => 1,
        "PF" => 3,
        s => return Err(format!("read_pfm(): Invalid PFM type '{s}'")),
    };

    let width = read_pfm_word(&mut reader, 80)?
        .parse::<usize>()
        .map_err(|e| format!("Error parsing PFM width: {e}"))?;
    let height = read_pfm_word(&mut reader, 80)?
        .parse::<usize>()
        .map_err(|e| format!("Error parsing PFM height: {e}"))?;

    // The sign of the scale encodes the endianness.
    let scale = read_pfm_word(&mut reader, 80)?
        .parse::<f32>()
        .map_err(|e| format!("Error parsing PFM scale: {e}"))?;
    let file_little_endian = scale < 0.0;
    let scale = scale.abs();

    // The header must describe no more samples than the file holds.
    let row_len = width
        .checked_mul(n_channels)
        .ok_or_else(|| format!("read_pfm(): PFM width {width} is too large"))?;
    let n_values = row_len
        .checked_mul(height)
        .ok_or_else(|| format!("read_pfm(): PFM size {width} x {height} is too large"))?;
    let n_bytes = n_values.checked_mul(std::mem::size_of::<f32>()).unwrap_or(usize::MAX);
    if n_bytes as u64 > file_len {
        return Err(format!(
            "read_pfm(): PFM size {width} x {height} exceeds file length {file_len}"
        ));
    }

    // Rows are stored bottom to top.
    let mut pixels = vec![0.0_f32; n_values];
    for y in (0..height).rev() {
        for x in 0..row_len {
            let f = if file_little_endian {
                reader.read_f32::<LittleEndian>()
            } else {
                reader.read_f32::<BigEndian>()
            }
            .map_err(|e| format!("Error reading PFM pixel data y={y}, x={x}: {e}"))?;
            pixels[y * row_len + x] = f * scale;
        }
    }

    info!("Read PFM image {path} ({width} x {height} x {n_channels})");

    Ok(PixelBuffer::new(width, height, n_channels, pixels))
}

/// Read an 8-bit image format and convert to linear RGB in [0, 1].
///
/// * `path` - Input file path.
fn read_8_bit(path: &str) -> Result<PixelBuffer, String> {
    let img = match open(path) {
        Ok(i) => i.into_rgb8(),
        Err(err) => return Err(format!("Error reading image '{path}': {err}")),
    };

    let width = img.width() as usize;
    let height = img.height() as usize;
    let pixels: Vec<f32> = img
        .pixels()
        .flat_map(|rgb| rgb.0.map(|c| inverse_gamma_correct(c as Float / 255.0) as f32))
        .collect();

    info!("Read 8-bit image {path} ({width} x {height})");

    Ok(PixelBuffer::new(width, height, 3, pixels))
}

/// Write RGB pixel data to the given path. The format is chosen from the
/// file extension.
///
/// * `path`   - Output file path.
/// * `rgb`    - Floating point RGB pixel data, top row first.
/// * `width`  - Width of image.
/// * `height` - Height of image.
pub fn write_image(path: &str, rgb: &[Float], width: usize, height: usize) -> Result<(), String> {
    if rgb.len() != 3 * width * height {
        return Err(format!(
            "Pixel data for {path} has {} values, expected {}",
            rgb.len(),
            3 * width * height
        ));
    }

    match get_extension_from_filename(path).as_deref() {
        Some(".exr") => write_exr(path, rgb, width, height),
        Some(".tga") => write_8_bit(path, rgb, width, height, ImageFormat::Tga),
        Some(".png") => write_8_bit(path, rgb, width, height, ImageFormat::Png),
        Some(".pfm") => write_pfm(path, rgb, width, height),
        Some(extension) => Err(format!("Extension {extension} is not supported")),
        None => Err(format!("Can't determine file type from suffix of filename {path}")),
    }
}

/// Returns regular expression for extracting the file extension. This will
/// match the last occurrence of a period followed by no periods or slashes.
fn regex_file_ext() -> &'static Regex {
    static DATA: OnceLock<Regex> = OnceLock::new();
    // The pattern is a literal and always compiles.
    DATA.get_or_init(|| Regex::new(r"(\.[^./\\]+)$").unwrap())
}

/// Retrieve the lower-cased extension from a file path, including the
/// leading period.
///
/// * `path` - The file path.
fn get_extension_from_filename(path: &str) -> Option<String> {
    regex_file_ext()
        .captures(path)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// Writes the image in OpenEXR format.
///
/// * `path`   - Output file path.
/// * `rgb`    - Floating point RGB pixel data.
/// * `width`  - Width of image.
/// * `height` - Height of image.
fn write_exr(path: &str, rgb: &[Float], width: usize, height: usize) -> Result<(), String> {
    info!("Writing image {path} with resolution {width}x{height}");

    let size = Vec2(width, height);
    let layer = Layer::new(
        size,
        LayerAttributes::named("weights"),
        Encoding::SMALL_LOSSLESS,
        SpecificChannels::rgb(|pos: Vec2<usize>| {
            let offset = 3 * (pos.1 * width + pos.0);
            (rgb[offset] as f32, rgb[offset + 1] as f32, rgb[offset + 2] as f32)
        }),
    );

    let attributes = ImageAttributes::new(IntegerBounds::from_dimensions(size));
    match Image::empty(attributes).with_layer(layer).write().to_file(path) {
        Ok(()) => Ok(()),
        Err(err) => Err(format!("Error saving output image {path}: {err}")),
    }
}

/// Writes the image in an 8-bit image format.
///
/// * `path`         - Output file path.
/// * `rgb`          - Floating point RGB pixel data.
/// * `width`        - Width of image.
/// * `height`       - Height of image.
/// * `image_format` - Image format.
fn write_8_bit(
    path: &str,
    rgb: &[Float],
    width: usize,
    height: usize,
    image_format: ImageFormat,
) -> Result<(), String> {
    info!("Writing image {path} with resolution {width}x{height}");

    let mut imgbuf = ImageBuffer::new(width as u32, height as u32);
    for (i, pixel) in imgbuf.pixels_mut().enumerate() {
        let offset = 3 * i;
        *pixel = Rgb([
            clamp_byte(rgb[offset]),
            clamp_byte(rgb[offset + 1]),
            clamp_byte(rgb[offset + 2]),
        ]);
    }

    match imgbuf.save_with_format(path, image_format) {
        Ok(()) => Ok(()),
        Err(err) => Err(format!("Error saving output image {path}: {err}.")),
    }
}

/// Writes the image in PFM (Portable FloatMap) format using the native byte
/// order.
///
/// * `path`   - Output file path.
/// * `rgb`    - Floating point RGB pixel data.
/// * `width`  - Width of image.
/// * `height` - Height of image.
fn write_pfm(path: &str, rgb: &[Float], width: usize, height: usize) -> Result<(), String> {
    info!("Writing image {path} with resolution {width}x{height}");

    let file = File::create(path)
        .map_err(|e| format!("write_pfm(): Error writing PFM file '{path}': {e}"))?;
    let mut writer = BufWriter::new(file);

    let big_endian = cfg!(target_endian = "big");
    let scale = if big_endian { 1.0 } else { -1.0 };
    write!(writer, "PF\n{width} {height}\n{scale}\n")
        .map_err(|e| format!("write_pfm(): Error writing PFM header '{path}': {e}"))?;

    // Rows go bottom to top.
    for y in (0..height).rev() {
        for &f in &rgb[3 * y * width..3 * (y + 1) * width] {
            if big_endian {
                writer.write_f32::<BigEndian>(f as f32)
            } else {
                writer.write_f32::<LittleEndian>(f as f32)
            }
            .map_err(|e| format!("write_pfm(): Error writing PFM pixels '{path}': {e}"))?;
        }
    }

    writer
        .flush()
        .map_err(|e| format!("write_pfm(): Error writing PFM file '{path}': {e}"))
}

/// Apply sRGB gamma to a linear value.
///
/// * `v` - Linear value.
#[inline]
fn gamma_correct(v: Float) -> Float {
    if v <= 0.0031308 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Remove sRGB gamma from an encoded value.
///
/// * `v` - Encoded value in [0, 1].
#[inline]
fn inverse_gamma_correct(v: Float) -> Float {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Clamp floating point value to 8-bit range [0, 255].
///
/// * `v` - Value to clamp.
#[inline]
fn clamp_byte(v: Float) -> u8 {
    clamp(255.0 * gamma_correct(v) + 0.5, 0.0, 255.0) as u8
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
