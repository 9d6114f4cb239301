//! Camera Errors

use lens_core::sampling::BokehError;
use thiserror::Error;

/// Errors raised while loading or calibrating a lens prescription.
#[derive(Error, Debug)]
pub enum LensError {
    /// The lens file could not be read.
    #[error("unable to read lens file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The lens file does not follow the tabular grammar.
    #[error("unable to parse lens file: {0}")]
    Parse(String),

    /// Fields were separated by something other than a single tab.
    #[error("line {line}: lens data fields must be separated by a single tab")]
    Separator { line: usize },

    /// A data line did not hold exactly four fields.
    #[error("line {line}: expected 4 fields, found {found}")]
    FieldCount { line: usize, found: usize },

    /// A field is not a number.
    #[error("line {line}: malformed number '{token}'")]
    MalformedNumber { line: usize, token: String },

    /// The lens file holds no surfaces.
    #[error("lens file '{0}' contains no surfaces")]
    Empty(String),

    /// No surface of the prescription is an aperture stop.
    #[error("lens prescription has no aperture stop")]
    NoApertureStop,

    /// The image distance could not be computed.
    #[error("unable to compute image distance: {0}")]
    DegenerateCalibration(String),
}

/// Errors raised while configuring a camera.
#[derive(Error, Debug)]
pub enum CameraError {
    /// Lens prescription failure.
    #[error(transparent)]
    Lens(#[from] LensError),

    /// Bokeh image failure.
    #[error(transparent)]
    Bokeh(#[from] BokehError),
}
