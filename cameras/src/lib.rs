//! Camera

#[macro_use]
extern crate log;
#[macro_use]
extern crate pest_derive;

mod error;
mod lens;
mod lens_camera;
mod options;
mod parser;
mod thin_lens_camera;

// Re-export
pub use error::*;
pub use lens::*;
pub use lens_camera::*;
pub use options::*;
pub use parser::{parse_lens_file, parse_lens_str};
pub use thin_lens_camera::*;
