//! Renders the road network of an OpenStreetMap XML export as an SVG drawing, styling each
//! road by importance.
//!
//! The pipeline runs parse → classify → project/bound → style → emit, see [`convert::render`].

pub mod bounds;
pub mod config;
pub mod convert;
pub mod data;
pub mod errors;
pub mod etl;
pub mod gradient;
pub mod projection;

pub use config::{GradientPreset, RenderConfig};
pub use convert::{convert_reader, convert_str, render, Conversion, ConversionReport};
pub use errors::{Error, ErrorKind, Result};
pub use gradient::Rgb;
