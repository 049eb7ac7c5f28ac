//! Choropleth classification.
//!
//! - [`Palette`]: the closed set of 5-class sequential color schemes.
//! - [`Scale`]: quantize (equal width) or quantile (equal population) binning.
//! - [`classify`]: builds a [`Classification`] (scale, legend colors and break
//!   labels) from one numeric column.

pub mod breaks;
pub mod classification;
pub mod palette;
pub mod scale;

pub use breaks::*;
pub use classification::*;
pub use palette::*;
pub use scale::*;
