//! # GeoDelta Colormap
//!
//! Color mapping and change-map rendering for GeoDelta.
//!
//! Provides diverging, magnitude and grayscale color schemes on a generic
//! multi-stop interpolation engine, side-by-side panel composites, and
//! [`save_change_map`] which writes the three-panel PNG for a
//! [`ChangeResult`](geodelta_algorithms::change::ChangeResult).
//!
//! Change maps carry no text: panel titles and color-scale ranges are not
//! drawn into the PNG. They are fixed per panel (see [`change_panels`]) and
//! logged at debug level by [`save_change_map`].
//!
//! ## Usage
//!
//! ```ignore
//! use geodelta_colormap::save_change_map;
//!
//! for result in &changes {
//!     save_change_map(result, Path::new("results"))?;
//! }
//! ```

mod change;
mod composite;
mod error;
mod render;
mod scheme;

pub use change::{change_map_name, change_panels, save_change_map, DIFFERENCE_DISPLAY_LIMIT};
pub use composite::{panel_size, render_composite, resample_nearest, Panel, MAX_PANEL_SIDE};
pub use error::{RenderError, Result};
pub use render::{field_to_rgba, ColormapParams};
pub use scheme::{evaluate, ColorScheme, ColorStop, Rgb};
