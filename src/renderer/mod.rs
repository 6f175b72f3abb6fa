//! Rendering module
//!
//! Entities draw themselves onto any canvas-like 2D surface.

pub mod shapes;
pub mod surface;

pub use shapes::{colors, draw_entity};
pub use surface::{DrawCommand, DrawSurface, RecordingSurface, Rgba, css_rgba};
