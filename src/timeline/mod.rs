//! Timeline axis: pixel/time mapping, filmstrip lookup, and the pointer state
//! machine that drives scrubbing, hover preview and trim editing.

mod controller;
mod frames;
mod geometry;
mod projection;
mod trim;

pub use controller::*;
pub use frames::*;
pub use geometry::*;
pub use projection::*;
pub use trim::*;
