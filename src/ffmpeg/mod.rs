pub mod backend;
mod commands;
mod probe;
mod progress;
mod sampler;
mod wrapper;

pub use backend::{acquire, FfmpegBackend, FfmpegPaths};
pub use commands::*;
pub use probe::*;
pub use progress::*;
pub use sampler::*;
pub use wrapper::*;
