mod main_window;
mod preview;
mod timeline_widget;

pub use main_window::*;
pub use preview::*;
pub use timeline_widget::*;
