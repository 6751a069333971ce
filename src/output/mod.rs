//! Output module
//!
//! Status table rendering, in-place terminal redraw and report formats.

mod formatter;
mod screen;

pub use formatter::{render_table, DisplayMode, OutputFormat, ResultFormatter};
pub use screen::ScreenWriter;
