//! Rendering of the current view onto a display surface

pub mod table;
pub mod target;
pub mod terminal;

pub use table::{DisplayCell, DisplayRow, TableRenderer, PLACEHOLDER};
pub use target::{Element, HeadlessRenderTarget, RenderTarget, LOAD_FAILURE_MESSAGE};
pub use terminal::TerminalRenderTarget;
