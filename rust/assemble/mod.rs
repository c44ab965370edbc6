//! Writers for container formats built in-process.

pub mod pdf;
pub mod pptx;

pub use pdf::write_image_pdf;
pub use pptx::SlideDeck;
