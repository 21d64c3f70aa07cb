//! Document assembly: canonical record + resolved references -> output slots,
//! the export row, and the rendered Service Agreement.

pub mod export;
pub mod fields;
pub mod output;
pub mod render;

pub use export::*;
pub use fields::*;
pub use output::*;
pub use render::*;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Font loading failed: {0}")]
    Font(String),

    #[error("PDF save failed: {0}")]
    Save(String),

    #[error("Export serialization failed: {0}")]
    Export(String),
}
