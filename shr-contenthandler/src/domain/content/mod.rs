pub mod content;
pub mod representation;

pub use content::{Content, ContentBuilder, ContentError};
pub use representation::{CompressionFormat, Representation};
