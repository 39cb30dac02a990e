pub mod codec;
pub mod coded_value;
pub mod content;

pub use codec::{CodecError, PayloadCodec};
pub use coded_value::CodedValue;
pub use content::{CompressionFormat, Content, ContentBuilder, ContentError, Representation};
