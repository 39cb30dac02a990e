use crate::domain::content::{CompressionFormat, Content, Representation};

/// Transforms raw bytes to and from the representation a [`Content`]
/// declares.
///
/// Implementations must reject [`CompressionFormat::Z`] with
/// [`CodecError::UnsupportedCompression`], both when encoding and decoding.
pub trait PayloadCodec {
    /// Compresses and armors `raw` so it can become the payload of a
    /// `Content` with the given representation and compression.
    fn encode(
        &self,
        raw: &[u8],
        representation: Representation,
        compression: Option<CompressionFormat>,
    ) -> Result<Vec<u8>, CodecError>;

    /// Returns the raw bytes carried by an inline `Content` payload.
    fn decode(&self, content: &Content) -> Result<Vec<u8>, CodecError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("unsupported compression format: {0}")]
    UnsupportedCompression(CompressionFormat),
    #[error("invalid representation: {0}")]
    InvalidRepresentation(String),
    #[error("payload is a URL reference and has no local data")]
    PayloadIsUrl,
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
    #[error("compression error: {0}")]
    Io(#[from] std::io::Error),
}
