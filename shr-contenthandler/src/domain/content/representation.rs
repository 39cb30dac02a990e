use serde::{Deserialize, Serialize};
use std::fmt;

/// How the payload bytes of a [`Content`](super::Content) are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Representation {
    /// Plain text.
    Txt,
    /// Base64 armored bytes.
    B64,
    /// Binary data. Only valid when the payload is a URL reference.
    Binary,
}

impl Representation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Representation::Txt => "TXT",
            Representation::B64 => "B64",
            Representation::Binary => "BINARY",
        }
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compression algorithm applied to a payload before it was armored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompressionFormat {
    /// Deflate (RFC 1951)
    Df,
    /// GZip (RFC 1952)
    Gz,
    /// ZLib (RFC 1950)
    Zl,
    /// Unix compress. Recognised so stored metadata can name it, never
    /// encoded or decoded.
    Z,
}

impl CompressionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionFormat::Df => "DF",
            CompressionFormat::Gz => "GZ",
            CompressionFormat::Zl => "ZL",
            CompressionFormat::Z => "Z",
        }
    }

    /// Whether payloads in this format can be transformed at runtime.
    pub fn is_supported(&self) -> bool {
        !matches!(self, CompressionFormat::Z)
    }
}

impl fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
