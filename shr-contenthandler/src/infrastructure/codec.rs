//! Base64 armoring and deflate-family compression of content payloads.

use crate::domain::{CodecError, CompressionFormat, Content, PayloadCodec, Representation};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use flate2::Compression;
use std::io::{Read, Write};

/// The HL7 ED transforms: TXT passthrough, standard base64, and DF/GZ/ZL
/// compression underneath base64.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPayloadCodec;

impl StandardPayloadCodec {
    fn compress(raw: &[u8], format: CompressionFormat) -> Result<Vec<u8>, CodecError> {
        match format {
            CompressionFormat::Df => {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(raw)?;
                Ok(encoder.finish()?)
            }
            CompressionFormat::Gz => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(raw)?;
                Ok(encoder.finish()?)
            }
            CompressionFormat::Zl => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(raw)?;
                Ok(encoder.finish()?)
            }
            CompressionFormat::Z => Err(CodecError::UnsupportedCompression(format)),
        }
    }

    fn decompress(data: &[u8], format: CompressionFormat) -> Result<Vec<u8>, CodecError> {
        let mut output = Vec::new();
        match format {
            CompressionFormat::Df => {
                DeflateDecoder::new(data).read_to_end(&mut output)?;
            }
            CompressionFormat::Gz => {
                GzDecoder::new(data).read_to_end(&mut output)?;
            }
            CompressionFormat::Zl => {
                ZlibDecoder::new(data).read_to_end(&mut output)?;
            }
            CompressionFormat::Z => return Err(CodecError::UnsupportedCompression(format)),
        }
        Ok(output)
    }

    fn ensure_supported(compression: Option<CompressionFormat>) -> Result<(), CodecError> {
        match compression {
            Some(format) if !format.is_supported() => {
                Err(CodecError::UnsupportedCompression(format))
            }
            _ => Ok(()),
        }
    }
}

impl PayloadCodec for StandardPayloadCodec {
    fn encode(
        &self,
        raw: &[u8],
        representation: Representation,
        compression: Option<CompressionFormat>,
    ) -> Result<Vec<u8>, CodecError> {
        Self::ensure_supported(compression)?;

        match representation {
            Representation::Txt if compression.is_none() => Ok(raw.to_vec()),
            Representation::Txt => Err(CodecError::InvalidRepresentation(
                "compressed payload must be Base64 encoded".into(),
            )),
            Representation::Binary => Err(CodecError::InvalidRepresentation(
                "binary payload must be referenced by URL".into(),
            )),
            Representation::B64 => {
                let bytes = match compression {
                    Some(format) => Self::compress(raw, format)?,
                    None => raw.to_vec(),
                };
                Ok(BASE64_STANDARD.encode(bytes).into_bytes())
            }
        }
    }

    fn decode(&self, content: &Content) -> Result<Vec<u8>, CodecError> {
        Self::ensure_supported(content.compression_format())?;
        if content.payload_is_url() {
            return Err(CodecError::PayloadIsUrl);
        }

        match content.representation() {
            Representation::Txt => Ok(content.payload().to_vec()),
            Representation::Binary => Err(CodecError::InvalidRepresentation(
                "binary payload must be referenced by URL".into(),
            )),
            Representation::B64 => {
                // Armored payloads are often line-wrapped.
                let armored: Vec<u8> = content
                    .payload()
                    .iter()
                    .copied()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect();
                let decoded = BASE64_STANDARD
                    .decode(armored)
                    .map_err(|e| CodecError::InvalidBase64(e.to_string()))?;

                match content.compression_format() {
                    Some(format) => Self::decompress(&decoded, format),
                    None => Ok(decoded),
                }
            }
        }
    }
}
