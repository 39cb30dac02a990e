use crate::domain::codec::{CodecError, PayloadCodec};
use crate::domain::coded_value::CodedValue;
use crate::domain::content::{CompressionFormat, Representation};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("invalid representation: {0}")]
    InvalidRepresentation(String),
}

/// An encapsulated data payload.
///
/// Follows the HL7 ED (Encapsulated Data) datatype, extended with a type code
/// and a format code. The format code globally identifies the format of the
/// content (e.g. the IHE format codes used for XDS documents).
///
/// The payload either holds the content itself or, when `payload_is_url` is
/// set, a UTF-8 URL pointing at it. In the latter case every other field
/// describes the referenced data rather than the URL string.
///
/// Two `Content` values are equal when their content ids are equal, whatever
/// their payloads hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ContentBuilder")]
pub struct Content {
    content_id: String,
    payload: Vec<u8>,
    payload_is_url: bool,
    type_code: Option<CodedValue>,
    format_code: Option<CodedValue>,
    content_type: Option<String>,
    encoding: Option<String>,
    representation: Representation,
    compression_format: Option<CompressionFormat>,
    language: Option<String>,
}

impl Content {
    /// Inline text content, e.g. an XML document.
    pub fn text(
        content_id: impl Into<String>,
        payload: impl Into<Vec<u8>>,
        type_code: CodedValue,
        format_code: CodedValue,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            content_id: content_id.into(),
            payload: payload.into(),
            payload_is_url: false,
            type_code: Some(type_code),
            format_code: Some(format_code),
            content_type: Some(content_type.into()),
            encoding: None,
            representation: Representation::Txt,
            compression_format: None,
            language: None,
        }
    }

    pub fn builder(content_id: impl Into<String>, payload: impl Into<Vec<u8>>) -> ContentBuilder {
        ContentBuilder::new(content_id, payload)
    }

    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn payload_is_url(&self) -> bool {
        self.payload_is_url
    }

    /// The referenced location, if the payload is a URL and valid UTF-8.
    pub fn payload_as_url(&self) -> Option<&str> {
        if !self.payload_is_url {
            return None;
        }
        std::str::from_utf8(&self.payload).ok()
    }

    pub fn type_code(&self) -> Option<&CodedValue> {
        self.type_code.as_ref()
    }

    pub fn format_code(&self) -> Option<&CodedValue> {
        self.format_code.as_ref()
    }

    /// MIME type of the content.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Character set; only meaningful for text content.
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    pub fn representation(&self) -> Representation {
        self.representation
    }

    pub fn is_compressed(&self) -> bool {
        self.compression_format.is_some()
    }

    pub fn compression_format(&self) -> Option<CompressionFormat> {
        self.compression_format
    }

    /// Locale tag of the content language, e.g. `en` or `fr-CA`.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// The payload with armoring and compression undone.
    pub fn raw_data<C: PayloadCodec + ?Sized>(&self, codec: &C) -> Result<Vec<u8>, CodecError> {
        codec.decode(self)
    }
}

impl PartialEq for Content {
    fn eq(&self, other: &Self) -> bool {
        self.content_id == other.content_id
    }
}

impl Eq for Content {}

impl PartialOrd for Content {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Content {
    fn cmp(&self, other: &Self) -> Ordering {
        self.content_id.cmp(&other.content_id)
    }
}

impl Hash for Content {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.content_id.hash(state);
    }
}

/// Assembles a [`Content`], checking the representation rules on `build`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentBuilder {
    content_id: String,
    payload: Vec<u8>,
    #[serde(default)]
    payload_is_url: bool,
    type_code: Option<CodedValue>,
    format_code: Option<CodedValue>,
    content_type: Option<String>,
    encoding: Option<String>,
    representation: Representation,
    compression_format: Option<CompressionFormat>,
    language: Option<String>,
}

impl ContentBuilder {
    pub fn new(content_id: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            content_id: content_id.into(),
            payload: payload.into(),
            payload_is_url: false,
            type_code: None,
            format_code: None,
            content_type: None,
            encoding: None,
            representation: Representation::Txt,
            compression_format: None,
            language: None,
        }
    }

    pub fn with_payload_is_url(mut self, payload_is_url: bool) -> Self {
        self.payload_is_url = payload_is_url;
        self
    }

    pub fn with_type_code(mut self, type_code: CodedValue) -> Self {
        self.type_code = Some(type_code);
        self
    }

    pub fn with_format_code(mut self, format_code: CodedValue) -> Self {
        self.format_code = Some(format_code);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    pub fn with_representation(mut self, representation: Representation) -> Self {
        self.representation = representation;
        self
    }

    pub fn with_compression_format(mut self, compression_format: CompressionFormat) -> Self {
        self.compression_format = Some(compression_format);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn build(self) -> Result<Content, ContentError> {
        if self.compression_format.is_some()
            && !self.payload_is_url
            && self.representation != Representation::B64
        {
            return Err(ContentError::InvalidRepresentation(
                "compressed payload must be Base64 encoded".into(),
            ));
        }
        if !self.payload_is_url && self.representation == Representation::Binary {
            return Err(ContentError::InvalidRepresentation(
                "binary payload must be referenced by URL".into(),
            ));
        }

        Ok(Content {
            content_id: self.content_id,
            payload: self.payload,
            payload_is_url: self.payload_is_url,
            type_code: self.type_code,
            format_code: self.format_code,
            content_type: self.content_type,
            encoding: self.encoding,
            representation: self.representation,
            compression_format: self.compression_format,
            language: self.language,
        })
    }
}

impl TryFrom<ContentBuilder> for Content {
    type Error = ContentError;

    fn try_from(builder: ContentBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}
