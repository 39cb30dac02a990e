pub mod model;
pub mod port;
pub mod unstructured;

pub use model::{
    AttachedObject, ComplexData, Concept, ConceptDraft, ConceptId, Entry, EntryValue,
    Participants, Record, RecordClassifier, RecordDraft, RecordId, RecordQuery, SubjectId,
};
pub use port::{
    ConceptStore, ConceptStoreError, ConfigError, ConfigurationSource, RecordStore,
    RecordStoreError,
};
pub use unstructured::UnstructuredDataHandler;

use crate::domain::{CodedValue, Content};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Which stored content a handler considers its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Discriminator {
    /// Content is claimed by MIME type.
    ContentType(String),
    /// Content is claimed by its type and format codes.
    Codes {
        type_code: CodedValue,
        format_code: CodedValue,
    },
}

impl Discriminator {
    /// The classification title of this discriminator.
    ///
    /// For the code form only the format code's code is used; the type code
    /// takes no part in the title.
    pub fn title(&self) -> &str {
        match self {
            Discriminator::ContentType(content_type) => content_type,
            Discriminator::Codes { format_code, .. } => format_code.code(),
        }
    }

    /// The title `content` carries for this discriminator form, if any.
    pub fn title_of<'a>(&self, content: &'a Content) -> Option<&'a str> {
        match self {
            Discriminator::ContentType(_) => content.content_type(),
            Discriminator::Codes { .. } => content.format_code().map(CodedValue::code),
        }
    }

    pub fn claims(&self, content: &Content) -> bool {
        self.title_of(content) == Some(self.title())
    }
}

impl fmt::Display for Discriminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discriminator::ContentType(content_type) => write!(f, "content-type {content_type}"),
            Discriminator::Codes {
                type_code,
                format_code,
            } => write!(f, "type {type_code} / format {format_code}"),
        }
    }
}

/// The external collaborators a handler talks to.
#[derive(Clone)]
pub struct HandlerContext {
    pub records: Arc<dyn RecordStore>,
    pub concepts: Arc<dyn ConceptStore>,
    pub config: Arc<dyn ConfigurationSource>,
}

impl HandlerContext {
    pub fn new(
        records: Arc<dyn RecordStore>,
        concepts: Arc<dyn ConceptStore>,
        config: Arc<dyn ConfigurationSource>,
    ) -> Self {
        Self {
            records,
            concepts,
            config,
        }
    }
}

impl fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerContext").finish_non_exhaustive()
    }
}

/// Maps [`Content`] to and from records in a [`RecordStore`].
///
/// "Not found" outcomes are `Ok(None)` or an empty `Vec`, never errors.
pub trait ContentHandler: Send + Sync + fmt::Debug {
    fn discriminator(&self) -> &Discriminator;

    /// Stores `content` in a new record for `subject`. Every call creates a
    /// new record.
    fn save_content(
        &self,
        subject: &SubjectId,
        participants: &Participants,
        classifier: &RecordClassifier,
        content: &Content,
    ) -> Result<RecordId, HandlerError>;

    /// The first content of the record claimed by this handler.
    fn fetch_content(&self, record_id: &RecordId) -> Result<Option<Content>, HandlerError>;

    /// All content claimed by this handler across the subject's records.
    fn query_encounters(
        &self,
        subject: &SubjectId,
        classifiers: &[RecordClassifier],
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Content>, HandlerError>;

    /// [`query_encounters`](Self::query_encounters) over every classifier.
    fn query_all(
        &self,
        subject: &SubjectId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Content>, HandlerError> {
        self.query_encounters(subject, &[], from, to)
    }

    /// A new, independent handler with the same discriminator.
    fn clone_handler(&self) -> Box<dyn ContentHandler>;
}

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("record store error: {0}")]
    Store(#[from] RecordStoreError),
    #[error("concept store error: {0}")]
    Vocabulary(#[from] ConceptStoreError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
