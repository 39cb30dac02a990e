use super::model::{Concept, ConceptDraft, Record, RecordDraft, RecordId, RecordQuery};

/// The clinical record store that content is persisted into.
pub trait RecordStore: Send + Sync {
    /// Persists a new record and returns the identifier the store assigned.
    fn save_record(&self, draft: RecordDraft) -> Result<RecordId, RecordStoreError>;

    fn find_record(&self, id: &RecordId) -> Result<Option<Record>, RecordStoreError>;

    /// Returns every record matching `query`, in store order.
    fn find_records(&self, query: &RecordQuery) -> Result<Vec<Record>, RecordStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Vocabulary of classification entries (concepts).
///
/// Concurrent `save_concept` calls for the same name are not arbitrated by
/// callers; whether duplicates can appear is up to the implementation.
pub trait ConceptStore: Send + Sync {
    fn find_concept_by_name(&self, name: &str) -> Result<Option<Concept>, ConceptStoreError>;

    fn save_concept(&self, draft: ConceptDraft) -> Result<Concept, ConceptStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ConceptStoreError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Named string settings supplied by the hosting application.
pub trait ConfigurationSource: Send + Sync {
    fn property(&self, name: &str) -> Result<Option<String>, ConfigError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("serialize error: {0}")]
    Serialize(String),
}
