use crate::application_service::content_handler::{
    Concept, ConceptDraft, ConceptId, ConceptStore, ConceptStoreError, Record, RecordDraft,
    RecordId, RecordQuery, RecordStore, RecordStoreError,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// In-process RecordStore keeping records in insertion order. Nothing is
/// persisted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    inner: Arc<Mutex<Vec<Record>>>,
}

impl InMemoryRecordStore {
    pub fn len(&self) -> usize {
        self.inner.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for InMemoryRecordStore {
    fn save_record(&self, draft: RecordDraft) -> Result<RecordId, RecordStoreError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| RecordStoreError::Storage(e.to_string()))?;

        let id = RecordId::new(Uuid::new_v4().to_string());
        guard.push(Record::from_draft(id.clone(), draft));
        Ok(id)
    }

    fn find_record(&self, id: &RecordId) -> Result<Option<Record>, RecordStoreError> {
        let guard = self
            .inner
            .lock()
            .map_err(|e| RecordStoreError::Storage(e.to_string()))?;

        Ok(guard.iter().find(|record| &record.id == id).cloned())
    }

    fn find_records(&self, query: &RecordQuery) -> Result<Vec<Record>, RecordStoreError> {
        let guard = self
            .inner
            .lock()
            .map_err(|e| RecordStoreError::Storage(e.to_string()))?;

        Ok(guard
            .iter()
            .filter(|record| query.matches(record))
            .cloned()
            .collect())
    }
}

/// In-process ConceptStore.
///
/// `save_concept` always appends, so two callers racing to create the same
/// name both succeed and leave duplicates behind; lookups return the first.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConceptStore {
    inner: Arc<Mutex<Vec<Concept>>>,
}

impl InMemoryConceptStore {
    pub fn len(&self) -> usize {
        self.inner.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConceptStore for InMemoryConceptStore {
    fn find_concept_by_name(&self, name: &str) -> Result<Option<Concept>, ConceptStoreError> {
        let guard = self
            .inner
            .lock()
            .map_err(|e| ConceptStoreError::Storage(e.to_string()))?;

        Ok(guard.iter().find(|concept| concept.name == name).cloned())
    }

    fn save_concept(&self, draft: ConceptDraft) -> Result<Concept, ConceptStoreError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| ConceptStoreError::Storage(e.to_string()))?;

        let concept = Concept::from_draft(ConceptId::new(Uuid::new_v4().to_string()), draft);
        guard.push(concept.clone());
        Ok(concept)
    }
}
