//! Sled-backed record and concept stores.

use crate::application_service::content_handler::{
    Concept, ConceptDraft, ConceptId, ConceptStore, ConceptStoreError, Record, RecordDraft,
    RecordId, RecordQuery, RecordStore, RecordStoreError,
};
use sled::Db;
use std::path::Path;

const RECORD_TREE_NAME: &str = "records";
const CONCEPT_TREE_NAME: &str = "concepts";

/// Stores records as JSON under big-endian ids from `Db::generate_id`, so
/// tree order is creation order.
#[derive(Debug, Clone)]
pub struct SledRecordStore {
    db: Db,
}

impl SledRecordStore {
    /// Open or create a sled database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RecordStoreError> {
        let db = sled::open(path.as_ref()).map_err(|e| RecordStoreError::Storage(e.to_string()))?;
        Ok(Self { db })
    }

    /// Share an already opened database, e.g. with a [`SledConceptStore`].
    pub fn with_db(db: Db) -> Self {
        Self { db }
    }

    fn tree(&self) -> Result<sled::Tree, RecordStoreError> {
        self.db
            .open_tree(RECORD_TREE_NAME)
            .map_err(|e| RecordStoreError::Storage(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Record, RecordStoreError> {
        serde_json::from_slice(bytes).map_err(|e| RecordStoreError::Serialization(e.to_string()))
    }
}

impl RecordStore for SledRecordStore {
    fn save_record(&self, draft: RecordDraft) -> Result<RecordId, RecordStoreError> {
        let tree = self.tree()?;
        let key = self
            .db
            .generate_id()
            .map_err(|e| RecordStoreError::Storage(e.to_string()))?;

        let id = RecordId::new(key.to_string());
        let record = Record::from_draft(id.clone(), draft);
        let value = serde_json::to_vec(&record)
            .map_err(|e| RecordStoreError::Serialization(e.to_string()))?;

        tree.insert(key.to_be_bytes(), value)
            .map_err(|e| RecordStoreError::Storage(e.to_string()))?;
        tree.flush()
            .map_err(|e| RecordStoreError::Storage(e.to_string()))?;
        Ok(id)
    }

    fn find_record(&self, id: &RecordId) -> Result<Option<Record>, RecordStoreError> {
        // Ids this store never handed out cannot exist.
        let Ok(key) = id.as_str().parse::<u64>() else {
            return Ok(None);
        };

        let tree = self.tree()?;
        match tree
            .get(key.to_be_bytes())
            .map_err(|e| RecordStoreError::Storage(e.to_string()))?
        {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn find_records(&self, query: &RecordQuery) -> Result<Vec<Record>, RecordStoreError> {
        let tree = self.tree()?;
        let mut records = Vec::new();

        for item in tree.iter() {
            let (key, bytes) = item.map_err(|e| RecordStoreError::Storage(e.to_string()))?;
            let record = match Self::decode(&bytes) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(key = ?key, error = %e, "skipping undecodable record");
                    continue;
                }
            };
            if query.matches(&record) {
                records.push(record);
            }
        }

        Ok(records)
    }
}

/// Stores concepts as JSON keyed by name.
///
/// Creation uses compare-and-swap on the name, so concurrent creators of the
/// same name all receive the concept that won.
#[derive(Debug, Clone)]
pub struct SledConceptStore {
    db: Db,
}

impl SledConceptStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ConceptStoreError> {
        let db = sled::open(path.as_ref()).map_err(|e| ConceptStoreError::Storage(e.to_string()))?;
        Ok(Self { db })
    }

    pub fn with_db(db: Db) -> Self {
        Self { db }
    }

    fn tree(&self) -> Result<sled::Tree, ConceptStoreError> {
        self.db
            .open_tree(CONCEPT_TREE_NAME)
            .map_err(|e| ConceptStoreError::Storage(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Concept, ConceptStoreError> {
        serde_json::from_slice(bytes).map_err(|e| ConceptStoreError::Serialization(e.to_string()))
    }
}

impl ConceptStore for SledConceptStore {
    fn find_concept_by_name(&self, name: &str) -> Result<Option<Concept>, ConceptStoreError> {
        let tree = self.tree()?;
        match tree
            .get(name.as_bytes())
            .map_err(|e| ConceptStoreError::Storage(e.to_string()))?
        {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save_concept(&self, draft: ConceptDraft) -> Result<Concept, ConceptStoreError> {
        let tree = self.tree()?;
        let id = self
            .db
            .generate_id()
            .map_err(|e| ConceptStoreError::Storage(e.to_string()))?;

        let concept = Concept::from_draft(ConceptId::new(id.to_string()), draft);
        let value = serde_json::to_vec(&concept)
            .map_err(|e| ConceptStoreError::Serialization(e.to_string()))?;

        let swapped = tree
            .compare_and_swap(concept.name.as_bytes(), None::<&[u8]>, Some(value))
            .map_err(|e| ConceptStoreError::Storage(e.to_string()))?;

        match swapped {
            Ok(()) => {
                tree.flush()
                    .map_err(|e| ConceptStoreError::Storage(e.to_string()))?;
                Ok(concept)
            }
            Err(conflict) => match conflict.current {
                Some(current) => Self::decode(&current),
                None => Err(ConceptStoreError::Storage(format!(
                    "concept {} vanished during creation",
                    concept.name
                ))),
            },
        }
    }
}
