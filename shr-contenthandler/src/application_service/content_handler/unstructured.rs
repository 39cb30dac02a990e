use super::model::{
    AttachedObject, ComplexData, Concept, ConceptDraft, Entry, EntryValue, Participants, Record,
    RecordClassifier, RecordDraft, RecordId, RecordQuery, SubjectId,
};
use super::{ContentHandler, Discriminator, HandlerContext, HandlerError};
use crate::domain::{CodedValue, Content};
use chrono::{DateTime, Utc};

pub const UNSTRUCTURED_ATTACHMENT_CONCEPT_BASE_NAME: &str = "Unstructured Attachment";
pub const UNSTRUCTURED_DATA_HANDLER_KEY_PROPERTY: &str =
    "shr.contenthandler.unstructureddatahandler.key";

const CONCEPT_DESCRIPTION: &str = "Represents a generic unstructured data attachment";
const CONCEPT_DATATYPE: &str = "Complex";
const CONCEPT_CLASS: &str = "Misc";

/// Stores content as an opaque attachment ("blob") on a new record.
///
/// Each saved content becomes one complex entry classified under an
/// `Unstructured Attachment (<title>)` concept. Fetching and querying scan
/// complex entries under such concepts and keep the content whose title
/// matches this handler's.
#[derive(Debug, Clone)]
pub struct UnstructuredDataHandler {
    discriminator: Discriminator,
    context: HandlerContext,
}

impl UnstructuredDataHandler {
    /// A handler that claims content by MIME type.
    pub fn for_content_type(content_type: impl Into<String>, context: HandlerContext) -> Self {
        Self {
            discriminator: Discriminator::ContentType(content_type.into()),
            context,
        }
    }

    /// A handler that claims content by type and format code.
    pub fn for_codes(
        type_code: CodedValue,
        format_code: CodedValue,
        context: HandlerContext,
    ) -> Self {
        Self {
            discriminator: Discriminator::Codes {
                type_code,
                format_code,
            },
            context,
        }
    }

    pub fn with_discriminator(discriminator: Discriminator, context: HandlerContext) -> Self {
        Self {
            discriminator,
            context,
        }
    }

    /// Title used to name the attachment and to recognise it on the way back.
    pub fn title(&self) -> &str {
        self.discriminator.title()
    }

    pub fn concept_name(&self) -> String {
        format!("{} ({})", UNSTRUCTURED_ATTACHMENT_CONCEPT_BASE_NAME, self.title())
    }

    fn unstructured_attachment_concept(&self) -> Result<Concept, HandlerError> {
        let name = self.concept_name();
        if let Some(concept) = self.context.concepts.find_concept_by_name(&name)? {
            return Ok(concept);
        }

        let handler = self
            .context
            .config
            .property(UNSTRUCTURED_DATA_HANDLER_KEY_PROPERTY)?;
        if handler.is_none() {
            tracing::warn!(
                property = UNSTRUCTURED_DATA_HANDLER_KEY_PROPERTY,
                "no complex data handler key configured"
            );
        }

        let concept = self.context.concepts.save_concept(ConceptDraft {
            name,
            description: CONCEPT_DESCRIPTION.to_string(),
            datatype: CONCEPT_DATATYPE.to_string(),
            concept_class: CONCEPT_CLASS.to_string(),
            handler,
        })?;
        tracing::info!(
            concept_id = %concept.id,
            concept = %concept.name,
            "created unstructured attachment concept"
        );
        Ok(concept)
    }

    fn build_record(
        &self,
        subject: &SubjectId,
        participants: &Participants,
        classifier: &RecordClassifier,
        content: &Content,
    ) -> Result<RecordDraft, HandlerError> {
        let concept = self.unstructured_attachment_concept()?;
        let now = Utc::now();
        let entry = Entry {
            concept_name: concept.name,
            observed_at: now,
            value: EntryValue::Complex(ComplexData::new(
                self.title(),
                Some(AttachedObject::Content(content.clone())),
            )),
        };

        Ok(RecordDraft {
            subject: subject.clone(),
            classifier: classifier.clone(),
            occurred_at: now,
            participants: participants.clone(),
            entries: vec![entry],
        })
    }

    fn collect_contents(&self, record: &Record, dst: &mut Vec<Content>) {
        for (index, entry) in record.entries.iter().enumerate() {
            let Some(complex) = entry.complex_data() else {
                continue;
            };
            if !is_unstructured_attachment(&entry.concept_name) {
                continue;
            }

            let content = match &complex.data {
                Some(AttachedObject::Content(content)) => content,
                other => {
                    tracing::warn!(
                        record_id = %record.id,
                        entry = index,
                        found = other.as_ref().map_or("nothing", AttachedObject::kind),
                        "unprocessable content found in unstructured data entry"
                    );
                    continue;
                }
            };

            if self.discriminator.claims(content) {
                dst.push(content.clone());
            } else {
                tracing::debug!(
                    record_id = %record.id,
                    entry = index,
                    title = self.title(),
                    "skipping attachment claimed by another handler"
                );
            }
        }
    }
}

fn is_unstructured_attachment(concept_name: &str) -> bool {
    concept_name.starts_with(UNSTRUCTURED_ATTACHMENT_CONCEPT_BASE_NAME)
}

impl ContentHandler for UnstructuredDataHandler {
    fn discriminator(&self) -> &Discriminator {
        &self.discriminator
    }

    fn save_content(
        &self,
        subject: &SubjectId,
        participants: &Participants,
        classifier: &RecordClassifier,
        content: &Content,
    ) -> Result<RecordId, HandlerError> {
        let draft = self.build_record(subject, participants, classifier, content)?;
        let record_id = self.context.records.save_record(draft)?;
        tracing::debug!(
            record_id = %record_id,
            content_id = content.content_id(),
            "saved unstructured content"
        );
        Ok(record_id)
    }

    fn fetch_content(&self, record_id: &RecordId) -> Result<Option<Content>, HandlerError> {
        let Some(record) = self.context.records.find_record(record_id)? else {
            return Ok(None);
        };

        let mut res = Vec::new();
        self.collect_contents(&record, &mut res);
        Ok(res.into_iter().next())
    }

    fn query_encounters(
        &self,
        subject: &SubjectId,
        classifiers: &[RecordClassifier],
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Content>, HandlerError> {
        let query = RecordQuery {
            subject: subject.clone(),
            classifiers: classifiers.to_vec(),
            from,
            to,
        };
        let records = self.context.records.find_records(&query)?;

        let mut res = Vec::with_capacity(records.len());
        for record in &records {
            self.collect_contents(record, &mut res);
        }
        Ok(res)
    }

    fn clone_handler(&self) -> Box<dyn ContentHandler> {
        let handler = match &self.discriminator {
            Discriminator::ContentType(content_type) => {
                Self::for_content_type(content_type.clone(), self.context.clone())
            }
            Discriminator::Codes {
                type_code,
                format_code,
            } => Self::for_codes(type_code.clone(), format_code.clone(), self.context.clone()),
        };
        Box::new(handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_service::content_handler::port::{
        ConceptStore, RecordStore, RecordStoreError,
    };
    use crate::infrastructure::config::PropertiesConfig;
    use crate::infrastructure::repository::{InMemoryConceptStore, InMemoryRecordStore};
    use std::sync::Arc;

    struct Fixture {
        records: InMemoryRecordStore,
        concepts: InMemoryConceptStore,
        context: HandlerContext,
    }

    fn fixture() -> Fixture {
        let records = InMemoryRecordStore::default();
        let concepts = InMemoryConceptStore::default();
        let config = PropertiesConfig::default()
            .with_property(UNSTRUCTURED_DATA_HANDLER_KEY_PROPERTY, "UnstructuredDataHandler");
        let context = HandlerContext::new(
            Arc::new(records.clone()),
            Arc::new(concepts.clone()),
            Arc::new(config),
        );
        Fixture {
            records,
            concepts,
            context,
        }
    }

    fn content(id: &str, content_type: &str) -> Content {
        Content::text(
            id,
            format!("payload of {id}"),
            CodedValue::new("LOINC", "34117-2"),
            CodedValue::new("IHE", "urn:ihe:pcc:xphr:2007"),
            content_type,
        )
    }

    fn subject() -> SubjectId {
        SubjectId::new("patient-1")
    }

    fn classifier() -> RecordClassifier {
        RecordClassifier::new("Consultation")
    }

    fn save(handler: &UnstructuredDataHandler, content: &Content) -> RecordId {
        save_as(handler, &subject(), &classifier(), content)
    }

    fn save_as(
        handler: &UnstructuredDataHandler,
        subject: &SubjectId,
        classifier: &RecordClassifier,
        content: &Content,
    ) -> RecordId {
        handler
            .save_content(subject, &Participants::new(), classifier, content)
            .unwrap()
    }

    fn record_with_entries(f: &Fixture, entries: Vec<Entry>) -> RecordId {
        f.records
            .save_record(RecordDraft {
                subject: subject(),
                classifier: classifier(),
                occurred_at: Utc::now(),
                participants: Participants::new(),
                entries,
            })
            .unwrap()
    }

    fn complex_entry(concept_name: &str, data: Option<AttachedObject>) -> Entry {
        Entry {
            concept_name: concept_name.to_string(),
            observed_at: Utc::now(),
            value: EntryValue::Complex(ComplexData::new("title", data)),
        }
    }

    fn attached_content(concept_name: &str, content: Content) -> Entry {
        complex_entry(concept_name, Some(AttachedObject::Content(content)))
    }

    #[test]
    fn test_save_creates_record_with_complex_entry() {
        let f = fixture();
        let handler = UnstructuredDataHandler::for_content_type("text/plain", f.context.clone());
        let participants = Participants::new().with("clinician", "provider-7");

        let before = Utc::now();
        let record_id = handler
            .save_content(&subject(), &participants, &classifier(), &content("c1", "text/plain"))
            .unwrap();

        let record = f.records.find_record(&record_id).unwrap().unwrap();
        assert_eq!(record.subject, subject());
        assert_eq!(record.classifier, classifier());
        assert_eq!(record.participants, participants);
        assert!(record.occurred_at >= before);
        assert_eq!(record.entries.len(), 1);

        let entry = &record.entries[0];
        assert_eq!(entry.concept_name, "Unstructured Attachment (text/plain)");
        assert_eq!(entry.observed_at, record.occurred_at);
        let complex = entry.complex_data().unwrap();
        assert_eq!(complex.title, "text/plain");
        assert_eq!(
            complex.data.as_ref().and_then(AttachedObject::as_content).map(Content::content_id),
            Some("c1")
        );
    }

    #[test]
    fn test_save_is_not_idempotent() {
        let f = fixture();
        let handler = UnstructuredDataHandler::for_content_type("text/plain", f.context.clone());
        let c = content("c1", "text/plain");

        let first = save(&handler, &c);
        let second = save(&handler, &c);

        assert_ne!(first, second);
        assert_eq!(f.records.len(), 2);
    }

    #[test]
    fn test_concept_created_once_with_configured_handler_key() {
        let f = fixture();
        let handler = UnstructuredDataHandler::for_content_type("text/plain", f.context.clone());
        let c = content("c1", "text/plain");

        save(&handler, &c);
        save(&handler, &c);

        assert_eq!(f.concepts.len(), 1);
        let concept = f
            .concepts
            .find_concept_by_name("Unstructured Attachment (text/plain)")
            .unwrap()
            .unwrap();
        assert_eq!(concept.description, CONCEPT_DESCRIPTION);
        assert_eq!(concept.datatype, "Complex");
        assert_eq!(concept.concept_class, "Misc");
        assert_eq!(concept.handler.as_deref(), Some("UnstructuredDataHandler"));
    }

    #[test]
    fn test_existing_concept_is_reused() {
        let f = fixture();
        let existing = f
            .concepts
            .save_concept(ConceptDraft {
                name: "Unstructured Attachment (text/plain)".into(),
                description: "pre-existing".into(),
                datatype: "Complex".into(),
                concept_class: "Misc".into(),
                handler: None,
            })
            .unwrap();
        let handler = UnstructuredDataHandler::for_content_type("text/plain", f.context.clone());

        let record_id = save(&handler, &content("c1", "text/plain"));

        assert_eq!(f.concepts.len(), 1);
        let record = f.records.find_record(&record_id).unwrap().unwrap();
        assert_eq!(record.entries[0].concept_name, existing.name);
    }

    #[test]
    fn test_missing_handler_key_creates_concept_without_handler() {
        let records = InMemoryRecordStore::default();
        let concepts = InMemoryConceptStore::default();
        let context = HandlerContext::new(
            Arc::new(records),
            Arc::new(concepts.clone()),
            Arc::new(PropertiesConfig::default()),
        );
        let handler = UnstructuredDataHandler::for_content_type("text/plain", context);

        save(&handler, &content("c1", "text/plain"));

        let concept = concepts
            .find_concept_by_name("Unstructured Attachment (text/plain)")
            .unwrap()
            .unwrap();
        assert_eq!(concept.handler, None);
    }

    #[test]
    fn test_fetch_returns_saved_content() {
        let f = fixture();
        let handler = UnstructuredDataHandler::for_content_type("text/plain", f.context.clone());
        let c = content("c1", "text/plain");
        let record_id = save(&handler, &c);

        let fetched = handler.fetch_content(&record_id).unwrap().unwrap();
        assert_eq!(fetched, c);
        assert_eq!(fetched.payload(), c.payload());
    }

    #[test]
    fn test_fetch_unknown_record_returns_none() {
        let f = fixture();
        let handler = UnstructuredDataHandler::for_content_type("text/plain", f.context.clone());

        let fetched = handler.fetch_content(&RecordId::new("does-not-exist")).unwrap();
        assert!(fetched.is_none());
    }

    #[test]
    fn test_fetch_record_without_attachment_returns_none() {
        let f = fixture();
        let record_id = record_with_entries(
            &f,
            vec![Entry {
                concept_name: "Weight (kg)".into(),
                observed_at: Utc::now(),
                value: EntryValue::Numeric(72.5),
            }],
        );
        let handler = UnstructuredDataHandler::for_content_type("text/plain", f.context.clone());

        assert!(handler.fetch_content(&record_id).unwrap().is_none());
    }

    #[test]
    fn test_fetch_returns_first_matching_content() {
        let f = fixture();
        let concept = "Unstructured Attachment (text/plain)";
        let record_id = record_with_entries(
            &f,
            vec![
                attached_content(concept, content("png", "image/png")),
                attached_content(concept, content("first", "text/plain")),
                attached_content(concept, content("second", "text/plain")),
            ],
        );
        let handler = UnstructuredDataHandler::for_content_type("text/plain", f.context.clone());

        let fetched = handler.fetch_content(&record_id).unwrap().unwrap();
        assert_eq!(fetched.content_id(), "first");
    }

    #[test]
    fn test_entries_outside_attachment_concepts_are_ignored() {
        let f = fixture();
        let record_id = record_with_entries(
            &f,
            vec![attached_content("Scanned Document", content("c1", "text/plain"))],
        );
        let handler = UnstructuredDataHandler::for_content_type("text/plain", f.context.clone());

        assert!(handler.fetch_content(&record_id).unwrap().is_none());
    }

    #[test]
    fn test_foreign_attachments_are_skipped() {
        let f = fixture();
        let concept = "Unstructured Attachment (text/plain)";
        let record_id = record_with_entries(
            &f,
            vec![
                complex_entry(concept, Some(AttachedObject::Text("not content".into()))),
                complex_entry(concept, Some(AttachedObject::Binary(vec![0xde, 0xad]))),
                complex_entry(concept, None),
                complex_entry(
                    concept,
                    Some(AttachedObject::Unreadable(serde_json::json!({"Content": {}}))),
                ),
            ],
        );
        let handler = UnstructuredDataHandler::for_content_type("text/plain", f.context.clone());

        assert!(handler.fetch_content(&record_id).unwrap().is_none());
        assert!(handler.query_all(&subject(), None, None).unwrap().is_empty());
    }

    #[test]
    fn test_query_spans_records_in_store_order() {
        let f = fixture();
        let handler = UnstructuredDataHandler::for_content_type("text/plain", f.context.clone());
        let other = UnstructuredDataHandler::for_content_type("image/png", f.context.clone());

        save(&handler, &content("a", "text/plain"));
        save(&other, &content("png", "image/png"));
        save(&handler, &content("b", "text/plain"));
        let someone_else = SubjectId::new("someone-else");
        save_as(&handler, &someone_else, &classifier(), &content("c", "text/plain"));

        let ids: Vec<_> = handler
            .query_all(&subject(), None, None)
            .unwrap()
            .iter()
            .map(|c| c.content_id().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_query_respects_classifiers_and_window() {
        let f = fixture();
        let handler = UnstructuredDataHandler::for_content_type("text/plain", f.context.clone());
        let lab = RecordClassifier::new("Lab");
        save_as(&handler, &subject(), &lab, &content("lab", "text/plain"));
        save(&handler, &content("visit", "text/plain"));

        let only_visits = handler
            .query_encounters(&subject(), &[classifier()], None, None)
            .unwrap();
        assert_eq!(only_visits.len(), 1);
        assert_eq!(only_visits[0].content_id(), "visit");

        let future = Utc::now() + chrono::Duration::hours(1);
        assert!(handler
            .query_encounters(&subject(), &[], Some(future), None)
            .unwrap()
            .is_empty());
        assert_eq!(
            handler
                .query_encounters(&subject(), &[], None, Some(future))
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn test_codes_handler_matches_on_format_code() {
        let f = fixture();
        let handler = UnstructuredDataHandler::for_codes(
            CodedValue::new("LOINC", "34117-2"),
            CodedValue::new("IHE", "urn:ihe:pcc:xphr:2007"),
            f.context.clone(),
        );
        assert_eq!(handler.title(), "urn:ihe:pcc:xphr:2007");

        let record_id = save(&handler, &content("c1", "text/xml"));

        let record = f.records.find_record(&record_id).unwrap().unwrap();
        assert_eq!(
            record.entries[0].concept_name,
            "Unstructured Attachment (urn:ihe:pcc:xphr:2007)"
        );
        assert_eq!(handler.fetch_content(&record_id).unwrap().unwrap().content_id(), "c1");
    }

    #[test]
    fn test_clone_handler_keeps_discriminator() {
        let f = fixture();
        let by_type = UnstructuredDataHandler::for_content_type("text/plain", f.context.clone());
        let by_codes = UnstructuredDataHandler::for_codes(
            CodedValue::new("LOINC", "34117-2"),
            CodedValue::new("IHE", "urn:ihe:pcc:xphr:2007"),
            f.context.clone(),
        );

        for original in [by_type, by_codes] {
            let cloned = original.clone_handler();
            assert_eq!(cloned.discriminator(), original.discriminator());
            assert_eq!(cloned.discriminator().title(), original.title());
            assert!(!std::ptr::eq(
                cloned.discriminator(),
                original.discriminator()
            ));
        }
    }

    #[derive(Debug)]
    struct FailingRecordStore;

    impl RecordStore for FailingRecordStore {
        fn save_record(&self, _draft: RecordDraft) -> Result<RecordId, RecordStoreError> {
            Err(RecordStoreError::Storage("unavailable".into()))
        }

        fn find_record(&self, _id: &RecordId) -> Result<Option<Record>, RecordStoreError> {
            Err(RecordStoreError::Storage("unavailable".into()))
        }

        fn find_records(&self, _query: &RecordQuery) -> Result<Vec<Record>, RecordStoreError> {
            Err(RecordStoreError::Storage("unavailable".into()))
        }
    }

    #[test]
    fn test_store_errors_propagate() {
        let context = HandlerContext::new(
            Arc::new(FailingRecordStore),
            Arc::new(InMemoryConceptStore::default()),
            Arc::new(PropertiesConfig::default()),
        );
        let handler = UnstructuredDataHandler::for_content_type("text/plain", context);

        assert!(matches!(
            handler.fetch_content(&RecordId::new("r")),
            Err(HandlerError::Store(RecordStoreError::Storage(_)))
        ));
        assert!(matches!(
            handler.save_content(
                &subject(),
                &Participants::new(),
                &classifier(),
                &content("c", "text/plain")
            ),
            Err(HandlerError::Store(_))
        ));
    }
}
