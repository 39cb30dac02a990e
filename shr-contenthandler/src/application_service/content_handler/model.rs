use crate::domain::content::Content;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

opaque_id!(
    /// Identifies the person a record belongs to.
    SubjectId
);
opaque_id!(
    /// Store-assigned identifier of a saved record.
    RecordId
);
opaque_id!(
    /// Store-assigned identifier of a vocabulary entry.
    ConceptId
);
opaque_id!(
    /// The kind of record (an encounter type).
    RecordClassifier
);

/// Providers taking part in a record, grouped by role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participants(BTreeMap<String, BTreeSet<String>>);

impl Participants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, role: impl Into<String>, provider: impl Into<String>) -> Self {
        self.add(role, provider);
        self
    }

    pub fn add(&mut self, role: impl Into<String>, provider: impl Into<String>) {
        self.0.entry(role.into()).or_default().insert(provider.into());
    }

    pub fn providers(&self, role: &str) -> impl Iterator<Item = &str> {
        self.0.get(role).into_iter().flatten().map(String::as_str)
    }

    /// `(role, provider)` pairs in role order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().flat_map(|(role, providers)| {
            providers
                .iter()
                .map(move |provider| (role.as_str(), provider.as_str()))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeSet::is_empty)
    }
}

/// The opaque object attached to a complex entry.
///
/// Stored objects that no longer decode (for instance a `Content` that fails
/// its representation rules) come back as [`AttachedObject::Unreadable`]
/// holding the raw stored value, so one bad entry does not spoil its record.
#[derive(Debug, Clone, PartialEq)]
pub enum AttachedObject {
    Content(Content),
    Text(String),
    Binary(Vec<u8>),
    Unreadable(serde_json::Value),
}

impl AttachedObject {
    pub fn as_content(&self) -> Option<&Content> {
        match self {
            AttachedObject::Content(content) => Some(content),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AttachedObject::Content(_) => "content",
            AttachedObject::Text(_) => "text",
            AttachedObject::Binary(_) => "binary",
            AttachedObject::Unreadable(_) => "unreadable",
        }
    }
}

#[derive(Serialize)]
enum AttachedObjectRef<'a> {
    Content(&'a Content),
    Text(&'a str),
    Binary(&'a [u8]),
}

#[derive(Deserialize)]
enum StoredAttachedObject {
    Content(Content),
    Text(String),
    Binary(Vec<u8>),
}

impl Serialize for AttachedObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttachedObject::Content(content) => {
                AttachedObjectRef::Content(content).serialize(serializer)
            }
            AttachedObject::Text(text) => AttachedObjectRef::Text(text).serialize(serializer),
            AttachedObject::Binary(bytes) => AttachedObjectRef::Binary(bytes).serialize(serializer),
            AttachedObject::Unreadable(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for AttachedObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match StoredAttachedObject::deserialize(&value) {
            Ok(StoredAttachedObject::Content(content)) => AttachedObject::Content(content),
            Ok(StoredAttachedObject::Text(text)) => AttachedObject::Text(text),
            Ok(StoredAttachedObject::Binary(bytes)) => AttachedObject::Binary(bytes),
            Err(_) => AttachedObject::Unreadable(value),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexData {
    pub title: String,
    pub data: Option<AttachedObject>,
}

impl ComplexData {
    pub fn new(title: impl Into<String>, data: Option<AttachedObject>) -> Self {
        Self {
            title: title.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntryValue {
    Text(String),
    Numeric(f64),
    Complex(ComplexData),
}

/// A single observation inside a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub concept_name: String,
    pub observed_at: DateTime<Utc>,
    pub value: EntryValue,
}

impl Entry {
    pub fn complex_data(&self) -> Option<&ComplexData> {
        match &self.value {
            EntryValue::Complex(data) => Some(data),
            _ => None,
        }
    }
}

/// A record that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDraft {
    pub subject: SubjectId,
    pub classifier: RecordClassifier,
    pub occurred_at: DateTime<Utc>,
    pub participants: Participants,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub subject: SubjectId,
    pub classifier: RecordClassifier,
    pub occurred_at: DateTime<Utc>,
    pub participants: Participants,
    pub entries: Vec<Entry>,
}

impl Record {
    pub fn from_draft(id: RecordId, draft: RecordDraft) -> Self {
        Self {
            id,
            subject: draft.subject,
            classifier: draft.classifier,
            occurred_at: draft.occurred_at,
            participants: draft.participants,
            entries: draft.entries,
        }
    }
}

/// Selects the records of a subject.
///
/// An empty `classifiers` list matches every classifier. `from` and `to` are
/// inclusive; `None` leaves that side unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub subject: SubjectId,
    pub classifiers: Vec<RecordClassifier>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl RecordQuery {
    pub fn matches(&self, record: &Record) -> bool {
        record.subject == self.subject
            && (self.classifiers.is_empty() || self.classifiers.contains(&record.classifier))
            && self.from.map_or(true, |from| record.occurred_at >= from)
            && self.to.map_or(true, |to| record.occurred_at <= to)
    }
}

/// A vocabulary entry that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptDraft {
    pub name: String,
    pub description: String,
    pub datatype: String,
    pub concept_class: String,
    pub handler: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub id: ConceptId,
    pub name: String,
    pub description: String,
    pub datatype: String,
    pub concept_class: String,
    pub handler: Option<String>,
}

impl Concept {
    pub fn from_draft(id: ConceptId, draft: ConceptDraft) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            datatype: draft.datatype,
            concept_class: draft.concept_class,
            handler: draft.handler,
        }
    }
}
