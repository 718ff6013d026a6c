use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::id::{self, RecordId};

pub const FIELD_ID: &str = "_id";
pub const FIELD_NAME: &str = "name";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_PASSWORD: &str = "password";

/// A stored identity document with its id rendered in external form.
///
/// The password is kept and returned verbatim; nothing in this crate hashes it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Record {
    /// Shapes a raw store document. Fields that are missing or not strings
    /// come back as `None`.
    pub fn from_document(document: &Document) -> Self {
        let id = match document.get(FIELD_ID) {
            Some(Bson::ObjectId(oid)) => id::encode(&RecordId::new(*oid)),
            Some(Bson::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let text = |key: &str| document.get_str(key).ok().map(str::to_owned);
        Self {
            id,
            name: text(FIELD_NAME),
            email: text(FIELD_EMAIL),
            password: text(FIELD_PASSWORD),
        }
    }
}

/// Fields of a record to be created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRecord {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl NewRecord {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.insert(FIELD_NAME, self.name.as_str());
        document.insert(FIELD_EMAIL, self.email.as_str());
        document.insert(FIELD_PASSWORD, self.password.as_str());
        document
    }
}

/// Fields to replace on an existing record. `None` leaves the stored value
/// untouched; clearing a field takes an explicit empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none()
    }

    /// The `$set` body for the merge.
    pub fn to_set_document(&self) -> Document {
        let mut set = Document::new();
        for (key, value) in [
            (FIELD_NAME, &self.name),
            (FIELD_EMAIL, &self.email),
            (FIELD_PASSWORD, &self.password),
        ] {
            if let Some(value) = value {
                set.insert(key, value.as_str());
            }
        }
        set
    }
}

impl From<NewRecord> for RecordPatch {
    fn from(fields: NewRecord) -> Self {
        Self {
            name: Some(fields.name),
            email: Some(fields.email),
            password: Some(fields.password),
        }
    }
}

/// Result of a write as reported by the store.
///
/// `acknowledged` only says the store accepted the write; `matched` is the
/// number of documents the filter hit, which may be zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub acknowledged: bool,
    pub matched: u64,
}

impl WriteOutcome {
    pub fn acknowledged(matched: u64) -> Self {
        Self {
            acknowledged: true,
            matched,
        }
    }

    pub fn unacknowledged() -> Self {
        Self::default()
    }
}
