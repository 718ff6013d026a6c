use std::{fmt, str::FromStr};

use mongodb::bson::oid::ObjectId;
use thiserror::Error;

/// Rejected external identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid record identifier: {input:?}")]
pub struct InvalidIdentifier {
    pub input: String,
}

/// Store-native identifier of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(ObjectId);

impl RecordId {
    pub fn new(oid: ObjectId) -> Self {
        Self(oid)
    }

    pub fn oid(&self) -> ObjectId {
        self.0
    }
}

impl From<ObjectId> for RecordId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

impl FromStr for RecordId {
    type Err = InvalidIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

/// Parses the external string form (24 hex characters) into a native id.
pub fn decode(external: &str) -> Result<RecordId, InvalidIdentifier> {
    ObjectId::parse_str(external)
        .map(RecordId)
        .map_err(|_| InvalidIdentifier {
            input: external.to_string(),
        })
}

/// Canonical external form: lowercase hex.
pub fn encode(id: &RecordId) -> String {
    id.0.to_hex()
}
