pub mod app;
pub mod cli;
pub mod context;
pub mod id;
pub mod record;
pub mod repository;
pub mod rest;
pub mod store;
pub mod tracing;

pub use id::{InvalidIdentifier, RecordId};
pub use record::{NewRecord, Record, RecordPatch, WriteOutcome};
pub use repository::{ConnectionState, IdentityRepository, Liveness};
pub use store::{DocumentStore, MemoryStore, MongoSettings, MongoStore, StoreError};
