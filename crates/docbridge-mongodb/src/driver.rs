//! Driver abstraction
//!
//! The facade never talks to MongoDB directly. It holds a [`Driver`] that opens
//! a [`Session`], and forwards every operation to that session with the
//! collection name already resolved. [`crate::connection::MongoDriver`] is the
//! production implementation.

use async_trait::async_trait;
use bson::{doc, Bson, Document as BsonDocument};
use docbridge_common::Result;
use futures::stream::BoxStream;
use std::time::Duration;

use crate::options::{AggregateOptions, ConnectOptions};

/// Lazy stream of result documents returned by find and aggregate
pub type DocumentStream = BoxStream<'static, Result<BsonDocument>>;

/// Everything needed to issue a find query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindSpec {
    pub filter: BsonDocument,
    pub projection: Option<BsonDocument>,
    pub sort: Option<BsonDocument>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
}

/// The update document submitted to the driver
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateDocument {
    /// Only the given fields change: submitted as `{ "$set": fields }`
    Merge(BsonDocument),
    /// The matched document body is overwritten
    Replace(BsonDocument),
}

impl UpdateDocument {
    pub fn new(value: BsonDocument, replace: bool) -> Self {
        if replace {
            UpdateDocument::Replace(value)
        } else {
            UpdateDocument::Merge(value)
        }
    }

    pub fn is_replace(&self) -> bool {
        matches!(self, UpdateDocument::Replace(_))
    }

    /// The document as it goes over the wire
    pub fn to_document(&self) -> BsonDocument {
        match self {
            UpdateDocument::Merge(fields) => doc! { "$set": fields.clone() },
            UpdateDocument::Replace(body) => body.clone(),
        }
    }
}

/// An index definition for `Database::indexes`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSpec {
    pub keys: BsonDocument,
    pub name: Option<String>,
    pub unique: bool,
    pub sparse: bool,
    pub expire_after: Option<Duration>,
}

impl IndexSpec {
    pub fn new(keys: BsonDocument) -> Self {
        Self {
            keys,
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn sparse(mut self) -> Self {
        self.sparse = true;
        self
    }

    pub fn expire_after(mut self, ttl: Duration) -> Self {
        self.expire_after = Some(ttl);
        self
    }
}

impl From<BsonDocument> for IndexSpec {
    fn from(keys: BsonDocument) -> Self {
        IndexSpec::new(keys)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertOutcome {
    pub inserted_ids: Vec<Bson>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<Bson>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteOutcome {
    pub deleted_count: u64,
}

/// Opens sessions against a database server
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    type Session: Session;

    /// Establish a session. `connection_string` is the caller's URL with the
    /// database name appended.
    async fn connect(
        &self,
        connection_string: &str,
        database: &str,
        options: &ConnectOptions,
    ) -> Result<Self::Session>;
}

/// An established session; every collection argument is a real name
#[async_trait]
pub trait Session: Send + Sync + 'static {
    fn database_name(&self) -> &str;

    async fn insert_one(&self, collection: &str, document: BsonDocument) -> Result<InsertOutcome>;

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<BsonDocument>,
    ) -> Result<InsertOutcome>;

    async fn find(&self, collection: &str, spec: FindSpec) -> Result<DocumentStream>;

    async fn count(&self, collection: &str, filter: BsonDocument) -> Result<u64>;

    async fn update(
        &self,
        collection: &str,
        filter: BsonDocument,
        update: UpdateDocument,
        multi: bool,
    ) -> Result<UpdateOutcome>;

    async fn delete(&self, collection: &str, filter: BsonDocument, multi: bool)
        -> Result<DeleteOutcome>;

    /// Create indexes, returning their names
    async fn create_indexes(&self, collection: &str, specs: Vec<IndexSpec>) -> Result<Vec<String>>;

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<BsonDocument>,
        options: AggregateOptions,
    ) -> Result<DocumentStream>;

    async fn drop_collection(&self, collection: &str) -> Result<()>;

    async fn drop_database(&self) -> Result<()>;

    async fn ping(&self) -> Result<()>;

    async fn close(&self) -> Result<()>;
}
