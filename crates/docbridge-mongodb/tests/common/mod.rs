//! Recording driver used by the facade integration tests
//!
//! Every session call is appended to a shared log so tests can assert on
//! exactly what the facade submitted.

#![allow(dead_code)]

use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument};
use docbridge_mongodb::{
    AggregateOptions, ConnectOptions, DeleteOutcome, DocBridgeError, DocumentStream, Driver,
    FindSpec, IndexSpec, InsertOutcome, Result, Session, UpdateDocument, UpdateOutcome,
};
use futures::StreamExt;
use mongodb::options::ClientOptions;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// A real error produced by the MongoDB driver
pub async fn driver_error() -> DocBridgeError {
    ClientOptions::parse("notaurl").await.unwrap_err().into()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect {
        connection_string: String,
        database: String,
    },
    InsertOne {
        collection: String,
        document: BsonDocument,
    },
    InsertMany {
        collection: String,
        documents: Vec<BsonDocument>,
    },
    Find {
        collection: String,
        spec: FindSpec,
    },
    Count {
        collection: String,
        filter: BsonDocument,
    },
    Update {
        collection: String,
        filter: BsonDocument,
        update: UpdateDocument,
        multi: bool,
    },
    Delete {
        collection: String,
        filter: BsonDocument,
        multi: bool,
    },
    CreateIndexes {
        collection: String,
        specs: Vec<IndexSpec>,
    },
    Aggregate {
        collection: String,
        pipeline: Vec<BsonDocument>,
        options: AggregateOptions,
    },
    DropCollection {
        collection: String,
    },
    DropDatabase,
    Ping,
    Close,
}

#[derive(Default)]
struct Shared {
    calls: Mutex<Vec<Call>>,
    results: Mutex<Vec<BsonDocument>>,
    count: Mutex<u64>,
    fail_next_connect: Mutex<Option<DocBridgeError>>,
    fail_operations: Mutex<Option<DocBridgeError>>,
}

/// Driver whose sessions record calls and answer with canned results
#[derive(Clone, Default)]
pub struct RecordingDriver {
    shared: Arc<Shared>,
    connect_delay: Option<Duration>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `connect` wait before returning
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    /// Documents returned by find and aggregate
    pub fn with_results(self, results: Vec<BsonDocument>) -> Self {
        *self.shared.results.lock() = results;
        self
    }

    pub fn with_count(self, count: u64) -> Self {
        *self.shared.count.lock() = count;
        self
    }

    pub fn fail_next_connect(&self, err: DocBridgeError) {
        *self.shared.fail_next_connect.lock() = Some(err);
    }

    /// Make every session operation fail with `err`
    pub fn fail_operations(&self, err: DocBridgeError) {
        *self.shared.fail_operations.lock() = Some(err);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.calls.lock().clone()
    }

    /// Calls after the initial connect
    pub fn operations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, Call::Connect { .. }))
            .collect()
    }

    pub fn last_call(&self) -> Option<Call> {
        self.shared.calls.lock().last().cloned()
    }
}

#[async_trait]
impl Driver for RecordingDriver {
    type Session = RecordingSession;

    async fn connect(
        &self,
        connection_string: &str,
        database: &str,
        _options: &ConnectOptions,
    ) -> Result<RecordingSession> {
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.shared.fail_next_connect.lock().take() {
            return Err(err);
        }
        self.shared.calls.lock().push(Call::Connect {
            connection_string: connection_string.to_string(),
            database: database.to_string(),
        });
        Ok(RecordingSession {
            database: database.to_string(),
            shared: Arc::clone(&self.shared),
        })
    }
}

pub struct RecordingSession {
    database: String,
    shared: Arc<Shared>,
}

impl RecordingSession {
    fn record(&self, call: Call) -> Result<()> {
        self.shared.calls.lock().push(call);
        match self.shared.fail_operations.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn results(&self) -> DocumentStream {
        let docs = self.shared.results.lock().clone();
        futures::stream::iter(docs.into_iter().map(Ok)).boxed()
    }
}

#[async_trait]
impl Session for RecordingSession {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn insert_one(&self, collection: &str, document: BsonDocument) -> Result<InsertOutcome> {
        self.record(Call::InsertOne {
            collection: collection.to_string(),
            document,
        })?;
        Ok(InsertOutcome {
            inserted_ids: vec![Bson::Int32(0)],
        })
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<BsonDocument>,
    ) -> Result<InsertOutcome> {
        let inserted_ids = (0..documents.len() as i32).map(Bson::Int32).collect();
        self.record(Call::InsertMany {
            collection: collection.to_string(),
            documents,
        })?;
        Ok(InsertOutcome { inserted_ids })
    }

    async fn find(&self, collection: &str, spec: FindSpec) -> Result<DocumentStream> {
        self.record(Call::Find {
            collection: collection.to_string(),
            spec,
        })?;
        Ok(self.results())
    }

    async fn count(&self, collection: &str, filter: BsonDocument) -> Result<u64> {
        self.record(Call::Count {
            collection: collection.to_string(),
            filter,
        })?;
        Ok(*self.shared.count.lock())
    }

    async fn update(
        &self,
        collection: &str,
        filter: BsonDocument,
        update: UpdateDocument,
        multi: bool,
    ) -> Result<UpdateOutcome> {
        self.record(Call::Update {
            collection: collection.to_string(),
            filter,
            update,
            multi,
        })?;
        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: 1,
            upserted_id: None,
        })
    }

    async fn delete(
        &self,
        collection: &str,
        filter: BsonDocument,
        multi: bool,
    ) -> Result<DeleteOutcome> {
        self.record(Call::Delete {
            collection: collection.to_string(),
            filter,
            multi,
        })?;
        Ok(DeleteOutcome { deleted_count: 1 })
    }

    async fn create_indexes(&self, collection: &str, specs: Vec<IndexSpec>) -> Result<Vec<String>> {
        let names = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| spec.name.clone().unwrap_or_else(|| format!("index_{}", i)))
            .collect();
        self.record(Call::CreateIndexes {
            collection: collection.to_string(),
            specs,
        })?;
        Ok(names)
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<BsonDocument>,
        options: AggregateOptions,
    ) -> Result<DocumentStream> {
        self.record(Call::Aggregate {
            collection: collection.to_string(),
            pipeline,
            options,
        })?;
        Ok(self.results())
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        self.record(Call::DropCollection {
            collection: collection.to_string(),
        })
    }

    async fn drop_database(&self) -> Result<()> {
        self.record(Call::DropDatabase)
    }

    async fn ping(&self) -> Result<()> {
        self.record(Call::Ping)
    }

    async fn close(&self) -> Result<()> {
        self.shared.calls.lock().push(Call::Close);
        Ok(())
    }
}
