//! MongoDB driver implementation with pool configuration and health checking

use async_trait::async_trait;
use bson::{doc, Document as BsonDocument};
use docbridge_common::{DocBridgeError, Result};
use futures::{StreamExt, TryStreamExt};
use mongodb::{
    options::{
        AggregateOptions as MongoAggregateOptions, ClientOptions, FindOptions, IndexOptions,
        ServerApi, ServerApiVersion,
    },
    Client, Collection, Database, IndexModel,
};
use tracing::debug;

use crate::driver::{
    DeleteOutcome, DocumentStream, Driver, FindSpec, IndexSpec, InsertOutcome, Session,
    UpdateDocument, UpdateOutcome,
};
use crate::options::{AggregateOptions, ConnectOptions, PoolConfig};

/// Opens [`MongoSession`]s with the official MongoDB driver
#[derive(Debug, Clone, Copy, Default)]
pub struct MongoDriver;

#[async_trait]
impl Driver for MongoDriver {
    type Session = MongoSession;

    async fn connect(
        &self,
        connection_string: &str,
        database: &str,
        options: &ConnectOptions,
    ) -> Result<MongoSession> {
        MongoSession::with_config(connection_string, database, &options.pool).await
    }
}

/// A MongoDB client bound to one database
#[derive(Debug, Clone)]
pub struct MongoSession {
    client: Client,
    database: Database,
    database_name: String,
}

impl MongoSession {
    /// Create a new MongoDB session with custom pool configuration
    pub async fn with_config(
        connection_string: &str,
        database_name: &str,
        config: &PoolConfig,
    ) -> Result<Self> {
        let mut client_options = ClientOptions::parse(connection_string).await?;
        apply_pool_config(&mut client_options, config);

        // Set stable API version for compatibility
        let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
        client_options.server_api = Some(server_api);

        let client = Client::with_options(client_options)?;
        let database = client.database(database_name);

        Ok(Self {
            client,
            database,
            database_name: database_name.to_string(),
        })
    }

    /// Get a collection by its real name (untyped BsonDocument collection)
    pub fn collection(&self, name: &str) -> Collection<BsonDocument> {
        self.database.collection(name)
    }
}

fn apply_pool_config(client_options: &mut ClientOptions, config: &PoolConfig) {
    if let Some(min) = config.min_pool_size {
        client_options.min_pool_size = Some(min);
    }
    if let Some(max) = config.max_pool_size {
        client_options.max_pool_size = Some(max);
    }
    if let Some(idle) = config.max_idle_time {
        client_options.max_idle_time = Some(idle);
    }
    if let Some(connect) = config.connect_timeout {
        client_options.connect_timeout = Some(connect);
    }
    if let Some(server_sel) = config.server_selection_timeout {
        client_options.server_selection_timeout = Some(server_sel);
    }
    if let Some(app) = &config.app_name {
        client_options.app_name = Some(app.clone());
    }
}

fn into_stream(cursor: mongodb::Cursor<BsonDocument>) -> DocumentStream {
    cursor.map_err(DocBridgeError::from).boxed()
}

fn index_model(spec: IndexSpec) -> IndexModel {
    let mut options = IndexOptions::default();
    options.name = spec.name;
    options.unique = spec.unique.then_some(true);
    options.sparse = spec.sparse.then_some(true);
    options.expire_after = spec.expire_after;

    IndexModel::builder()
        .keys(spec.keys)
        .options(Some(options))
        .build()
}

#[async_trait]
impl Session for MongoSession {
    fn database_name(&self) -> &str {
        &self.database_name
    }

    async fn insert_one(&self, collection: &str, document: BsonDocument) -> Result<InsertOutcome> {
        let result = self.collection(collection).insert_one(document).await?;
        Ok(InsertOutcome {
            inserted_ids: vec![result.inserted_id],
        })
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<BsonDocument>,
    ) -> Result<InsertOutcome> {
        let result = self.collection(collection).insert_many(documents).await?;

        let mut ids: Vec<_> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);

        Ok(InsertOutcome {
            inserted_ids: ids.into_iter().map(|(_, id)| id).collect(),
        })
    }

    async fn find(&self, collection: &str, spec: FindSpec) -> Result<DocumentStream> {
        let mut options = FindOptions::default();
        options.projection = spec.projection;
        options.sort = spec.sort;
        options.skip = spec.skip;
        options.limit = spec.limit;

        let cursor = self
            .collection(collection)
            .find(spec.filter)
            .with_options(options)
            .await?;
        Ok(into_stream(cursor))
    }

    async fn count(&self, collection: &str, filter: BsonDocument) -> Result<u64> {
        let count = self.collection(collection).count_documents(filter).await?;
        Ok(count)
    }

    async fn update(
        &self,
        collection: &str,
        filter: BsonDocument,
        update: UpdateDocument,
        multi: bool,
    ) -> Result<UpdateOutcome> {
        let coll = self.collection(collection);

        let result = match (update, multi) {
            (UpdateDocument::Replace(body), false) => coll.replace_one(filter, body).await?,
            // The server only accepts operator documents for multi updates; a
            // raw body fails there and the error is returned unchanged.
            (update, true) => coll.update_many(filter, update.to_document()).await?,
            (update @ UpdateDocument::Merge(_), false) => {
                coll.update_one(filter, update.to_document()).await?
            }
        };

        Ok(UpdateOutcome {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn delete(
        &self,
        collection: &str,
        filter: BsonDocument,
        multi: bool,
    ) -> Result<DeleteOutcome> {
        let coll = self.collection(collection);
        let result = if multi {
            coll.delete_many(filter).await?
        } else {
            coll.delete_one(filter).await?
        };
        Ok(DeleteOutcome {
            deleted_count: result.deleted_count,
        })
    }

    async fn create_indexes(&self, collection: &str, specs: Vec<IndexSpec>) -> Result<Vec<String>> {
        let models: Vec<IndexModel> = specs.into_iter().map(index_model).collect();
        let result = self.collection(collection).create_indexes(models).await?;
        Ok(result.index_names)
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<BsonDocument>,
        options: AggregateOptions,
    ) -> Result<DocumentStream> {
        let mut mongo_options = MongoAggregateOptions::default();
        mongo_options.allow_disk_use = options.allow_disk_use;
        mongo_options.batch_size = options.batch_size;
        mongo_options.max_time = options.max_time;

        let cursor = self
            .collection(collection)
            .aggregate(pipeline)
            .with_options(mongo_options)
            .await?;
        Ok(into_stream(cursor))
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        self.collection(collection).drop().await?;
        Ok(())
    }

    async fn drop_database(&self) -> Result<()> {
        self.database.drop().await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        debug!(database = %self.database_name, "Shutting down MongoDB client");
        self.client.clone().shutdown().await;
        Ok(())
    }
}
