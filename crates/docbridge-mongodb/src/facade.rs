//! Database facade
//!
//! [`Database`] owns one connection and the collection alias table. Every
//! collection operation resolves the alias, checks that a session is live and
//! forwards to the driver. Driver errors are returned unchanged; nothing is
//! retried.
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use docbridge_mongodb::{ConnectOptions, Database};
//!
//! let db = Database::mongodb();
//! db.set_mapping([("users", "app_users")]);
//! db.connect("mongodb://localhost:27017", "app", ConnectOptions::default()).await?;
//!
//! db.insert("users", doc! { "id": "1", "name": "volo" }).await?;
//! let docs = db.find("users", doc! { "id": "1" })?.project(["id"]).to_list().await?;
//! db.update("users", doc! { "id": "1" }, doc! { "name": "no-volo" }, false, false).await?;
//! db.disconnect().await?;
//! ```

use bson::Document as BsonDocument;
use docbridge_common::{DocBridgeError, Result};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::connection::{MongoDriver, MongoSession};
use crate::cursor::{AggregateCursor, FindCursor};
use crate::driver::{
    DeleteOutcome, Driver, IndexSpec, InsertOutcome, Session, UpdateDocument, UpdateOutcome,
};
use crate::flags::{StrictFlag, UpdateMode};
use crate::mapping::CollectionMapping;
use crate::options::{AggregateOptions, ConnectOptions};
use crate::payload::InsertPayload;

enum ConnectionState<S> {
    Disconnected,
    Connecting,
    Connected {
        session: Arc<S>,
        allow_disk_use: bool,
    },
}

impl<S> ConnectionState<S> {
    fn take_session(&mut self) -> Option<Arc<S>> {
        if !matches!(self, ConnectionState::Connected { .. }) {
            return None;
        }
        match std::mem::replace(self, ConnectionState::Disconnected) {
            ConnectionState::Connected { session, .. } => Some(session),
            _ => None,
        }
    }
}

/// Resets a `Connecting` state if the connect future fails or is dropped
struct ConnectingGuard<'a, S> {
    state: &'a Mutex<ConnectionState<S>>,
    armed: bool,
}

impl<S> ConnectingGuard<'_, S> {
    fn finish(mut self, session: Arc<S>, allow_disk_use: bool) {
        *self.state.lock() = ConnectionState::Connected {
            session,
            allow_disk_use,
        };
        self.armed = false;
    }
}

impl<S> Drop for ConnectingGuard<'_, S> {
    fn drop(&mut self) {
        if self.armed {
            *self.state.lock() = ConnectionState::Disconnected;
        }
    }
}

/// Build the driver connection string as `url/database`
pub fn connection_string(url: &str, database_name: &str) -> String {
    format!("{}/{}", url.trim_end_matches('/'), database_name)
}

/// Connection owner and alias-resolving front door to a document database
pub struct Database<D: Driver = MongoDriver> {
    driver: D,
    state: Mutex<ConnectionState<D::Session>>,
    mapping: RwLock<CollectionMapping>,
}

impl Database<MongoDriver> {
    /// A facade backed by the MongoDB driver
    pub fn mongodb() -> Self {
        Self::new(MongoDriver)
    }

    /// Get the raw driver collection for a (possibly aliased) name
    pub fn raw_collection(&self, name: &str) -> Result<mongodb::Collection<BsonDocument>> {
        Ok(self.collection(name)?.raw())
    }
}

impl Default for Database<MongoDriver> {
    fn default() -> Self {
        Self::mongodb()
    }
}

impl<D: Driver> Database<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            state: Mutex::new(ConnectionState::Disconnected),
            mapping: RwLock::new(CollectionMapping::new()),
        }
    }

    /// Start with an alias table
    pub fn with_mapping(self, mapping: impl Into<CollectionMapping>) -> Self {
        *self.mapping.write() = mapping.into();
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    // ----- connection lifecycle -----

    /// Open the connection to `url/database_name`
    ///
    /// Fails with [`DocBridgeError::AlreadyConnected`] if a connection exists or
    /// another `connect` is in flight.
    pub async fn connect(
        &self,
        url: &str,
        database_name: &str,
        options: ConnectOptions,
    ) -> Result<()> {
        {
            let mut state = self.state.lock();
            if !matches!(*state, ConnectionState::Disconnected) {
                warn!(database = database_name, "Rejected connect: DB already connected");
                return Err(DocBridgeError::AlreadyConnected);
            }
            *state = ConnectionState::Connecting;
        }
        let guard = ConnectingGuard {
            state: &self.state,
            armed: true,
        };

        info!(database = database_name, "Opening connection");
        let dsn = connection_string(url, database_name);
        let session = self.driver.connect(&dsn, database_name, &options).await?;

        self.mapping.write().merge(options.collection_mapping.iter());
        guard.finish(Arc::new(session), options.allow_disk_use);
        info!(database = database_name, "Connection opened");
        Ok(())
    }

    /// Close the connection if there is one; succeeds when already disconnected
    ///
    /// Fails with [`DocBridgeError::NotAvailable`] while a `connect` is in flight.
    pub async fn disconnect(&self) -> Result<()> {
        let session = {
            let mut state = self.state.lock();
            if matches!(*state, ConnectionState::Connecting) {
                warn!("Rejected disconnect: connection still being established");
                return Err(DocBridgeError::NotAvailable);
            }
            state.take_session()
        };
        match session {
            Some(session) => {
                info!(database = session.database_name(), "Closing connection");
                session.close().await?;
                info!("Connection closed");
                Ok(())
            }
            None => {
                debug!("Disconnect without a connection");
                Ok(())
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(*self.state.lock(), ConnectionState::Connected { .. })
    }

    /// Name of the connected database
    pub fn database_name(&self) -> Result<String> {
        Ok(self.session()?.0.database_name().to_string())
    }

    /// Check that the server answers
    pub async fn ping(&self) -> Result<()> {
        let (session, _) = self.session()?;
        session.ping().await
    }

    fn session(&self) -> Result<(Arc<D::Session>, bool)> {
        match &*self.state.lock() {
            ConnectionState::Connected {
                session,
                allow_disk_use,
            } => Ok((Arc::clone(session), *allow_disk_use)),
            _ => Err(DocBridgeError::NotAvailable),
        }
    }

    // ----- alias table -----

    /// Merge aliases into the table
    pub fn set_mapping<I, K, V>(&self, aliases: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.mapping.write().merge(aliases);
    }

    /// Replace the whole alias table
    pub fn replace_mapping(&self, mapping: impl Into<CollectionMapping>) {
        *self.mapping.write() = mapping.into();
    }

    /// Snapshot of the alias table
    pub fn mapping(&self) -> CollectionMapping {
        self.mapping.read().clone()
    }

    /// Real collection name for `name`; unmapped names come back unchanged
    pub fn resolve_collection_name(&self, name: &str) -> String {
        self.mapping.read().resolve(name).to_string()
    }

    /// Snapshot of the currently known aliases
    pub fn alias_names(&self) -> Vec<String> {
        self.mapping
            .read()
            .aliases()
            .map(str::to_string)
            .collect()
    }

    // ----- collections -----

    /// Handle to the collection `name` resolves to
    pub fn collection(&self, name: &str) -> Result<CollectionHandle<D::Session>> {
        let (session, allow_disk_use) = self.session()?;
        Ok(CollectionHandle {
            session,
            name: self.resolve_collection_name(name),
            allow_disk_use,
        })
    }

    pub async fn insert(
        &self,
        name: &str,
        data: impl Into<InsertPayload>,
    ) -> Result<InsertOutcome> {
        self.collection(name)?.insert(data).await
    }

    /// Lazy find cursor; `None` matches every document
    pub fn find(
        &self,
        name: &str,
        filter: impl Into<Option<BsonDocument>>,
    ) -> Result<FindCursor<D::Session>> {
        Ok(self.collection(name)?.find(filter))
    }

    pub async fn count(&self, name: &str, filter: impl Into<Option<BsonDocument>>) -> Result<u64> {
        self.find(name, filter)?.count().await
    }

    /// Update the first match, or all matches when `multi` is `true`
    ///
    /// With `replace` set to `true` the matched document is overwritten by
    /// `value`; otherwise only the fields in `value` are set. Flags other than a
    /// literal boolean `true` count as unset.
    pub async fn update(
        &self,
        name: &str,
        filter: BsonDocument,
        value: BsonDocument,
        multi: impl StrictFlag,
        replace: impl StrictFlag,
    ) -> Result<UpdateOutcome> {
        let mode = UpdateMode::from_flags(multi, replace);
        self.collection(name)?.update(filter, value, mode).await
    }

    /// Delete the first match, or all matches when `multi` is `true`
    pub async fn remove(
        &self,
        name: &str,
        filter: BsonDocument,
        multi: impl StrictFlag,
    ) -> Result<DeleteOutcome> {
        self.collection(name)?
            .remove(filter, multi.is_strictly_true())
            .await
    }

    pub async fn indexes<I>(&self, name: &str, specs: I) -> Result<Vec<String>>
    where
        I: IntoIterator,
        I::Item: Into<IndexSpec>,
    {
        self.collection(name)?.indexes(specs).await
    }

    /// Lazy aggregation cursor; disk use defaults to the connection setting
    pub fn aggregate(
        &self,
        name: &str,
        pipeline: Vec<BsonDocument>,
        options: impl Into<Option<AggregateOptions>>,
    ) -> Result<AggregateCursor<D::Session>> {
        Ok(self.collection(name)?.aggregate(pipeline, options))
    }

    pub async fn drop_collection(&self, name: &str) -> Result<()> {
        self.collection(name)?.drop().await
    }

    pub async fn drop_database(&self) -> Result<()> {
        let (session, _) = self.session()?;
        info!(database = session.database_name(), "Dropping database");
        session.drop_database().await
    }

    // ----- alternate names -----

    pub async fn open(
        &self,
        url: &str,
        database_name: &str,
        options: ConnectOptions,
    ) -> Result<()> {
        self.connect(url, database_name, options).await
    }

    pub async fn close(&self) -> Result<()> {
        self.disconnect().await
    }

    pub fn get(&self, name: &str) -> Result<CollectionHandle<D::Session>> {
        self.collection(name)
    }

    pub fn get_collection_name(&self, name: &str) -> String {
        self.resolve_collection_name(name)
    }

    pub async fn drop(&self, name: &str) -> Result<()> {
        self.drop_collection(name).await
    }

    pub async fn drop_db(&self) -> Result<()> {
        self.drop_database().await
    }
}

impl<D: Driver> IntoIterator for &Database<D> {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.alias_names().into_iter()
    }
}

/// A resolved collection on a live session
pub struct CollectionHandle<S: Session> {
    session: Arc<S>,
    name: String,
    allow_disk_use: bool,
}

impl<S: Session> CollectionHandle<S> {
    /// Real collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn session(&self) -> &Arc<S> {
        &self.session
    }

    /// Insert one document, or many when given a sequence
    pub async fn insert(&self, data: impl Into<InsertPayload>) -> Result<InsertOutcome> {
        match data.into() {
            InsertPayload::One(document) => {
                debug!(collection = %self.name, "insert_one");
                self.session.insert_one(&self.name, document).await
            }
            InsertPayload::Many(documents) => {
                debug!(collection = %self.name, count = documents.len(), "insert_many");
                self.session.insert_many(&self.name, documents).await
            }
        }
    }

    pub fn find(&self, filter: impl Into<Option<BsonDocument>>) -> FindCursor<S> {
        let filter = filter.into().unwrap_or_default();
        FindCursor::new(Arc::clone(&self.session), self.name.clone(), filter)
    }

    pub async fn update(
        &self,
        filter: BsonDocument,
        value: BsonDocument,
        mode: UpdateMode,
    ) -> Result<UpdateOutcome> {
        debug!(
            collection = %self.name,
            multi = mode.multi,
            replace = mode.replace,
            "update"
        );
        let update = UpdateDocument::new(value, mode.replace);
        self.session
            .update(&self.name, filter, update, mode.multi)
            .await
    }

    pub async fn remove(&self, filter: BsonDocument, multi: bool) -> Result<DeleteOutcome> {
        debug!(collection = %self.name, multi, "remove");
        self.session.delete(&self.name, filter, multi).await
    }

    pub async fn indexes<I>(&self, specs: I) -> Result<Vec<String>>
    where
        I: IntoIterator,
        I::Item: Into<IndexSpec>,
    {
        let specs: Vec<IndexSpec> = specs.into_iter().map(Into::into).collect();
        debug!(collection = %self.name, count = specs.len(), "create_indexes");
        self.session.create_indexes(&self.name, specs).await
    }

    pub fn aggregate(
        &self,
        pipeline: Vec<BsonDocument>,
        options: impl Into<Option<AggregateOptions>>,
    ) -> AggregateCursor<S> {
        let options = options
            .into()
            .unwrap_or_default()
            .merged_with_defaults(self.allow_disk_use);
        AggregateCursor::new(Arc::clone(&self.session), self.name.clone(), pipeline, options)
    }

    pub async fn drop(&self) -> Result<()> {
        debug!(collection = %self.name, "drop");
        self.session.drop_collection(&self.name).await
    }
}

impl CollectionHandle<MongoSession> {
    /// The underlying driver collection
    pub fn raw(&self) -> mongodb::Collection<BsonDocument> {
        self.session.collection(&self.name)
    }
}
