//! Lazy cursors for find and aggregate
//!
//! Building a cursor issues nothing. Each call to `stream`, `to_list` or
//! `count` runs the query again against the session, so a cursor can be
//! consumed any number of times.

use bson::Document as BsonDocument;
use docbridge_common::Result;
use futures::TryStreamExt;
use std::sync::Arc;

use crate::driver::{DocumentStream, FindSpec, Session};
use crate::options::AggregateOptions;
use crate::projection::Projection;

/// A find query bound to a session and a resolved collection
pub struct FindCursor<S: Session> {
    session: Arc<S>,
    collection: String,
    spec: FindSpec,
}

impl<S: Session> FindCursor<S> {
    pub(crate) fn new(session: Arc<S>, collection: String, filter: BsonDocument) -> Self {
        Self {
            session,
            collection,
            spec: FindSpec {
                filter,
                ..FindSpec::default()
            },
        }
    }

    /// Set the returned fields
    pub fn project(mut self, projection: impl Into<Projection>) -> Self {
        self.spec.projection = Some(projection.into().to_document());
        self
    }

    /// Set the sort order
    pub fn sort(mut self, sort: BsonDocument) -> Self {
        self.spec.sort = Some(sort);
        self
    }

    /// Set the number of documents to skip
    pub fn skip(mut self, skip: u64) -> Self {
        self.spec.skip = Some(skip);
        self
    }

    /// Set the maximum number of documents to return
    pub fn limit(mut self, limit: i64) -> Self {
        self.spec.limit = Some(limit);
        self
    }

    /// The real collection name the query runs against
    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    pub fn spec(&self) -> &FindSpec {
        &self.spec
    }

    /// Run the query and stream the results
    pub async fn stream(&self) -> Result<DocumentStream> {
        self.session.find(&self.collection, self.spec.clone()).await
    }

    /// Run the query and return all matching documents
    pub async fn to_list(&self) -> Result<Vec<BsonDocument>> {
        self.stream().await?.try_collect().await
    }

    /// Count the documents matching the filter
    pub async fn count(&self) -> Result<u64> {
        self.session
            .count(&self.collection, self.spec.filter.clone())
            .await
    }
}

/// An aggregation pipeline bound to a session and a resolved collection
pub struct AggregateCursor<S: Session> {
    session: Arc<S>,
    collection: String,
    pipeline: Vec<BsonDocument>,
    options: AggregateOptions,
}

impl<S: Session> AggregateCursor<S> {
    pub(crate) fn new(
        session: Arc<S>,
        collection: String,
        pipeline: Vec<BsonDocument>,
        options: AggregateOptions,
    ) -> Self {
        Self {
            session,
            collection,
            pipeline,
            options,
        }
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    pub fn pipeline(&self) -> &[BsonDocument] {
        &self.pipeline
    }

    /// Options after merging with the connection defaults
    pub fn options(&self) -> &AggregateOptions {
        &self.options
    }

    pub async fn stream(&self) -> Result<DocumentStream> {
        self.session
            .aggregate(&self.collection, self.pipeline.clone(), self.options.clone())
            .await
    }

    pub async fn to_list(&self) -> Result<Vec<BsonDocument>> {
        self.stream().await?.try_collect().await
    }
}
