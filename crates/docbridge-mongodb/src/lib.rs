//! MongoDB facade for docbridge
//!
//! This crate wraps the MongoDB driver behind a small [`Database`] facade that
//! owns the connection and resolves collection aliases.
//!
//! # Features
//! - Explicit connection lifecycle with a single-acquisition connect guard
//! - Collection alias table with identity fallback
//! - Merge (`$set`) or replace updates, single or multi
//! - Lazy, re-runnable find and aggregate cursors
//! - Index management and collection/database drops
//! - A [`Driver`] seam so the facade runs against any backend

pub mod connection;
pub mod cursor;
pub mod driver;
pub mod facade;
pub mod flags;
pub mod mapping;
pub mod options;
pub mod payload;
pub mod projection;

pub use connection::{MongoDriver, MongoSession};
pub use cursor::{AggregateCursor, FindCursor};
pub use docbridge_common::{DocBridgeError, Result};
pub use driver::{
    DeleteOutcome, DocumentStream, Driver, FindSpec, IndexSpec, InsertOutcome, Session,
    UpdateDocument, UpdateOutcome,
};
pub use facade::{connection_string, CollectionHandle, Database};
pub use flags::{StrictFlag, UpdateMode};
pub use mapping::CollectionMapping;
pub use options::{AggregateOptions, ConnectOptions, PoolConfig};
pub use payload::InsertPayload;
pub use projection::Projection;
