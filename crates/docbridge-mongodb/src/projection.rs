//! Field selection for find queries

use bson::{Bson, Document as BsonDocument};
use docbridge_common::{DocBridgeError, Result};

/// Which fields a find query returns
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Field names to include; each becomes `{ field: 1 }`
    Fields(Vec<String>),
    /// A projection document passed to the driver unchanged
    Document(BsonDocument),
}

impl Projection {
    /// Build an inclusion projection from a list of field names
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Fields(fields.into_iter().map(Into::into).collect())
    }

    /// Convert a dynamic value: arrays are field lists, documents pass through
    pub fn from_bson(value: Bson) -> Result<Self> {
        match value {
            Bson::Document(doc) => Ok(Projection::Document(doc)),
            Bson::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Bson::String(field) => Ok(field),
                    other => Err(DocBridgeError::Validation(format!(
                        "projection field names must be strings, got {}",
                        other
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Projection::Fields),
            other => Err(DocBridgeError::Validation(format!(
                "projection must be an array or a document, got {}",
                other
            ))),
        }
    }

    /// The projection document submitted to the driver
    pub fn to_document(&self) -> BsonDocument {
        match self {
            Projection::Fields(fields) => fields
                .iter()
                .map(|field| (field.clone(), Bson::Int32(1)))
                .collect(),
            Projection::Document(doc) => doc.clone(),
        }
    }
}

impl From<BsonDocument> for Projection {
    fn from(doc: BsonDocument) -> Self {
        Projection::Document(doc)
    }
}

impl From<Vec<String>> for Projection {
    fn from(fields: Vec<String>) -> Self {
        Projection::Fields(fields)
    }
}

impl From<Vec<&str>> for Projection {
    fn from(fields: Vec<&str>) -> Self {
        Projection::fields(fields)
    }
}

impl<const N: usize> From<[&str; N]> for Projection {
    fn from(fields: [&str; N]) -> Self {
        Projection::fields(fields)
    }
}

impl From<&[&str]> for Projection {
    fn from(fields: &[&str]) -> Self {
        Projection::fields(fields.iter().copied())
    }
}
