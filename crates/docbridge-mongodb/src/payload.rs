//! Insert payloads

use bson::{Bson, Document as BsonDocument};
use docbridge_common::{DocBridgeError, Result};

/// Data handed to `insert`: one document or a sequence of documents
#[derive(Debug, Clone, PartialEq)]
pub enum InsertPayload {
    One(BsonDocument),
    Many(Vec<BsonDocument>),
}

impl InsertPayload {
    /// Convert a dynamic value: arrays insert many, documents insert one
    pub fn from_bson(value: Bson) -> Result<Self> {
        match value {
            Bson::Document(doc) => Ok(InsertPayload::One(doc)),
            Bson::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Bson::Document(doc) => Ok(doc),
                    other => Err(DocBridgeError::Validation(format!(
                        "insert expects documents, got {}",
                        other
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(InsertPayload::Many),
            other => Err(DocBridgeError::Validation(format!(
                "insert expects a document or an array of documents, got {}",
                other
            ))),
        }
    }

    /// Number of documents in the payload
    pub fn len(&self) -> usize {
        match self {
            InsertPayload::One(_) => 1,
            InsertPayload::Many(docs) => docs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<BsonDocument> for InsertPayload {
    fn from(doc: BsonDocument) -> Self {
        InsertPayload::One(doc)
    }
}

impl From<Vec<BsonDocument>> for InsertPayload {
    fn from(docs: Vec<BsonDocument>) -> Self {
        InsertPayload::Many(docs)
    }
}

impl<const N: usize> From<[BsonDocument; N]> for InsertPayload {
    fn from(docs: [BsonDocument; N]) -> Self {
        InsertPayload::Many(docs.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_document_is_single() {
        let payload = InsertPayload::from(doc! { "id": "1" });
        assert_eq!(payload, InsertPayload::One(doc! { "id": "1" }));
        assert_eq!(payload.len(), 1);
    }

    #[test]
    fn test_sequence_is_many_even_with_one_item() {
        let payload = InsertPayload::from(vec![doc! { "id": "1" }]);
        assert!(matches!(payload, InsertPayload::Many(ref docs) if docs.len() == 1));
    }

    #[test]
    fn test_from_bson() {
        let one = InsertPayload::from_bson(Bson::Document(doc! { "id": "1" })).unwrap();
        assert!(matches!(one, InsertPayload::One(_)));

        let many = InsertPayload::from_bson(Bson::Array(vec![
            Bson::Document(doc! { "id": "1" }),
            Bson::Document(doc! { "id": "2" }),
        ]))
        .unwrap();
        assert_eq!(many.len(), 2);
    }

    #[test]
    fn test_from_bson_rejects_non_documents() {
        assert!(InsertPayload::from_bson(Bson::String("x".into())).is_err());
        assert!(InsertPayload::from_bson(Bson::Array(vec![Bson::Int32(1)])).is_err());
    }
}
