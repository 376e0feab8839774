use crate::collection::{
    BulkWriteResult, DeleteResult, Document, FindOptions, InsertManyResult, InsertOneResult,
    UpdateOptions, UpdateResult,
};
use crate::errors::RepoResult;
use async_trait::async_trait;

/// A lazy, forward-only sequence of documents produced by a store.
pub type DocumentStream<'a> = Box<dyn Iterator<Item = RepoResult<Document>> + Send + 'a>;

/// One write of a [DocumentStore::bulk_write] batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOperation {
    InsertOne {
        document: Document,
    },
    UpdateOne {
        filter: Document,
        update: Document,
        upsert: bool,
    },
    DeleteOne {
        filter: Document,
    },
}

/// Blocking, collection scoped access to a document database.
///
/// Filters, updates, projections and pipelines are documents in the store's
/// own query language; the repository layer forwards them without
/// interpreting them. Errors reported by an implementation reach the caller
/// unchanged.
pub trait DocumentStore: Send + Sync {
    /// Inserts a document, assigning an identity value when it has none.
    fn insert_one(&self, collection: &str, document: Document) -> RepoResult<InsertOneResult>;

    fn insert_many(&self, collection: &str, documents: Vec<Document>) -> RepoResult<InsertManyResult>;

    fn update_one(
        &self,
        collection: &str,
        filter: &Document,
        update: &Document,
        options: &UpdateOptions,
    ) -> RepoResult<UpdateResult>;

    /// Applies the operations in order and reports their combined outcome.
    fn bulk_write(&self, collection: &str, operations: Vec<WriteOperation>) -> RepoResult<BulkWriteResult>;

    fn delete_one(&self, collection: &str, filter: &Document) -> RepoResult<DeleteResult>;

    fn find<'a>(
        &'a self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> RepoResult<DocumentStream<'a>>;

    fn find_one(
        &self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> RepoResult<Option<Document>> {
        let options = options.clone().limit(1);
        let mut stream = self.find(collection, filter, &options)?;
        stream.next().transpose()
    }

    fn count_documents(&self, collection: &str, filter: &Document) -> RepoResult<u64>;

    fn aggregate<'a>(&'a self, collection: &str, pipeline: &[Document]) -> RepoResult<DocumentStream<'a>>;
}

/// Asynchronous counterpart of [DocumentStore].
///
/// Reads return materialized batches; an implementation decides how much it
/// fetches per round trip.
#[async_trait]
pub trait AsyncDocumentStore: Send + Sync {
    async fn insert_one(&self, collection: &str, document: Document) -> RepoResult<InsertOneResult>;

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> RepoResult<InsertManyResult>;

    async fn update_one(
        &self,
        collection: &str,
        filter: &Document,
        update: &Document,
        options: &UpdateOptions,
    ) -> RepoResult<UpdateResult>;

    async fn bulk_write(
        &self,
        collection: &str,
        operations: Vec<WriteOperation>,
    ) -> RepoResult<BulkWriteResult>;

    async fn delete_one(&self, collection: &str, filter: &Document) -> RepoResult<DeleteResult>;

    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> RepoResult<Vec<Document>>;

    async fn find_one(
        &self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> RepoResult<Option<Document>> {
        let options = options.clone().limit(1);
        let documents = self.find(collection, filter, &options).await?;
        Ok(documents.into_iter().next())
    }

    async fn count_documents(&self, collection: &str, filter: &Document) -> RepoResult<u64>;

    async fn aggregate(&self, collection: &str, pipeline: &[Document]) -> RepoResult<Vec<Document>>;
}
