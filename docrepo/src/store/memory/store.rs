use crate::collection::{
    BulkWriteResult, DeleteResult, Document, FindOptions, InsertManyResult, InsertOneResult,
    UpdateOptions, UpdateResult,
};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::store::memory::collection::MemoryCollection;
use crate::store::memory::config::MemoryStoreConfig;
use crate::store::memory::pipeline::{aggregate, apply_find_options};
use crate::store::{AsyncDocumentStore, DocumentStore, DocumentStream, WriteOperation};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// In-memory implementation of [DocumentStore] and [AsyncDocumentStore].
///
/// # Purpose
/// `MemoryStore` keeps every collection in process and understands the
/// subset of the query language the repository layer emits: comparison,
/// membership, existence, regex and logical filters, `$set`/`$unset`/`$inc`
/// updates and replacements, inclusion/exclusion projections and the
/// `$match`, `$sort`, `$skip`, `$limit`, `$project` and `$count` pipeline
/// stages.
///
/// # Characteristics
/// - **Thread-Safe**: Clones share the same collections
/// - **Ordered**: Unsorted reads return documents in insertion order
/// - **Atomic Writes**: Each write, including a whole bulk write, runs under
///   the collection's write lock
///
/// # Usage
/// ```text
/// let store = MemoryStore::new();
/// let repository = Repository::<Spam, _>::new(store, RepositoryConfig::new("spams"))?;
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::with_config(MemoryStoreConfig::new())
    }

    pub fn with_config(config: MemoryStoreConfig) -> MemoryStore {
        MemoryStore {
            inner: Arc::new(MemoryStoreInner::new(config)),
        }
    }

    pub fn config(&self) -> &MemoryStoreConfig {
        &self.inner.config
    }

    /// Names of the collections written to so far, sorted.
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.collections.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Removes a collection and all its documents.
    pub fn drop_collection(&self, collection: &str) {
        self.inner.collections.remove(collection);
    }
}

impl DocumentStore for MemoryStore {
    fn insert_one(&self, collection: &str, document: Document) -> RepoResult<InsertOneResult> {
        let collection = self.inner.collection(collection)?;
        let mut guard = collection.write();
        guard.insert(document)
    }

    fn insert_many(&self, collection: &str, documents: Vec<Document>) -> RepoResult<InsertManyResult> {
        let collection = self.inner.collection(collection)?;
        let mut guard = collection.write();
        let mut inserted_ids = Vec::with_capacity(documents.len());
        for document in documents {
            let result = guard.insert(document)?;
            inserted_ids.push(result.inserted_id().clone());
        }
        Ok(InsertManyResult::new(inserted_ids))
    }

    fn update_one(
        &self,
        collection: &str,
        filter: &Document,
        update: &Document,
        options: &UpdateOptions,
    ) -> RepoResult<UpdateResult> {
        let collection = self.inner.collection(collection)?;
        let mut guard = collection.write();
        guard.update_one(filter, update, options.is_upsert())
    }

    fn bulk_write(&self, collection: &str, operations: Vec<WriteOperation>) -> RepoResult<BulkWriteResult> {
        let collection = self.inner.collection(collection)?;
        let mut guard = collection.write();
        guard.bulk_write(operations)
    }

    fn delete_one(&self, collection: &str, filter: &Document) -> RepoResult<DeleteResult> {
        let collection = self.inner.collection(collection)?;
        let mut guard = collection.write();
        guard.delete_one(filter)
    }

    fn find<'a>(
        &'a self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> RepoResult<DocumentStream<'a>> {
        let documents = self.inner.find(collection, filter, options)?;
        Ok(Box::new(documents.into_iter().map(Ok)))
    }

    fn count_documents(&self, collection: &str, filter: &Document) -> RepoResult<u64> {
        let collection = self.inner.collection(collection)?;
        let guard = collection.read();
        guard.count(filter)
    }

    fn aggregate<'a>(&'a self, collection: &str, pipeline: &[Document]) -> RepoResult<DocumentStream<'a>> {
        let documents = self.inner.aggregate(collection, pipeline)?;
        Ok(Box::new(documents.into_iter().map(Ok)))
    }
}

#[async_trait]
impl AsyncDocumentStore for MemoryStore {
    async fn insert_one(&self, collection: &str, document: Document) -> RepoResult<InsertOneResult> {
        DocumentStore::insert_one(self, collection, document)
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> RepoResult<InsertManyResult> {
        DocumentStore::insert_many(self, collection, documents)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Document,
        update: &Document,
        options: &UpdateOptions,
    ) -> RepoResult<UpdateResult> {
        DocumentStore::update_one(self, collection, filter, update, options)
    }

    async fn bulk_write(
        &self,
        collection: &str,
        operations: Vec<WriteOperation>,
    ) -> RepoResult<BulkWriteResult> {
        DocumentStore::bulk_write(self, collection, operations)
    }

    async fn delete_one(&self, collection: &str, filter: &Document) -> RepoResult<DeleteResult> {
        DocumentStore::delete_one(self, collection, filter)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> RepoResult<Vec<Document>> {
        self.inner.find(collection, filter, options)
    }

    async fn count_documents(&self, collection: &str, filter: &Document) -> RepoResult<u64> {
        DocumentStore::count_documents(self, collection, filter)
    }

    async fn aggregate(&self, collection: &str, pipeline: &[Document]) -> RepoResult<Vec<Document>> {
        self.inner.aggregate(collection, pipeline)
    }
}

#[derive(Default)]
struct MemoryStoreInner {
    config: MemoryStoreConfig,
    collections: DashMap<String, Arc<RwLock<MemoryCollection>>>,
}

impl MemoryStoreInner {
    fn new(config: MemoryStoreConfig) -> MemoryStoreInner {
        MemoryStoreInner {
            config,
            collections: DashMap::new(),
        }
    }

    fn collection(&self, name: &str) -> RepoResult<Arc<RwLock<MemoryCollection>>> {
        if name.is_empty() {
            log::error!("Collection name cannot be empty");
            return Err(RepoError::new(
                "Collection name cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }

        if let Some(collection) = self.collections.get(name) {
            return Ok(collection.value().clone());
        }

        let collection = self
            .collections
            .entry(name.to_string())
            .or_insert_with(|| {
                log::debug!("Creating in-memory collection {}", name);
                Arc::new(RwLock::new(MemoryCollection::new(self.config.get_identity_key())))
            })
            .value()
            .clone();
        Ok(collection)
    }

    // the snapshot is taken under the read lock, so a stream never observes
    // a half-applied write
    fn find(&self, name: &str, filter: &Document, options: &FindOptions) -> RepoResult<Vec<Document>> {
        let collection = self.collection(name)?;
        let documents = collection.read().find(filter)?;
        apply_find_options(documents, options, self.config.get_identity_key())
    }

    fn aggregate(&self, name: &str, pipeline: &[Document]) -> RepoResult<Vec<Document>> {
        let collection = self.collection(name)?;
        let documents = collection.read().all();
        aggregate(documents, pipeline, self.config.get_identity_key())
    }
}
