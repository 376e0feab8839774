use chrono::{DateTime, TimeDelta, Utc};
use docrepo::collection::{
    BulkWriteResult, DeleteResult, Document, FindOptions, InsertManyResult, InsertOneResult, ObjectId,
    UpdateOptions, UpdateResult,
};
use docrepo::errors::RepoResult;
use docrepo::repository::{AsyncRepository, Model, Repository};
use docrepo::repository_config::RepositoryConfig;
use docrepo::store::memory::MemoryStore;
use docrepo::store::{DocumentStore, DocumentStream, WriteOperation};
use docrepo_derive::{Convertible, Entity};
use fake::faker::lorem::en::Word;
use fake::faker::name::en::FirstName;
use fake::Fake;
use rand::{rng, Rng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Runs a test between a setup and a teardown step. The teardown runs even
/// when the test fails.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: FnOnce(TestContext) -> RepoResult<()>,
    B: FnOnce() -> RepoResult<TestContext>,
    A: FnOnce(TestContext) -> RepoResult<()>,
{
    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let result = test(ctx.clone());
    let teardown = after(ctx);

    if let Err(e) = result {
        panic!("Test failed: {:?}", e);
    }
    if let Err(e) = teardown {
        panic!("After run failed: {:?}", e);
    }
}

#[derive(Clone)]
pub struct TestContext {
    store: MemoryStore,
}

impl TestContext {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> MemoryStore {
        self.store.clone()
    }

    pub fn repository<M: Model>(&self, collection_name: &str) -> RepoResult<Repository<M, MemoryStore>> {
        Repository::new(self.store(), RepositoryConfig::new(collection_name))
    }

    pub fn async_repository<M: Model + Send + Sync>(
        &self,
        collection_name: &str,
    ) -> RepoResult<AsyncRepository<M, MemoryStore>> {
        AsyncRepository::new(self.store(), RepositoryConfig::new(collection_name))
    }
}

pub fn create_test_context() -> RepoResult<TestContext> {
    Ok(TestContext::new(MemoryStore::new()))
}

pub fn cleanup(ctx: TestContext) -> RepoResult<()> {
    let store = ctx.store();
    for name in store.collection_names() {
        store.drop_collection(&name);
    }
    Ok(())
}

pub fn is_sorted<T: PartialOrd>(iterable: impl IntoIterator<Item = T>, ascending: bool) -> bool {
    let mut iter = iterable.into_iter();
    if let Some(mut prev) = iter.next() {
        for current in iter {
            if ascending {
                if prev > current {
                    return false;
                }
            } else if prev < current {
                return false;
            }
            prev = current;
        }
    }
    true
}

/// A [MemoryStore] that counts every call made to it.
#[derive(Clone)]
pub struct CountingStore {
    inner: MemoryStore,
    calls: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Self {
        CountingStore {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl DocumentStore for CountingStore {
    fn insert_one(&self, collection: &str, document: Document) -> RepoResult<InsertOneResult> {
        self.count();
        self.inner.insert_one(collection, document)
    }

    fn insert_many(&self, collection: &str, documents: Vec<Document>) -> RepoResult<InsertManyResult> {
        self.count();
        self.inner.insert_many(collection, documents)
    }

    fn update_one(
        &self,
        collection: &str,
        filter: &Document,
        update: &Document,
        options: &UpdateOptions,
    ) -> RepoResult<UpdateResult> {
        self.count();
        self.inner.update_one(collection, filter, update, options)
    }

    fn bulk_write(&self, collection: &str, operations: Vec<WriteOperation>) -> RepoResult<BulkWriteResult> {
        self.count();
        self.inner.bulk_write(collection, operations)
    }

    fn delete_one(&self, collection: &str, filter: &Document) -> RepoResult<DeleteResult> {
        self.count();
        self.inner.delete_one(collection, filter)
    }

    fn find<'a>(
        &'a self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> RepoResult<DocumentStream<'a>> {
        self.count();
        self.inner.find(collection, filter, options)
    }

    fn find_one(&self, collection: &str, filter: &Document, options: &FindOptions) -> RepoResult<Option<Document>> {
        self.count();
        self.inner.find_one(collection, filter, options)
    }

    fn count_documents(&self, collection: &str, filter: &Document) -> RepoResult<u64> {
        self.count();
        self.inner.count_documents(collection, filter)
    }

    fn aggregate<'a>(&'a self, collection: &str, pipeline: &[Document]) -> RepoResult<DocumentStream<'a>> {
        self.count();
        self.inner.aggregate(collection, pipeline)
    }
}

// =============================================================================
// MODELS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Convertible, Entity)]
pub struct Foo {
    pub count: i32,
    pub size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Convertible, Entity)]
pub struct Bar {
    pub apple: String,
    #[converter(default)]
    pub banana: String,
}

#[derive(Debug, Clone, PartialEq, Convertible, Entity)]
#[entity(name = "spams")]
pub struct Spam {
    pub id: Option<ObjectId>,
    pub name: String,
    pub foo: Foo,
    pub bars: Vec<Bar>,
}

/// Projection of [Spam] without its bars.
#[derive(Debug, Clone, PartialEq, Convertible, Entity)]
pub struct SpamSummary {
    pub id: Option<ObjectId>,
    pub name: String,
    pub foo: Foo,
}

#[derive(Debug, Clone, Copy, PartialEq, Convertible)]
pub enum Status {
    Open,
    InProgress,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Convertible)]
pub enum Estimate {
    Points(i32),
    Range { low: i32, high: i32 },
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Convertible, Entity)]
pub struct Comment {
    pub id: Option<String>,
    pub author: String,
    pub text: String,
}

/// A model keeping its identifier as text.
#[derive(Debug, Clone, PartialEq, Convertible, Entity)]
pub struct Ticket {
    pub id: Option<String>,
    pub title: String,
    pub status: Status,
    pub priority: i32,
    pub estimate: Option<Estimate>,
    pub comments: Vec<Comment>,
    #[converter(ignored)]
    pub dirty: bool,
}

/// A model whose identifier attribute is not called `id`.
#[derive(Debug, Clone, PartialEq, Convertible, Entity)]
#[entity(id(field = "code"))]
pub struct Country {
    pub code: Option<ObjectId>,
    pub name: String,
}

/// Output of a counting pipeline. Without identifier attribute it can be
/// read but not stored.
#[derive(Debug, Clone, PartialEq, Convertible, Entity)]
pub struct SpamCount {
    pub total: i64,
}

/// A model ordered by a timestamp.
#[derive(Debug, Clone, PartialEq, Convertible, Entity)]
#[entity(name = "events")]
pub struct Event {
    pub id: Option<ObjectId>,
    pub title: String,
    pub happened_at: DateTime<Utc>,
}

pub fn generate_spam(count: i32) -> Spam {
    Spam {
        id: None,
        name: FirstName().fake(),
        foo: Foo {
            count,
            size: Some(rng().random_range(0.0..100.0)),
        },
        bars: (0..rng().random_range(1..4))
            .map(|_| Bar {
                apple: Word().fake(),
                banana: Word().fake(),
            })
            .collect(),
    }
}

pub fn generate_spams(count: i32) -> Vec<Spam> {
    (0..count).map(generate_spam).collect()
}

pub fn generate_ticket(title: &str, priority: i32) -> Ticket {
    Ticket {
        id: None,
        title: title.to_string(),
        status: Status::Open,
        priority,
        estimate: None,
        comments: vec![],
        dirty: false,
    }
}

/// Event `minutes` after a fixed instant.
pub fn generate_event(minutes: i64) -> Event {
    let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default();
    Event {
        id: None,
        title: Word().fake(),
        happened_at: start + TimeDelta::minutes(minutes),
    }
}
