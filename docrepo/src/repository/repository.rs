use crate::collection::{
    BulkWriteResult, DeleteResult, Document, FindOptions, IdLookup, UpdateOptions,
};
use crate::errors::RepoResult;
use crate::pagination::{Edge, PageRequest};
use crate::repository::repository_core::{RepositoryCore, SavePlan};
use crate::repository::{Entity, Model, ModelCursor, ModelMapper, SaveResult};
use crate::repository_config::RepositoryConfig;
use crate::store::{DocumentStore, DocumentStream};
use std::sync::Arc;

/// A typed, blocking repository of `M` models over a [DocumentStore].
///
/// # Purpose
///
/// `Repository` maps models to documents and back, translates identifiers
/// between the model's representation and the store's native
/// [ObjectId](crate::collection::ObjectId), and pages through query results
/// with opaque cursors. It keeps no state besides its configuration: every
/// call is one independent round trip to the store.
///
/// # Characteristics
///
/// - **Generic Over Model Type**: works with any `M: Model`, driven by the
///   model's [Schema](crate::common::Schema)
/// - **Pass-Through Queries**: query documents reach the store unchanged,
///   except that a top-level `id` key is renamed to the identity key
/// - **Cheap Clones**: clones share the configuration
///
/// # Examples
///
/// ```rust,ignore
/// let repository = Repository::<Spam, _>::new(MemoryStore::new(), RepositoryConfig::new("spams"))?;
///
/// let mut spam = Spam::new("spam");
/// repository.save(&mut spam)?;
/// assert!(spam.id.is_some());
///
/// let found = repository.find_one_by_id(spam.id.unwrap())?;
/// ```
pub struct Repository<M, S> {
    store: S,
    core: Arc<RepositoryCore<M>>,
}

impl<M, S> Clone for Repository<M, S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Repository {
            store: self.store.clone(),
            core: self.core.clone(),
        }
    }
}

impl<M, S> Repository<M, S>
where
    M: Model,
    S: DocumentStore,
{
    /// Creates a repository after validating `config` and the schema of `M`.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::InvalidConfiguration](crate::errors::ErrorKind::InvalidConfiguration)
    /// for an invalid configuration or schema.
    pub fn new(store: S, config: RepositoryConfig) -> RepoResult<Repository<M, S>> {
        let core = RepositoryCore::new(config)?;
        Ok(Repository {
            store,
            core: Arc::new(core),
        })
    }

    pub fn collection_name(&self) -> &str {
        self.core.collection_name()
    }

    pub fn config(&self) -> &RepositoryConfig {
        self.core.config()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn mapper(&self) -> &ModelMapper {
        self.core.mapper()
    }

    /// Inserts or upserts a model.
    ///
    /// # Behavior
    ///
    /// - Without an identifier the model is inserted and the identifier the
    ///   store assigns is written back onto it
    /// - With an identifier the stored document is upserted on it with a
    ///   `$set` of the mapped fields, so saving an unchanged model modifies
    ///   nothing
    pub fn save(&self, model: &mut M) -> RepoResult<SaveResult> {
        match self.core.save_plan(model)? {
            SavePlan::Insert(document) => {
                let result = self.store.insert_one(self.collection_name(), document)?;
                self.core.assign_id(model, result.inserted_id())?;
                log::debug!("Inserted {} into {}", result.inserted_id(), self.collection_name());
                Ok(SaveResult::Inserted(result))
            }
            SavePlan::Upsert { filter, update } => {
                let result = self.store.update_one(
                    self.collection_name(),
                    &filter,
                    &update,
                    &UpdateOptions::new(true),
                )?;
                Ok(SaveResult::Upserted(result))
            }
        }
    }

    /// Saves all models with a single bulk write.
    ///
    /// # Behavior
    ///
    /// - An empty slice returns an empty result without calling the store
    /// - Operations run in input order; identifiers assigned to inserted
    ///   models are written back in the same order
    /// - Atomicity is that of the store's bulk write. A failing batch may
    ///   leave earlier operations applied, and no identifiers are written
    ///   back in that case
    pub fn save_many(&self, models: &mut [M]) -> RepoResult<BulkWriteResult> {
        if models.is_empty() {
            return Ok(BulkWriteResult::new());
        }

        let operations = self.core.save_many_operations(models)?;
        let result = self.store.bulk_write(self.collection_name(), operations)?;
        self.core.assign_ids(models, &result)?;
        Ok(result)
    }

    /// Deletes the stored document of `model`. A model without an
    /// identifier deletes nothing.
    pub fn delete(&self, model: &M) -> RepoResult<DeleteResult> {
        match self.core.model_filter(model)? {
            Some(filter) => self.store.delete_one(self.collection_name(), &filter),
            None => {
                log::warn!("Deleting a model without identifier from {}", self.collection_name());
                Ok(DeleteResult::new(0))
            }
        }
    }

    pub fn delete_by_id(&self, id: impl Into<IdLookup>) -> RepoResult<DeleteResult> {
        let filter = self.core.lookup_filter(id.into())?;
        self.store.delete_one(self.collection_name(), &filter)
    }

    /// Finds a model by identifier, given natively or as text.
    pub fn find_one_by_id(&self, id: impl Into<IdLookup>) -> RepoResult<Option<M>> {
        let filter = self.core.lookup_filter(id.into())?;
        self.find_one_by(&filter)
    }

    pub fn find_one_by(&self, query: &Document) -> RepoResult<Option<M>> {
        let query = self.core.map_query(query);
        match self.store.find_one(self.collection_name(), &query, &FindOptions::new())? {
            Some(document) => Ok(Some(self.core.mapper().to_model(document)?)),
            None => Ok(None),
        }
    }

    /// Finds models matching `query`, mapped lazily while iterating.
    pub fn find_by(&self, query: &Document, options: &FindOptions) -> RepoResult<ModelCursor<'_, M>> {
        self.find_by_with_output_type::<M>(query, options)
    }

    /// Like [Repository::find_by] but maps results into `O`, typically a
    /// projection of `M` used together with a projection document.
    pub fn find_by_with_output_type<O: Entity>(
        &self,
        query: &Document,
        options: &FindOptions,
    ) -> RepoResult<ModelCursor<'_, O>> {
        let query = self.core.map_query(query);
        let options = self.core.map_find_options(options);
        let stream = self.store.find(self.collection_name(), &query, &options)?;
        Ok(ModelCursor::new(stream, self.core.mapper().clone()))
    }

    pub fn count(&self, query: &Document) -> RepoResult<u64> {
        let query = self.core.map_query(query);
        self.store.count_documents(self.collection_name(), &query)
    }

    /// Returns one page of models as edges, see [PageRequest].
    ///
    /// # Errors
    ///
    /// - [InvalidOperation](crate::errors::ErrorKind::InvalidOperation) for a
    ///   zero limit or when both `after` and `before` are given
    /// - [InvalidCursor](crate::errors::ErrorKind::InvalidCursor) for a
    ///   malformed cursor or one issued under another sort
    pub fn paginate(&self, request: &PageRequest) -> RepoResult<Vec<Edge<M>>> {
        self.paginate_with_output_type::<M>(request)
    }

    pub fn paginate_with_output_type<O: Entity>(&self, request: &PageRequest) -> RepoResult<Vec<Edge<O>>> {
        let plan = self.core.plan_page(request)?;
        let documents = self
            .store
            .find(self.collection_name(), plan.filter(), plan.options())?
            .collect::<RepoResult<Vec<_>>>()?;
        self.core.to_edges(&plan, documents)
    }

    /// Runs an aggregation pipeline and returns the raw documents.
    pub fn aggregate(&self, pipeline: &[Document]) -> RepoResult<DocumentStream<'_>> {
        self.store.aggregate(self.collection_name(), pipeline)
    }

    pub fn aggregate_with_output_type<O: Entity>(&self, pipeline: &[Document]) -> RepoResult<ModelCursor<'_, O>> {
        let stream = self.store.aggregate(self.collection_name(), pipeline)?;
        Ok(ModelCursor::new(stream, self.core.mapper().clone()))
    }
}
