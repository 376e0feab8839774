use crate::collection::{
    BulkWriteResult, DeleteResult, Document, FindOptions, IdLookup, UpdateOptions,
};
use crate::errors::RepoResult;
use crate::pagination::{Edge, PageRequest};
use crate::repository::repository_core::{RepositoryCore, SavePlan};
use crate::repository::{Entity, Model, ModelCursor, ModelMapper, SaveResult};
use crate::repository_config::RepositoryConfig;
use crate::store::AsyncDocumentStore;
use std::sync::Arc;

/// Async counterpart of [Repository](crate::repository::Repository) over an
/// [AsyncDocumentStore].
///
/// Mapping, identifier translation and cursor computation run synchronously
/// and are shared with the blocking repository; each method awaits only its
/// store round trip. Dropping a returned future abandons the in-flight store
/// call, and store errors are returned unchanged.
///
/// Reads materialize the store's batch first; models are still mapped
/// lazily by the returned [ModelCursor].
pub struct AsyncRepository<M, S> {
    store: S,
    core: Arc<RepositoryCore<M>>,
}

impl<M, S> Clone for AsyncRepository<M, S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        AsyncRepository {
            store: self.store.clone(),
            core: self.core.clone(),
        }
    }
}

impl<M, S> AsyncRepository<M, S>
where
    M: Model + Send + Sync,
    S: AsyncDocumentStore,
{
    pub fn new(store: S, config: RepositoryConfig) -> RepoResult<AsyncRepository<M, S>> {
        let core = RepositoryCore::new(config)?;
        Ok(AsyncRepository {
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

    pub async fn save(&self, model: &mut M) -> RepoResult<SaveResult> {
        match self.core.save_plan(model)? {
            SavePlan::Insert(document) => {
                let result = self.store.insert_one(self.collection_name(), document).await?;
                self.core.assign_id(model, result.inserted_id())?;
                log::debug!("Inserted {} into {}", result.inserted_id(), self.collection_name());
                Ok(SaveResult::Inserted(result))
            }
            SavePlan::Upsert { filter, update } => {
                let result = self
                    .store
                    .update_one(self.collection_name(), &filter, &update, &UpdateOptions::new(true))
                    .await?;
                Ok(SaveResult::Upserted(result))
            }
        }
    }

    pub async fn save_many(&self, models: &mut [M]) -> RepoResult<BulkWriteResult> {
        if models.is_empty() {
            return Ok(BulkWriteResult::new());
        }

        let operations = self.core.save_many_operations(models)?;
        let result = self.store.bulk_write(self.collection_name(), operations).await?;
        self.core.assign_ids(models, &result)?;
        Ok(result)
    }

    pub async fn delete(&self, model: &M) -> RepoResult<DeleteResult> {
        match self.core.model_filter(model)? {
            Some(filter) => self.store.delete_one(self.collection_name(), &filter).await,
            None => {
                log::warn!("Deleting a model without identifier from {}", self.collection_name());
                Ok(DeleteResult::new(0))
            }
        }
    }

    pub async fn delete_by_id(&self, id: impl Into<IdLookup>) -> RepoResult<DeleteResult> {
        let filter = self.core.lookup_filter(id.into())?;
        self.store.delete_one(self.collection_name(), &filter).await
    }

    pub async fn find_one_by_id(&self, id: impl Into<IdLookup>) -> RepoResult<Option<M>> {
        let filter = self.core.lookup_filter(id.into())?;
        self.find_one_by(&filter).await
    }

    pub async fn find_one_by(&self, query: &Document) -> RepoResult<Option<M>> {
        let query = self.core.map_query(query);
        let found = self
            .store
            .find_one(self.collection_name(), &query, &FindOptions::new())
            .await?;
        match found {
            Some(document) => Ok(Some(self.core.mapper().to_model(document)?)),
            None => Ok(None),
        }
    }

    pub async fn find_by(&self, query: &Document, options: &FindOptions) -> RepoResult<ModelCursor<'static, M>> {
        self.find_by_with_output_type::<M>(query, options).await
    }

    pub async fn find_by_with_output_type<O: Entity>(
        &self,
        query: &Document,
        options: &FindOptions,
    ) -> RepoResult<ModelCursor<'static, O>> {
        let query = self.core.map_query(query);
        let options = self.core.map_find_options(options);
        let documents = self.store.find(self.collection_name(), &query, &options).await?;
        Ok(ModelCursor::new(
            Box::new(documents.into_iter().map(Ok)),
            self.core.mapper().clone(),
        ))
    }

    pub async fn count(&self, query: &Document) -> RepoResult<u64> {
        let query = self.core.map_query(query);
        self.store.count_documents(self.collection_name(), &query).await
    }

    pub async fn paginate(&self, request: &PageRequest) -> RepoResult<Vec<Edge<M>>> {
        self.paginate_with_output_type::<M>(request).await
    }

    pub async fn paginate_with_output_type<O: Entity>(&self, request: &PageRequest) -> RepoResult<Vec<Edge<O>>> {
        let plan = self.core.plan_page(request)?;
        let documents = self
            .store
            .find(self.collection_name(), plan.filter(), plan.options())
            .await?;
        self.core.to_edges(&plan, documents)
    }

    pub async fn aggregate(&self, pipeline: &[Document]) -> RepoResult<Vec<Document>> {
        self.store.aggregate(self.collection_name(), pipeline).await
    }

    pub async fn aggregate_with_output_type<O: Entity>(&self, pipeline: &[Document]) -> RepoResult<Vec<O>> {
        let documents = self.store.aggregate(self.collection_name(), pipeline).await?;
        documents
            .into_iter()
            .map(|document| self.core.mapper().to_model(document))
            .collect()
    }
}
