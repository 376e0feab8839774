use crate::collection::{
    BulkWriteResult, Document, FindOptions, IdLookup, IdentifierCodec, InsertOneResult, ObjectId,
    UpdateResult,
};
use crate::common::{Value, OP_SET};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::pagination::{CursorPaginator, Edge, PagePlan, PageRequest};
use crate::repository::mapper::id_attribute_of;
use crate::repository::{Entity, Model, ModelId, ModelMapper};
use crate::repository_config::RepositoryConfig;
use crate::store::WriteOperation;
use std::marker::PhantomData;

/// Outcome of a save.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveResult {
    /// The model had no identifier and was inserted; the assigned identifier
    /// has been written back onto it.
    Inserted(InsertOneResult),
    /// The model had an identifier and was upserted on it.
    Upserted(UpdateResult),
}

impl SaveResult {
    /// The identifier the store reported, if the save created a document.
    pub fn created_id(&self) -> Option<&Value> {
        match self {
            SaveResult::Inserted(result) => Some(result.inserted_id()),
            SaveResult::Upserted(result) => result.upserted_id(),
        }
    }
}

/// The write a save resolves to.
pub(crate) enum SavePlan {
    Insert(Document),
    Upsert { filter: Document, update: Document },
}

/// Mapping, filter building and pagination shared by the blocking and the
/// async repository. Nothing here talks to a store.
pub(crate) struct RepositoryCore<M> {
    config: RepositoryConfig,
    mapper: ModelMapper,
    paginator: CursorPaginator,
    _phantom: PhantomData<fn() -> M>,
}

impl<M: Model> RepositoryCore<M> {
    pub(crate) fn new(config: RepositoryConfig) -> RepoResult<RepositoryCore<M>> {
        config.validate()?;

        let schema = M::schema();
        schema.validate()?;
        if schema.id().is_none() {
            log::error!("{} declares no identifier attribute", schema.name());
            return Err(RepoError::new(
                &format!("{} declares no identifier attribute", schema.name()),
                ErrorKind::InvalidConfiguration,
            ));
        }

        let identity_key = config.get_identity_key().to_string();
        Ok(RepositoryCore {
            config,
            mapper: ModelMapper::new(&identity_key),
            paginator: CursorPaginator::new(&identity_key),
            _phantom: PhantomData,
        })
    }

    pub(crate) fn collection_name(&self) -> &str {
        self.config.collection_name()
    }

    pub(crate) fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub(crate) fn mapper(&self) -> &ModelMapper {
        &self.mapper
    }

    fn id_attribute(&self) -> &str {
        id_attribute_of(M::schema())
    }

    pub(crate) fn id_filter(&self, id: ObjectId) -> Document {
        let mut filter = Document::new();
        filter.insert(self.mapper.identity_key(), Value::ObjectId(id));
        filter
    }

    pub(crate) fn lookup_filter(&self, id: IdLookup) -> RepoResult<Document> {
        Ok(self.id_filter(id.resolve()?))
    }

    /// Filter matching the stored document of `model`, or `None` when the
    /// model has no identifier.
    pub(crate) fn model_filter(&self, model: &M) -> RepoResult<Option<Document>> {
        match model.id() {
            Some(id) => Ok(Some(self.id_filter(id.to_object_id()?))),
            None => Ok(None),
        }
    }

    pub(crate) fn save_plan(&self, model: &M) -> RepoResult<SavePlan> {
        let mut document = self.mapper.to_document(model)?;
        match document.remove_key(self.mapper.identity_key()) {
            None => Ok(SavePlan::Insert(document)),
            Some(id) => {
                let mut filter = Document::new();
                filter.insert(self.mapper.identity_key(), id);

                let mut update = Document::new();
                update.insert(OP_SET, Value::Document(document));
                Ok(SavePlan::Upsert { filter, update })
            }
        }
    }

    pub(crate) fn save_many_operations(&self, models: &[M]) -> RepoResult<Vec<WriteOperation>> {
        models
            .iter()
            .map(|model| {
                Ok(match self.save_plan(model)? {
                    SavePlan::Insert(document) => WriteOperation::InsertOne { document },
                    SavePlan::Upsert { filter, update } => WriteOperation::UpdateOne {
                        filter,
                        update,
                        upsert: true,
                    },
                })
            })
            .collect()
    }

    /// Writes a store assigned identifier back onto `model`.
    pub(crate) fn assign_id(&self, model: &mut M, id: &Value) -> RepoResult<()> {
        let id = IdentifierCodec::from_value(id)?;
        model.set_id(M::Id::from_object_id(id));
        Ok(())
    }

    /// Writes the identifiers of inserted operations back onto the models
    /// they came from.
    pub(crate) fn assign_ids(&self, models: &mut [M], result: &BulkWriteResult) -> RepoResult<()> {
        for (index, id) in result.inserted_ids() {
            match models.get_mut(*index) {
                Some(model) => self.assign_id(model, id)?,
                None => {
                    log::error!("Store reported an insert at unknown position {}", index);
                    return Err(RepoError::new(
                        &format!("Store reported an insert at unknown position {}", index),
                        ErrorKind::InternalError,
                    ));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn map_query(&self, query: &Document) -> Document {
        self.mapper.map_query(query, self.id_attribute())
    }

    pub(crate) fn map_find_options(&self, options: &FindOptions) -> FindOptions {
        self.mapper.map_find_options(options, self.id_attribute())
    }

    pub(crate) fn plan_page(&self, request: &PageRequest) -> RepoResult<PagePlan> {
        let id_attribute = self.id_attribute();
        let request = request
            .clone()
            .with_query(self.mapper.map_query(request.query_doc(), id_attribute))
            .with_sort(request.sort_spec().map(|s| self.mapper.map_sort(s, id_attribute)))
            .with_projection(
                request
                    .projection_doc()
                    .map(|p| self.mapper.map_query(p, id_attribute)),
            );
        self.paginator.plan(&request)
    }

    pub(crate) fn to_edges<O: Entity>(&self, plan: &PagePlan, documents: Vec<Document>) -> RepoResult<Vec<Edge<O>>> {
        documents
            .into_iter()
            .map(|document| {
                let cursor = plan.cursor_for(&document)?;
                let node = self.mapper.to_model::<O>(document)?;
                Ok(Edge::new(node, cursor))
            })
            .collect()
    }
}
