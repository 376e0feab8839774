use crate::collection::{
    BulkWriteResult, DeleteResult, Document, InsertOneResult, ObjectId, UpdateResult,
};
use crate::common::Value;
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::store::memory::filter::matches;
use crate::store::memory::update::{apply_update, is_operator_update, upsert_seed};
use crate::store::WriteOperation;
use indexmap::IndexMap;

/// Documents of one collection, keyed by identity value in insertion order.
pub(crate) struct MemoryCollection {
    identity_key: String,
    documents: IndexMap<Value, Document>,
}

impl MemoryCollection {
    pub(crate) fn new(identity_key: &str) -> MemoryCollection {
        MemoryCollection {
            identity_key: identity_key.to_string(),
            documents: IndexMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.documents.len()
    }

    pub(crate) fn insert(&mut self, mut document: Document) -> RepoResult<InsertOneResult> {
        let id = match document.get_key(&self.identity_key) {
            None | Some(Value::Null) => {
                let id = Value::ObjectId(ObjectId::new());
                document.insert(self.identity_key.clone(), id.clone());
                id
            }
            Some(id) => id.clone(),
        };

        if self.documents.contains_key(&id) {
            log::error!("Duplicate {} {} in collection", self.identity_key, id);
            return Err(RepoError::new(
                &format!("Duplicate key error: {} {}", self.identity_key, id),
                ErrorKind::DuplicateKey,
            ));
        }

        self.documents.insert(id.clone(), document);
        Ok(InsertOneResult::new(id))
    }

    pub(crate) fn update_one(
        &mut self,
        filter: &Document,
        update: &Document,
        upsert: bool,
    ) -> RepoResult<UpdateResult> {
        is_operator_update(update)?;

        let mut target = None;
        for (id, doc) in self.documents.iter() {
            if matches(doc, filter)? {
                target = Some(id.clone());
                break;
            }
        }

        match target {
            Some(id) => {
                let current = match self.documents.get(&id) {
                    Some(doc) => doc,
                    None => return Ok(UpdateResult::new(0, 0, None)),
                };
                let updated = apply_update(current, update, &self.identity_key)?;
                if &updated == current {
                    return Ok(UpdateResult::new(1, 0, None));
                }
                self.documents.insert(id, updated);
                Ok(UpdateResult::new(1, 1, None))
            }
            None if upsert => {
                let seed = upsert_seed(filter)?;
                let document = apply_update(&seed, update, &self.identity_key)?;
                let inserted = self.insert(document)?;
                Ok(UpdateResult::new(0, 0, Some(inserted.inserted_id().clone())))
            }
            None => Ok(UpdateResult::new(0, 0, None)),
        }
    }

    pub(crate) fn delete_one(&mut self, filter: &Document) -> RepoResult<DeleteResult> {
        let mut target = None;
        for (id, doc) in self.documents.iter() {
            if matches(doc, filter)? {
                target = Some(id.clone());
                break;
            }
        }

        Ok(match target {
            Some(id) => {
                self.documents.shift_remove(&id);
                DeleteResult::new(1)
            }
            None => DeleteResult::new(0),
        })
    }

    /// Clones every matching document, in insertion order.
    pub(crate) fn find(&self, filter: &Document) -> RepoResult<Vec<Document>> {
        let mut result = Vec::new();
        for doc in self.documents.values() {
            if matches(doc, filter)? {
                result.push(doc.clone());
            }
        }
        Ok(result)
    }

    pub(crate) fn count(&self, filter: &Document) -> RepoResult<u64> {
        if filter.is_empty() {
            return Ok(self.documents.len() as u64);
        }

        let mut count = 0;
        for doc in self.documents.values() {
            if matches(doc, filter)? {
                count += 1;
            }
        }
        Ok(count)
    }

    pub(crate) fn all(&self) -> Vec<Document> {
        self.documents.values().cloned().collect()
    }

    /// Applies a batch in order, stopping at the first failing operation.
    /// Operations before the failure stay applied.
    pub(crate) fn bulk_write(&mut self, operations: Vec<WriteOperation>) -> RepoResult<BulkWriteResult> {
        let mut result = BulkWriteResult::new();
        for (index, operation) in operations.into_iter().enumerate() {
            let outcome = match operation {
                WriteOperation::InsertOne { document } => {
                    self.insert(document).map(|r| result.record_insert(index, r))
                }
                WriteOperation::UpdateOne {
                    filter,
                    update,
                    upsert,
                } => self
                    .update_one(&filter, &update, upsert)
                    .map(|r| result.record_update(index, r)),
                WriteOperation::DeleteOne { filter } => {
                    self.delete_one(&filter).map(|r| result.record_delete(r))
                }
            };

            if let Err(err) = outcome {
                log::error!("Bulk write stopped at operation {}: {}", index, err);
                return Err(RepoError::new_with_cause(
                    &format!("Bulk write failed at operation {}", index),
                    err.kind().clone(),
                    err,
                ));
            }
        }
        Ok(result)
    }
}
