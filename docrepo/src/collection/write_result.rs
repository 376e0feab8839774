use crate::common::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct InsertOneResult {
    inserted_id: Value,
}

impl InsertOneResult {
    pub fn new(inserted_id: Value) -> Self {
        Self { inserted_id }
    }

    /// Identity key value of the inserted document.
    pub fn inserted_id(&self) -> &Value {
        &self.inserted_id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertManyResult {
    inserted_ids: Vec<Value>,
}

impl InsertManyResult {
    pub fn new(inserted_ids: Vec<Value>) -> Self {
        Self { inserted_ids }
    }

    /// Identity key values in input order.
    pub fn inserted_ids(&self) -> &[Value] {
        &self.inserted_ids
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResult {
    matched_count: u64,
    modified_count: u64,
    upserted_id: Option<Value>,
}

impl UpdateResult {
    pub fn new(matched_count: u64, modified_count: u64, upserted_id: Option<Value>) -> Self {
        Self {
            matched_count,
            modified_count,
            upserted_id,
        }
    }

    pub fn matched_count(&self) -> u64 {
        self.matched_count
    }

    /// Number of matched documents whose content actually changed.
    pub fn modified_count(&self) -> u64 {
        self.modified_count
    }

    /// Identity key value of the document inserted by an upsert.
    pub fn upserted_id(&self) -> Option<&Value> {
        self.upserted_id.as_ref()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteResult {
    deleted_count: u64,
}

impl DeleteResult {
    pub fn new(deleted_count: u64) -> Self {
        Self { deleted_count }
    }

    pub fn deleted_count(&self) -> u64 {
        self.deleted_count
    }
}

/// Outcome of a batch of writes.
///
/// Identifiers are keyed by the position of the operation that produced
/// them, so they follow input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkWriteResult {
    inserted_ids: BTreeMap<usize, Value>,
    upserted_ids: BTreeMap<usize, Value>,
    matched_count: u64,
    modified_count: u64,
    deleted_count: u64,
}

impl BulkWriteResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_insert(&mut self, index: usize, result: InsertOneResult) {
        self.inserted_ids.insert(index, result.inserted_id);
    }

    pub(crate) fn record_update(&mut self, index: usize, result: UpdateResult) {
        self.matched_count += result.matched_count;
        self.modified_count += result.modified_count;
        if let Some(id) = result.upserted_id {
            self.upserted_ids.insert(index, id);
        }
    }

    pub(crate) fn record_delete(&mut self, result: DeleteResult) {
        self.deleted_count += result.deleted_count;
    }

    pub fn inserted_ids(&self) -> &BTreeMap<usize, Value> {
        &self.inserted_ids
    }

    pub fn upserted_ids(&self) -> &BTreeMap<usize, Value> {
        &self.upserted_ids
    }

    pub fn inserted_count(&self) -> u64 {
        self.inserted_ids.len() as u64
    }

    pub fn upserted_count(&self) -> u64 {
        self.upserted_ids.len() as u64
    }

    pub fn matched_count(&self) -> u64 {
        self.matched_count
    }

    pub fn modified_count(&self) -> u64 {
        self.modified_count
    }

    pub fn deleted_count(&self) -> u64 {
        self.deleted_count
    }

    /// `true` when no operation had any effect.
    pub fn is_empty(&self) -> bool {
        self.inserted_ids.is_empty()
            && self.upserted_ids.is_empty()
            && self.matched_count == 0
            && self.deleted_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::ObjectId;

    #[test]
    fn test_bulk_write_result_accumulates() {
        let first = Value::ObjectId(ObjectId::new());
        let second = Value::ObjectId(ObjectId::new());

        let mut result = BulkWriteResult::new();
        assert!(result.is_empty());

        result.record_insert(0, InsertOneResult::new(first.clone()));
        result.record_update(1, UpdateResult::new(1, 0, None));
        result.record_update(2, UpdateResult::new(0, 0, Some(second.clone())));
        result.record_delete(DeleteResult::new(1));

        assert_eq!(result.inserted_ids().get(&0), Some(&first));
        assert_eq!(result.upserted_ids().get(&2), Some(&second));
        assert_eq!(result.inserted_count(), 1);
        assert_eq!(result.upserted_count(), 1);
        assert_eq!(result.matched_count(), 1);
        assert_eq!(result.modified_count(), 0);
        assert_eq!(result.deleted_count(), 1);
        assert!(!result.is_empty());
    }

    #[test]
    fn test_update_result() {
        let result = UpdateResult::new(1, 1, None);
        assert_eq!(result.matched_count(), 1);
        assert_eq!(result.modified_count(), 1);
        assert!(result.upserted_id().is_none());
    }
}
