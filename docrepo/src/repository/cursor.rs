use crate::errors::RepoResult;
use crate::repository::{Entity, ModelMapper};
use crate::store::DocumentStream;
use std::marker::PhantomData;

/// A lazy, forward-only sequence of mapped models.
///
/// Each document is mapped when it is pulled. A mapping failure is yielded
/// in place of that model and iteration may continue past it. The cursor
/// cannot be restarted; run the query again instead.
pub struct ModelCursor<'a, O> {
    stream: DocumentStream<'a>,
    mapper: ModelMapper,
    _phantom: PhantomData<fn() -> O>,
}

impl<'a, O: Entity> ModelCursor<'a, O> {
    pub(crate) fn new(stream: DocumentStream<'a>, mapper: ModelMapper) -> Self {
        ModelCursor {
            stream,
            mapper,
            _phantom: PhantomData,
        }
    }

    /// Pulls the next model, or `None` when the cursor is exhausted.
    pub fn first(&mut self) -> Option<RepoResult<O>> {
        self.next()
    }

    /// Drains the cursor, stopping at the first error.
    pub fn collect_all(self) -> RepoResult<Vec<O>> {
        self.collect()
    }
}

impl<'a, O: Entity> Iterator for ModelCursor<'a, O> {
    type Item = RepoResult<O>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.stream.next()? {
            Ok(document) => Some(self.mapper.to_model::<O>(document)),
            Err(e) => Some(Err(e)),
        }
    }
}
