use crate::collection::{IdentifierCodec, ObjectId};
use crate::common::{Convertible, IdRepr, Schema};
use crate::errors::RepoResult;

/// A type with a [Schema] that converts to and from a document.
///
/// Implemented with `#[derive(Entity)]`, which builds the schema once per
/// type. Every type a repository reads or writes is an `Entity`, including
/// projection types and embedded types.
///
/// # Usage
/// ```ignore
/// #[derive(Entity, Convertible, Debug, Clone, PartialEq)]
/// pub struct Bar {
///     apple: String,
///     banana: String,
/// }
///
/// #[derive(Entity, Convertible, Debug, Clone, PartialEq)]
/// #[entity(name = "spams")]
/// pub struct Spam {
///     id: Option<ObjectId>,
///     foo: Foo,
///     bars: Vec<Bar>,
/// }
/// ```
pub trait Entity: Convertible<Output = Self> + Sized {
    fn schema() -> &'static Schema;
}

/// An [Entity] with an identifier attribute.
///
/// The derive implements `Model` for types with a field named `id` or a
/// field marked `#[entity(id)]`.
pub trait Model: Entity {
    type Id: ModelId;

    /// The identifier, or `None` when the model has not been saved.
    fn id(&self) -> Option<&Self::Id>;

    fn set_id(&mut self, id: Self::Id);
}

/// An identifier representation a model can hold.
pub trait ModelId: Clone + Send + Sync {
    const REPR: IdRepr;

    fn to_object_id(&self) -> RepoResult<ObjectId>;

    fn from_object_id(id: ObjectId) -> Self;
}

impl ModelId for ObjectId {
    const REPR: IdRepr = IdRepr::Native;

    fn to_object_id(&self) -> RepoResult<ObjectId> {
        Ok(*self)
    }

    fn from_object_id(id: ObjectId) -> Self {
        id
    }
}

impl ModelId for String {
    const REPR: IdRepr = IdRepr::Text;

    fn to_object_id(&self) -> RepoResult<ObjectId> {
        IdentifierCodec::decode(self)
    }

    fn from_object_id(id: ObjectId) -> Self {
        IdentifierCodec::encode(&id)
    }
}

/// The field type holding a model's identifier.
///
/// Used by the `Entity` derive; `Option<I>` marks an identifier that is
/// absent until the first save.
pub trait IdSlot {
    type Id: ModelId;
    const REQUIRED: bool;

    fn get(&self) -> Option<&Self::Id>;

    fn set(&mut self, id: Self::Id);
}

impl IdSlot for ObjectId {
    type Id = ObjectId;
    const REQUIRED: bool = true;

    fn get(&self) -> Option<&ObjectId> {
        Some(self)
    }

    fn set(&mut self, id: ObjectId) {
        *self = id;
    }
}

// an empty string is an unset identifier
impl IdSlot for String {
    type Id = String;
    const REQUIRED: bool = true;

    fn get(&self) -> Option<&String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    fn set(&mut self, id: String) {
        *self = id;
    }
}

impl<I: ModelId> IdSlot for Option<I> {
    type Id = I;
    const REQUIRED: bool = false;

    fn get(&self) -> Option<&I> {
        self.as_ref()
    }

    fn set(&mut self, id: I) {
        *self = Some(id);
    }
}
