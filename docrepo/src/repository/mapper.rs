use crate::collection::{Document, FindOptions, IdentifierCodec};
use crate::common::{
    FieldKind, IdField, IdRepr, Schema, SortSpec, Value, DEFAULT_ID_ATTRIBUTE, DOC_ID,
};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::repository::Entity;

/// Converts models to stored documents and back.
///
/// Both directions are driven by the [Schema] of the type being mapped.
/// The identifier attribute of a model (and of every embedded entity) is
/// stored under the identity key in native [ObjectId](crate::collection::ObjectId)
/// form; an unset identifier is not stored at all. Keys the target schema
/// does not declare are dropped when mapping back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMapper {
    identity_key: String,
}

impl ModelMapper {
    pub fn new(identity_key: &str) -> ModelMapper {
        ModelMapper {
            identity_key: identity_key.to_string(),
        }
    }

    pub fn identity_key(&self) -> &str {
        &self.identity_key
    }

    /// Maps a model to the document that is stored for it.
    pub fn to_document<E: Entity>(&self, model: &E) -> RepoResult<Document> {
        match model.to_value()? {
            Value::Document(doc) => self.encode(E::schema(), doc),
            other => {
                log::error!("{} did not convert to a document: {}", E::schema().name(), other);
                Err(RepoError::new(
                    &format!("{} did not convert to a document", E::schema().name()),
                    ErrorKind::MappingError,
                ))
            }
        }
    }

    /// Maps a stored document to `O`, which may be the model type or a
    /// projection of it.
    pub fn to_model<O: Entity>(&self, document: Document) -> RepoResult<O> {
        let doc = self.decode(O::schema(), document)?;
        O::from_value(&Value::Document(doc))
    }

    /// Renames a top-level `id_attribute` key of a caller query to the
    /// identity key.
    pub fn map_query(&self, query: &Document, id_attribute: &str) -> Document {
        let mut mapped = query.clone();
        if let Some(value) = mapped.remove_key(id_attribute) {
            mapped.insert(self.identity_key.clone(), value);
        }
        mapped
    }

    pub fn map_sort(&self, sort: &SortSpec, id_attribute: &str) -> SortSpec {
        sort.map_fields(|field| {
            if field == id_attribute {
                self.identity_key.clone()
            } else {
                field.to_string()
            }
        })
    }

    /// Applies [ModelMapper::map_query] to the projection and
    /// [ModelMapper::map_sort] to the sort of `options`.
    pub fn map_find_options(&self, options: &FindOptions, id_attribute: &str) -> FindOptions {
        let mut mapped = options.clone();
        if let Some(sort) = options.sort_spec() {
            mapped = mapped.sort(self.map_sort(sort, id_attribute));
        }
        if let Some(projection) = options.projection_doc() {
            mapped = mapped.projection(self.map_query(projection, id_attribute));
        }
        mapped
    }

    fn encode(&self, schema: &Schema, mut doc: Document) -> RepoResult<Document> {
        if let Some(id) = schema.id() {
            if let Some(value) = doc.remove_key(id.attribute()) {
                if let Some(native) = encode_id(id, value)? {
                    doc.insert(self.identity_key.clone(), native);
                }
            }
        }

        for field in schema.fields() {
            if !field.kind().has_embedded() {
                continue;
            }
            if let Some(value) = doc.remove_key(field.name()) {
                let value = self
                    .walk(field.kind(), value, &|s, d| self.encode(s, d))
                    .map_err(|err| err.within(field.name()))?;
                doc.insert(field.name(), value);
            }
        }
        Ok(doc)
    }

    fn decode(&self, schema: &Schema, mut doc: Document) -> RepoResult<Document> {
        let stored_id = doc.remove_key(&self.identity_key);
        doc = doc.retain(|key| schema.field(key).is_some());

        if let Some(id) = schema.id() {
            match stored_id {
                None | Some(Value::Null) if id.is_required() => {
                    log::error!("Document of {} has no {}", schema.name(), self.identity_key);
                    return Err(RepoError::missing_field(id.attribute()));
                }
                None | Some(Value::Null) => {
                    doc.remove_key(id.attribute());
                }
                Some(value) => {
                    let value = decode_id(id, value).map_err(|err| err.within(id.attribute()))?;
                    doc.insert(id.attribute(), value);
                }
            }
        }

        for field in schema.fields() {
            if !field.kind().has_embedded() {
                continue;
            }
            if let Some(value) = doc.remove_key(field.name()) {
                let value = self
                    .walk(field.kind(), value, &|s, d| self.decode(s, d))
                    .map_err(|err| err.within(field.name()))?;
                doc.insert(field.name(), value);
            }
        }
        Ok(doc)
    }

    // applies `visit` to every embedded entity reachable through `kind`
    fn walk(
        &self,
        kind: &FieldKind,
        value: Value,
        visit: &dyn Fn(&Schema, Document) -> RepoResult<Document>,
    ) -> RepoResult<Value> {
        match (kind, value) {
            (FieldKind::Embedded(schema), Value::Document(doc)) => {
                Ok(Value::Document(visit(schema(), doc)?))
            }
            (FieldKind::Sequence(inner), Value::Array(items)) => {
                let mut mapped = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    mapped.push(
                        self.walk(inner, item, visit)
                            .map_err(|err| err.within(&index.to_string()))?,
                    );
                }
                Ok(Value::Array(mapped))
            }
            (FieldKind::Mapping(inner), Value::Document(entries)) => {
                let mut mapped = Document::new();
                for (key, item) in entries {
                    let item = self.walk(inner, item, visit).map_err(|err| err.within(&key))?;
                    mapped.insert(key, item);
                }
                Ok(Value::Document(mapped))
            }
            (_, value) => Ok(value),
        }
    }
}

impl Default for ModelMapper {
    fn default() -> Self {
        ModelMapper::new(DOC_ID)
    }
}

/// The identifier attribute used when a schema declares none.
pub(crate) fn id_attribute_of(schema: &Schema) -> &str {
    schema.id().map(|id| id.attribute()).unwrap_or(DEFAULT_ID_ATTRIBUTE)
}

fn encode_id(id: &IdField, value: Value) -> RepoResult<Option<Value>> {
    match value {
        Value::Null => Ok(None),
        Value::ObjectId(_) => Ok(Some(value)),
        Value::String(ref text) if text.is_empty() => Ok(None),
        Value::String(text) => IdentifierCodec::decode(&text)
            .map(|native| Some(Value::ObjectId(native)))
            .map_err(|err| err.within(id.attribute())),
        other => {
            log::error!("Identifier '{}' has unsupported value {}", id.attribute(), other);
            Err(RepoError::mapping(
                id.attribute(),
                &format!("Expected an identifier but found {}", other.type_name()),
            ))
        }
    }
}

fn decode_id(id: &IdField, value: Value) -> RepoResult<Value> {
    match (id.repr(), value) {
        (IdRepr::Native, Value::ObjectId(native)) => Ok(Value::ObjectId(native)),
        (IdRepr::Native, Value::String(text)) => IdentifierCodec::decode(&text).map(Value::ObjectId),
        (IdRepr::Text, Value::ObjectId(native)) => Ok(Value::String(IdentifierCodec::encode(&native))),
        (IdRepr::Text, Value::String(text)) => Ok(Value::String(text)),
        (_, other) => {
            log::error!("Stored identifier has unsupported value {}", other);
            Err(RepoError::new(
                &format!("Expected an identifier but found {}", other.type_name()),
                ErrorKind::MappingError,
            ))
        }
    }
}
