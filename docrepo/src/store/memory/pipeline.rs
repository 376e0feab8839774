use crate::collection::{Document, FindOptions};
use crate::common::{
    SortOrder, SortSpec, Value, STAGE_COUNT, STAGE_LIMIT, STAGE_MATCH, STAGE_PROJECT, STAGE_SKIP,
    STAGE_SORT,
};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::store::memory::filter::{matches, truthy};
use std::cmp::Ordering;

fn invalid(message: String) -> RepoError {
    log::error!("{}", message);
    RepoError::new(&message, ErrorKind::InvalidOperation)
}

/// Stable multi-key sort. Missing fields sort as null.
pub(crate) fn sort_documents(documents: &mut [Document], sort: &SortSpec) {
    if sort.is_empty() {
        return;
    }

    documents.sort_by(|a, b| {
        for (field, order) in sort.sorting_order() {
            let ordering = a.get(field).cmp(&b.get(field));
            let ordering = match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// Applies sort, skip, limit and projection of `options`, in that order.
pub(crate) fn apply_find_options(
    mut documents: Vec<Document>,
    options: &FindOptions,
    identity_key: &str,
) -> RepoResult<Vec<Document>> {
    if let Some(sort) = options.sort_spec() {
        sort_documents(&mut documents, sort);
    }

    let skip = options.skip_count().unwrap_or(0) as usize;
    let limit = options.limit_count().map(|l| l as usize).unwrap_or(usize::MAX);
    let window = documents.into_iter().skip(skip).take(limit);

    match options.projection_doc() {
        Some(projection) => {
            let projector = Projector::new(projection, identity_key)?;
            window.map(|doc| projector.project(&doc)).collect()
        }
        None => Ok(window.collect()),
    }
}

/// An inclusion or exclusion projection.
pub(crate) struct Projector {
    fields: Vec<String>,
    inclusive: bool,
    keep_identity: bool,
    identity_key: String,
}

impl Projector {
    pub(crate) fn new(projection: &Document, identity_key: &str) -> RepoResult<Projector> {
        let mut included = Vec::new();
        let mut excluded = Vec::new();
        let mut identity_flag = None;

        for (field, flag) in projection.iter() {
            let include = truthy(STAGE_PROJECT, flag)?;
            if field == identity_key {
                identity_flag = Some(include);
            } else if include {
                included.push(field.clone());
            } else {
                excluded.push(field.clone());
            }
        }

        if !included.is_empty() && !excluded.is_empty() {
            return Err(invalid("Projection mixes inclusion and exclusion".to_string()));
        }

        // {"_id": 1} alone keeps only the identity
        let inclusive =
            !included.is_empty() || (excluded.is_empty() && identity_flag == Some(true));
        let keep_identity = identity_flag.unwrap_or(true);
        let fields = if inclusive { included } else { excluded };
        Ok(Projector {
            fields,
            inclusive,
            keep_identity,
            identity_key: identity_key.to_string(),
        })
    }

    pub(crate) fn project(&self, doc: &Document) -> RepoResult<Document> {
        if self.inclusive {
            let mut result = Document::new();
            if self.keep_identity {
                if let Some(id) = doc.get_key(&self.identity_key) {
                    result.insert(self.identity_key.clone(), id.clone());
                }
            }
            for field in &self.fields {
                if let Some(value) = doc.resolve(field) {
                    result.put(field, value)?;
                }
            }
            Ok(result)
        } else {
            let mut result = doc.clone();
            for field in &self.fields {
                result.remove(field);
            }
            if !self.keep_identity {
                result.remove(&self.identity_key);
            }
            Ok(result)
        }
    }
}

/// Runs an aggregation pipeline over the documents of a collection.
pub(crate) fn aggregate(
    mut documents: Vec<Document>,
    pipeline: &[Document],
    identity_key: &str,
) -> RepoResult<Vec<Document>> {
    for stage in pipeline {
        if stage.size() != 1 {
            return Err(invalid(format!("Pipeline stage must have exactly one key: {}", stage)));
        }

        if let Some((name, spec)) = stage.iter().next() {
            documents = run_stage(documents, name, spec, identity_key)?;
        }
    }
    Ok(documents)
}

fn run_stage(
    documents: Vec<Document>,
    name: &str,
    spec: &Value,
    identity_key: &str,
) -> RepoResult<Vec<Document>> {
    match name {
        STAGE_MATCH => {
            let filter = stage_document(name, spec)?;
            let mut result = Vec::with_capacity(documents.len());
            for doc in documents {
                if matches(&doc, filter)? {
                    result.push(doc);
                }
            }
            Ok(result)
        }
        STAGE_SORT => {
            let mut documents = documents;
            sort_documents(&mut documents, &sort_stage(spec)?);
            Ok(documents)
        }
        STAGE_SKIP => {
            let count = stage_count(name, spec)?;
            Ok(documents.into_iter().skip(count).collect())
        }
        STAGE_LIMIT => {
            let count = stage_count(name, spec)?;
            Ok(documents.into_iter().take(count).collect())
        }
        STAGE_PROJECT => {
            let projector = Projector::new(stage_document(name, spec)?, identity_key)?;
            documents.iter().map(|doc| projector.project(doc)).collect()
        }
        STAGE_COUNT => {
            let field = spec
                .as_string()
                .filter(|f| !f.is_empty() && !f.starts_with('$'))
                .ok_or_else(|| invalid(format!("{} requires a field name", STAGE_COUNT)))?;
            if documents.is_empty() {
                return Ok(Vec::new());
            }
            let mut result = Document::new();
            result.insert(field.clone(), Value::I64(documents.len() as i64));
            Ok(vec![result])
        }
        other => Err(invalid(format!("Unsupported pipeline stage {}", other))),
    }
}

fn stage_document<'a>(name: &str, spec: &'a Value) -> RepoResult<&'a Document> {
    spec.as_document()
        .ok_or_else(|| invalid(format!("{} requires a document", name)))
}

fn stage_count(name: &str, spec: &Value) -> RepoResult<usize> {
    spec.as_integer()
        .filter(|count| *count >= 0)
        .map(|count| count as usize)
        .ok_or_else(|| invalid(format!("{} requires a non-negative integer", name)))
}

// either a document of field directions, or an array of single-key documents
fn sort_stage(spec: &Value) -> RepoResult<SortSpec> {
    let mut sort = SortSpec::new();
    let mut add = |field: &str, direction: &Value| -> RepoResult<()> {
        let direction = direction
            .as_integer()
            .ok_or_else(|| invalid(format!("Sort direction of '{}' must be 1 or -1", field)))?;
        let order = SortOrder::from_direction(direction)?;
        sort = std::mem::take(&mut sort).add_sorted_field(field, order);
        Ok(())
    };

    match spec {
        Value::Document(fields) if !fields.is_empty() => {
            for (field, direction) in fields.iter() {
                add(field, direction)?;
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for item in items {
                let fields = item
                    .as_document()
                    .ok_or_else(|| invalid(format!("{} entries must be documents", STAGE_SORT)))?;
                for (field, direction) in fields.iter() {
                    add(field, direction)?;
                }
            }
        }
        _ => return Err(invalid(format!("{} requires a non-empty document", STAGE_SORT))),
    }
    Ok(sort)
}
