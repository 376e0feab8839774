use crate::collection::{Document, FindOptions};
use crate::common::{SortOrder, SortSpec, Value, OP_AND, OP_EQ, OP_GT, OP_IN, OP_LT, OP_NE, OP_OR};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::pagination::CursorToken;

/// One model of a page together with the cursor that resumes right after
/// it.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge<M> {
    node: M,
    cursor: String,
}

impl<M> Edge<M> {
    pub fn new(node: M, cursor: String) -> Edge<M> {
        Edge { node, cursor }
    }

    pub fn node(&self) -> &M {
        &self.node
    }

    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    pub fn into_node(self) -> M {
        self.node
    }

    pub fn into_parts(self) -> (M, String) {
        (self.node, self.cursor)
    }
}

/// Parameters of one page.
///
/// ```rust,ignore
/// let first = repository.paginate(&PageRequest::new(10).query(doc! { kind: "spam" }))?;
/// let next = repository.paginate(
///     &PageRequest::new(10)
///         .query(doc! { kind: "spam" })
///         .after(first.last().unwrap().cursor()),
/// )?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    query: Document,
    limit: u64,
    after: Option<String>,
    before: Option<String>,
    sort: Option<SortSpec>,
    projection: Option<Document>,
}

impl PageRequest {
    pub fn new(limit: u64) -> PageRequest {
        PageRequest {
            query: Document::new(),
            limit,
            after: None,
            before: None,
            sort: None,
            projection: None,
        }
    }

    pub fn query(mut self, query: Document) -> PageRequest {
        self.query = query;
        self
    }

    /// Resume strictly after the position of `cursor`.
    pub fn after(mut self, cursor: &str) -> PageRequest {
        self.after = Some(cursor.to_string());
        self
    }

    /// Restrict to documents strictly before the position of `cursor`.
    ///
    /// The page keeps the request's sort and holds the first `limit` such
    /// documents, not the ones immediately preceding the cursor.
    pub fn before(mut self, cursor: &str) -> PageRequest {
        self.before = Some(cursor.to_string());
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> PageRequest {
        self.sort = Some(sort);
        self
    }

    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> PageRequest {
        let sort = self.sort.take().unwrap_or_default();
        self.sort = Some(sort.add_sorted_field(field_name, sort_order));
        self
    }

    pub fn projection(mut self, projection: Document) -> PageRequest {
        self.projection = Some(projection);
        self
    }

    pub fn query_doc(&self) -> &Document {
        &self.query
    }

    pub fn limit_count(&self) -> u64 {
        self.limit
    }

    pub fn after_cursor(&self) -> Option<&str> {
        self.after.as_deref()
    }

    pub fn before_cursor(&self) -> Option<&str> {
        self.before.as_deref()
    }

    pub fn sort_spec(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn projection_doc(&self) -> Option<&Document> {
        self.projection.as_ref()
    }

    pub(crate) fn with_query(mut self, query: Document) -> PageRequest {
        self.query = query;
        self
    }

    pub(crate) fn with_sort(mut self, sort: Option<SortSpec>) -> PageRequest {
        self.sort = sort;
        self
    }

    pub(crate) fn with_projection(mut self, projection: Option<Document>) -> PageRequest {
        self.projection = projection;
        self
    }
}

/// The find a page request resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    filter: Document,
    sort: SortSpec,
    options: FindOptions,
}

impl PagePlan {
    pub fn filter(&self) -> &Document {
        &self.filter
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn options(&self) -> &FindOptions {
        &self.options
    }

    /// Cursor resuming after `document`, read from the plan's sort fields.
    pub fn cursor_for(&self, document: &Document) -> RepoResult<String> {
        CursorToken::from_document(&self.sort, document).encode()
    }
}

/// Resolves page requests into finds and computes the cursors of their
/// results.
///
/// Requests reaching the paginator already use store field names; the
/// repository renames the model's identifier attribute beforehand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPaginator {
    identity_key: String,
}

impl CursorPaginator {
    pub fn new(identity_key: &str) -> CursorPaginator {
        CursorPaginator {
            identity_key: identity_key.to_string(),
        }
    }

    /// The caller's sort, or ascending identity when none is given.
    pub fn effective_sort(&self, sort: Option<&SortSpec>) -> SortSpec {
        match sort {
            Some(sort) if !sort.is_empty() => sort.clone(),
            _ => SortSpec::by(&self.identity_key, SortOrder::Ascending),
        }
    }

    pub fn plan(&self, request: &PageRequest) -> RepoResult<PagePlan> {
        if request.limit_count() == 0 {
            log::error!("Page limit must be greater than zero");
            return Err(RepoError::new(
                "Page limit must be greater than zero",
                ErrorKind::InvalidOperation,
            ));
        }

        let sort = self.effective_sort(request.sort_spec());
        let resume = match (request.after_cursor(), request.before_cursor()) {
            (Some(_), Some(_)) => {
                log::error!("A page request cannot have both after and before cursors");
                return Err(RepoError::new(
                    "A page request cannot have both after and before cursors",
                    ErrorKind::InvalidOperation,
                ));
            }
            (Some(cursor), None) => Some(self.resume_filter(&sort, cursor, false)?),
            (None, Some(cursor)) => Some(self.resume_filter(&sort, cursor, true)?),
            (None, None) => None,
        };

        let filter = match resume {
            Some(resume) => {
                let mut filter = Document::new();
                filter.insert(
                    OP_AND,
                    Value::Array(vec![
                        Value::Document(request.query_doc().clone()),
                        Value::Document(resume),
                    ]),
                );
                filter
            }
            None => request.query_doc().clone(),
        };

        let mut options = FindOptions::new().sort(sort.clone()).limit(request.limit_count());
        if let Some(projection) = request.projection_doc() {
            options = options.projection(keep_sort_fields(projection, &sort));
        }

        log::debug!("Page plan: filter {}, sort {:?}, limit {}", filter, sort, request.limit_count());
        Ok(PagePlan {
            filter,
            sort,
            options,
        })
    }

    fn resume_filter(&self, sort: &SortSpec, cursor: &str, before: bool) -> RepoResult<Document> {
        let token = CursorToken::decode(cursor)?;
        if token.sort() != sort {
            log::error!(
                "Cursor was issued for sort {:?} but the page is sorted by {:?}",
                token.sort(),
                sort
            );
            return Err(RepoError::new(
                "Cursor does not match the sort of the page",
                ErrorKind::InvalidCursor,
            ));
        }
        Ok(past_tuple(&token, before))
    }
}

// whether "past" the cursor means greater in value order
fn moves_up(order: SortOrder, before: bool) -> bool {
    matches!(
        (order, before),
        (SortOrder::Ascending, false) | (SortOrder::Descending, true)
    )
}

fn condition(op: &str, value: &Value) -> Value {
    let mut condition = Document::new();
    condition.insert(op, value.clone());
    Value::Document(condition)
}

// Range operators never cross type brackets, and null (or a missing field)
// sorts below every other value, so the null bracket is spelled out.
fn past_value(field: &str, up: bool, value: &Value) -> Document {
    let mut past = Document::new();
    match (up, value.is_null()) {
        (true, true) => {
            past.insert(field, condition(OP_NE, &Value::Null));
        }
        (true, false) => {
            past.insert(field, condition(OP_GT, value));
        }
        (false, true) => {
            past.insert(field, condition(OP_IN, &Value::Array(vec![])));
        }
        (false, false) => {
            let mut lower = Document::new();
            lower.insert(field, condition(OP_LT, value));
            let mut null = Document::new();
            null.insert(field, Value::Null);
            past.insert(OP_OR, Value::Array(vec![Value::Document(lower), Value::Document(null)]));
        }
    }
    past
}

// lexicographic "strictly past": f1 past, or f1 tied and f2 past, ...
fn past_tuple(token: &CursorToken, before: bool) -> Document {
    let entries: Vec<_> = token.entries().collect();

    if let [(field, order, value)] = entries.as_slice() {
        return past_value(field, moves_up(*order, before), value);
    }

    let clauses = (0..entries.len())
        .map(|position| {
            let mut clause = Document::new();
            for (field, _, value) in &entries[..position] {
                clause.insert(*field, condition(OP_EQ, value));
            }
            let (field, order, value) = entries[position];
            for (key, past) in past_value(field, moves_up(order, before), value).iter() {
                clause.insert(key.as_str(), past.clone());
            }
            Value::Document(clause)
        })
        .collect();

    let mut filter = Document::new();
    filter.insert(OP_OR, Value::Array(clauses));
    filter
}

// cursors are read from the projected documents, so sort fields must
// survive the projection
fn keep_sort_fields(projection: &Document, sort: &SortSpec) -> Document {
    let inclusive = projection.iter().any(|(_, flag)| match flag {
        Value::Bool(b) => *b,
        other => other.as_number().map(|n| n != 0.0).unwrap_or(false),
    });

    let mut projection = projection.clone();
    for field in sort.field_names() {
        if inclusive {
            projection.insert(field, Value::I32(1));
        } else {
            projection.remove_key(field);
        }
    }
    projection
}
