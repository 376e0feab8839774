use crate::common::{Value, FIELD_SEPARATOR};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use im::OrdMap;
use itertools::Itertools;
use std::fmt::{Debug, Display};

/// An untyped record as stored in a collection.
///
/// A document is composed of key-value pairs. The key is always a [String]
/// and the value is a [Value]. Keys are kept in ascending order.
///
/// Documents support nested documents and arrays. Path based accessors
/// ([Document::put], [Document::get], [Document::remove],
/// [Document::contains_field]) split the key on `.`, so the value inside
/// `{"foo": {"count": 1}}` is reached with `"foo.count"` and the first
/// element of an array with `"bars.0"`. A path segment that is not an index
/// applied to an array collects the segment from every element.
///
/// Query and update documents often carry literal dotted keys such as
/// `{"foo.count": {"$gt": 1}}`; those are built with [Document::insert] or
/// the [doc!](crate::doc) macro, which never split keys.
///
/// Cloning is O(1): the map is a persistent structure sharing its nodes.
#[derive(Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd, serde::Deserialize, serde::Serialize)]
pub struct Document {
    data: OrdMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: OrdMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of top level entries.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Inserts a value under a literal top level key, returning the value it
    /// replaces.
    pub fn insert<K: Into<String>, T: Into<Value>>(&mut self, key: K, value: T) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    /// Associates the value with the given path.
    ///
    /// Missing intermediate documents are created. An index segment must
    /// address an existing element of an array.
    ///
    /// ```rust,ignore
    /// let mut doc = Document::new();
    /// doc.put("user.name", "Alice")?;
    /// assert_eq!(doc.get("user.name"), Value::String("Alice".to_string()));
    /// ```
    pub fn put<T: Into<Value>>(&mut self, path: &str, value: T) -> RepoResult<()> {
        let splits: Vec<&str> = path.split(FIELD_SEPARATOR).collect();
        self.deep_put(path, &splits, value.into())
    }

    /// Returns the value at the given path, or [Value::Null] if the path
    /// does not resolve.
    pub fn get(&self, path: &str) -> Value {
        self.resolve(path).unwrap_or(Value::Null)
    }

    /// Returns the value at the given path, or [None] if the path does not
    /// resolve. Unlike [Document::get] this tells a stored null from a
    /// missing field.
    pub fn resolve(&self, path: &str) -> Option<Value> {
        if let Some(value) = self.data.get(path) {
            return Some(value.clone());
        }

        if !path.contains(FIELD_SEPARATOR) {
            return None;
        }

        let splits: Vec<&str> = path.split(FIELD_SEPARATOR).collect();
        recursive_get(self.data.get(splits[0]), &splits[1..])
    }

    /// Returns the value stored under a literal top level key.
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Removes the value at the given path and returns it.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        if let Some(value) = self.data.remove(path) {
            return Some(value);
        }

        if !path.contains(FIELD_SEPARATOR) {
            return None;
        }

        let splits: Vec<&str> = path.split(FIELD_SEPARATOR).collect();
        self.deep_remove(&splits)
    }

    /// Removes the value stored under a literal top level key.
    pub fn remove_key(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Checks if a top level key exists in the document.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Checks if a top level or embedded field exists in the document.
    pub fn contains_field(&self, path: &str) -> bool {
        self.resolve(path).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// Returns a document holding only the top level keys for which the
    /// predicate holds.
    pub fn retain<F: Fn(&str) -> bool>(&self, predicate: F) -> Document {
        self.data
            .iter()
            .filter(|(key, _)| predicate(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn deep_put(&mut self, path: &str, splits: &[&str], value: Value) -> RepoResult<()> {
        let key = splits[0];
        if key.is_empty() {
            log::error!("Document does not support empty key in '{}'", path);
            return Err(RepoError::new(
                &format!("Document does not support empty key in '{}'", path),
                ErrorKind::InvalidOperation,
            ));
        }

        if splits.len() == 1 {
            self.data.insert(key.to_string(), value);
            return Ok(());
        }

        let remaining = &splits[1..];
        match self.data.get(key).cloned() {
            Some(Value::Document(mut nested)) => {
                let result = nested.deep_put(path, remaining, value);
                self.data.insert(key.to_string(), Value::Document(nested));
                result
            }
            Some(Value::Array(mut items)) => {
                put_in_array(path, &mut items, remaining, value)?;
                self.data.insert(key.to_string(), Value::Array(items));
                Ok(())
            }
            _ => {
                // anything else is replaced by a fresh embedded document
                let mut nested = Document::new();
                let result = nested.deep_put(path, remaining, value);
                self.data.insert(key.to_string(), Value::Document(nested));
                result
            }
        }
    }

    fn deep_remove(&mut self, splits: &[&str]) -> Option<Value> {
        let key = splits[0];
        if splits.len() == 1 {
            return self.data.remove(key);
        }

        let remaining = &splits[1..];
        match self.data.get(key).cloned() {
            Some(Value::Document(mut nested)) => {
                let removed = nested.deep_remove(remaining);
                if removed.is_some() {
                    self.data.insert(key.to_string(), Value::Document(nested));
                }
                removed
            }
            Some(Value::Array(mut items)) => {
                let index = parse_index(remaining[0])?;
                if index >= items.len() {
                    return None;
                }

                let removed = if remaining.len() == 1 {
                    Some(items.remove(index))
                } else {
                    items[index].as_document_mut()?.deep_remove(&remaining[1..])
                };
                if removed.is_some() {
                    self.data.insert(key.to_string(), Value::Array(items));
                }
                removed
            }
            _ => None,
        }
    }
}

fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse::<usize>().ok()
}

fn put_in_array(path: &str, items: &mut [Value], splits: &[&str], value: Value) -> RepoResult<()> {
    let index = match parse_index(splits[0]) {
        Some(index) if index < items.len() => index,
        _ => {
            log::error!("Invalid array index {} in '{}'", splits[0], path);
            return Err(RepoError::new(
                &format!("Invalid array index {} in '{}'", splits[0], path),
                ErrorKind::InvalidOperation,
            ));
        }
    };

    if splits.len() == 1 {
        items[index] = value;
        return Ok(());
    }

    match &mut items[index] {
        Value::Document(nested) => nested.deep_put(path, &splits[1..], value),
        Value::Array(nested) => put_in_array(path, nested, &splits[1..], value),
        slot => {
            let mut nested = Document::new();
            nested.deep_put(path, &splits[1..], value)?;
            *slot = Value::Document(nested);
            Ok(())
        }
    }
}

fn recursive_get(value: Option<&Value>, splits: &[&str]) -> Option<Value> {
    let value = value?;
    if splits.is_empty() {
        return Some(value.clone());
    }

    let key = splits[0];
    match value {
        Value::Document(nested) => recursive_get(nested.data.get(key), &splits[1..]),
        Value::Array(items) => match parse_index(key) {
            Some(index) => recursive_get(items.get(index), &splits[1..]),
            None => decompose(items, splits),
        },
        _ => None,
    }
}

// applies the remaining path to every element of an array
fn decompose(items: &[Value], splits: &[&str]) -> Option<Value> {
    let mut collected: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        match recursive_get(Some(item), splits) {
            Some(Value::Array(values)) => collected.extend(values),
            Some(value) => collected.push(value),
            None => {}
        }
    }

    if collected.is_empty() {
        None
    } else {
        Some(Value::Array(collected.into_iter().unique().collect()))
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.data.iter()).finish()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (index, (key, value)) in self.data.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "\"{}\": {}", key, value)?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = im::ordmap::ConsumingIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// Keys are inserted literally: `"foo.count"` stays one key, which is what
/// query documents need. Negative numbers and other multi-token values go in
/// parentheses.
///
/// # Examples
///
/// ```rust,ignore
/// use docrepo::doc;
///
/// let empty = doc!{};
///
/// let query = doc!{
///     "foo.count": { "$gt": 1 },
///     "$or": [{ name: "spam" }, { name: (format!("eg{}", "gs")) }],
///     rank: (-1)
/// };
/// ```
#[macro_export]
macro_rules! doc {
    ({}) => {
        $crate::collection::Document::new()
    };

    () => {
        $crate::collection::Document::new()
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $(
                doc.insert($crate::collection::normalize(stringify!($key)), $crate::doc_value!($value));
            )*
            doc
        }
    };
}

/// Helper macro to convert values for the doc! macro.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        {
            $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
        }
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
