use crate::errors::{ErrorKind, RepoError, RepoResult};
use serde::{Deserialize, Serialize};

/// Specifies the direction for sorting documents.
///
/// The numeric form used by query documents is `1` for ascending and `-1`
/// for descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    /// Sort in ascending order (smallest to largest, A-Z, oldest to newest)
    Ascending,
    /// Sort in descending order (largest to smallest, Z-A, newest to oldest)
    Descending,
}

impl SortOrder {
    pub fn direction(&self) -> i32 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }

    pub fn from_direction(direction: i64) -> RepoResult<SortOrder> {
        match direction {
            1 => Ok(SortOrder::Ascending),
            -1 => Ok(SortOrder::Descending),
            other => {
                log::error!("Invalid sort direction {}", other);
                Err(RepoError::new(
                    &format!("Invalid sort direction {}, expected 1 or -1", other),
                    ErrorKind::InvalidOperation,
                ))
            }
        }
    }
}

/// An ordered list of `(field, direction)` pairs.
///
/// The first pair is the primary sort key; later pairs break ties.
///
/// ```rust,ignore
/// let sort = SortSpec::new()
///     .add_sorted_field("name", SortOrder::Ascending)
///     .add_sorted_field("count", SortOrder::Descending);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    sorting_order: Vec<(String, SortOrder)>,
}

impl SortSpec {
    pub fn new() -> SortSpec {
        SortSpec {
            sorting_order: Vec::new(),
        }
    }

    pub fn with_order(sorting_order: Vec<(String, SortOrder)>) -> SortSpec {
        SortSpec { sorting_order }
    }

    /// Sorts by a single field.
    pub fn by(field_name: &str, sort_order: SortOrder) -> SortSpec {
        SortSpec::new().add_sorted_field(field_name, sort_order)
    }

    #[inline]
    pub fn add_field(self, field_name: &str) -> SortSpec {
        self.add_sorted_field(field_name, SortOrder::Ascending)
    }

    #[inline]
    pub fn add_sorted_field(mut self, field_name: &str, sort_order: SortOrder) -> SortSpec {
        self.sorting_order.push((field_name.to_string(), sort_order));
        self
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.sorting_order.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[inline]
    pub fn sorting_order(&self) -> &[(String, SortOrder)] {
        &self.sorting_order
    }

    pub fn is_empty(&self) -> bool {
        self.sorting_order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sorting_order.len()
    }

    /// Returns a copy with every field name passed through `rename`.
    pub fn map_fields<F: Fn(&str) -> String>(&self, rename: F) -> SortSpec {
        SortSpec {
            sorting_order: self
                .sorting_order
                .iter()
                .map(|(name, order)| (rename(name), *order))
                .collect(),
        }
    }
}

impl From<Vec<(&str, SortOrder)>> for SortSpec {
    fn from(value: Vec<(&str, SortOrder)>) -> Self {
        SortSpec {
            sorting_order: value
                .into_iter()
                .map(|(name, order)| (name.to_string(), order))
                .collect(),
        }
    }
}
