use crate::collection::Document;
use crate::common::{Value, OP_AND, OP_EQ, OP_INC, OP_SET, OP_UNSET};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::store::memory::filter::is_operator_doc;

fn invalid(message: String) -> RepoError {
    log::error!("{}", message);
    RepoError::new(&message, ErrorKind::InvalidOperation)
}

/// Returns `true` when every key of the update is an update operator.
///
/// Fails when operators and plain fields are mixed.
pub(crate) fn is_operator_update(update: &Document) -> RepoResult<bool> {
    let operators = update.keys().filter(|key| key.starts_with('$')).count();
    if operators == 0 {
        Ok(false)
    } else if operators == update.size() {
        Ok(true)
    } else {
        Err(invalid("Update mixes operators and fields".to_string()))
    }
}

/// Computes the new content of `doc` under `update`.
///
/// An operator update applies `$set`, `$unset` and `$inc`; any other update
/// replaces the document while keeping its identity value. The identity
/// value itself can never change.
pub(crate) fn apply_update(doc: &Document, update: &Document, identity_key: &str) -> RepoResult<Document> {
    if !is_operator_update(update)? {
        return replace(doc, update, identity_key);
    }

    let mut result = doc.clone();
    for (op, operand) in update.iter() {
        let fields = operand
            .as_document()
            .ok_or_else(|| invalid(format!("{} requires a document", op)))?;

        match op.as_str() {
            OP_SET => {
                for (path, value) in fields.iter() {
                    guard_identity(doc, identity_key, path, Some(value))?;
                    result.put(path, value.clone())?;
                }
            }
            OP_UNSET => {
                for (path, _) in fields.iter() {
                    guard_identity(doc, identity_key, path, None)?;
                    result.remove(path);
                }
            }
            OP_INC => {
                for (path, amount) in fields.iter() {
                    guard_identity(doc, identity_key, path, None)?;
                    let current = result.resolve(path);
                    result.put(path, increment(path, current, amount)?)?;
                }
            }
            other => return Err(invalid(format!("Unsupported update operator {}", other))),
        }
    }
    Ok(result)
}

fn replace(doc: &Document, replacement: &Document, identity_key: &str) -> RepoResult<Document> {
    let mut result = replacement.clone();
    match (doc.get_key(identity_key), replacement.get_key(identity_key)) {
        (Some(current), Some(new)) if current != new => {
            Err(invalid(format!("Replacement would modify the immutable field '{}'", identity_key)))
        }
        (Some(current), None) => {
            result.insert(identity_key, current.clone());
            Ok(result)
        }
        _ => Ok(result),
    }
}

fn guard_identity(doc: &Document, identity_key: &str, path: &str, value: Option<&Value>) -> RepoResult<()> {
    let touches_identity = path == identity_key
        || path.starts_with(&format!("{}.", identity_key));
    if !touches_identity {
        return Ok(());
    }

    match (doc.get_key(identity_key), value) {
        (Some(current), Some(value)) if path == identity_key && current == value => Ok(()),
        (None, Some(_)) if path == identity_key => Ok(()),
        _ => Err(invalid(format!(
            "Update would modify the immutable field '{}'",
            identity_key
        ))),
    }
}

fn increment(path: &str, current: Option<Value>, amount: &Value) -> RepoResult<Value> {
    if !amount.is_number() {
        return Err(invalid(format!("{} on '{}' requires a numeric amount", OP_INC, path)));
    }

    let current = match current {
        None | Some(Value::Null) => return Ok(amount.clone()),
        Some(value) => value,
    };

    match (&current, amount) {
        (Value::I32(a), Value::I32(b)) => Ok(match a.checked_add(*b) {
            Some(sum) => Value::I32(sum),
            None => Value::I64(*a as i64 + *b as i64),
        }),
        (Value::F64(_), _) | (_, Value::F64(_)) => match (current.as_number(), amount.as_number()) {
            (Some(a), Some(b)) => Ok(Value::F64(a + b)),
            _ => Err(invalid(format!("{} on '{}' requires a numeric field", OP_INC, path))),
        },
        _ => match (current.as_integer(), amount.as_integer()) {
            (Some(a), Some(b)) => a
                .checked_add(b)
                .map(Value::I64)
                .ok_or_else(|| invalid(format!("{} on '{}' overflows", OP_INC, path))),
            _ => Err(invalid(format!("{} on '{}' requires a numeric field", OP_INC, path))),
        },
    }
}

/// Builds the starting document of an upsert from the equality conditions
/// of its filter.
pub(crate) fn upsert_seed(filter: &Document) -> RepoResult<Document> {
    let mut seed = Document::new();
    collect_equalities(filter, &mut seed)?;
    Ok(seed)
}

fn collect_equalities(filter: &Document, seed: &mut Document) -> RepoResult<()> {
    for (key, condition) in filter.iter() {
        if key == OP_AND {
            if let Value::Array(clauses) = condition {
                for clause in clauses.iter().filter_map(|c| c.as_document()) {
                    collect_equalities(clause, seed)?;
                }
            }
            continue;
        }

        if key.starts_with('$') {
            continue;
        }

        if !is_operator_doc(condition) {
            seed.put(key, condition.clone())?;
        } else if let Some(value) = condition.as_document().and_then(|ops| ops.get_key(OP_EQ)) {
            seed.put(key, value.clone())?;
        }
    }
    Ok(())
}
