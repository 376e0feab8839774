use crate::collection::Document;
use crate::common::{
    Value, OP_AND, OP_EQ, OP_EXISTS, OP_GT, OP_GTE, OP_IN, OP_LT, OP_LTE, OP_NE, OP_NIN, OP_NOR,
    OP_OPTIONS, OP_OR, OP_REGEX,
};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use regex::RegexBuilder;
use std::cmp::Ordering;

fn invalid(message: String) -> RepoError {
    log::error!("{}", message);
    RepoError::new(&message, ErrorKind::InvalidOperation)
}

/// Returns `true` when `value` is an operator document such as
/// `{"$gt": 5}`.
pub(crate) fn is_operator_doc(value: &Value) -> bool {
    match value {
        Value::Document(doc) => doc.keys().next().map(|k| k.starts_with('$')).unwrap_or(false),
        _ => false,
    }
}

/// Evaluates a filter document against a stored document.
pub(crate) fn matches(doc: &Document, filter: &Document) -> RepoResult<bool> {
    for (key, condition) in filter.iter() {
        let matched = match key.as_str() {
            OP_AND => {
                let mut all = true;
                for clause in clauses(key, condition)? {
                    if !matches(doc, clause)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            OP_OR => {
                let mut any = false;
                for clause in clauses(key, condition)? {
                    if matches(doc, clause)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            OP_NOR => {
                let mut none = true;
                for clause in clauses(key, condition)? {
                    if matches(doc, clause)? {
                        none = false;
                        break;
                    }
                }
                none
            }
            op if op.starts_with('$') => {
                return Err(invalid(format!("Unsupported query operator {}", op)));
            }
            path => matches_field(doc.resolve(path).as_ref(), condition)?,
        };

        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses<'a>(op: &str, condition: &'a Value) -> RepoResult<Vec<&'a Document>> {
    let items = match condition {
        Value::Array(items) if !items.is_empty() => items,
        _ => return Err(invalid(format!("{} requires a non-empty array", op))),
    };

    items
        .iter()
        .map(|item| {
            item.as_document()
                .ok_or_else(|| invalid(format!("{} requires an array of documents", op)))
        })
        .collect()
}

fn matches_field(field: Option<&Value>, condition: &Value) -> RepoResult<bool> {
    let operators = match condition {
        Value::Document(doc) if is_operator_doc(condition) => doc,
        _ => return Ok(equals(field, condition)),
    };

    for (op, operand) in operators.iter() {
        let matched = match op.as_str() {
            OP_EQ => equals(field, operand),
            OP_NE => !equals(field, operand),
            OP_GT => compare(field, operand, |o| o == Ordering::Greater),
            OP_GTE => compare(field, operand, |o| o != Ordering::Less),
            OP_LT => compare(field, operand, |o| o == Ordering::Less),
            OP_LTE => compare(field, operand, |o| o != Ordering::Greater),
            OP_IN => any_of(op, field, operand)?,
            OP_NIN => !any_of(op, field, operand)?,
            OP_EXISTS => field.is_some() == truthy(op, operand)?,
            OP_REGEX => regex_match(field, operand, operators.get_key(OP_OPTIONS))?,
            OP_OPTIONS => {
                if operators.get_key(OP_REGEX).is_none() {
                    return Err(invalid(format!("{} without {}", OP_OPTIONS, OP_REGEX)));
                }
                true
            }
            other => return Err(invalid(format!("Unsupported query operator {}", other))),
        };

        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

// a missing field equals null; an array field equals any of its elements
fn equals(field: Option<&Value>, target: &Value) -> bool {
    match field {
        None => target.is_null(),
        Some(value) => {
            value == target
                || matches!(value, Value::Array(items) if items.iter().any(|item| item == target))
        }
    }
}

// range operators only match values of the same type bracket
fn compare<F: Fn(Ordering) -> bool>(field: Option<&Value>, target: &Value, accept: F) -> bool {
    let check = |value: &Value| value.is_comparable_with(target) && accept(value.cmp(target));
    match field {
        None => false,
        Some(Value::Array(items)) if !target.is_array() => items.iter().any(check),
        Some(value) => check(value),
    }
}

fn any_of(op: &str, field: Option<&Value>, operand: &Value) -> RepoResult<bool> {
    match operand {
        Value::Array(targets) => Ok(targets.iter().any(|target| equals(field, target))),
        _ => Err(invalid(format!("{} requires an array", op))),
    }
}

pub(crate) fn truthy(op: &str, operand: &Value) -> RepoResult<bool> {
    match operand {
        Value::Bool(b) => Ok(*b),
        Value::I32(_) | Value::I64(_) | Value::F64(_) => Ok(operand.as_number() != Some(0.0)),
        _ => Err(invalid(format!("{} requires a boolean or a number", op))),
    }
}

fn regex_match(field: Option<&Value>, pattern: &Value, options: Option<&Value>) -> RepoResult<bool> {
    let pattern = pattern
        .as_string()
        .ok_or_else(|| invalid(format!("{} requires a string pattern", OP_REGEX)))?;

    let mut builder = RegexBuilder::new(pattern);
    if let Some(options) = options {
        let options = options
            .as_string()
            .ok_or_else(|| invalid(format!("{} requires a string", OP_OPTIONS)))?;
        for flag in options.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                other => return Err(invalid(format!("Unsupported regex option '{}'", other))),
            };
        }
    }

    let regex = builder
        .build()
        .map_err(|err| invalid(format!("Invalid regex '{}': {}", pattern, err)))?;

    let is_match = |value: &Value| value.as_string().map(|s| regex.is_match(s)).unwrap_or(false);
    Ok(match field {
        None => false,
        Some(Value::Array(items)) => items.iter().any(is_match),
        Some(value) => is_match(value),
    })
}
