use crate::collection::{Document, IdentifierCodec, ObjectId};
use crate::common::{FieldKind, Value};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

// i64::MIN as f64 and the first float above i64::MAX
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// Conversion of a Rust value to and from a [Value].
///
/// Implemented for primitives, `String`, `Option`, `Box`, `Vec`, string
/// keyed maps, [ObjectId], `DateTime<Utc>`, [Document] and [Value], and
/// derived for user types with `#[derive(Convertible)]`.
///
/// Conversion errors are [ErrorKind::MappingError]s. Container
/// implementations prefix the field path of an inner error with the index
/// or key they were converting, so a failure deep inside a model reports a
/// path such as `bars.0.apple`.
///
/// Integers convert between widths when the value fits and floats accept
/// integer values.
pub trait Convertible {
    type Output;

    fn to_value(&self) -> RepoResult<Value>;
    fn from_value(value: &Value) -> RepoResult<Self::Output>;

    /// Mapping shape of this type.
    fn field_kind() -> FieldKind
    where
        Self: Sized,
    {
        FieldKind::Scalar
    }

    /// `true` when a missing value converts to an absent one.
    fn is_optional() -> bool
    where
        Self: Sized,
    {
        false
    }
}

fn type_mismatch(expected: &str, value: &Value) -> RepoError {
    log::error!("Expected {} but found {}", expected, value);
    RepoError::new(
        &format!("Expected {} but found {}", expected, value.type_name()),
        ErrorKind::MappingError,
    )
}

fn integer_of(expected: &str, value: &Value) -> RepoResult<i64> {
    match value {
        Value::I32(v) => Ok(*v as i64),
        Value::I64(v) => Ok(*v),
        Value::F64(v) if v.fract() == 0.0 && *v >= I64_LOWER && *v < I64_UPPER => Ok(*v as i64),
        _ => Err(type_mismatch(expected, value)),
    }
}

macro_rules! impl_convertible_for_int {
    ($($t:ty => $name:literal, $variant:ident, $wide:ty);* $(;)?) => {
        $(
            impl Convertible for $t {
                type Output = $t;

                fn to_value(&self) -> RepoResult<Value> {
                    let wide = <$wide>::try_from(*self).map_err(|_| {
                        log::error!("Value {} does not fit in a document integer", self);
                        RepoError::new(
                            &format!("Value {} does not fit in a document integer", self),
                            ErrorKind::MappingError,
                        )
                    })?;
                    Ok(Value::$variant(wide))
                }

                fn from_value(value: &Value) -> RepoResult<Self::Output> {
                    let integer = integer_of($name, value)?;
                    <$t>::try_from(integer).map_err(|_| {
                        log::error!("Value {} does not fit in {}", integer, $name);
                        RepoError::new(
                            &format!("Value {} does not fit in {}", integer, $name),
                            ErrorKind::MappingError,
                        )
                    })
                }
            }
        )*
    };
}

impl_convertible_for_int! {
    i8 => "i8", I32, i32;
    i16 => "i16", I32, i32;
    i32 => "i32", I32, i32;
    i64 => "i64", I64, i64;
    isize => "isize", I64, i64;
    u8 => "u8", I32, i32;
    u16 => "u16", I32, i32;
    u32 => "u32", I64, i64;
    u64 => "u64", I64, i64;
    usize => "usize", I64, i64;
}

impl Convertible for f64 {
    type Output = f64;

    fn to_value(&self) -> RepoResult<Value> {
        Ok(Value::F64(*self))
    }

    fn from_value(value: &Value) -> RepoResult<Self> {
        value.as_number().ok_or_else(|| type_mismatch("f64", value))
    }
}

impl Convertible for f32 {
    type Output = f32;

    fn to_value(&self) -> RepoResult<Value> {
        Ok(Value::F64(*self as f64))
    }

    fn from_value(value: &Value) -> RepoResult<Self> {
        value
            .as_number()
            .map(|v| v as f32)
            .ok_or_else(|| type_mismatch("f32", value))
    }
}

impl Convertible for bool {
    type Output = bool;

    fn to_value(&self) -> RepoResult<Value> {
        Ok(Value::Bool(*self))
    }

    fn from_value(value: &Value) -> RepoResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err(type_mismatch("bool", value)),
        }
    }
}

impl Convertible for String {
    type Output = String;

    fn to_value(&self) -> RepoResult<Value> {
        Ok(Value::String(self.clone()))
    }

    fn from_value(value: &Value) -> RepoResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(type_mismatch("string", value)),
        }
    }
}

impl Convertible for &str {
    type Output = String;

    fn to_value(&self) -> RepoResult<Value> {
        Ok(Value::String(self.to_string()))
    }

    fn from_value(value: &Value) -> RepoResult<Self::Output> {
        String::from_value(value)
    }
}

impl Convertible for ObjectId {
    type Output = ObjectId;

    fn to_value(&self) -> RepoResult<Value> {
        Ok(Value::ObjectId(*self))
    }

    fn from_value(value: &Value) -> RepoResult<Self> {
        match value {
            Value::ObjectId(_) | Value::String(_) => IdentifierCodec::from_value(value),
            _ => Err(type_mismatch("object id", value)),
        }
    }
}

impl Convertible for DateTime<Utc> {
    type Output = DateTime<Utc>;

    fn to_value(&self) -> RepoResult<Value> {
        Ok(Value::DateTime(*self))
    }

    fn from_value(value: &Value) -> RepoResult<Self> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            _ => Err(type_mismatch("date time", value)),
        }
    }
}

impl Convertible for Document {
    type Output = Document;

    fn to_value(&self) -> RepoResult<Value> {
        Ok(Value::Document(self.clone()))
    }

    fn from_value(value: &Value) -> RepoResult<Self> {
        match value {
            Value::Document(doc) => Ok(doc.clone()),
            _ => Err(type_mismatch("document", value)),
        }
    }
}

impl Convertible for Value {
    type Output = Value;

    fn to_value(&self) -> RepoResult<Value> {
        Ok(self.clone())
    }

    fn from_value(value: &Value) -> RepoResult<Self> {
        Ok(value.clone())
    }
}

impl<T> Convertible for Option<T>
where
    T: Convertible,
{
    type Output = Option<T::Output>;

    fn to_value(&self) -> RepoResult<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: &Value) -> RepoResult<Self::Output> {
        match value {
            Value::Null => Ok(None),
            _ => Ok(Some(T::from_value(value)?)),
        }
    }

    fn field_kind() -> FieldKind {
        T::field_kind()
    }

    fn is_optional() -> bool {
        true
    }
}

impl<T> Convertible for Box<T>
where
    T: Convertible,
{
    type Output = Box<T::Output>;

    fn to_value(&self) -> RepoResult<Value> {
        (**self).to_value()
    }

    fn from_value(value: &Value) -> RepoResult<Self::Output> {
        Ok(Box::new(T::from_value(value)?))
    }

    fn field_kind() -> FieldKind {
        T::field_kind()
    }

    fn is_optional() -> bool {
        T::is_optional()
    }
}

impl<T> Convertible for Vec<T>
where
    T: Convertible,
{
    type Output = Vec<T::Output>;

    fn to_value(&self) -> RepoResult<Value> {
        let mut array = Vec::with_capacity(self.len());
        for (index, item) in self.iter().enumerate() {
            array.push(item.to_value().map_err(|err| err.within(&index.to_string()))?);
        }
        Ok(Value::Array(array))
    }

    fn from_value(value: &Value) -> RepoResult<Self::Output> {
        match value {
            Value::Array(items) => {
                let mut result = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    result.push(T::from_value(item).map_err(|err| err.within(&index.to_string()))?);
                }
                Ok(result)
            }
            _ => Err(type_mismatch("array", value)),
        }
    }

    fn field_kind() -> FieldKind {
        FieldKind::Sequence(Box::new(T::field_kind()))
    }
}

impl<T> Convertible for BTreeMap<String, T>
where
    T: Convertible,
{
    type Output = BTreeMap<String, T::Output>;

    fn to_value(&self) -> RepoResult<Value> {
        let mut doc = Document::new();
        for (key, item) in self {
            doc.insert(key.clone(), item.to_value().map_err(|err| err.within(key))?);
        }
        Ok(Value::Document(doc))
    }

    fn from_value(value: &Value) -> RepoResult<Self::Output> {
        match value {
            Value::Document(doc) => {
                let mut result = BTreeMap::new();
                for (key, item) in doc.iter() {
                    result.insert(key.clone(), T::from_value(item).map_err(|err| err.within(key))?);
                }
                Ok(result)
            }
            _ => Err(type_mismatch("document", value)),
        }
    }

    fn field_kind() -> FieldKind {
        FieldKind::Mapping(Box::new(T::field_kind()))
    }
}

impl<T> Convertible for HashMap<String, T>
where
    T: Convertible,
{
    type Output = HashMap<String, T::Output>;

    fn to_value(&self) -> RepoResult<Value> {
        let mut doc = Document::new();
        for (key, item) in self {
            doc.insert(key.clone(), item.to_value().map_err(|err| err.within(key))?);
        }
        Ok(Value::Document(doc))
    }

    fn from_value(value: &Value) -> RepoResult<Self::Output> {
        match value {
            Value::Document(doc) => {
                let mut result = HashMap::with_capacity(doc.size());
                for (key, item) in doc.iter() {
                    result.insert(key.clone(), T::from_value(item).map_err(|err| err.within(key))?);
                }
                Ok(result)
            }
            _ => Err(type_mismatch("document", value)),
        }
    }

    fn field_kind() -> FieldKind {
        FieldKind::Mapping(Box::new(T::field_kind()))
    }
}

pub fn from_value<T>(value: &Value) -> RepoResult<T::Output>
where
    T: Convertible,
{
    T::from_value(value)
}

pub fn to_value<T>(data: &T) -> RepoResult<Value>
where
    T: Convertible,
{
    data.to_value()
}

/// Reads a declared field of a struct out of its document.
///
/// A missing field is a [ErrorKind::MappingError] naming the field unless
/// `T` is optional. Errors raised while converting the value are prefixed
/// with the field name.
pub fn read_field<T>(doc: &Document, name: &str) -> RepoResult<T::Output>
where
    T: Convertible,
{
    match doc.get_key(name) {
        Some(value) => T::from_value(value).map_err(|err| err.within(name)),
        None if T::is_optional() => T::from_value(&Value::Null).map_err(|err| err.within(name)),
        None => {
            log::error!("Missing required field '{}'", name);
            Err(RepoError::missing_field(name))
        }
    }
}

/// Like [read_field] but a missing or null field yields the default value.
pub fn read_field_or_default<T>(doc: &Document, name: &str) -> RepoResult<T::Output>
where
    T: Convertible,
    T::Output: Default,
{
    match doc.get_key(name) {
        None | Some(Value::Null) => Ok(Default::default()),
        Some(value) => T::from_value(value).map_err(|err| err.within(name)),
    }
}
