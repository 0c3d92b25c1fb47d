//! Dynamic value representation.
//!
//! This module provides the [`Value`] tree that both codec pipelines operate
//! on. It is richer than plain JSON in exactly the ways the codec preserves:
//!
//! - objects may have a [`Prototype`], which JSON cannot express
//! - numbers include `NaN`, `Infinity` and `-Infinity`
//! - dates and patterns are first-class values
//!
//! ## Creating Values
//!
//! ```rust
//! use serde_proto::{value, Object, Prototype, Value};
//! use std::sync::Arc;
//!
//! let point = Arc::new(Prototype::new("Point").with_tag("Point"));
//! let mut obj = Object::with_prototype(&point);
//! obj.insert("x", Value::from(1));
//! obj.insert("y", Value::from(f64::INFINITY));
//!
//! let doc = value!({ "origin": "here", "tags": ["a", "b"] });
//! assert!(doc.is_object());
//! assert!(Value::Object(obj).is_object());
//! ```
//!
//! ## Serde
//!
//! [`Value`] implements `Serialize` / `Deserialize` as *plain* JSON data:
//! prototypes are dropped, non-finite numbers become `null`, dates become
//! RFC 3339 strings and patterns become empty objects. Use a
//! [`Codec`](crate::Codec) to keep that information.

use crate::{ObjectMap, Pattern, Prototype};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// A dynamically-typed value tree.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(Object),
    Date(DateTime<Utc>),
    Pattern(Pattern),
}

/// A numeric value that can be an integer, float, or non-finite special value.
///
/// # Examples
///
/// ```rust
/// use serde_proto::Number;
///
/// assert!(Number::from(f64::NAN).is_special());
/// assert_eq!(Number::from(f64::NEG_INFINITY), Number::NegativeInfinity);
/// assert_eq!(Number::Integer(42).as_i64(), Some(42));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
    Infinity,
    NegativeInfinity,
    NaN,
}

impl Number {
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Returns `true` for `NaN` and the infinities, including a `Float`
    /// variant that holds a non-finite value.
    #[inline]
    #[must_use]
    pub fn is_special(&self) -> bool {
        match self {
            Number::Integer(_) => false,
            Number::Float(f) => !f.is_finite(),
            Number::Infinity | Number::NegativeInfinity | Number::NaN => true,
        }
    }

    /// Converts this number to an `i64` if it is integral and in range.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Converts this number to an `f64`. Always succeeds.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
            Number::Infinity => f64::INFINITY,
            Number::NegativeInfinity => f64::NEG_INFINITY,
            Number::NaN => f64::NAN,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(fl) => write!(f, "{}", fl),
            Number::Infinity => write!(f, "Infinity"),
            Number::NegativeInfinity => write!(f, "-Infinity"),
            Number::NaN => write!(f, "NaN"),
        }
    }
}

macro_rules! number_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Number {
                fn from(value: $ty) -> Self {
                    Number::Integer(value as i64)
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(Number::from(value))
                }
            }
        )*
    };
}

number_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            Number::NaN
        } else if value == f64::INFINITY {
            Number::Infinity
        } else if value == f64::NEG_INFINITY {
            Number::NegativeInfinity
        } else {
            Number::Float(value)
        }
    }
}

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        Number::from(value as f64)
    }
}

/// An object: own fields in insertion order plus an optional prototype.
///
/// An object without a prototype is a *plain container*. Equality compares
/// prototypes by identity and fields structurally.
///
/// # Examples
///
/// ```rust
/// use serde_proto::{Object, Prototype, Value};
/// use std::sync::Arc;
///
/// let base = Arc::new(Prototype::new("Base").with_tag("Base"));
/// let mut obj = Object::with_prototype(&base);
/// obj.insert("ts", Value::from(0));
///
/// assert!(obj.instance_of(&base));
/// assert!(!obj.is_plain());
/// assert_eq!(obj.get("ts").and_then(|v| v.as_i64()), Some(0));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Object {
    proto: Option<Arc<Prototype>>,
    fields: ObjectMap,
}

impl Object {
    /// Creates an empty plain object.
    #[must_use]
    pub fn new() -> Self {
        Object::default()
    }

    /// Creates an empty object with the given prototype.
    #[must_use]
    pub fn with_prototype(proto: &Arc<Prototype>) -> Self {
        Object {
            proto: Some(Arc::clone(proto)),
            fields: ObjectMap::new(),
        }
    }

    /// Creates an object from a prototype and a set of own fields.
    #[must_use]
    pub fn from_parts(proto: Option<Arc<Prototype>>, fields: ObjectMap) -> Self {
        Object { proto, fields }
    }

    #[must_use]
    pub fn prototype(&self) -> Option<&Arc<Prototype>> {
        self.proto.as_ref()
    }

    pub fn set_prototype(&mut self, proto: Option<Arc<Prototype>>) {
        self.proto = proto;
    }

    /// Returns `true` when the object has no prototype.
    #[must_use]
    pub fn is_plain(&self) -> bool {
        self.proto.is_none()
    }

    /// Returns `true` if `proto` is on this object's prototype chain.
    #[must_use]
    pub fn instance_of(&self, proto: &Arc<Prototype>) -> bool {
        self.proto
            .as_ref()
            .is_some_and(|own| Prototype::descends_from(own, proto))
    }

    #[must_use]
    pub fn fields(&self) -> &ObjectMap {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut ObjectMap {
        &mut self.fields
    }

    #[must_use]
    pub fn into_parts(self) -> (Option<Arc<Prototype>>, ObjectMap) {
        (self.proto, self.fields)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.fields.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        let same_proto = match (&self.proto, &other.proto) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        same_proto && self.fields == other.fields
    }
}

impl From<ObjectMap> for Object {
    fn from(fields: ObjectMap) -> Self {
        Object { proto: None, fields }
    }
}

impl Value {
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_date(&self) -> bool {
        matches!(self, Value::Date(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_pattern(&self) -> bool {
        matches!(self, Value::Pattern(_))
    }

    /// Returns `true` for the values a host language would call objects:
    /// objects, arrays, dates and patterns.
    #[inline]
    #[must_use]
    pub const fn is_compound(&self) -> bool {
        matches!(
            self,
            Value::Object(_) | Value::Array(_) | Value::Date(_) | Value::Pattern(_)
        )
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// If the value is an integer or a whole-number float, returns it.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(dt) => Some(dt),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_pattern(&self) -> Option<&Pattern> {
        match self {
            Value::Pattern(p) => Some(p),
            _ => None,
        }
    }

    /// Looks up an own field when the value is an object.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Integer(i)) => serializer.serialize_i64(*i),
            Value::Number(Number::Float(f)) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Number(_) => serializer.serialize_unit(),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(arr) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for element in arr {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            Value::Object(obj) => {
                use serde::ser::SerializeMap;
                let mut map = serializer.serialize_map(Some(obj.len()))?;
                for (k, v) in obj.fields().iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Date(dt) => {
                serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Pattern(_) => {
                use serde::ser::SerializeMap;
                serializer.serialize_map(Some(0))?.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid JSON value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(Value::Number(Number::Integer(value)))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E> {
                if value <= i64::MAX as u64 {
                    Ok(Value::Number(Number::Integer(value as i64)))
                } else {
                    Ok(Value::Number(Number::Float(value as f64)))
                }
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(Value::Number(Number::from(value)))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(Value::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(Value::String(value))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::Array(vec))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = ObjectMap::new();
                while let Some((key, value)) = map.next_entry()? {
                    values.insert(key, value);
                }
                Ok(Value::Object(Object::from(values)))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| crate::Error::custom(format!("expected integer, found {:?}", value)))
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| crate::Error::custom(format!("expected number, found {:?}", value)))
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            _ => Err(crate::Error::custom(format!(
                "expected string, found {:?}",
                value
            ))),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<ObjectMap> for Value {
    fn from(value: ObjectMap) -> Self {
        Value::Object(Object::from(value))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<Pattern> for Value {
    fn from(value: Pattern) -> Self {
        Value::Pattern(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_float_normalizes_specials() {
        assert_eq!(Number::from(f64::INFINITY), Number::Infinity);
        assert_eq!(Number::from(f64::NEG_INFINITY), Number::NegativeInfinity);
        assert!(matches!(Number::from(f64::NAN), Number::NaN));
        assert_eq!(Number::from(1.5), Number::Float(1.5));
    }

    #[test]
    fn test_raw_float_special_detected() {
        assert!(Number::Float(f64::NAN).is_special());
        assert!(!Number::Float(0.0).is_special());
        assert!(!Number::Integer(i64::MAX).is_special());
    }

    #[test]
    fn test_object_equality_uses_prototype_identity() {
        let a = Arc::new(Prototype::new("A").with_tag("A"));
        let twin = Arc::new(Prototype::new("A").with_tag("A"));
        assert_eq!(Object::with_prototype(&a), Object::with_prototype(&a));
        assert_ne!(Object::with_prototype(&a), Object::with_prototype(&twin));
        assert_ne!(Object::with_prototype(&a), Object::new());
    }

    #[test]
    fn test_plain_serialization_drops_extras() {
        let proto = Arc::new(Prototype::new("P").with_tag("P"));
        let mut obj = Object::with_prototype(&proto);
        obj.insert("n", Value::from(f64::NAN));
        obj.insert("re", Value::Pattern(Pattern::new("a", "g").unwrap()));
        obj.insert(
            "at",
            Value::Date(Utc.timestamp_millis_opt(1_500_000_000_123).unwrap()),
        );

        let json = serde_json::to_string(&Value::Object(obj)).unwrap();
        assert_eq!(
            json,
            r#"{"n":null,"re":{},"at":"2017-07-14T02:40:00.123Z"}"#
        );
    }

    #[test]
    fn test_deserialize_keeps_field_order() {
        let value: Value = serde_json::from_str(r#"{"z":1,"a":[true,null],"m":2.5}"#).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().fields().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert_eq!(value.get("m"), Some(&Value::from(2.5)));
    }

    #[test]
    fn test_try_from_conversions() {
        assert_eq!(i64::try_from(Value::from(7)).unwrap(), 7);
        assert!(f64::try_from(Value::from(f64::INFINITY)).unwrap().is_infinite());
        assert!(String::try_from(Value::Null).is_err());
    }
}
