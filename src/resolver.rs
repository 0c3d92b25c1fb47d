//! Resolving lineage tags back to prototypes.
//!
//! A [`Resolver`] is the receiving side's table from tag name to the
//! constructor whose prototype should be restored. It drives both decode
//! pipelines: [`Resolver::unpack`] is the per-node hook for the streaming
//! pipeline, and [`unpack_object`](crate::unpack_object) borrows it for the
//! deep walk.
//!
//! Lookups are best effort. A tag with no binding, or bound to something
//! that is not a constructor, leaves the envelope as plain data with its
//! marker still present.
//!
//! ## Examples
//!
//! ```rust
//! use serde_proto::{Codec, Object, Prototype, Resolver, Value};
//! use std::sync::Arc;
//!
//! let point = Arc::new(Prototype::new("Point").with_tag("Point"));
//! let mut obj = Object::with_prototype(&point);
//! obj.insert("x", Value::from(3));
//!
//! let json = Codec::default().encode(&Value::Object(obj)).unwrap();
//! assert_eq!(json, r##"{"x":3,"#":"Point"}"##);
//!
//! let mut resolver = Resolver::new();
//! resolver.register(&point).unwrap();
//! let back = resolver.decode(&json).unwrap();
//! assert!(back.as_object().unwrap().instance_of(&point));
//! ```

use crate::envelope::{is_reserved, reserved_factory, Factory, MARKER};
use crate::json::{self, Key};
use crate::{walk, Error, Object, ObjectMap, Prototype, Result, Value};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// What a tag name is bound to.
#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    /// A constructor: revived instances get this prototype.
    Constructor(Arc<Prototype>),
    /// Any other entry. Lookups that hit it are unresolved.
    Opaque(Value),
}

enum Revival<'a> {
    Factory(Factory),
    Constructor(&'a Arc<Prototype>),
}

/// Table from tag name to [`Binding`].
#[derive(Clone, Debug, Default)]
pub struct Resolver {
    bindings: IndexMap<String, Binding>,
}

impl Resolver {
    #[must_use]
    pub fn new() -> Self {
        Resolver::default()
    }

    /// Builds a resolver from prototypes, registering each in turn.
    ///
    /// # Errors
    ///
    /// Fails on the first prototype [`Resolver::register`] rejects.
    pub fn from_prototypes<'a, I>(prototypes: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Arc<Prototype>>,
    {
        let mut resolver = Resolver::new();
        for proto in prototypes {
            resolver.register(proto)?;
        }
        Ok(resolver)
    }

    /// Binds a prototype under its lineage tag.
    ///
    /// Registering the same prototype twice is a no-op.
    ///
    /// # Errors
    ///
    /// - [`Error::UntaggedPrototype`] if the prototype has no (or an empty) tag
    /// - [`Error::ReservedTag`] for `__NaN`, `__Inf`, `__-Inf`, `Date`, `RegExp`
    /// - [`Error::TagCollision`] if the tag is bound to something else
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_proto::{Error, Prototype, Resolver};
    /// use std::sync::Arc;
    ///
    /// let a = Arc::new(Prototype::new("A").with_tag("Shape"));
    /// let b = Arc::new(Prototype::new("B").with_tag("Shape"));
    ///
    /// let mut resolver = Resolver::new();
    /// resolver.register(&a).unwrap();
    /// resolver.register(&a).unwrap();
    /// assert!(matches!(resolver.register(&b), Err(Error::TagCollision { .. })));
    /// ```
    pub fn register(&mut self, proto: &Arc<Prototype>) -> Result<()> {
        let tag = match proto.lineage_tag() {
            Some(tag) if !tag.is_empty() => tag,
            _ => return Err(Error::UntaggedPrototype(proto.name().to_string())),
        };
        if is_reserved(tag) {
            return Err(Error::ReservedTag(tag.to_string()));
        }
        match self.bindings.get(tag) {
            Some(Binding::Constructor(existing)) if Arc::ptr_eq(existing, proto) => {
                return Ok(())
            }
            Some(Binding::Constructor(existing)) => {
                return Err(Error::tag_collision(tag, existing.name(), proto.name()))
            }
            Some(Binding::Opaque(_)) => {
                return Err(Error::tag_collision(tag, "<opaque>", proto.name()))
            }
            None => {}
        }
        debug!(tag, prototype = proto.name(), "registered prototype");
        self.bindings
            .insert(tag.to_string(), Binding::Constructor(Arc::clone(proto)));
        Ok(())
    }

    /// Inserts a binding without any checks, returning the previous one.
    pub fn insert(&mut self, tag: impl Into<String>, binding: Binding) -> Option<Binding> {
        self.bindings.insert(tag.into(), binding)
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&Binding> {
        self.bindings.get(tag)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterates over the bound tag names in insertion order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    fn lookup(&self, fields: &ObjectMap) -> Option<Revival<'_>> {
        let tag = fields.get(MARKER)?.as_str().filter(|tag| !tag.is_empty())?;
        if let Some(factory) = reserved_factory(tag) {
            return Some(Revival::Factory(factory));
        }
        match self.bindings.get(tag) {
            Some(Binding::Constructor(proto)) => Some(Revival::Constructor(proto)),
            Some(Binding::Opaque(_)) => {
                debug!(tag, "tag bound to a non-constructor, leaving envelope as data");
                None
            }
            None => {
                debug!(tag, "unresolved tag, leaving envelope as data");
                None
            }
        }
    }

    /// Decodes a single envelope, without touching its children.
    ///
    /// Returns `None` when `value` is not an envelope, or its tag cannot be
    /// resolved, or a reserved envelope is malformed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_proto::{value, Resolver};
    ///
    /// let resolver = Resolver::new();
    /// let revived = resolver.revive(&value!({ "#": "__Inf" })).unwrap();
    /// assert_eq!(revived.as_f64(), Some(f64::INFINITY));
    /// assert!(resolver.revive(&value!({ "#": "Missing" })).is_none());
    /// ```
    #[must_use]
    pub fn revive(&self, value: &Value) -> Option<Value> {
        let obj = value.as_object()?;
        match self.lookup(obj.fields())? {
            Revival::Factory(factory) => factory(obj.fields()),
            Revival::Constructor(proto) => {
                let mut fields = obj.fields().clone();
                fields.remove(MARKER);
                Some(Value::Object(Object::from_parts(
                    Some(Arc::clone(proto)),
                    fields,
                )))
            }
        }
    }

    /// Owned form of [`Resolver::revive`]: moves the fields instead of
    /// copying them and hands the value back unchanged on a miss.
    #[must_use]
    pub fn revive_owned(&self, value: Value) -> Value {
        let obj = match value {
            Value::Object(obj) => obj,
            other => return other,
        };
        match self.lookup(obj.fields()) {
            Some(Revival::Factory(factory)) => match factory(obj.fields()) {
                Some(revived) => {
                    trace!("revived reserved envelope");
                    revived
                }
                None => {
                    debug!("malformed reserved envelope, leaving as data");
                    Value::Object(obj)
                }
            },
            Some(Revival::Constructor(proto)) => {
                let proto = Arc::clone(proto);
                trace!(prototype = proto.name(), "revived instance");
                let (_, mut fields) = obj.into_parts();
                fields.remove(MARKER);
                Value::Object(Object::from_parts(Some(proto), fields))
            }
            None => Value::Object(obj),
        }
    }

    /// The streaming decode hook: revives `value` if it is a resolvable
    /// envelope and returns it unchanged otherwise.
    ///
    /// The JSON engine calls it once per node, children first, so nested
    /// envelopes are already revived when their parent is visited.
    pub fn unpack(&self, _key: Key<'_>, value: Value) -> Value {
        self.revive_owned(value)
    }

    /// Parses JSON text, reviving envelopes node by node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the text is not valid JSON.
    pub fn decode(&self, text: &str) -> Result<Value> {
        debug!(len = text.len(), "streaming decode");
        json::from_str_with(text, |key, value| self.unpack(key, value))
    }

    /// Parses JSON text as plain data, then revives it with a deep walk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the text is not valid JSON.
    pub fn decode_in_place(&self, text: &str) -> Result<Value> {
        let mut value = json::from_str(text)?;
        walk::unpack_object(&mut value, Some(self))?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;

    fn shape() -> Arc<Prototype> {
        Arc::new(Prototype::new("Shape").with_tag("Shape"))
    }

    #[test]
    fn test_register_rejects_untagged() {
        let mut resolver = Resolver::new();
        let anon = Arc::new(Prototype::new("Anon"));
        let blank = Arc::new(Prototype::new("Blank").with_tag(""));
        assert!(matches!(
            resolver.register(&anon),
            Err(Error::UntaggedPrototype(_))
        ));
        assert!(matches!(
            resolver.register(&blank),
            Err(Error::UntaggedPrototype(_))
        ));
    }

    #[test]
    fn test_register_rejects_reserved() {
        let mut resolver = Resolver::new();
        let fake = Arc::new(Prototype::new("FakeDate").with_tag("Date"));
        assert!(matches!(resolver.register(&fake), Err(Error::ReservedTag(_))));
        assert!(resolver.is_empty());
    }

    #[test]
    fn test_register_detects_opaque_collision() {
        let mut resolver = Resolver::new();
        resolver.insert("Shape", Binding::Opaque(Value::from(1)));
        assert!(matches!(
            resolver.register(&shape()),
            Err(Error::TagCollision { .. })
        ));
    }

    #[test]
    fn test_revive_restores_prototype_and_strips_marker() {
        let proto = shape();
        let resolver = Resolver::from_prototypes([&proto]).unwrap();
        let envelope = value!({ "side": 2, "#": "Shape" });

        let revived = resolver.revive(&envelope).unwrap();
        let obj = revived.as_object().unwrap();
        assert!(obj.instance_of(&proto));
        assert!(obj.get(MARKER).is_none());
        assert_eq!(obj.get("side").and_then(Value::as_i64), Some(2));
    }

    #[test]
    fn test_opaque_binding_is_unresolved() {
        let mut resolver = Resolver::new();
        resolver.insert("Shape", Binding::Opaque(value!({ "prototype": 1 })));
        let envelope = value!({ "#": "Shape" });
        assert_eq!(resolver.revive_owned(envelope.clone()), envelope);
    }

    #[test]
    fn test_non_string_marker_ignored() {
        let resolver = Resolver::from_prototypes([&shape()]).unwrap();
        let envelope = value!({ "#": 5 });
        assert!(resolver.revive(&envelope).is_none());
        let empty = value!({ "#": "" });
        assert!(resolver.revive(&empty).is_none());
    }

    #[test]
    fn test_malformed_date_envelope_passes_through() {
        let resolver = Resolver::new();
        let envelope = value!({ "#": "Date" });
        assert_eq!(resolver.revive_owned(envelope.clone()), envelope);
    }

    #[test]
    fn test_non_objects_unchanged() {
        let resolver = Resolver::new();
        assert_eq!(resolver.unpack(Key::Root, Value::from("#")), Value::from("#"));
        assert_eq!(resolver.unpack(Key::Index(0), Value::Null), Value::Null);
    }
}
