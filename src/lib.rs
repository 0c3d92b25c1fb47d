//! # serde_proto
//!
//! Prototype-preserving JSON: encode a value tree to plain JSON and decode
//! it back without losing what JSON normally drops.
//!
//! ## What survives a round trip
//!
//! - **Prototype lineage**: objects whose [`Prototype`] carries a lineage tag
//!   come back as instances of the same prototype
//! - **Special numbers**: `NaN`, `Infinity` and `-Infinity`
//! - **Dates**: to the millisecond
//! - **Patterns**: source text and flags
//!
//! Everything travels as a flat *envelope* with a reserved marker key `#`:
//!
//! ```text
//! { "x": 1, "#": "Point" }
//! { "d": 1500000000000, "#": "Date" }
//! { "r": "a+", "f": "gi", "#": "RegExp" }
//! { "#": "__NaN" }   { "#": "__Inf" }   { "#": "__-Inf" }
//! ```
//!
//! ## Two pipelines
//!
//! **Streaming** hooks into the JSON engine, one node at a time, and never
//! touches the source:
//!
//! ```rust
//! use serde_proto::{Codec, Object, Prototype, Resolver, Value};
//! use std::sync::Arc;
//!
//! let point = Arc::new(Prototype::new("Point").with_tag("Point"));
//! let mut p = Object::with_prototype(&point);
//! p.insert("x", Value::from(1));
//! p.insert("y", Value::from(f64::NEG_INFINITY));
//!
//! let json = Codec::default().encode(&Value::Object(p)).unwrap();
//! assert_eq!(json, r##"{"x":1,"y":{"#":"__-Inf"},"#":"Point"}"##);
//!
//! let resolver = Resolver::from_prototypes([&point]).unwrap();
//! let back = resolver.decode(&json).unwrap();
//! let back = back.as_object().unwrap();
//! assert!(back.instance_of(&point));
//! assert_eq!(back.get("y").and_then(|v| v.as_f64()), Some(f64::NEG_INFINITY));
//! ```
//!
//! **Deep walk** rewrites the tree in place so that a plain JSON pass keeps
//! everything, and reverses that after a plain parse:
//!
//! ```rust
//! use serde_proto::{pack_object, unpack_object, CodecOptions, Resolver, Value};
//!
//! let mut doc = Value::Array(vec![Value::from(f64::NAN)]);
//! pack_object(&mut doc, &CodecOptions::default());
//! let json = serde_proto::to_string(&doc).unwrap();
//! assert_eq!(json, r##"[{"#":"__NaN"}]"##);
//!
//! let mut back = serde_proto::from_str(&json).unwrap();
//! unpack_object(&mut back, Some(&Resolver::new())).unwrap();
//! assert!(back.as_array().unwrap()[0].as_f64().unwrap().is_nan());
//! ```
//!
//! The two are interchangeable on the wire: packed by either, decodable by
//! either.
//!
//! ## Limits
//!
//! Value trees are acyclic by construction. Recursion depth follows nesting
//! depth. A real field named `#` on a tagged object is overwritten by the
//! marker. Lineage tags must be unique per [`Resolver`];
//! [`Resolver::register`] rejects collisions.

pub mod codec;
pub mod envelope;
pub mod error;
pub mod json;
pub mod macros;
pub mod map;
pub mod options;
pub mod pattern;
pub mod proto;
pub mod resolver;
pub mod special;
pub mod value;
pub mod walk;

pub use codec::Codec;
pub use envelope::MARKER;
pub use error::{Error, Result};
pub use json::{from_reader, from_slice, from_str, to_string, to_string_pretty, to_writer, Key};
pub use map::ObjectMap;
pub use options::CodecOptions;
pub use pattern::{Pattern, PatternFlags};
pub use proto::{resolve_tag, Prototype};
pub use resolver::{Binding, Resolver};
pub use special::{pack_special_number, StandIn};
pub use value::{Number, Object, Value};
pub use walk::{pack_object, unpack_object};

/// The streaming encode hook with default options.
///
/// See [`Codec::pack`].
///
/// # Examples
///
/// ```rust
/// use serde_proto::{pack, Key, Value};
///
/// let packed = pack(Key::Root, Value::from(f64::INFINITY));
/// assert_eq!(packed.to_string(), r##"{"#":"__Inf"}"##);
/// ```
#[must_use]
pub fn pack(key: Key<'_>, value: Value) -> Value {
    Codec::default().pack(key, value)
}

/// Serializes `value` through the streaming pipeline with default options.
///
/// # Errors
///
/// Returns [`Error::Json`] if rendering fails.
pub fn encode(value: &Value) -> Result<String> {
    Codec::default().encode(value)
}

/// Parses `text` through the streaming pipeline.
///
/// # Errors
///
/// Returns [`Error::Json`] if the text is not valid JSON.
pub fn decode(text: &str, resolver: &Resolver) -> Result<Value> {
    resolver.decode(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn fixtures() -> (Arc<Prototype>, Arc<Prototype>) {
        let base = Arc::new(Prototype::new("Base").with_tag("Base"));
        let derived = Arc::new(Prototype::new("Derived").extending(&base).with_tag("Derived"));
        (base, derived)
    }

    #[test]
    fn test_encode_decode_nested_lineage() {
        let (base, derived) = fixtures();
        let mut child = Object::with_prototype(&derived);
        child.insert("s", Value::from("d1"));
        let mut parent = Object::with_prototype(&base);
        parent.insert("child", Value::Object(child));

        let json = encode(&Value::Object(parent)).unwrap();
        assert_eq!(json, r##"{"child":{"s":"d1","#":"Derived"},"#":"Base"}"##);

        let resolver = Resolver::from_prototypes([&base, &derived]).unwrap();
        let back = decode(&json, &resolver).unwrap();
        let child = back.get("child").unwrap().as_object().unwrap();
        assert!(child.instance_of(&derived));
        assert!(child.instance_of(&base));
        assert!(!back.as_object().unwrap().instance_of(&derived));
    }

    #[test]
    fn test_pack_hook_passes_strings() {
        assert_eq!(pack(Key::Field("k"), Value::from("v")), Value::from("v"));
    }
}
