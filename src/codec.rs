//! The sending side: packing values for transport.
//!
//! A [`Codec`] holds the [`CodecOptions`] and offers both pipelines:
//!
//! - **streaming**: [`Codec::pack`] is a per-node hook for the JSON engine;
//!   [`Codec::encode`] wires it up. The source value is never modified.
//! - **deep walk**: [`Codec::pack_object`] rewrites a tree in place so that a
//!   plain JSON pass keeps everything; [`Codec::encode_in_place`] does both.
//!
//! Either output can be decoded by either pipeline on the receiving side.

use crate::json::{self, Key};
use crate::special::{pack_special_number, StandIn};
use crate::{envelope, proto, walk, CodecOptions, Result, Value};
use tracing::{debug, trace};

/// Packs values into prototype-preserving JSON.
///
/// # Examples
///
/// ```rust
/// use serde_proto::{value, Codec, Value};
///
/// let mut doc = value!({});
/// let obj = doc.as_object_mut().unwrap();
/// obj.insert("x", Value::from(f64::NAN));
/// obj.insert("y", Value::from(f64::INFINITY));
///
/// let json = Codec::default().encode(&doc).unwrap();
/// assert_eq!(json, r##"{"x":{"#":"__NaN"},"y":{"#":"__Inf"}}"##);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Codec {
    options: CodecOptions,
}

impl Codec {
    #[must_use]
    pub fn new(options: CodecOptions) -> Self {
        Codec { options }
    }

    #[must_use]
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// The lineage tag of `value` under this codec's options.
    #[must_use]
    pub fn resolve_tag<'a>(&self, value: &'a Value) -> Option<&'a str> {
        proto::resolve_tag(value, &self.options)
    }

    /// Computes the transport form of a single node, or `None` when the node
    /// is used unchanged. Children are not visited.
    #[must_use]
    pub fn pack_node(&self, value: &Value) -> Option<Value> {
        if let Value::Number(n) = value {
            return pack_special_number(n).map(|stand_in| {
                trace!(tag = stand_in.tag(), "packed special number");
                StandIn::to_envelope(stand_in)
            });
        }
        let tag = self.resolve_tag(value)?;
        let packed = envelope::pack_envelope(value, tag)?;
        trace!(tag, "packed tagged value");
        Some(packed)
    }

    /// The streaming encode hook: returns the envelope for tagged objects,
    /// dates, patterns and non-finite numbers, and `value` unchanged
    /// otherwise.
    pub fn pack(&self, _key: Key<'_>, value: Value) -> Value {
        self.pack_node(&value).unwrap_or(value)
    }

    /// Serializes `value` through the streaming hook.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if rendering fails.
    pub fn encode(&self, value: &Value) -> Result<String> {
        debug!("streaming encode");
        json::to_string_with_options(value, &self.options, |key, node| self.pack(key, node))
    }

    /// Packs `value` in place with the deep walk.
    pub fn pack_object(&self, value: &mut Value) {
        walk::pack_object(value, &self.options);
    }

    /// Deep-walk packs `value`, then serializes it as plain JSON.
    ///
    /// `value` is left in its packed form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if rendering fails.
    pub fn encode_in_place(&self, value: &mut Value) -> Result<String> {
        self.pack_object(value);
        json::render(value, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{value, Object, Pattern, Prototype};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    #[test]
    fn test_encode_leaves_source_untouched() {
        let proto = Arc::new(Prototype::new("P").with_tag("P"));
        let mut obj = Object::with_prototype(&proto);
        obj.insert("n", Value::from(f64::NAN));
        let source = Value::Object(obj);
        let snapshot = format!("{:?}", source);

        let json = Codec::default().encode(&source).unwrap();
        assert_eq!(json, r##"{"n":{"#":"__NaN"},"#":"P"}"##);
        assert_eq!(format!("{:?}", source), snapshot);
    }

    #[test]
    fn test_untagged_date_renders_as_string() {
        let doc = Value::Array(vec![Value::Date(Utc.timestamp_millis_opt(0).unwrap())]);
        let codec = Codec::new(CodecOptions::plain());
        assert_eq!(codec.encode(&doc).unwrap(), r#"["1970-01-01T00:00:00.000Z"]"#);
    }

    #[test]
    fn test_tagged_builtins_streamed() {
        let doc = Value::Array(vec![
            Value::Date(Utc.timestamp_millis_opt(1).unwrap()),
            Value::Pattern(Pattern::new("a", "yg").unwrap()),
        ]);
        assert_eq!(
            Codec::default().encode(&doc).unwrap(),
            r##"[{"d":1,"#":"Date"},{"r":"a","f":"gy","#":"RegExp"}]"##
        );
    }

    #[test]
    fn test_untagged_pattern_renders_empty() {
        let doc = Value::Pattern(Pattern::new("a", "").unwrap());
        let codec = Codec::new(CodecOptions::new().with_patterns(false));
        assert_eq!(codec.encode(&doc).unwrap(), "{}");
    }

    #[test]
    fn test_plain_values_unchanged() {
        let codec = Codec::default();
        let doc = value!({ "a": [1, 2.5, "s", true, null] });
        assert_eq!(codec.pack(Key::Root, doc.clone()), doc);
        assert!(codec.pack_node(&Value::from(3)).is_none());
    }

    #[test]
    fn test_encode_in_place_pretty() {
        let codec = Codec::new(CodecOptions::new().with_pretty(true));
        let mut doc = Value::Array(vec![Value::from(f64::INFINITY)]);
        let json = codec.encode_in_place(&mut doc).unwrap();
        assert_eq!(json, "[\n  {\n    \"#\": \"__Inf\"\n  }\n]");
    }
}
