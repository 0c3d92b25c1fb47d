//! Deep-walk packing and unpacking.
//!
//! Instead of hooking into the JSON engine, the deep walk rewrites a value
//! tree in place before a plain serialization pass ([`pack_object`]) or after
//! a plain parse ([`unpack_object`]). Both walks are depth-first pre-order
//! over own fields: array elements by ascending index, object fields in
//! insertion order. Nested values are handled by a recursive worker; the
//! root is stamped or revived last.
//!
//! Packing mutates the caller's tree. Running [`unpack_object`] over the
//! packed tree restores it.

use crate::envelope::{date_envelope, pattern_envelope, warn_if_reserved, MARKER};
use crate::proto::resolve_tag;
use crate::special::pack_special_number;
use crate::{CodecOptions, Error, Resolver, Result, Value};
use tracing::{debug, trace};

/// Packs `root` in place.
///
/// - non-finite numbers become `{"#": "__NaN" | "__Inf" | "__-Inf"}`
/// - tagged dates and patterns become their reserved envelopes
/// - objects with a lineage tag get a `#` field holding it; their other
///   fields are kept as they are
///
/// Plain objects, arrays and tagged objects are descended into. Objects with
/// an untagged prototype below the root are left alone entirely. A top-level
/// array is walked but never stamped; a top-level number is packed like any
/// other.
///
/// # Examples
///
/// ```rust
/// use serde_proto::{pack_object, value, CodecOptions};
///
/// let mut doc = value!({ "x": 1 });
/// doc.as_object_mut().unwrap().insert("y", f64::NAN.into());
/// pack_object(&mut doc, &CodecOptions::default());
/// assert_eq!(doc.to_string(), r##"{"x":1,"y":{"#":"__NaN"}}"##);
/// ```
pub fn pack_object(root: &mut Value, options: &CodecOptions) {
    debug!("deep-walk pack");
    if root.is_number() {
        pack_slot(root, options);
        return;
    }
    pack_children(root, options);
    if !root.is_array() {
        stamp(root, options);
    }
}

fn pack_children(container: &mut Value, options: &CodecOptions) {
    match container {
        Value::Array(items) => {
            for item in items.iter_mut() {
                pack_slot(item, options);
            }
        }
        Value::Object(obj) => {
            for value in obj.fields_mut().values_mut() {
                pack_slot(value, options);
            }
        }
        _ => {}
    }
}

fn pack_slot(slot: &mut Value, options: &CodecOptions) {
    if let Value::Number(n) = slot {
        if let Some(stand_in) = pack_special_number(n) {
            trace!(tag = stand_in.tag(), "packed special number");
            *slot = stand_in.to_envelope();
        }
        return;
    }
    if is_walkable(slot, options) {
        pack_children(slot, options);
    }
    stamp(slot, options);
}

/// Plain objects, arrays and tagged objects are descended into; dates and
/// patterns are terminal.
fn is_walkable(value: &Value, options: &CodecOptions) -> bool {
    match value {
        Value::Array(_) => true,
        Value::Object(obj) => obj.is_plain() || resolve_tag(value, options).is_some(),
        _ => false,
    }
}

fn stamp(slot: &mut Value, options: &CodecOptions) {
    let Some(tag) = resolve_tag(slot, options).map(str::to_owned) else {
        return;
    };
    let envelope = match slot {
        Value::Date(date) => date_envelope(date),
        Value::Pattern(pattern) => pattern_envelope(pattern),
        Value::Object(obj) => {
            if !tag.is_empty() {
                warn_if_reserved(&tag);
                trace!(tag = tag.as_str(), "stamped object");
                obj.insert(MARKER, Value::from(tag));
            }
            return;
        }
        _ => return,
    };
    trace!(tag = tag.as_str(), "packed built-in");
    *slot = envelope;
}

/// Unpacks `root` in place, reviving every resolvable envelope.
///
/// Children are revived before their parent, and the root last (unless it
/// is an array). Envelopes whose tag cannot be resolved stay as plain
/// objects with their marker.
///
/// # Errors
///
/// Returns [`Error::MissingResolver`] when `resolver` is `None`; the tree is
/// left untouched in that case.
///
/// # Examples
///
/// ```rust
/// use serde_proto::{unpack_object, value, Resolver};
///
/// let mut doc = value!({ "big": { "#": "__Inf" } });
/// unpack_object(&mut doc, Some(&Resolver::new())).unwrap();
/// assert_eq!(doc.get("big").and_then(|v| v.as_f64()), Some(f64::INFINITY));
/// ```
pub fn unpack_object(root: &mut Value, resolver: Option<&Resolver>) -> Result<()> {
    let resolver = resolver.ok_or(Error::MissingResolver)?;
    debug!(bindings = resolver.len(), "deep-walk unpack");
    unpack_children(root, resolver);
    if !root.is_array() {
        revive_slot(root, resolver);
    }
    Ok(())
}

fn unpack_children(container: &mut Value, resolver: &Resolver) {
    match container {
        Value::Array(items) => {
            for item in items.iter_mut() {
                unpack_slot(item, resolver);
            }
        }
        Value::Object(obj) => {
            for value in obj.fields_mut().values_mut() {
                unpack_slot(value, resolver);
            }
        }
        _ => {}
    }
}

fn unpack_slot(slot: &mut Value, resolver: &Resolver) {
    if !slot.is_compound() {
        return;
    }
    unpack_children(slot, resolver);
    revive_slot(slot, resolver);
}

fn revive_slot(slot: &mut Value, resolver: &Resolver) {
    let value = std::mem::take(slot);
    *slot = resolver.revive_owned(value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{value, Object, Pattern, Prototype};
    use chrono::{TimeZone, Utc};
    use std::io;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_untagged_prototype_not_descended() {
        let opaque = Arc::new(Prototype::new("Opaque"));
        let mut inner = Object::with_prototype(&opaque);
        inner.insert("n", Value::from(f64::INFINITY));

        let mut doc = Value::Object(Object::new());
        doc.as_object_mut().unwrap().insert("inner", Value::Object(inner));
        pack_object(&mut doc, &CodecOptions::default());

        let inner = doc.get("inner").unwrap().as_object().unwrap();
        assert_eq!(inner.get("n"), Some(&Value::from(f64::INFINITY)));
        assert!(inner.get(MARKER).is_none());
    }

    #[test]
    fn test_tagged_object_keeps_prototype_and_fields() {
        let proto = Arc::new(Prototype::new("Base").with_tag("Base"));
        let mut obj = Object::with_prototype(&proto);
        obj.insert("ts", Value::from(5));
        let mut doc = Value::Object(obj);

        pack_object(&mut doc, &CodecOptions::default());
        let obj = doc.as_object().unwrap();
        assert!(obj.instance_of(&proto));
        assert_eq!(doc.to_string(), r##"{"ts":5,"#":"Base"}"##);
    }

    #[test]
    fn test_builtins_replaced_in_place() {
        let mut doc = value!({ "items": [] });
        let items = match doc.as_object_mut().unwrap().get_mut("items") {
            Some(Value::Array(items)) => items,
            _ => unreachable!(),
        };
        items.push(Value::Date(Utc.timestamp_millis_opt(42).unwrap()));
        items.push(Value::Pattern(Pattern::new("x", "im").unwrap()));

        pack_object(&mut doc, &CodecOptions::default());
        assert_eq!(
            doc.to_string(),
            r##"{"items":[{"d":42,"#":"Date"},{"r":"x","f":"im","#":"RegExp"}]}"##
        );
    }

    #[test]
    fn test_untagged_builtins_left_alone() {
        let date = Utc.timestamp_millis_opt(42).unwrap();
        let mut doc = Value::Array(vec![Value::Date(date)]);
        pack_object(&mut doc, &CodecOptions::plain());
        assert_eq!(doc, Value::Array(vec![Value::Date(date)]));
    }

    #[test]
    fn test_root_array_not_stamped_but_walked() {
        let mut doc = Value::Array(vec![Value::from(f64::NEG_INFINITY)]);
        pack_object(&mut doc, &CodecOptions::default());
        assert_eq!(doc.to_string(), r##"[{"#":"__-Inf"}]"##);
    }

    #[test]
    fn test_root_number_packed() {
        let mut doc = Value::from(f64::NAN);
        pack_object(&mut doc, &CodecOptions::default());
        assert_eq!(doc.to_string(), r##"{"#":"__NaN"}"##);

        let mut plain = Value::from(4);
        pack_object(&mut plain, &CodecOptions::default());
        assert_eq!(plain, Value::from(4));
    }

    #[test]
    fn test_root_date_is_stamped() {
        let mut doc = Value::Date(Utc.timestamp_millis_opt(7).unwrap());
        pack_object(&mut doc, &CodecOptions::default());
        assert_eq!(doc.to_string(), r##"{"d":7,"#":"Date"}"##);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_reserved_tag_on_object_warns() {
        let fake = Arc::new(Prototype::new("FakeDate").with_tag("Date"));
        let mut obj = Object::with_prototype(&fake);
        obj.insert("d", Value::from(5));
        obj.insert("other", Value::from("x"));
        let mut doc = Value::Array(vec![Value::Object(obj)]);

        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            pack_object(&mut doc, &CodecOptions::default());
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("reserved tag"), "no warning in: {logs}");
        assert!(logs.contains("Date"));
        assert_eq!(doc.to_string(), r##"[{"d":5,"other":"x","#":"Date"}]"##);
    }

    #[test]
    fn test_missing_resolver_leaves_tree_untouched() {
        let mut doc = value!({ "n": { "#": "__NaN" } });
        let before = doc.clone();
        let err = unpack_object(&mut doc, None).unwrap_err();
        assert!(matches!(err, Error::MissingResolver));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_unpack_root_revived_last() {
        let proto = Arc::new(Prototype::new("Box").with_tag("Box"));
        let resolver = Resolver::from_prototypes([&proto]).unwrap();
        let mut doc = value!({ "inner": { "v": 1, "#": "Box" }, "#": "Box" });

        unpack_object(&mut doc, Some(&resolver)).unwrap();
        let outer = doc.as_object().unwrap();
        assert!(outer.instance_of(&proto));
        assert!(outer.get("inner").unwrap().as_object().unwrap().instance_of(&proto));
        assert!(outer.get(MARKER).is_none());
    }

    #[test]
    fn test_unresolved_keeps_marker() {
        let mut doc = value!({ "x": { "a": 1, "#": "Unknown" } });
        unpack_object(&mut doc, Some(&Resolver::new())).unwrap();
        assert_eq!(doc.to_string(), r##"{"x":{"a":1,"#":"Unknown"}}"##);
    }
}
