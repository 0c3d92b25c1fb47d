//! Transport envelopes.
//!
//! Every value the codec has to annotate travels as a flat mapping carrying
//! the marker key `#`:
//!
//! ```text
//! { "<own-field>": <value>, ..., "#": "<Tag>" }   tagged object
//! { "d": <epoch-ms>, "#": "Date" }                 date
//! { "r": "<source>", "f": "<flags>", "#": "RegExp" }  pattern
//! { "#": "__NaN" } / { "#": "__Inf" } / { "#": "__-Inf" }
//! ```
//!
//! This module builds those mappings and holds the factories that turn the
//! reserved ones back into values.

use crate::{ObjectMap, Pattern, Value};
use chrono::{DateTime, TimeZone, Utc};
use tracing::warn;

/// The marker key shared by all envelope kinds.
pub const MARKER: &str = "#";

pub const NAN_TAG: &str = "__NaN";
pub const INFINITY_TAG: &str = "__Inf";
pub const NEG_INFINITY_TAG: &str = "__-Inf";
pub const DATE_TAG: &str = "Date";
pub const PATTERN_TAG: &str = "RegExp";

/// Epoch milliseconds of a date envelope.
pub const DATE_FIELD: &str = "d";
/// Source text of a pattern envelope.
pub const SOURCE_FIELD: &str = "r";
/// Flag string of a pattern envelope.
pub const FLAGS_FIELD: &str = "f";

/// Tags that are decoded by a built-in factory instead of a resolver lookup.
pub const RESERVED_TAGS: [&str; 5] = [
    NAN_TAG,
    INFINITY_TAG,
    NEG_INFINITY_TAG,
    DATE_TAG,
    PATTERN_TAG,
];

#[must_use]
pub fn is_reserved(tag: &str) -> bool {
    RESERVED_TAGS.contains(&tag)
}

/// Warns when an object's prototype carries a reserved tag. The envelope is
/// still written, but decodes as the built-in, not as an instance.
pub(crate) fn warn_if_reserved(tag: &str) {
    if is_reserved(tag) {
        warn!(
            tag,
            "object prototype uses a reserved tag; it will not revive as an instance"
        );
    }
}

/// Builds `{"d": <epoch-ms>, "#": "Date"}`.
#[must_use]
pub fn date_envelope(date: &DateTime<Utc>) -> Value {
    let mut fields = ObjectMap::with_capacity(2);
    fields.insert(DATE_FIELD.to_string(), Value::from(date.timestamp_millis()));
    fields.insert(MARKER.to_string(), Value::from(DATE_TAG));
    Value::from(fields)
}

/// Builds `{"r": <source>, "f": <flags>, "#": "RegExp"}`.
#[must_use]
pub fn pattern_envelope(pattern: &Pattern) -> Value {
    let mut fields = ObjectMap::with_capacity(3);
    fields.insert(SOURCE_FIELD.to_string(), Value::from(pattern.source()));
    fields.insert(FLAGS_FIELD.to_string(), Value::from(pattern.flags_string()));
    fields.insert(MARKER.to_string(), Value::from(PATTERN_TAG));
    Value::from(fields)
}

/// Shallow-copies `fields` into a new plain mapping and appends the marker.
///
/// A real field named `#` is overwritten by the marker.
#[must_use]
pub fn tagged_copy(fields: &ObjectMap, tag: &str) -> Value {
    let mut copy = ObjectMap::with_capacity(fields.len() + 1);
    for (k, v) in fields.iter() {
        copy.insert(k.clone(), v.clone());
    }
    copy.insert(MARKER.to_string(), Value::from(tag));
    Value::from(copy)
}

/// Converts one value into its transport form, given its resolved tag.
///
/// Dates and patterns become their reserved envelopes; objects with a
/// non-empty tag become a tagged shallow copy. Returns `None` when the value
/// needs no envelope.
///
/// # Examples
///
/// ```rust
/// use serde_proto::envelope::pack_envelope;
/// use serde_proto::{Pattern, Value};
///
/// let pattern = Value::Pattern(Pattern::new("a|b", "gi").unwrap());
/// let envelope = pack_envelope(&pattern, "RegExp").unwrap();
/// assert_eq!(envelope.to_string(), r##"{"r":"a|b","f":"gi","#":"RegExp"}"##);
/// ```
#[must_use]
pub fn pack_envelope(value: &Value, tag: &str) -> Option<Value> {
    match value {
        Value::Date(date) => Some(date_envelope(date)),
        Value::Pattern(pattern) => Some(pattern_envelope(pattern)),
        Value::Object(_) if tag.is_empty() => None,
        Value::Object(obj) => {
            warn_if_reserved(tag);
            Some(tagged_copy(obj.fields(), tag))
        }
        _ => None,
    }
}

/// A factory for a reserved tag.
pub type Factory = fn(&ObjectMap) -> Option<Value>;

/// Looks up the built-in factory for a reserved tag.
#[must_use]
pub fn reserved_factory(tag: &str) -> Option<Factory> {
    let factory: Factory = match tag {
        NAN_TAG => revive_nan,
        INFINITY_TAG => revive_infinity,
        NEG_INFINITY_TAG => revive_neg_infinity,
        DATE_TAG => revive_date,
        PATTERN_TAG => revive_pattern,
        _ => return None,
    };
    Some(factory)
}

fn revive_nan(_: &ObjectMap) -> Option<Value> {
    Some(Value::from(f64::NAN))
}

fn revive_infinity(_: &ObjectMap) -> Option<Value> {
    Some(Value::from(f64::INFINITY))
}

fn revive_neg_infinity(_: &ObjectMap) -> Option<Value> {
    Some(Value::from(f64::NEG_INFINITY))
}

fn revive_date(fields: &ObjectMap) -> Option<Value> {
    let millis = fields.get(DATE_FIELD)?.as_f64()?;
    if !millis.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(millis.trunc() as i64)
        .single()
        .map(Value::Date)
}

fn revive_pattern(fields: &ObjectMap) -> Option<Value> {
    let source = fields.get(SOURCE_FIELD)?.as_str()?;
    let flags = fields.get(FLAGS_FIELD).map_or(Some(""), Value::as_str)?;
    Pattern::new(source, flags).ok().map(Value::Pattern)
}
