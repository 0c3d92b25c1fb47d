//! The JSON engine the codec plugs into.
//!
//! Text conversion is delegated to `serde_json`; this module adds the
//! per-node hook points the streaming pipeline needs. A hook receives the
//! [`Key`] of the node within its parent and the node itself, and returns the
//! node to use in its place.
//!
//! Hooks run post-order in both directions: children are transformed before
//! their parent, so a parent's hook always sees already-transformed children.
//!
//! ## Examples
//!
//! ```rust
//! use serde_proto::json::{from_str_with, to_string_with, Key};
//! use serde_proto::Value;
//!
//! let doc = serde_proto::value!({ "a": 1, "b": [2, 3] });
//! let doubled = to_string_with(&doc, |_key, value| match value.as_i64() {
//!     Some(n) => Value::from(n * 2),
//!     None => value,
//! })
//! .unwrap();
//! assert_eq!(doubled, r#"{"a":2,"b":[4,6]}"#);
//!
//! let mut seen = Vec::new();
//! from_str_with("[1,{\"k\":2}]", |key, value| {
//!     seen.push(key.to_string());
//!     value
//! })
//! .unwrap();
//! assert_eq!(seen, vec!["0", "k", "1", ""]);
//! ```

use crate::{CodecOptions, Error, Object, Result, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

/// Position of a node within its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key<'a> {
    /// The top-level value.
    Root,
    /// An array element.
    Index(usize),
    /// An object field.
    Field(&'a str),
}

impl fmt::Display for Key<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Root => Ok(()),
            Key::Index(i) => write!(f, "{}", i),
            Key::Field(name) => f.write_str(name),
        }
    }
}

/// Applies `hook` to every node of `value`, children first.
pub fn transform<F>(key: Key<'_>, value: Value, hook: &mut F) -> Value
where
    F: FnMut(Key<'_>, Value) -> Value,
{
    let value = match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| transform(Key::Index(i), item, &mut *hook))
                .collect(),
        ),
        Value::Object(obj) => {
            let (proto, fields) = obj.into_parts();
            let fields = fields
                .into_iter()
                .map(|(k, v)| {
                    let v = transform(Key::Field(&k), v, &mut *hook);
                    (k, v)
                })
                .collect();
            Value::Object(Object::from_parts(proto, fields))
        }
        other => other,
    };
    hook(key, value)
}

/// Renders a value as JSON text using the layout in `options`.
///
/// # Errors
///
/// Returns [`Error::Json`] if `serde_json` fails to render the value.
pub fn render(value: &Value, options: &CodecOptions) -> Result<String> {
    if !options.pretty {
        return Ok(serde_json::to_string(value)?);
    }
    let indent = " ".repeat(options.indent);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buffer = Vec::with_capacity(256);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buffer).map_err(Error::custom)
}

/// Serializes `value` to compact JSON after passing every node through `hook`.
///
/// The source value is not modified.
///
/// # Errors
///
/// Returns [`Error::Json`] if rendering fails.
pub fn to_string_with<F>(value: &Value, mut hook: F) -> Result<String>
where
    F: FnMut(Key<'_>, Value) -> Value,
{
    let transformed = transform(Key::Root, value.clone(), &mut hook);
    render(&transformed, &CodecOptions::default())
}

/// Like [`to_string_with`], rendering with the layout in `options`.
///
/// # Errors
///
/// Returns [`Error::Json`] if rendering fails.
pub fn to_string_with_options<F>(
    value: &Value,
    options: &CodecOptions,
    mut hook: F,
) -> Result<String>
where
    F: FnMut(Key<'_>, Value) -> Value,
{
    let transformed = transform(Key::Root, value.clone(), &mut hook);
    render(&transformed, options)
}

/// Parses JSON text, then passes every node through `hook`.
///
/// # Errors
///
/// Returns [`Error::Json`] if the text is not valid JSON.
pub fn from_str_with<F>(text: &str, mut hook: F) -> Result<Value>
where
    F: FnMut(Key<'_>, Value) -> Value,
{
    let parsed = from_str(text)?;
    Ok(transform(Key::Root, parsed, &mut hook))
}

/// Serializes a value to compact JSON as plain data.
///
/// # Errors
///
/// Returns [`Error::Json`] if rendering fails.
pub fn to_string(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Serializes a value to pretty-printed JSON as plain data.
///
/// # Errors
///
/// Returns [`Error::Json`] if rendering fails.
pub fn to_string_pretty(value: &Value) -> Result<String> {
    render(value, &CodecOptions::new().with_pretty(true))
}

/// Writes a value as compact JSON to `writer`.
///
/// # Errors
///
/// Returns [`Error::Io`] if writing fails.
pub fn to_writer<W>(mut writer: W, value: &Value) -> Result<()>
where
    W: io::Write,
{
    let text = to_string(value)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}

/// Parses JSON text as plain data.
///
/// Nesting depth is bounded only by the call stack, matching what the
/// encoders accept.
///
/// # Errors
///
/// Returns [`Error::Json`] if the text is not valid JSON.
pub fn from_str(text: &str) -> Result<Value> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(value)
}

/// Parses JSON bytes as plain data.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8 or not valid JSON.
pub fn from_slice(bytes: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(bytes).map_err(|e| Error::custom(e.to_string()))?;
    from_str(text)
}

/// Reads and parses JSON from `reader` as plain data.
///
/// # Errors
///
/// Returns [`Error::Io`] if reading fails, or [`Error::Json`] on bad input.
pub fn from_reader<R>(mut reader: R) -> Result<Value>
where
    R: io::Read,
{
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;
    use std::io::Cursor;

    #[test]
    fn test_hook_sees_transformed_children() {
        let doc = value!({ "inner": { "n": 1 } });
        let mut parent_saw = None;
        to_string_with(&doc, |key, value| {
            if key == Key::Field("n") {
                return Value::from("replaced");
            }
            if key == Key::Field("inner") {
                parent_saw = value.get("n").cloned();
            }
            value
        })
        .unwrap();
        assert_eq!(parent_saw, Some(Value::from("replaced")));
    }

    #[test]
    fn test_root_key_last() {
        let mut keys = Vec::new();
        from_str_with(r#"{"a":[true]}"#, |key, value| {
            keys.push(key.to_string());
            value
        })
        .unwrap();
        assert_eq!(keys, vec!["0", "a", ""]);
    }

    #[test]
    fn test_pretty_indent() {
        let doc = value!({ "a": 1 });
        let text = render(&doc, &CodecOptions::new().with_pretty(true).with_indent(4)).unwrap();
        assert_eq!(text, "{\n    \"a\": 1\n}");
        assert_eq!(to_string_pretty(&doc).unwrap(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_reader_writer_roundtrip() {
        let doc = value!({ "list": [1, "two", null] });
        let mut buffer = Vec::new();
        to_writer(&mut buffer, &doc).unwrap();
        let back = from_reader(Cursor::new(buffer)).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_parse_beyond_default_depth() {
        let depth = 300;
        let text = format!("{}1{}", "[".repeat(depth), "]".repeat(depth));
        let mut node = &from_str(&text).unwrap();
        for _ in 0..depth {
            node = &node.as_array().unwrap()[0];
        }
        assert_eq!(node, &Value::from(1));
        assert!(from_str("[1] 2").is_err());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(from_str("{\"a\":"), Err(Error::Json(_))));
        assert!(from_slice(&[0xff, 0xfe]).is_err());
    }
}
