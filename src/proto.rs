//! Prototypes and lineage tags.
//!
//! A [`Prototype`] is the shared, named parent of a family of objects. It may
//! carry a *lineage tag*: the string written into the marker field of every
//! envelope produced for its instances, and the name a [`Resolver`] uses to
//! find the prototype again on the receiving side.
//!
//! Tags are inherited. A prototype that extends a tagged parent but has no
//! tag of its own resolves to the parent's tag, the same way an inherited
//! property lookup walks a prototype chain.
//!
//! [`Resolver`]: crate::Resolver
//!
//! ## Examples
//!
//! ```rust
//! use serde_proto::Prototype;
//! use std::sync::Arc;
//!
//! let base = Arc::new(Prototype::new("Base").with_tag("Base"));
//! let derived = Arc::new(Prototype::new("Derived").extending(&base).with_tag("Derived"));
//! let helper = Arc::new(Prototype::new("Helper").extending(&derived));
//!
//! assert_eq!(derived.lineage_tag(), Some("Derived"));
//! assert_eq!(helper.lineage_tag(), Some("Derived"));
//! assert!(Prototype::descends_from(&helper, &base));
//! ```

use crate::envelope::{DATE_TAG, PATTERN_TAG};
use crate::{CodecOptions, Value};
use std::fmt;
use std::sync::Arc;

/// A shared prototype: a name, an optional lineage tag and an optional parent.
#[derive(Clone, PartialEq, Eq)]
pub struct Prototype {
    name: String,
    tag: Option<String>,
    parent: Option<Arc<Prototype>>,
}

impl Prototype {
    /// Creates an untagged prototype with no parent.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Prototype {
            name: name.into(),
            tag: None,
            parent: None,
        }
    }

    /// Attaches a lineage tag. This is the one-time setup step that makes
    /// instances of this prototype eligible for tagging.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Makes this prototype extend `parent`.
    #[must_use]
    pub fn extending(mut self, parent: &Arc<Prototype>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tag set directly on this prototype, ignoring the chain.
    #[must_use]
    pub fn own_tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Prototype>> {
        self.parent.as_ref()
    }

    /// The lineage tag visible on this prototype: its own tag, or else the
    /// nearest tag up the chain.
    #[must_use]
    pub fn lineage_tag(&self) -> Option<&str> {
        let mut current = Some(self);
        while let Some(proto) = current {
            if let Some(tag) = proto.tag.as_deref() {
                return Some(tag);
            }
            current = proto.parent.as_deref();
        }
        None
    }

    /// Returns `true` if `ancestor` is `proto` itself or appears on its chain.
    /// Identity is pointer identity, not structural equality.
    #[must_use]
    pub fn descends_from(proto: &Arc<Prototype>, ancestor: &Arc<Prototype>) -> bool {
        let mut current = Some(proto);
        while let Some(p) = current {
            if Arc::ptr_eq(p, ancestor) {
                return true;
            }
            current = p.parent.as_ref();
        }
        false
    }
}

impl fmt::Debug for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Prototype");
        s.field("name", &self.name).field("tag", &self.tag);
        if let Some(parent) = &self.parent {
            s.field("parent", &parent.name);
        }
        s.finish()
    }
}

/// Determines the lineage tag of a value.
///
/// Objects report the tag found on their prototype chain, never an own
/// field. Dates and patterns report the reserved `"Date"` / `"RegExp"` tags
/// when the options enable built-in tagging. Everything else, including
/// plain objects and arrays, is untagged.
///
/// # Examples
///
/// ```rust
/// use serde_proto::{resolve_tag, CodecOptions, Object, Prototype, Value};
/// use std::sync::Arc;
///
/// let point = Arc::new(Prototype::new("Point").with_tag("Point"));
/// let value = Value::Object(Object::with_prototype(&point));
/// let options = CodecOptions::default();
///
/// assert_eq!(resolve_tag(&value, &options), Some("Point"));
/// assert_eq!(resolve_tag(&Value::Object(Object::new()), &options), None);
/// ```
#[must_use]
pub fn resolve_tag<'a>(value: &'a Value, options: &CodecOptions) -> Option<&'a str> {
    match value {
        Value::Object(obj) => obj.prototype().and_then(|proto| proto.lineage_tag()),
        Value::Date(_) if options.tag_dates => Some(DATE_TAG),
        Value::Pattern(_) if options.tag_patterns => Some(PATTERN_TAG),
        _ => None,
    }
}
