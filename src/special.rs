//! Stand-ins for `NaN`, `Infinity` and `-Infinity`.
//!
//! JSON has no spelling for non-finite numbers. The packer replaces them with
//! one of three process-wide [`StandIn`] singletons. A stand-in still coerces
//! to the number it replaces through [`StandIn::value_of`], and carries the
//! reserved tag used for its envelope (`{"#": "__NaN"}` and friends).

use crate::envelope::{INFINITY_TAG, MARKER, NAN_TAG, NEG_INFINITY_TAG};
use crate::{Number, ObjectMap, Value};

/// A read-only stand-in for a non-finite number.
#[derive(Debug, PartialEq)]
pub struct StandIn {
    tag: &'static str,
    value: f64,
}

pub static NAN: StandIn = StandIn {
    tag: NAN_TAG,
    value: f64::NAN,
};

pub static INFINITY: StandIn = StandIn {
    tag: INFINITY_TAG,
    value: f64::INFINITY,
};

pub static NEG_INFINITY: StandIn = StandIn {
    tag: NEG_INFINITY_TAG,
    value: f64::NEG_INFINITY,
};

impl StandIn {
    /// The number this stand-in represents.
    #[must_use]
    pub fn value_of(&self) -> f64 {
        self.value
    }

    /// The reserved tag written into the marker field.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// The transport envelope: a mapping holding only the marker.
    #[must_use]
    pub fn to_envelope(&self) -> Value {
        let mut fields = ObjectMap::with_capacity(1);
        fields.insert(MARKER.to_string(), Value::from(self.tag));
        Value::from(fields)
    }
}

/// Returns the stand-in for a non-finite number, or `None` when the number
/// can be used unchanged.
///
/// # Examples
///
/// ```rust
/// use serde_proto::{pack_special_number, Number};
///
/// let nan = pack_special_number(&Number::NaN).unwrap();
/// assert_eq!(nan.tag(), "__NaN");
/// assert!(nan.value_of().is_nan());
///
/// assert_eq!(pack_special_number(&Number::from(-f64::INFINITY)).unwrap().tag(), "__-Inf");
/// assert!(pack_special_number(&Number::Integer(3)).is_none());
/// ```
#[must_use]
pub fn pack_special_number(number: &Number) -> Option<&'static StandIn> {
    let n = number.as_f64();
    if n.is_nan() {
        Some(&NAN)
    } else if n == f64::INFINITY {
        Some(&INFINITY)
    } else if n == f64::NEG_INFINITY {
        Some(&NEG_INFINITY)
    } else {
        None
    }
}
