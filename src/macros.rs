/// Builds a [`Value`](crate::Value) from JSON-like literal syntax.
///
/// Objects built this way are plain (no prototype).
///
/// ```rust
/// use serde_proto::value;
///
/// let doc = value!({ "name": "Alice", "tags": ["a", "b"], "nested": { "#": "__NaN" } });
/// assert_eq!(doc.get("name").and_then(|v| v.as_str()), Some("Alice"));
/// ```
#[macro_export]
macro_rules! value {
    // Munch array elements into `vec![..]`
    (@array [$($out:expr,)*]) => {
        vec![$($out,)*]
    };

    (@array [$($out:expr,)*] - $n:literal $(, $($rest:tt)*)?) => {
        $crate::value!(@array [$($out,)* $crate::value!(- $n),] $($($rest)*)?)
    };

    (@array [$($out:expr,)*] $elem:tt $(, $($rest:tt)*)?) => {
        $crate::value!(@array [$($out,)* $crate::value!($elem),] $($($rest)*)?)
    };

    // Munch `key: value` pairs into an object
    (@object $object:ident) => {};

    (@object $object:ident $key:literal : - $n:literal $(, $($rest:tt)*)?) => {
        $object.insert($key, $crate::value!(- $n));
        $crate::value!(@object $object $($($rest)*)?);
    };

    (@object $object:ident $key:literal : $value:tt $(, $($rest:tt)*)?) => {
        $object.insert($key, $crate::value!($value));
        $crate::value!(@object $object $($($rest)*)?);
    };

    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elems:tt)+ ]) => {
        $crate::Value::Array($crate::value!(@array [] $($elems)+))
    };

    ({}) => {
        $crate::Value::Object($crate::Object::new())
    };

    ({ $($fields:tt)+ }) => {{
        let mut object = $crate::Object::new();
        $crate::value!(@object object $($fields)+);
        $crate::Value::Object(object)
    }};

    // Any other expression convertible into a Value
    ($s:expr) => {
        $crate::Value::from($s)
    };
}

#[cfg(test)]
mod tests {
    use crate::{Number, Object, Value};

    #[test]
    fn test_value_macro_primitives() {
        assert_eq!(value!(null), Value::Null);
        assert_eq!(value!(true), Value::Bool(true));
        assert_eq!(value!(false), Value::Bool(false));
        assert_eq!(value!(42), Value::Number(Number::Integer(42)));
        assert_eq!(value!(3.5), Value::Number(Number::Float(3.5)));
        assert_eq!(value!("hello"), Value::String("hello".to_string()));
    }

    #[test]
    fn test_value_macro_arrays() {
        assert_eq!(value!([]), Value::Array(vec![]));
        let arr = value!([1, [2], { "k": 3 }]);
        let items = arr.as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1], Value::Array(vec![Value::from(2)]));
        assert_eq!(items[2].get("k"), Some(&Value::from(3)));
    }

    #[test]
    fn test_value_macro_negative_literals() {
        assert_eq!(
            value!([-1, 2, -0.5,]),
            Value::Array(vec![Value::from(-1), Value::from(2), Value::from(-0.5)])
        );
        let obj = value!({ "a": -1.5, "b": [-3], "c": 4 });
        assert_eq!(obj.get("a"), Some(&Value::from(-1.5)));
        assert_eq!(obj.get("b"), Some(&Value::Array(vec![Value::from(-3)])));
        assert_eq!(obj.get("c"), Some(&Value::from(4)));
    }

    #[test]
    fn test_value_macro_objects_are_plain() {
        assert_eq!(value!({}), Value::Object(Object::new()));
        let obj = value!({ "name": "Alice", "age": 30 });
        let obj = obj.as_object().unwrap();
        assert!(obj.is_plain());
        assert_eq!(obj.len(), 2);
    }
}
