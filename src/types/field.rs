use crate::types::DataType;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A dynamically typed row value. The tuple payload preserves the tag, so a
/// value deserializes back to the same variant it was written as.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Field {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Field>),
    Map(BTreeMap<String, Field>),
}

impl PartialEq for Field {
    fn eq(&self, other: &Field) -> bool {
        match (self, other) {
            (Field::Null, Field::Null) => true,
            (Field::Boolean(b), Field::Boolean(b2)) => b == b2,
            (Field::Integer(i), Field::Integer(i2)) => i == i2,
            // match on NaN as well as equality
            (Field::Float(f), Field::Float(f2)) => (f == f2) || (f.is_nan() && f2.is_nan()),
            (Field::String(s), Field::String(s2)) => s == s2,
            (Field::List(l), Field::List(l2)) => l == l2,
            (Field::Map(m), Field::Map(m2)) => m == m2,
            _ => false,
        }
    }
}

impl Eq for Field {}

impl Field {
    pub fn get_type(&self) -> DataType {
        match self {
            Field::Null => DataType::Invalid,
            Field::Boolean(_) => DataType::Bool,
            Field::Integer(_) => DataType::Int,
            Field::Float(_) => DataType::Float,
            Field::String(_) => DataType::Text,
            Field::List(_) => DataType::List,
            Field::Map(_) => DataType::Map,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    /// The total order shared by the planner, the index, and WHERE
    /// evaluation:
    ///
    /// - NULL sorts before every non-null value; two NULLs compare equal.
    /// - Numerics coerce to a common floating representation.
    /// - Strings compare by byte order.
    /// - Mixed kinds compare equal (fallback).
    pub fn compare(&self, other: &Field) -> Ordering {
        use Field::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Null, _) => Ordering::Less,
            (_, Null) => Ordering::Greater,
            (Boolean(b), Boolean(b2)) => b.cmp(b2),
            (Integer(i), Integer(i2)) => i.cmp(i2),
            (Integer(i), Float(f)) => compare_floats(*i as f64, *f),
            (Float(f), Integer(i)) => compare_floats(*f, *i as f64),
            (Float(f), Float(f2)) => compare_floats(*f, *f2),
            (String(s), String(s2)) => s.as_bytes().cmp(s2.as_bytes()),
            _ => Ordering::Equal,
        }
    }
}

fn compare_floats(lhs: f64, rhs: f64) -> Ordering {
    match (lhs.is_nan(), rhs.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal),
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Boolean(true) => f.write_str("TRUE"),
            Self::Boolean(false) => f.write_str("FALSE"),
            Self::Integer(integer) => integer.fmt(f),
            Self::Float(float) => write!(f, "{float:?}"),
            Self::String(string) => write!(f, "{string}"),
            Self::List(items) => {
                let rendered: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Self::Map(entries) => {
                let rendered: Vec<String> =
                    entries.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
        }
    }
}

impl From<bool> for Field {
    fn from(v: bool) -> Self {
        Field::Boolean(v)
    }
}

impl From<i64> for Field {
    fn from(v: i64) -> Self {
        Field::Integer(v)
    }
}

impl From<i32> for Field {
    fn from(v: i32) -> Self {
        Field::Integer(v as i64)
    }
}

impl From<f64> for Field {
    fn from(v: f64) -> Self {
        Field::Float(v)
    }
}

impl From<String> for Field {
    fn from(v: String) -> Self {
        Field::String(v)
    }
}

impl From<&str> for Field {
    fn from(v: &str) -> Self {
        Field::String(v.to_owned())
    }
}

impl From<Vec<Field>> for Field {
    fn from(v: Vec<Field>) -> Self {
        Field::List(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sorts_first() {
        assert_eq!(Field::Null.compare(&Field::Null), Ordering::Equal);
        assert_eq!(Field::Null.compare(&Field::from(-100)), Ordering::Less);
        assert_eq!(Field::Null.compare(&Field::from("")), Ordering::Less);
        assert_eq!(Field::from(false).compare(&Field::Null), Ordering::Greater);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Field::from(2).compare(&Field::from(2.0)), Ordering::Equal);
        assert_eq!(Field::from(2).compare(&Field::from(2.5)), Ordering::Less);
        assert_eq!(Field::from(3.5).compare(&Field::from(3)), Ordering::Greater);
    }

    #[test]
    fn test_string_byte_order() {
        assert_eq!(Field::from("abc").compare(&Field::from("abd")), Ordering::Less);
        assert_eq!(Field::from("b").compare(&Field::from("ab")), Ordering::Greater);
    }

    #[test]
    fn test_mixed_types_compare_equal() {
        // Known fallback behavior, adopted verbatim from the source system.
        assert_eq!(Field::from(1).compare(&Field::from("1")), Ordering::Equal);
        assert_eq!(Field::from(true).compare(&Field::from(0)), Ordering::Equal);
    }

    #[test]
    fn test_nan_equality() {
        let nan = Field::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_eq!(nan.compare(&Field::Float(f64::NAN)), Ordering::Equal);
        assert_eq!(Field::from(1.0).compare(&nan), Ordering::Less);
    }

    #[test]
    fn test_nested_values_round_trip() {
        let value = Field::List(vec![
            Field::from(1),
            Field::Map(BTreeMap::from([("k".to_string(), Field::from("v"))])),
        ]);
        let encoded = bincode::serialize(&value).unwrap();
        let decoded: Field = bincode::deserialize(&encoded).unwrap();
        assert_eq!(value, decoded);
    }
}
