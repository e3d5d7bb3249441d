//! Property value types for graph nodes and edges
//!
//! Values mirror what an RDF literal can be translated to. Arrays hold
//! scalars of a single type; that is checked by the store on write.

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Property value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Array(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Get string value if this is a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get integer value if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get float value if this is a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get boolean value if this is a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get array value if this is an array
    pub fn as_array(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// View the value as a list of scalars: arrays yield their elements,
    /// scalars yield themselves.
    pub fn elements(&self) -> &[PropertyValue] {
        match self {
            PropertyValue::Array(arr) => arr,
            scalar => std::slice::from_ref(scalar),
        }
    }

    /// True if `value` equals this scalar or is an element of this array
    pub fn contains(&self, value: &PropertyValue) -> bool {
        self.elements().iter().any(|v| v == value)
    }

    /// Get type name as string
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::String(_) => "String",
            PropertyValue::Integer(_) => "Integer",
            PropertyValue::Float(_) => "Float",
            PropertyValue::Boolean(_) => "Boolean",
            PropertyValue::Date(_) => "Date",
            PropertyValue::DateTime(_) => "DateTime",
            PropertyValue::Array(_) => "Array",
        }
    }

    /// Name of the first element type of a non-empty array that does not
    /// match the others, if any.
    pub(crate) fn heterogeneous_element(&self) -> Option<&'static str> {
        let arr = self.as_array()?;
        let first = arr.first()?.type_name();
        arr.iter()
            .map(PropertyValue::type_name)
            .find(|t| *t != first || *t == "Array")
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "\"{}\"", s),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(fl) => write!(f, "{}", fl),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Date(d) => write!(f, "{}", d),
            PropertyValue::DateTime(dt) => write!(f, "{}", dt),
            PropertyValue::Array(arr) => {
                write!(f, "[")?;
                for (i, val) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", val)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<NaiveDate> for PropertyValue {
    fn from(d: NaiveDate) -> Self {
        PropertyValue::Date(d)
    }
}

impl From<NaiveDateTime> for PropertyValue {
    fn from(dt: NaiveDateTime) -> Self {
        PropertyValue::DateTime(dt)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(arr: Vec<PropertyValue>) -> Self {
        PropertyValue::Array(arr)
    }
}

/// Property map for node and edge properties, in insertion order
pub type PropertyMap = IndexMap<String, PropertyValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_conversions() {
        let string_prop: PropertyValue = "hello".into();
        assert_eq!(string_prop.as_string(), Some("hello"));

        let int_prop: PropertyValue = 42i64.into();
        assert_eq!(int_prop.as_integer(), Some(42));

        let float_prop: PropertyValue = 2.5.into();
        assert_eq!(float_prop.as_float(), Some(2.5));

        let bool_prop: PropertyValue = true.into();
        assert_eq!(bool_prop.as_boolean(), Some(true));
    }

    #[test]
    fn test_elements_and_contains() {
        let scalar = PropertyValue::from("a");
        assert_eq!(scalar.elements().len(), 1);
        assert!(scalar.contains(&"a".into()));

        let arr = PropertyValue::Array(vec![1i64.into(), 2i64.into()]);
        assert!(arr.contains(&2i64.into()));
        // type-aware: 2.0 is not 2
        assert!(!arr.contains(&2.0.into()));
    }

    #[test]
    fn test_heterogeneous_arrays() {
        let ok = PropertyValue::Array(vec!["a".into(), "b".into()]);
        assert_eq!(ok.heterogeneous_element(), None);

        let mixed = PropertyValue::Array(vec![1i64.into(), "b".into()]);
        assert_eq!(mixed.heterogeneous_element(), Some("String"));

        let nested = PropertyValue::Array(vec![PropertyValue::Array(vec![])]);
        assert_eq!(nested.heterogeneous_element(), Some("Array"));
    }

    #[test]
    fn test_display() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(PropertyValue::Date(d).to_string(), "2024-02-29");
        let arr = PropertyValue::Array(vec![1i64.into(), 2i64.into()]);
        assert_eq!(arr.to_string(), "[1, 2]");
    }
}
