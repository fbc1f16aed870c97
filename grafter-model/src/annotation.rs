//! Annotations attached to declarations.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An argument value carried by an annotation.
///
/// Values are scalars only; nested structures are not part of the annotation
/// surface the engine understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    /// A string argument.
    String(String),
    /// An integer argument.
    Int(i64),
    /// A boolean argument.
    Bool(bool),
}

impl AnnotationValue {
    /// Get the string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnotationValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer payload, if this is an integer value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AnnotationValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the boolean payload, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnnotationValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl std::fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnotationValue::String(s) => write!(f, "{:?}", s),
            AnnotationValue::Int(i) => write!(f, "{}", i),
            AnnotationValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for AnnotationValue {
    fn from(value: &str) -> Self {
        AnnotationValue::String(value.to_string())
    }
}

impl From<String> for AnnotationValue {
    fn from(value: String) -> Self {
        AnnotationValue::String(value)
    }
}

impl From<i64> for AnnotationValue {
    fn from(value: i64) -> Self {
        AnnotationValue::Int(value)
    }
}

impl From<bool> for AnnotationValue {
    fn from(value: bool) -> Self {
        AnnotationValue::Bool(value)
    }
}

/// An annotation attached to a declaration.
///
/// Annotations whose name is bound in the compilation's directive table are
/// generator directives; the rest are inert markers that travel with the
/// declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation name, e.g. `DuplicateWithSuffix`.
    pub name: String,
    /// Positional arguments in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<AnnotationValue>,
    /// Named arguments in source order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub named: IndexMap<String, AnnotationValue>,
}

impl Annotation {
    /// Create an annotation with no arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            named: IndexMap::new(),
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<AnnotationValue>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Append a named argument.
    pub fn named_arg(mut self, name: impl Into<String>, value: impl Into<AnnotationValue>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    /// Get the positional argument at `index`.
    pub fn get(&self, index: usize) -> Option<&AnnotationValue> {
        self.args.get(index)
    }

    /// Get the positional argument at `index` as a string.
    pub fn string_arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).and_then(AnnotationValue::as_str)
    }

    /// Get a named argument by name.
    pub fn named_get(&self, name: &str) -> Option<&AnnotationValue> {
        self.named.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_args() {
        let ann = Annotation::new("DuplicateWithSuffix")
            .arg("A")
            .named_arg("count", 2i64);

        assert_eq!(ann.string_arg(0), Some("A"));
        assert_eq!(ann.named_get("count").and_then(AnnotationValue::as_int), Some(2));
        assert!(ann.string_arg(1).is_none());
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(AnnotationValue::from("x").as_str(), Some("x"));
        assert_eq!(AnnotationValue::from(3i64).as_int(), Some(3));
        assert_eq!(AnnotationValue::from(true).as_bool(), Some(true));
        assert!(AnnotationValue::from(3i64).as_str().is_none());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(AnnotationValue::from("a").to_string(), "\"a\"");
        assert_eq!(AnnotationValue::from(7i64).to_string(), "7");
        assert_eq!(AnnotationValue::from(false).to_string(), "false");
    }
}
