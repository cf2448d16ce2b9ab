use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::ElementId;

/// Values whose captured copy must not share state with the live one.
///
/// Edit history stores property values for later replay. Types implementing
/// this trait hand out an independent copy, so a later mutation of the element
/// cannot rewrite a value that history already holds.
pub trait Snapshot {
    fn snapshot(&self) -> Self;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Justification {
    #[default]
    Left,
    Center,
    Right,
}

/// Multi-line label text with presentation attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MultiLineString {
    text: String,
    justification: Justification,
    underlined: bool,
}

impl MultiLineString {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    pub fn justification(&self) -> Justification {
        self.justification
    }

    pub fn set_justification(&mut self, justification: Justification) {
        self.justification = justification;
    }

    pub fn is_underlined(&self) -> bool {
        self.underlined
    }

    pub fn set_underlined(&mut self, underlined: bool) {
        self.underlined = underlined;
    }
}

impl Snapshot for MultiLineString {
    fn snapshot(&self) -> Self {
        self.clone()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PropertyValue {
    Null,
    Text(Arc<str>),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    ElementRef(ElementId),
    Lines(MultiLineString),
    List(Vec<String>),
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b).is_eq(),
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::ElementRef(a), Self::ElementRef(b)) => a == b,
            (Self::Lines(a), Self::Lines(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for PropertyValue {}

impl Snapshot for PropertyValue {
    /// Text is shared, everything mutable is copied.
    fn snapshot(&self) -> Self {
        match self {
            Self::Lines(lines) => Self::Lines(lines.snapshot()),
            Self::List(items) => Self::List(items.clone()),
            Self::Text(text) => Self::Text(Arc::clone(text)),
            Self::Null => Self::Null,
            Self::Integer(n) => Self::Integer(*n),
            Self::Float(x) => Self::Float(*x),
            Self::Boolean(b) => Self::Boolean(*b),
            Self::ElementRef(id) => Self::ElementRef(*id),
        }
    }
}

impl PropertyValue {
    pub fn text(s: impl AsRef<str>) -> Self {
        Self::Text(Arc::from(s.as_ref()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
            Self::ElementRef(_) => "element ref",
            Self::Lines(_) => "lines",
            Self::List(_) => "list",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_lines(&self) -> Option<&MultiLineString> {
        match self {
            PropertyValue::Lines(lines) => Some(lines),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            PropertyValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Unwrap text for a setter, reporting a mismatch against `property`.
    pub fn into_text(self, property: &'static str) -> Result<String, CoreError> {
        match self {
            PropertyValue::Text(s) => Ok(s.to_string()),
            other => Err(mismatch(property, "text", &other)),
        }
    }

    pub fn into_integer(self, property: &'static str) -> Result<i64, CoreError> {
        match self {
            PropertyValue::Integer(n) => Ok(n),
            other => Err(mismatch(property, "integer", &other)),
        }
    }

    pub fn into_boolean(self, property: &'static str) -> Result<bool, CoreError> {
        match self {
            PropertyValue::Boolean(b) => Ok(b),
            other => Err(mismatch(property, "boolean", &other)),
        }
    }

    pub fn into_lines(self, property: &'static str) -> Result<MultiLineString, CoreError> {
        match self {
            PropertyValue::Lines(lines) => Ok(lines),
            other => Err(mismatch(property, "lines", &other)),
        }
    }

    pub fn into_list(self, property: &'static str) -> Result<Vec<String>, CoreError> {
        match self {
            PropertyValue::List(items) => Ok(items),
            other => Err(mismatch(property, "list", &other)),
        }
    }
}

fn mismatch(property: &'static str, expected: &'static str, found: &PropertyValue) -> CoreError {
    CoreError::TypeMismatch {
        property,
        expected,
        found: found.kind(),
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Text(Arc::from(s))
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<MultiLineString> for PropertyValue {
    fn from(lines: MultiLineString) -> Self {
        Self::Lines(lines)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}
