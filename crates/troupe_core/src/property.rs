//! Typed property values addressed by opaque string keys.
//!
//! Behaviours and the scripting boundary never see concrete actor fields;
//! they read and write named properties through [`PropertyTarget`]. The key
//! is an opaque string, the value a [`PropertyValue`]; no reflection
//! machinery is involved.

use thiserror::Error;

use crate::geometry::{Color, Vec2};

/// The kind of a [`PropertyValue`], used for mismatch reporting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyKind {
    Float,
    Vec2,
    Color,
    Bool,
}

/// A typed property value
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PropertyValue {
    Float(f32),
    Vec2(Vec2),
    Color(Color),
    Bool(bool),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Float(_) => PropertyKind::Float,
            PropertyValue::Vec2(_) => PropertyKind::Vec2,
            PropertyValue::Color(_) => PropertyKind::Color,
            PropertyValue::Bool(_) => PropertyKind::Bool,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            PropertyValue::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            PropertyValue::Color(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f32> for PropertyValue {
    fn from(v: f32) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<Vec2> for PropertyValue {
    fn from(v: Vec2) -> Self {
        PropertyValue::Vec2(v)
    }
}

impl From<Color> for PropertyValue {
    fn from(v: Color) -> Self {
        PropertyValue::Color(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

/// Errors from named property access
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// The target has no property with this key
    #[error("unknown property `{0}`")]
    UnknownProperty(String),

    /// The value's kind does not match the property's kind
    #[error("type mismatch for `{key}`: expected {expected:?}, got {got:?}")]
    TypeMismatch {
        key: String,
        expected: PropertyKind,
        got: PropertyKind,
    },
}

/// Get/set named properties with typed values.
///
/// Property identity is an opaque string key; implementors map keys onto
/// their own typed channels. Setting an unknown key or a mismatched kind
/// fails without any partial state change.
pub trait PropertyTarget {
    /// Read the current value of a named property
    fn property(&self, key: &str) -> Result<PropertyValue, PropertyError>;

    /// Write a named property
    fn set_property(&mut self, key: &str, value: PropertyValue) -> Result<(), PropertyError>;
}
