//! Property values.
//!
//! Item properties hold a [`Variant`]: a boolean, integer, floating point,
//! string, or enumerated ([`ComboProperty`]) value. A property keeps the kind
//! it was declared with; assigning a value of another kind is an error.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MvvmError, Result};

/// A typed property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Variant {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value. NaN and the infinities are written as the
    /// strings `"nan"`, `"inf"` and `"-inf"`, since JSON has no literal
    /// for them.
    Double(#[serde(with = "double_repr")] f64),
    /// String value.
    String(String),
    /// Enumerated value.
    Combo(ComboProperty),
}

impl Variant {
    /// Name of the variant kind, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Variant::Bool(_) => "bool",
            Variant::Int(_) => "int",
            Variant::Double(_) => "double",
            Variant::String(_) => "string",
            Variant::Combo(_) => "combo",
        }
    }

    /// Returns `true` if both values are of the same kind.
    pub fn is_same_type(&self, other: &Variant) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Value equality used for change detection. Two NaNs compare equal, so
    /// assigning NaN over NaN is not a change.
    pub fn same_value(&self, other: &Variant) -> bool {
        match (self, other) {
            (Variant::Double(a), Variant::Double(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => self == other,
        }
    }

    /// Returns the value as `f64` if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Variant::Double(v) => Some(*v),
            Variant::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Returns the value as `bool` if it is boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Bool(v) => write!(f, "{v}"),
            Variant::Int(v) => write!(f, "{v}"),
            Variant::Double(v) => write!(f, "{v}"),
            Variant::String(v) => write!(f, "{v}"),
            Variant::Combo(v) => write!(f, "{}", v.value().unwrap_or_default()),
        }
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Variant::Bool(value)
    }
}

impl From<i64> for Variant {
    fn from(value: i64) -> Self {
        Variant::Int(value)
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Variant::Int(value.into())
    }
}

impl From<f64> for Variant {
    fn from(value: f64) -> Self {
        Variant::Double(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::String(value.to_string())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::String(value)
    }
}

impl From<ComboProperty> for Variant {
    fn from(value: ComboProperty) -> Self {
        Variant::Combo(value)
    }
}

/// Conversion from a stored [`Variant`] into a concrete Rust type.
///
/// Used by [`SessionItem::property`](crate::model::SessionItem::property).
pub trait FromVariant: Sized {
    /// Name of the expected kind, used in error messages.
    const TYPE_NAME: &'static str;

    /// Extract the value, or `None` if the variant holds another kind.
    fn from_variant(value: &Variant) -> Option<Self>;
}

impl FromVariant for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_variant(value: &Variant) -> Option<Self> {
        value.as_bool()
    }
}

impl FromVariant for i64 {
    const TYPE_NAME: &'static str = "int";

    fn from_variant(value: &Variant) -> Option<Self> {
        match value {
            Variant::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromVariant for f64 {
    const TYPE_NAME: &'static str = "double";

    fn from_variant(value: &Variant) -> Option<Self> {
        match value {
            Variant::Double(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromVariant for String {
    const TYPE_NAME: &'static str = "string";

    fn from_variant(value: &Variant) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromVariant for ComboProperty {
    const TYPE_NAME: &'static str = "combo";

    fn from_variant(value: &Variant) -> Option<Self> {
        match value {
            Variant::Combo(combo) => Some(combo.clone()),
            _ => None,
        }
    }
}

impl FromVariant for Variant {
    const TYPE_NAME: &'static str = "variant";

    fn from_variant(value: &Variant) -> Option<Self> {
        Some(value.clone())
    }
}

mod double_repr {
    use serde::de::{self, Deserialize, Deserializer};
    use serde::Serializer;

    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Named(String),
    }

    pub(super) fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("nan")
        } else if value.is_sign_positive() {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Named(name) => match name.as_str() {
                "nan" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(de::Error::custom(format!("invalid double '{other}'"))),
            },
        }
    }
}

/// An enumerated value: a fixed list of choices and the selected index.
///
/// Deserialization rejects a selection outside the list of choices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawComboProperty")]
pub struct ComboProperty {
    values: Vec<String>,
    current: usize,
}

#[derive(Deserialize)]
struct RawComboProperty {
    values: Vec<String>,
    current: usize,
}

impl TryFrom<RawComboProperty> for ComboProperty {
    type Error = String;

    fn try_from(raw: RawComboProperty) -> std::result::Result<Self, Self::Error> {
        // An empty combo keeps index 0, as `new` leaves it.
        let in_range = raw.current < raw.values.len() || (raw.values.is_empty() && raw.current == 0);
        if !in_range {
            return Err(format!(
                "combo index {} out of range for {} values",
                raw.current,
                raw.values.len()
            ));
        }
        Ok(Self {
            values: raw.values,
            current: raw.current,
        })
    }
}

impl ComboProperty {
    /// Creates a combo with the first value selected.
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            current: 0,
        }
    }

    /// Selects the value at `index`.
    pub fn with_current_index(mut self, index: usize) -> Result<Self> {
        self.set_current_index(index)?;
        Ok(self)
    }

    /// All choices, in order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Index of the selected choice.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The selected choice, or `None` for an empty combo.
    pub fn value(&self) -> Option<&str> {
        self.values.get(self.current).map(String::as_str)
    }

    /// Selects the choice at `index`.
    pub fn set_current_index(&mut self, index: usize) -> Result<()> {
        if index >= self.values.len() {
            return Err(MvvmError::not_found(format!("combo index {index}")));
        }
        self.current = index;
        Ok(())
    }

    /// Selects the choice named `value`.
    pub fn set_value(&mut self, value: &str) -> Result<()> {
        let index = self
            .values
            .iter()
            .position(|v| v == value)
            .ok_or_else(|| MvvmError::not_found(format!("combo value '{value}'")))?;
        self.current = index;
        Ok(())
    }
}
