//! Conversion between typed preference values and their stored string form.

use std::str::FromStr;

use serde::{de::DeserializeOwned, Serialize};

use crate::store::NativeValue;

/// A string-keyed mapping with heterogeneous JSON values.
pub type Mapping = serde_json::Map<String, serde_json::Value>;

/// The closed set of value kinds a preference can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceKind {
    /// `bool`
    Boolean,
    /// `i64`
    Integer,
    /// `f64`
    Float,
    /// `String`
    Text,
    /// `Vec<String>`
    TextList,
    /// [`Mapping`]
    Mapping,
}

impl PreferenceKind {
    /// Primitive kinds have a native representation in a [`PlainStore`](crate::PlainStore) and
    /// bypass string encoding there.
    pub const fn is_primitive(self) -> bool {
        matches!(
            self,
            PreferenceKind::Boolean
                | PreferenceKind::Integer
                | PreferenceKind::Float
                | PreferenceKind::Text
        )
    }
}

/// Errors that can occur while encoding or decoding a preference value.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Failed to serialize/deserialize a structured value
    #[error("Failed to serialize/deserialize preference value: {0}")]
    Json(#[from] serde_json::Error),

    /// Error raised by a custom codec
    #[error("Failed to convert preference value: {0}")]
    Custom(String),
}

/// Converts values of `T` to and from their stored string form.
///
/// `decode` is only called with a value that is actually present in storage; absence is resolved
/// to the preference's default before any codec runs. Implementations must satisfy
/// `decode(encode(v)) == v`.
pub trait Codec<T>: Send + Sync {
    /// Encodes `value` for storage.
    fn encode(&self, value: &T) -> Result<String, CodecError>;

    /// Decodes a stored value. `default` is available for codecs that fall back on bad input.
    fn decode(&self, raw: &str, default: &T) -> Result<T, CodecError>;
}

/// Codec for primitive kinds: canonical string form out, parse in.
///
/// Input that does not parse decodes to the default value.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimitiveCodec;

impl<T> Codec<T> for PrimitiveCodec
where
    T: ToString + FromStr + Clone,
{
    fn encode(&self, value: &T) -> Result<String, CodecError> {
        Ok(value.to_string())
    }

    fn decode(&self, raw: &str, default: &T) -> Result<T, CodecError> {
        Ok(raw.parse().unwrap_or_else(|_| default.clone()))
    }
}

/// Codec storing the whole value as JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode(&self, raw: &str, _default: &T) -> Result<T, CodecError> {
        Ok(serde_json::from_str(raw)?)
    }
}

mod private {
    // Keeps the set of preference kinds closed.
    pub trait Sealed {}
}

/// A type that can be stored in a [`Preference`](crate::Preference).
///
/// Implemented for exactly the kinds listed in [`PreferenceKind`] and cannot be implemented
/// outside this crate.
pub trait PreferenceValue: private::Sealed + Clone + Send + Sync + 'static {
    /// The kind this type belongs to.
    const KIND: PreferenceKind;

    /// Codec used when no override is given.
    type Codec: Codec<Self> + Default + 'static;

    /// Native plain-store representation, for primitive kinds only.
    fn to_native(&self) -> Option<NativeValue> {
        None
    }

    /// Inverse of [`PreferenceValue::to_native`].
    fn from_native(_value: NativeValue) -> Option<Self> {
        None
    }
}

macro_rules! primitive_value {
    ($ty:ty, $kind:ident, $native:ident) => {
        impl private::Sealed for $ty {}

        impl PreferenceValue for $ty {
            const KIND: PreferenceKind = PreferenceKind::$kind;
            type Codec = PrimitiveCodec;

            fn to_native(&self) -> Option<NativeValue> {
                Some(NativeValue::$native(self.clone()))
            }

            fn from_native(value: NativeValue) -> Option<Self> {
                match value {
                    NativeValue::$native(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

primitive_value!(bool, Boolean, Bool);
primitive_value!(i64, Integer, Int);
primitive_value!(f64, Float, Double);
primitive_value!(String, Text, String);

impl private::Sealed for Vec<String> {}

impl PreferenceValue for Vec<String> {
    const KIND: PreferenceKind = PreferenceKind::TextList;
    type Codec = JsonCodec;
}

impl private::Sealed for Mapping {}

impl PreferenceValue for Mapping {
    const KIND: PreferenceKind = PreferenceKind::Mapping;
    type Codec = JsonCodec;
}
