//! Type descriptors for bound fields.
//!
//! [`FieldKind`] is the compact, `Copy` tag carried in conversion errors.
//! [`FieldType`] is the full runtime descriptor used by schema-driven
//! binding, where the target type is only known at runtime.

use std::fmt::{self, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Conversion family a field belongs to.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Int { bits: u32 },
    Uint { bits: u32 },
    Float { bits: u32 },
    Bool,
    String,
    Date,
    Time,
    DateTime,
    Timestamp,
    /// Any type decoded through the text-decodable capability.
    Decodable,
}

impl FieldKind {
    /// Temporal kinds consume the directive's `format:` pattern.
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            Self::Date | Self::Time | Self::DateTime | Self::Timestamp
        )
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int { bits } => write!(f, "i{bits}"),
            Self::Uint { bits } => write!(f, "u{bits}"),
            Self::Float { bits } => write!(f, "f{bits}"),
            Self::Bool => f.write_str("bool"),
            Self::String => f.write_str("string"),
            Self::Date => f.write_str("date"),
            Self::Time => f.write_str("time"),
            Self::DateTime => f.write_str("datetime"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::Decodable => f.write_str("text-decodable"),
        }
    }
}

/// Runtime type descriptor for a schema field.
///
/// With the `serde` feature a descriptor is written in snake case, e.g.
/// `"i32"`, `"date_time"`, `{"custom": "decimal"}` or
/// `{"optional": "f64"}`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    String,
    Date,
    Time,
    DateTime,
    Timestamp,
    /// A type decoded by a codec registered under this name.
    Custom(String),
    /// Empty cells become an explicit absent value.
    Optional(Box<FieldType>),
}

impl FieldType {
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    pub fn optional(inner: FieldType) -> Self {
        Self::Optional(Box::new(inner))
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::I8 => FieldKind::Int { bits: 8 },
            Self::I16 => FieldKind::Int { bits: 16 },
            Self::I32 => FieldKind::Int { bits: 32 },
            Self::I64 => FieldKind::Int { bits: 64 },
            Self::U8 => FieldKind::Uint { bits: 8 },
            Self::U16 => FieldKind::Uint { bits: 16 },
            Self::U32 => FieldKind::Uint { bits: 32 },
            Self::U64 => FieldKind::Uint { bits: 64 },
            Self::F32 => FieldKind::Float { bits: 32 },
            Self::F64 => FieldKind::Float { bits: 64 },
            Self::Bool => FieldKind::Bool,
            Self::String => FieldKind::String,
            Self::Date => FieldKind::Date,
            Self::Time => FieldKind::Time,
            Self::DateTime => FieldKind::DateTime,
            Self::Timestamp => FieldKind::Timestamp,
            Self::Custom(_) => FieldKind::Decodable,
            Self::Optional(inner) => inner.kind(),
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional(_))
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(name) => f.write_str(name),
            Self::Optional(inner) => write!(f, "Option<{inner}>"),
            other => write!(f, "{}", other.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display_uses_rust_names() {
        assert_eq!(FieldKind::Int { bits: 16 }.to_string(), "i16");
        assert_eq!(FieldKind::Uint { bits: 64 }.to_string(), "u64");
        assert_eq!(FieldKind::Float { bits: 32 }.to_string(), "f32");
        assert_eq!(FieldKind::Decodable.to_string(), "text-decodable");
    }

    #[test]
    fn optional_type_reports_inner_kind() {
        let ty = FieldType::optional(FieldType::custom("decimal"));
        assert_eq!(ty.kind(), FieldKind::Decodable);
        assert!(ty.is_optional());
        assert_eq!(ty.to_string(), "Option<decimal>");
        assert_eq!(FieldType::DateTime.to_string(), "datetime");
    }

    #[test]
    fn temporal_kinds() {
        assert!(FieldType::Date.kind().is_temporal());
        assert!(FieldType::Timestamp.kind().is_temporal());
        assert!(!FieldType::String.kind().is_temporal());
    }
}
