//! Errors raised while binding a row into a record.
//!
//! - **`DirectiveError`** : a field annotation could not be parsed
//! - **`ConvertError`**   : a raw cell could not become the target type
//! - **`BindErrorKind`**  : the taxonomy surfaced to callers
//! - **`BindError`**      : the kind plus the field it happened on
//!
//! Every error is terminal for the bind call that produced it. Nothing is
//! retried and only the first failing field is reported.

use std::{
    error::Error,
    fmt,
    num::{ParseFloatError, ParseIntError},
};

use crate::FieldKind;

/// A `#[csv("...")]` annotation that cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    #[error("malformed index option `{token}`: {source}")]
    MalformedIndex {
        token: String,
        #[source]
        source: ParseIntError,
    },
}

/// Parser-level failure for a single raw value.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Int(#[from] ParseIntError),
    #[error(transparent)]
    Float(#[from] ParseFloatError),
    /// A finite literal that only fits as infinity at the target width.
    #[error("value out of range for {kind}")]
    FloatOverflow { kind: FieldKind },
    #[error("invalid boolean literal")]
    InvalidBool,
    #[error(transparent)]
    Temporal(#[from] chrono::ParseError),
    #[error("temporal field has an empty format pattern")]
    EmptyFormat,
    /// The decoder's own error, kept as-is.
    #[error("{0}")]
    Decode(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl ConvertError {
    /// Wrap an error returned by a text decoder.
    pub fn decode<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::Decode(Box::new(err))
    }

    /// The decoder error when this failure came from a text decoder.
    pub fn decode_error(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        match self {
            Self::Decode(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// What went wrong while binding one field.
#[derive(Debug, thiserror::Error)]
pub enum BindErrorKind {
    #[error(transparent)]
    MalformedAnnotation(#[from] DirectiveError),
    #[error("invalid column \"{name}\"")]
    UnknownColumn { name: String },
    #[error("index {index} out of range for {width} declared columns")]
    IndexOutOfRange { index: usize, width: usize },
    #[error("failed to convert value {value:?} to {kind}: {source}")]
    Conversion {
        value: String,
        kind: FieldKind,
        source: ConvertError,
    },
    #[error("unsupported type {kind}")]
    UnsupportedType { kind: String },
}

/// A failed bind, carrying the field it happened on.
///
/// Fields bound before the failing one keep their new values. Callers
/// should discard a partially populated record once they see this error.
#[derive(Debug)]
pub struct BindError {
    /// Declared field name.
    pub field: String,
    /// The raw annotation string of the field.
    pub tag: String,
    /// Name of the type the value was being converted into.
    pub type_name: String,
    pub kind: BindErrorKind,
}

impl BindError {
    pub fn new(
        field: impl Into<String>,
        tag: impl Into<String>,
        type_name: impl Into<String>,
        kind: BindErrorKind,
    ) -> Self {
        Self {
            field: field.into(),
            tag: tag.into(),
            type_name: type_name.into(),
            kind,
        }
    }

    pub fn kind(&self) -> &BindErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> BindErrorKind {
        self.kind
    }

    /// The underlying conversion failure, if the field failed to convert.
    pub fn conversion(&self) -> Option<&ConvertError> {
        match &self.kind {
            BindErrorKind::Conversion { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in field {} [{}] of type {}",
            self.kind, self.field, self.tag, self.type_name
        )
    }
}

// `Display` already renders the kind, so the chain continues at its cause.
impl Error for BindError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.kind.source()
    }
}
