//! Schema-driven binding for records whose layout is only known at runtime.
//!
//! A [`Schema`] lists fields as name, annotation and [`FieldType`]. Binding
//! a row produces a [`Record`] of [`Value`]s using the same locator and
//! primitive parsers as derived records. Custom types are resolved by name
//! through a [`Codecs`] registry.

use std::{fmt, sync::OnceLock};

use rowbind_common::{BindError, BindErrorKind, ConvertError, FieldType, Value};
use rustc_hash::FxHashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    bind::DirectiveTable,
    convert::{self, TextDecodable},
    directive::Locator,
    row::RowContext,
};

type DecodeFn = Box<dyn Fn(&str) -> Result<Value, ConvertError> + Send + Sync>;

struct Codec {
    zero: Value,
    decode: DecodeFn,
}

/// Registry of text decoders addressable by [`FieldType::Custom`] name.
///
/// `Codecs::default()` registers the decoders of enabled features:
/// `"decimal"` and `"uuid"`.
pub struct Codecs {
    entries: FxHashMap<String, Codec>,
}

impl Codecs {
    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    /// Register `T` under `name`, replacing any earlier registration.
    pub fn register<T>(&mut self, name: impl Into<String>) -> &mut Self
    where
        T: TextDecodable + Send + Sync + 'static,
    {
        let codec = Codec {
            zero: Value::custom(T::default()),
            decode: Box::new(|raw: &str| convert::decode::<T>(raw).map(Value::custom)),
        };
        self.entries.insert(name.into(), codec);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<&Codec> {
        self.entries.get(name)
    }
}

impl Default for Codecs {
    fn default() -> Self {
        #[allow(unused_mut)]
        let mut codecs = Self::empty();
        #[cfg(feature = "decimal")]
        codecs.register::<rust_decimal::Decimal>("decimal");
        #[cfg(feature = "uuid")]
        codecs.register::<uuid::Uuid>("uuid");
        codecs
    }
}

impl fmt::Debug for Codecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("Codecs").field("names", &names).finish()
    }
}

/// Convert one raw value according to a runtime type descriptor.
pub fn convert(
    raw: &str,
    field_type: &FieldType,
    format: &str,
    codecs: &Codecs,
) -> Result<Value, BindErrorKind> {
    let conversion = |source: ConvertError| BindErrorKind::Conversion {
        value: raw.to_string(),
        kind: field_type.kind(),
        source,
    };

    let value = match field_type {
        FieldType::Optional(inner) => {
            ensure_supported(inner, codecs)?;
            if raw.is_empty() {
                return Ok(Value::Empty);
            }
            return convert(raw, inner, format, codecs);
        }
        FieldType::Custom(name) => {
            let codec = codecs.get(name).ok_or_else(|| unsupported(field_type))?;
            if raw.is_empty() {
                return Ok(codec.zero.clone());
            }
            (codec.decode)(raw)
        }
        FieldType::I8 => convert::parse_int::<i8>(raw).map(|v| Value::Int(v.into())),
        FieldType::I16 => convert::parse_int::<i16>(raw).map(|v| Value::Int(v.into())),
        FieldType::I32 => convert::parse_int::<i32>(raw).map(|v| Value::Int(v.into())),
        FieldType::I64 => convert::parse_int::<i64>(raw).map(Value::Int),
        FieldType::U8 => convert::parse_int::<u8>(raw).map(|v| Value::UInt(v.into())),
        FieldType::U16 => convert::parse_int::<u16>(raw).map(|v| Value::UInt(v.into())),
        FieldType::U32 => convert::parse_int::<u32>(raw).map(|v| Value::UInt(v.into())),
        FieldType::U64 => convert::parse_int::<u64>(raw).map(Value::UInt),
        FieldType::F32 => convert::parse_f32(raw).map(|v| Value::Float(v.into())),
        FieldType::F64 => convert::parse_f64(raw).map(Value::Float),
        FieldType::Bool => convert::parse_bool(raw).map(Value::Bool),
        FieldType::String => Ok(Value::Text(raw.to_string())),
        FieldType::Date => convert::parse_date(raw, format).map(Value::Date),
        FieldType::Time => convert::parse_time(raw, format).map(Value::Time),
        FieldType::DateTime => convert::parse_datetime(raw, format).map(Value::DateTime),
        FieldType::Timestamp => convert::parse_timestamp(raw, format).map(Value::Timestamp),
    };
    value.map_err(conversion)
}

fn ensure_supported(field_type: &FieldType, codecs: &Codecs) -> Result<(), BindErrorKind> {
    match field_type {
        FieldType::Custom(name) if !codecs.contains(name) => Err(unsupported(field_type)),
        FieldType::Optional(inner) => ensure_supported(inner, codecs),
        _ => Ok(()),
    }
}

fn unsupported(field_type: &FieldType) -> BindErrorKind {
    BindErrorKind::UnsupportedType {
        kind: field_type.to_string(),
    }
}

/// One field of a [`Schema`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    /// Binding annotation, same grammar as `#[csv("...")]`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tag: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub field_type: FieldType,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, tag: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            field_type,
        }
    }
}

/// Runtime description of a record type.
///
/// ```
/// use rowbind::{Codecs, FieldType, RowContext, Schema, SchemaField, Value};
///
/// let schema = Schema::new([
///     SchemaField::new("id", "index:0", FieldType::U32),
///     SchemaField::new("label", "index:1", FieldType::optional(FieldType::String)),
/// ]);
/// let record = schema
///     .read(&RowContext::headerless(["7", ""]), &Codecs::default())
///     .unwrap();
/// assert_eq!(record.get("id"), Some(&Value::UInt(7)));
/// assert_eq!(record.get("label"), Some(&Value::Empty));
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<SchemaField>,
    #[cfg_attr(feature = "serde", serde(skip))]
    directives: OnceLock<DirectiveTable>,
}

impl Schema {
    pub fn new(fields: impl IntoIterator<Item = SchemaField>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
            directives: OnceLock::new(),
        }
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    fn directives(&self) -> &DirectiveTable {
        self.directives
            .get_or_init(|| DirectiveTable::parse(self.fields.iter().map(|f| f.tag.as_str())))
    }

    /// A record with every schema field set to [`Value::Empty`].
    pub fn empty_record(&self) -> Record {
        Record {
            entries: self
                .fields
                .iter()
                .map(|f| (f.name.clone(), Value::Empty))
                .collect(),
        }
    }

    /// Bind `row` into `record` in field order, stopping at the first failure.
    ///
    /// Fields bound before the failure keep their new values.
    pub fn bind(
        &self,
        row: &RowContext,
        record: &mut Record,
        codecs: &Codecs,
    ) -> Result<(), BindError> {
        let directives = self.directives();
        for (slot, field) in self.fields.iter().enumerate() {
            let fail = |kind: BindErrorKind| {
                BindError::new(&field.name, &field.tag, field.field_type.to_string(), kind)
            };

            let directive = match directives.get(slot) {
                Ok(Some(directive)) => directive,
                Ok(None) => continue,
                Err(err) => return Err(fail(err.clone().into())),
            };
            let locator = directive.locator();
            if locator == Locator::Unbound {
                continue;
            }

            let raw = row.locate(locator).map_err(fail)?;
            let value =
                convert(raw, &field.field_type, directive.format(), codecs).map_err(fail)?;
            record.set(&field.name, value);
        }
        Ok(())
    }

    pub fn read(&self, row: &RowContext, codecs: &Codecs) -> Result<Record, BindError> {
        let mut record = self.empty_record();
        self.bind(row, &mut record, codecs)?;
        Ok(record)
    }
}

/// Named values produced by a [`Schema`], in field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Replace the value of `name`, appending it if absent.
    pub fn set(&mut self, name: &str, value: Value) {
        match self.entries.iter_mut().find(|(key, _)| key == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
