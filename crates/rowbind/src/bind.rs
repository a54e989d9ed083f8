//! Static binding: `#[derive(FromRow)]` structs and the binder they call.

use std::any::type_name;

use rowbind_common::{BindError, BindErrorKind, DirectiveError};

use crate::{
    convert::FromField,
    directive::{BindingDirective, Locator},
    row::RowContext,
};

/// Name and raw annotation of one bound field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub tag: &'static str,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, tag: &'static str) -> Self {
        Self { name, tag }
    }
}

/// Parsed directives of a record type, one slot per bound field.
///
/// Parse failures are kept per slot and only surface when that field is
/// bound, so fields declared before a malformed one still bind.
#[derive(Debug, Clone, Default)]
pub struct DirectiveTable {
    slots: Vec<Result<Option<BindingDirective>, DirectiveError>>,
}

impl DirectiveTable {
    pub fn from_fields(fields: &[FieldDescriptor]) -> Self {
        Self::parse(fields.iter().map(|field| field.tag))
    }

    pub fn parse<'a>(tags: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            slots: tags.into_iter().map(BindingDirective::parse).collect(),
        }
    }

    /// `Ok(None)` for a slot that is out of range or excluded.
    pub fn get(&self, slot: usize) -> Result<Option<&BindingDirective>, &DirectiveError> {
        match self.slots.get(slot) {
            Some(Ok(directive)) => Ok(directive.as_ref()),
            Some(Err(err)) => Err(err),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// A record type whose annotated fields can be populated from a row.
///
/// Usually derived:
///
/// ```
/// use rowbind::{FromRow, Header, RowContext};
/// use std::sync::Arc;
///
/// #[derive(Debug, Default, FromRow)]
/// struct Person {
///     #[csv("name")]
///     name: String,
///     #[csv("index:1")]
///     age: u8,
///     #[csv("-")]
///     note: String,
/// }
///
/// let header = Arc::new(Header::new(["name", "age"]));
/// let row = RowContext::with_header(header, ["Ada", "36"]);
/// let person = Person::from_row(&row).unwrap();
/// assert_eq!((person.name.as_str(), person.age), ("Ada", 36));
/// ```
pub trait FromRow {
    /// Bound fields in declaration order.
    fn fields() -> &'static [FieldDescriptor];

    /// Directives for [`Self::fields`], parsed once per type.
    fn directives() -> &'static DirectiveTable;

    /// Bind fields in declaration order, stopping at the first failure.
    ///
    /// Fields bound before the failure keep their new values.
    fn bind_row(&mut self, row: &RowContext) -> Result<(), BindError>;

    fn from_row(row: &RowContext) -> Result<Self, BindError>
    where
        Self: Default,
    {
        let mut record = Self::default();
        record.bind_row(row)?;
        Ok(record)
    }
}

/// Binds the fields of one record against one row.
pub struct FieldBinder<'r> {
    row: &'r RowContext,
    fields: &'static [FieldDescriptor],
    directives: &'r DirectiveTable,
}

impl<'r> FieldBinder<'r> {
    pub fn new(
        row: &'r RowContext,
        fields: &'static [FieldDescriptor],
        directives: &'r DirectiveTable,
    ) -> Self {
        Self {
            row,
            fields,
            directives,
        }
    }

    /// Convert the value for `slot` and assign it to `target`.
    ///
    /// A field with no name and no index is left untouched. On error
    /// `target` is not modified.
    pub fn bind<T: FromField>(&self, slot: usize, target: &mut T) -> Result<(), BindError> {
        let fail = |kind: BindErrorKind| {
            let (field, tag) = self
                .fields
                .get(slot)
                .map(|f| (f.name, f.tag))
                .unwrap_or_default();
            BindError::new(field, tag, type_name::<T>(), kind)
        };

        let directive = match self.directives.get(slot) {
            Ok(Some(directive)) => directive,
            Ok(None) => return Ok(()),
            Err(err) => return Err(fail(err.clone().into())),
        };
        let locator = directive.locator();
        if locator == Locator::Unbound {
            return Ok(());
        }

        let raw = self.row.locate(locator).map_err(&fail)?;
        *target = T::from_field(raw, directive.format()).map_err(|source| {
            fail(BindErrorKind::Conversion {
                value: raw.to_string(),
                kind: T::KIND,
                source,
            })
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{FromRow, Header};

    #[derive(Debug, Default, FromRow)]
    struct Line {
        #[csv("sku")]
        sku: String,
        #[csv("index:1")]
        qty: u32,
        #[csv("-")]
        cached: u32,
        #[csv("")]
        scratch: String,
        untagged: bool,
        #[csv("format:2006")]
        formatted_only: i32,
    }

    fn row(values: &[&str]) -> RowContext {
        let header = Arc::new(Header::new(["sku", "qty", "price"]));
        RowContext::with_header(header, values.iter().copied())
    }

    #[test]
    fn derive_lists_only_tagged_fields() {
        let names: Vec<_> = Line::fields().iter().map(|f| f.name).collect();
        assert_eq!(names, ["sku", "qty", "formatted_only"]);
        assert_eq!(Line::directives().len(), 3);
        assert!(std::ptr::eq(Line::directives(), Line::directives()));
    }

    #[test]
    fn skipped_and_unbound_fields_are_untouched() {
        let mut line = Line {
            cached: 9,
            scratch: "keep".into(),
            untagged: true,
            formatted_only: -3,
            ..Default::default()
        };
        line.bind_row(&row(&["A-1", "4", "1.5"])).unwrap();
        assert_eq!(line.sku, "A-1");
        assert_eq!(line.qty, 4);
        assert_eq!(line.cached, 9);
        assert_eq!(line.scratch, "keep");
        assert!(line.untagged);
        assert_eq!(line.formatted_only, -3);
    }

    #[test]
    fn failed_conversion_leaves_target_alone() {
        let mut line = Line {
            qty: 11,
            ..Default::default()
        };
        let err = line.bind_row(&row(&["B-2", "many"])).unwrap_err();
        assert_eq!(err.field, "qty");
        assert_eq!(err.tag, "index:1");
        assert_eq!(err.type_name, "u32");
        assert!(matches!(
            err.kind(),
            BindErrorKind::Conversion { value, .. } if value == "many"
        ));
        // earlier fields keep their new values
        assert_eq!(line.sku, "B-2");
        assert_eq!(line.qty, 11);
    }

    #[test]
    fn malformed_slot_only_fails_when_bound() {
        static FIELDS: &[FieldDescriptor] = &[
            FieldDescriptor::new("a", "sku"),
            FieldDescriptor::new("b", "index:x"),
        ];
        let table = DirectiveTable::from_fields(FIELDS);
        let row = row(&["C-3"]);
        let binder = FieldBinder::new(&row, FIELDS, &table);

        let mut a = String::new();
        binder.bind(0, &mut a).unwrap();
        assert_eq!(a, "C-3");

        let mut b = 0_i64;
        let err = binder.bind(1, &mut b).unwrap_err();
        assert_eq!(err.field, "b");
        assert!(matches!(err.kind(), BindErrorKind::MalformedAnnotation(_)));
    }

    #[test]
    fn out_of_range_slot_is_ignored() {
        let table = DirectiveTable::default();
        let row = row(&[]);
        let binder = FieldBinder::new(&row, &[], &table);
        let mut v = 5_u8;
        binder.bind(3, &mut v).unwrap();
        assert_eq!(v, 5);
    }
}
