use std::sync::Arc;

use rowbind_common::BindErrorKind;
use rustc_hash::FxHashMap;

use crate::directive::Locator;

/// Column names of a table, with a name → position lookup built once.
///
/// When a name repeats, lookups resolve to its last position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    names: Vec<String>,
    positions: FxHashMap<String, usize>,
}

impl Header {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let positions = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { names, positions }
    }

    /// Column names in declaration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Header {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// One row of raw values together with the active header.
///
/// Rows may be ragged: a value count that differs from the header width
/// is not an error by itself.
#[derive(Debug, Clone, Default)]
pub struct RowContext {
    header: Option<Arc<Header>>,
    values: Vec<String>,
}

impl RowContext {
    pub fn new(header: Option<Arc<Header>>, values: Vec<String>) -> Self {
        Self { header, values }
    }

    pub fn with_header<I, S>(header: Arc<Header>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Some(header), values.into_iter().map(Into::into).collect())
    }

    /// A row with no header; only positional lookups succeed.
    pub fn headerless<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(None, values.into_iter().map(Into::into).collect())
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_deref()
    }

    pub fn shared_header(&self) -> Option<&Arc<Header>> {
        self.header.as_ref()
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn into_values(self) -> Vec<String> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Width positional lookups are checked against: the header width, or
    /// the row length when no header is established.
    pub fn declared_width(&self) -> usize {
        match &self.header {
            Some(header) => header.len(),
            None => self.values.len(),
        }
    }

    /// Value of a named column; `""` when the row is shorter than the header.
    pub fn get(&self, name: &str) -> Result<&str, BindErrorKind> {
        let position = self
            .header
            .as_ref()
            .and_then(|header| header.position(name))
            .ok_or_else(|| BindErrorKind::UnknownColumn {
                name: name.to_string(),
            })?;
        Ok(self.get_by_index(position))
    }

    /// Value at a position; `""` past the end of the row.
    pub fn get_by_index(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    /// Resolve the raw value a locator points at.
    ///
    /// An index at or beyond the declared width is an error, while a
    /// position that is only beyond the current row yields `""`. The two
    /// rules differ on purpose.
    pub fn locate(&self, locator: Locator<'_>) -> Result<&str, BindErrorKind> {
        match locator {
            Locator::Name(name) => self.get(name),
            Locator::Index(index) => {
                let width = self.declared_width();
                if index >= width {
                    return Err(BindErrorKind::IndexOutOfRange { index, width });
                }
                Ok(self.get_by_index(index))
            }
            Locator::Unbound => Ok(""),
        }
    }
}
