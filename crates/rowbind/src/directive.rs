//! Parsing of per-field binding annotations.
//!
//! An annotation is a comma-separated list of tokens:
//!
//! | Token | Effect |
//! |---|---|
//! | `<name>` | bind by header name |
//! | `index:<int>` | bind by zero-based position |
//! | `format:<pattern>` | pattern for temporal conversions |
//!
//! Tokens are trimmed and applied left to right; a later token of the same
//! kind replaces an earlier one. `""` and `"-"` exclude the field.

use rowbind_common::DirectiveError;

const INDEX_PREFIX: &str = "index:";
const FORMAT_PREFIX: &str = "format:";

/// Annotation value that excludes a field from binding.
pub const SKIP_MARKER: &str = "-";

/// Parsed form of one field annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingDirective {
    column_name: String,
    index: Option<usize>,
    format: String,
}

/// Where a directive reads its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator<'a> {
    Name(&'a str),
    Index(usize),
    /// Neither a name nor a non-negative index was given.
    Unbound,
}

impl BindingDirective {
    /// Parse an annotation. `Ok(None)` means the field is not bound.
    pub fn parse(raw: &str) -> Result<Option<Self>, DirectiveError> {
        if raw.is_empty() || raw == SKIP_MARKER {
            return Ok(None);
        }

        let mut directive = Self::default();
        for token in raw.split(',') {
            directive.apply(token.trim())?;
        }
        Ok(Some(directive))
    }

    fn apply(&mut self, token: &str) -> Result<(), DirectiveError> {
        if let Some(rest) = token.strip_prefix(INDEX_PREFIX) {
            let index: i64 = rest
                .parse()
                .map_err(|source| DirectiveError::MalformedIndex {
                    token: token.to_string(),
                    source,
                })?;
            // Negative indexes parse but leave the field unbound by position.
            self.index = usize::try_from(index).ok();
        } else if let Some(rest) = token.strip_prefix(FORMAT_PREFIX) {
            self.format = rest.to_string();
        } else {
            self.column_name = token.to_string();
        }
        Ok(())
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// A non-empty column name wins over an index.
    pub fn locator(&self) -> Locator<'_> {
        if !self.column_name.is_empty() {
            Locator::Name(&self.column_name)
        } else if let Some(index) = self.index {
            Locator::Index(index)
        } else {
            Locator::Unbound
        }
    }
}
