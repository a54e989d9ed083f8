//! Row driver over the `csv` crate.
//!
//! [`RowReader`] tokenizes input with `csv::Reader`, keeps the active
//! [`Header`] and hands each row to the binder. It adds no binding rules of
//! its own.

use std::{fs::File, io, marker::PhantomData, path::Path, sync::Arc};

use rowbind_common::{BindError, BindErrorKind};

use crate::{
    bind::FromRow,
    dynamic::{Codecs, Record, Schema},
    row::{Header, RowContext},
};

/// Where the header comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeaderMode {
    /// Skip this many lines, then read the header from the next one.
    Line(usize),
    /// Use these column names; every input line is data.
    Fixed(Vec<String>),
    /// No header. Only positional annotations can bind.
    None,
}

impl Default for HeaderMode {
    fn default() -> Self {
        HeaderMode::Line(0)
    }
}

#[derive(Clone, Debug)]
pub struct ReadOptions {
    /// Field delimiter as a single byte. Use `b'\t'` for TSV.
    pub delimiter: u8,
    /// When false, `"` has no special meaning.
    pub quoting: bool,
    pub header: HeaderMode,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quoting: true,
            header: HeaderMode::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Input ended before the header line was reached.
    #[error("input ended before header line {line}")]
    MissingHeader { line: usize },
    #[error(transparent)]
    Bind(#[from] BindError),
}

/// Reads delimited rows and binds them into records.
///
/// ```
/// use rowbind::{FromRow, ReadOptions, RowReader};
///
/// #[derive(Debug, Default, FromRow)]
/// struct Item {
///     #[csv("name")]
///     name: String,
///     #[csv("qty")]
///     qty: u32,
/// }
///
/// let input = "name,qty\nbolt,12\nnut,40\n";
/// let mut reader = RowReader::new(input.as_bytes(), ReadOptions::default()).unwrap();
/// let items: Vec<Item> = reader.records().collect::<Result<_, _>>().unwrap();
/// assert_eq!(items.len(), 2);
/// assert_eq!(items[1].qty, 40);
/// ```
pub struct RowReader<R> {
    inner: csv::Reader<R>,
    record: csv::StringRecord,
    header: Option<Arc<Header>>,
    row: RowContext,
    line: u64,
}

impl RowReader<File> {
    pub fn from_path(path: impl AsRef<Path>, options: ReadOptions) -> Result<Self, ReadError> {
        Self::new(File::open(path)?, options)
    }
}

impl<R: io::Read> RowReader<R> {
    /// Wrap `reader` and establish the header per `options.header`.
    pub fn new(reader: R, options: ReadOptions) -> Result<Self, ReadError> {
        let inner = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quoting(options.quoting)
            .has_headers(false)
            // Ragged rows are left to the binder.
            .flexible(true)
            .from_reader(reader);

        let mut this = Self {
            inner,
            record: csv::StringRecord::new(),
            header: None,
            row: RowContext::default(),
            line: 0,
        };

        match options.header {
            HeaderMode::Line(skip) => {
                for _ in 0..=skip {
                    if !this.next_row()? {
                        return Err(ReadError::MissingHeader { line: skip });
                    }
                }
                #[cfg(feature = "tracing")]
                tracing::debug!(skipped = skip, "header line reached");
                this.read_header();
            }
            HeaderMode::Fixed(columns) => this.set_header(columns),
            HeaderMode::None => {}
        }
        Ok(this)
    }

    /// Column names of the active header, in declaration order.
    pub fn header_names(&self) -> &[String] {
        self.header.as_deref().map(Header::names).unwrap_or(&[])
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_deref()
    }

    /// Replace the header.
    pub fn set_header<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let header = Arc::new(Header::new(columns));
        #[cfg(feature = "tracing")]
        tracing::debug!(columns = header.len(), line = self.line, "header established");
        self.header = Some(header);
        let values = std::mem::take(&mut self.row).into_values();
        self.row = RowContext::new(self.header.clone(), values);
    }

    /// Make the current row the header.
    pub fn read_header(&mut self) {
        let columns = self.row.values().to_vec();
        self.set_header(columns);
    }

    /// Advance to the next row. `Ok(false)` at end of input.
    pub fn next_row(&mut self) -> Result<bool, ReadError> {
        if !self.inner.read_record(&mut self.record)? {
            return Ok(false);
        }
        self.line = self
            .record
            .position()
            .map(|pos| pos.line())
            .unwrap_or(self.line + 1);
        let values = self.record.iter().map(str::to_string).collect();
        self.row = RowContext::new(self.header.clone(), values);
        Ok(true)
    }

    /// 1-based line the current row started on; 0 before the first row.
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn row(&self) -> &RowContext {
        &self.row
    }

    pub fn get(&self, name: &str) -> Result<&str, BindErrorKind> {
        self.row.get(name)
    }

    pub fn get_by_index(&self, index: usize) -> &str {
        self.row.get_by_index(index)
    }

    /// Bind the current row into `target`.
    pub fn bind<T: FromRow>(&self, target: &mut T) -> Result<(), ReadError> {
        target.bind_row(&self.row)?;
        Ok(())
    }

    /// Build a record from the current row.
    pub fn deserialize<T: FromRow + Default>(&self) -> Result<T, ReadError> {
        Ok(T::from_row(&self.row)?)
    }

    /// Bind the current row through a runtime schema.
    pub fn read_record(&self, schema: &Schema, codecs: &Codecs) -> Result<Record, ReadError> {
        Ok(schema.read(&self.row, codecs)?)
    }

    /// Iterate the remaining rows as records.
    pub fn records<T: FromRow + Default>(&mut self) -> Records<'_, R, T> {
        Records {
            reader: self,
            _marker: PhantomData,
        }
    }
}

/// Iterator returned by [`RowReader::records`].
pub struct Records<'a, R, T> {
    reader: &'a mut RowReader<R>,
    _marker: PhantomData<fn() -> T>,
}

impl<R: io::Read, T: FromRow + Default> Iterator for Records<'_, R, T> {
    type Item = Result<T, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.next_row() {
            Ok(true) => Some(self.reader.deserialize()),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
