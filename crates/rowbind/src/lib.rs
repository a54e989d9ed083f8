//! Bind delimited-text rows into typed Rust records.
//!
//! Fields are mapped to columns through `#[csv("...")]` annotations:
//!
//! | Annotation | Effect |
//! |---|---|
//! | `#[csv("name")]` | read the column whose header is `name` |
//! | `#[csv("index:2")]` | read the third column |
//! | `#[csv("born,format:2006-01-02")]` | read `born` as a date with this layout |
//! | `#[csv("-")]`, `#[csv("")]`, no attribute | leave the field alone |
//!
//! Values convert through [`FromField`], which covers the integer, float,
//! `bool`, `String` and `chrono` types plus `Option<T>` of any of them.
//! Other types implement [`TextDecodable`]. When the record layout is only
//! known at runtime, a [`Schema`] binds rows into a [`Record`] of
//! [`Value`]s with the same rules.
//!
//! The `csv` feature (on by default) adds [`RowReader`], which tokenizes
//! input with the `csv` crate and drives the binder row by row.
//!
//! ```
//! use rowbind::{FromRow, Header, RowContext};
//! use chrono::NaiveDate;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Default, FromRow)]
//! struct Person {
//!     #[csv("name")]
//!     name: String,
//!     #[csv("birthdate,format:2006-01-02")]
//!     born: Option<NaiveDate>,
//!     #[csv("index:2")]
//!     score: f64,
//! }
//!
//! let header = Arc::new(Header::new(["name", "birthdate", "score"]));
//! let row = RowContext::with_header(header, ["Ada", "1815-12-10", "9.5"]);
//! let person = Person::from_row(&row).unwrap();
//! assert_eq!(person.born, NaiveDate::from_ymd_opt(1815, 12, 10));
//! ```

// Lets `#[derive(FromRow)]` output, which names `::rowbind`, compile here too.
extern crate self as rowbind;

pub mod bind;
pub mod convert;
pub mod directive;
pub mod dynamic;
pub mod layout;
#[cfg(feature = "csv")]
pub mod reader;
pub mod row;

pub use bind::{DirectiveTable, FieldBinder, FieldDescriptor, FromRow};
pub use convert::{FromField, TextDecodable};
pub use directive::{BindingDirective, Locator, SKIP_MARKER};
pub use dynamic::{Codecs, Record, Schema, SchemaField};
pub use row::{Header, RowContext};

#[cfg(feature = "csv")]
pub use reader::{HeaderMode, ReadError, ReadOptions, Records, RowReader};

pub use rowbind_common::{
    BindError, BindErrorKind, ConvertError, DirectiveError, FieldKind, FieldType, Value,
};
pub use rowbind_macros::FromRow;
