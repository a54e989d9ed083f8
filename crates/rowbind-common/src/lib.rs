pub mod error;
pub mod kind;
pub mod value;

pub use error::*;
pub use kind::*;
pub use value::*;
