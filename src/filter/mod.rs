pub mod error;
pub mod search;
pub mod sort;

pub use error::FilterError;
pub use search::{ColumnKind, ColumnSpec, CondValue, Condition, SearchFilter};
