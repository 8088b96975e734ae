//! Tokenized input rows and the column vocabulary.

pub mod columns;
mod row;

pub use row::{RawRow, normalize_header};
