//! CSV import pipeline: tokenize, project into typed records, batch-write.

pub mod import;
pub mod parser;
pub mod projection;

pub use import::{import_csv, ImportError, ImportForm, ImportReport};
pub use parser::parse_csv;
pub use projection::{parse_amount, ImportRecords, Lenient};
