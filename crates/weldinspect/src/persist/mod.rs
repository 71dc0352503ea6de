//! Image naming and measurement-record persistence.

pub mod naming;
pub mod record;

pub use naming::{next_free_path, ImageName};
pub use record::{CsvRecord, RecordRow, RecordSink, RECORD_HEADER};
