//! Append-only measurement record (one CSV file per order).

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::classify::Status;
use crate::measurement::SLOT_COUNT;

pub const RECORD_HEADER: [&str; 19] = [
    "Number",
    "OK/NOK",
    "Ordernumber",
    "Counter",
    "Date",
    "Time",
    "Value1",
    "Value2",
    "Value3",
    "Value4",
    "Value5",
    "Value6",
    "Value7",
    "Value8",
    "Value9",
    "Value10",
    "Value11",
    "Value12",
    "User",
];

/// One row of the measurement record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRow {
    /// 1-based row number within the record.
    pub number: u64,
    pub status: Status,
    pub order_number: String,
    /// Per-status counter at the time the part was saved.
    pub counter: u64,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM:SS`
    pub time: String,
    pub values: [f64; SLOT_COUNT],
    pub user: String,
}

impl RecordRow {
    pub fn new(
        number: u64,
        status: Status,
        order_number: &str,
        counter: u64,
        timestamp: &DateTime<Local>,
        values: [f64; SLOT_COUNT],
        user: &str,
    ) -> Self {
        Self {
            number,
            status,
            order_number: order_number.to_string(),
            counter,
            date: timestamp.format("%Y-%m-%d").to_string(),
            time: timestamp.format("%H:%M:%S").to_string(),
            values,
            user: user.to_string(),
        }
    }

    /// The row as one CSV line, without the trailing newline.
    pub fn to_csv_line(&self) -> String {
        let mut fields: Vec<String> = Vec::with_capacity(RECORD_HEADER.len());
        fields.push(self.number.to_string());
        fields.push(self.status.to_string());
        fields.push(csv_field(&self.order_number));
        fields.push(self.counter.to_string());
        fields.push(csv_field(&self.date));
        fields.push(csv_field(&self.time));
        // Debug formatting keeps a trailing ".0" on whole numbers.
        fields.extend(self.values.iter().map(|v| format!("{v:?}")));
        fields.push(csv_field(&self.user));
        fields.join(",")
    }
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Destination for measurement rows.
pub trait RecordSink {
    /// Data rows currently in the record (header excluded).
    fn row_count(&self) -> u64;
    /// Append one row. Existing rows are never rewritten.
    fn append(&mut self, row: &RecordRow) -> io::Result<()>;
    /// Location of the record, for error reporting.
    fn location(&self) -> PathBuf;
}

/// Data records in `text`, header excluded. Newlines inside quoted fields
/// do not end a record; blank lines are ignored.
fn count_data_rows(text: &str) -> u64 {
    let mut in_quotes = false;
    let mut blank = true;
    let mut records = 0u64;
    for c in text.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                blank = false;
            }
            '\n' if !in_quotes => {
                if !blank {
                    records += 1;
                }
                blank = true;
            }
            c if !c.is_whitespace() => blank = false,
            _ => {}
        }
    }
    if !blank {
        records += 1;
    }
    records.saturating_sub(1)
}

fn ends_with_newline(file: &mut File, len: u64) -> io::Result<bool> {
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// CSV file record. Single writer assumed.
#[derive(Debug)]
pub struct CsvRecord {
    path: PathBuf,
    rows: u64,
}

impl CsvRecord {
    /// Open `path`, writing the header when the file is new or empty.
    pub fn open(path: &Path) -> io::Result<Self> {
        let existing = match std::fs::read_to_string(path) {
            Ok(s) => Some(s),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };

        let rows = match existing {
            Some(ref text) if !text.trim().is_empty() => count_data_rows(text),
            _ => {
                let mut file = File::create(path)?;
                writeln!(file, "{}", RECORD_HEADER.join(","))?;
                0
            }
        };
        tracing::debug!("record {} opened with {} rows", path.display(), rows);

        Ok(Self {
            path: path.to_path_buf(),
            rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for CsvRecord {
    fn row_count(&self) -> u64 {
        self.rows
    }

    /// Appends the row in a single write. A failed write is truncated away
    /// so the file keeps only whole rows.
    fn append(&mut self, row: &RecordRow) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)?;
        let len = file.metadata()?.len();

        let mut line = String::new();
        if !ends_with_newline(&mut file, len)? {
            line.push('\n');
        }
        line.push_str(&row.to_csv_line());
        line.push('\n');

        if let Err(e) = file.write_all(line.as_bytes()) {
            if let Err(t) = file.set_len(len) {
                tracing::warn!(
                    "failed to truncate {} after a partial write: {}",
                    self.path.display(),
                    t
                );
            }
            return Err(e);
        }
        self.rows += 1;
        Ok(())
    }

    fn location(&self) -> PathBuf {
        self.path.clone()
    }
}
