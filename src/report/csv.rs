//! CSV encoding for report uploads.
//!
//! Every field is wrapped in double quotes with embedded quotes doubled.
//! Fields are joined by `,` and rows by `\n`, with no trailing newline.

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};

use crate::error::{DialerError, Result};

/// Encode rows as fully quoted CSV.
pub fn build_csv<R, F>(rows: R) -> Result<String>
where
    R: IntoIterator,
    R::Item: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DialerError::Io(e.into_error()))?;
    let mut text = String::from_utf8(bytes).map_err(|e| DialerError::Validation(e.to_string()))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Decode CSV text produced by [`build_csv`] back into rows.
pub fn parse_csv(text: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }
    Ok(rows)
}
