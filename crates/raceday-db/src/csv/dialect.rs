//! Reader and writer settings shared by import and export.

use std::io;

use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};

/// Lenient reader over in-memory text.
///
/// No header handling and no fixed record width. A `"` at the start of a
/// field opens a quoted region where `""` is a literal quote; quotes in the
/// middle of an unquoted field are kept as-is. Blank lines yield no record.
pub fn reader(text: &str, delimiter: u8) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes())
}

/// Fields of the first record in `line`. Fields are not trimmed.
#[must_use]
pub fn split_line(line: &str, delimiter: u8) -> Vec<String> {
    let mut record = StringRecord::new();
    match reader(line, delimiter).read_record(&mut record) {
        Ok(true) => record.iter().map(str::to_string).collect(),
        Ok(false) | Err(_) => vec![String::new()],
    }
}

/// Writer for spreadsheet tools: `;` separated, every field quoted, CRLF.
#[must_use]
pub fn excel_writer<W: io::Write>(out: W) -> csv::Writer<W> {
    WriterBuilder::new()
        .delimiter(b';')
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::CRLF)
        .from_writer(out)
}
