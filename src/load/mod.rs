// src/load/mod.rs
pub mod sniff;

use anyhow::Result;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufRead, BufReader, Cursor, Read},
    path::Path,
};
use tracing::{debug, info, warn};

use crate::error::PipelineError;
pub use sniff::sniff_delimiter;

/// One source row, keyed by header name.
pub type RawRecord = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Data rows seen after the header.
    pub total_rows: usize,
    pub kept_rows: usize,
    pub skipped_rows: usize,
}

#[derive(Debug, Clone)]
pub struct RawTable {
    /// File name the table was read from, for logging.
    pub source: String,
    /// Header cells, cleaned, in file order.
    pub headers: Vec<String>,
    pub rows: Vec<RawRecord>,
    pub stats: LoadStats,
}

impl RawTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A cell as the rest of the pipeline sees it: no surrounding whitespace,
/// byte-order mark or matching pair of quotes.
pub fn clean_cell(raw: &str) -> String {
    let s = raw.trim_start_matches('\u{feff}').trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|&q| s.strip_prefix(q)?.strip_suffix(q))
        .unwrap_or(s);
    unquoted.trim().to_string()
}

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Read a delimited text file into a `RawTable`.
///
/// Rows are aligned on header names. A row with a different field count than
/// the header, a row the CSV reader rejects, or a row of empty cells is
/// skipped and counted. Only a missing or unreadable file is an error; a file
/// with nothing but a header (or nothing at all) yields an empty table.
///
/// The file is streamed: only the leading lines up to the header are
/// buffered for delimiter sniffing.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<RawTable, PipelineError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PipelineError::InputFileMissing(path.to_path_buf()));
    }
    let unreadable = |source| PipelineError::Unreadable {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(unreadable)?;
    let mut reader = BufReader::new(file);

    // 1) buffer up to and including the first non-blank line
    let mut head: Vec<u8> = Vec::new();
    loop {
        let start = head.len();
        let n = reader.read_until(b'\n', &mut head).map_err(unreadable)?;
        if n == 0 || !String::from_utf8_lossy(&head[start..]).trim().is_empty() {
            break;
        }
    }
    if head.starts_with(BOM) {
        head.drain(..BOM.len());
    }
    let delimiter = sniff_delimiter(first_line(&String::from_utf8_lossy(&head)));

    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    // 2) stream the buffered head followed by the rest of the file
    let table = read_table(&source, Cursor::new(head).chain(reader), delimiter);
    info!(
        file = %table.source,
        columns = table.headers.len(),
        rows = table.stats.kept_rows,
        "loaded"
    );
    if table.stats.skipped_rows > 0 {
        warn!(
            file = %table.source,
            skipped = table.stats.skipped_rows,
            "skipped malformed rows"
        );
    }
    Ok(table)
}

fn first_line(text: &str) -> &str {
    text.lines().find(|l| !l.trim().is_empty()).unwrap_or("")
}

/// Parse already-read text. Never fails; see `load_csv`.
pub fn parse_table(source: &str, text: &str) -> RawTable {
    let text = text.trim_start_matches('\u{feff}');
    read_table(source, text.as_bytes(), sniff_delimiter(first_line(text)))
}

fn read_table<R: Read>(source: &str, input: R, delimiter: u8) -> RawTable {
    debug!(file = source, delimiter = %(delimiter as char), "sniffed delimiter");

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // field-count mismatches are handled per row below
        .delimiter(delimiter)
        .from_reader(input);

    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::new();
    let mut stats = LoadStats::default();

    for (idx, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                if !headers.is_empty() {
                    stats.total_rows += 1;
                    stats.skipped_rows += 1;
                }
                debug!(file = source, record = idx, error = %e, "unparsable row");
                continue;
            }
        };

        if headers.is_empty() {
            if record.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            headers = record.iter().map(clean_cell).collect();
            continue;
        }

        stats.total_rows += 1;
        if record.len() != headers.len() {
            stats.skipped_rows += 1;
            debug!(
                file = source,
                record = idx,
                expected = headers.len(),
                found = record.len(),
                "field count mismatch"
            );
            continue;
        }
        if record.iter().all(|c| c.trim().is_empty()) {
            stats.skipped_rows += 1;
            continue;
        }

        let mut row = RawRecord::new();
        for (name, cell) in headers.iter().zip(record.iter()) {
            // first column wins when a header repeats
            row.entry(name.clone()).or_insert_with(|| clean_cell(cell));
        }
        rows.push(row);
    }

    stats.kept_rows = rows.len();
    RawTable {
        source: source.to_string(),
        headers,
        rows,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn malformed_rows_are_skipped_not_fatal() -> anyhow::Result<()> {
        crate::init_test_logging();
        let content = "dt,AverageTemperature,City,Country\n\
1850-01-01,12.5,Delhi,India\n\
1850-02-01,13.1,Delhi\n\
1850-03-01,14.0,Delhi,India,extra\n\
,,,\n\
1850-04-01,\"15.2\",Delhi,India\n";
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(content.as_bytes())?;

        let table = load_csv(tmp.path())?;
        assert_eq!(table.headers, vec!["dt", "AverageTemperature", "City", "Country"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(
            table.stats,
            LoadStats {
                total_rows: 5,
                kept_rows: 2,
                skipped_rows: 3
            }
        );
        assert_eq!(table.rows[1]["AverageTemperature"], "15.2");
        assert!(table.rows.iter().all(|r| r["Country"] == "India"));
        Ok(())
    }

    #[test]
    fn semicolon_export_aligns_on_header_names() {
        let text = "\u{feff}City;Pollutant;Value;Last Updated\n\
Delhi;PM2.5;180;2020-01-01T00:00:00+00:00\n\
Paris;NO2;40;2020-01-02T00:00:00+00:00\n";
        let table = parse_table("openaq.csv", text);
        assert_eq!(table.headers[0], "City");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0]["Pollutant"], "PM2.5");
        assert_eq!(table.rows[1]["Last Updated"], "2020-01-02T00:00:00+00:00");
    }

    #[test]
    fn streamed_file_sniffs_past_bom_and_blank_lines() -> anyhow::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(b"\xEF\xBB\xBF\n\nCity;Pollutant;Value\nDelhi;PM2.5;180\nParis;NO2;40\n")?;

        let table = load_csv(tmp.path())?;
        assert_eq!(table.headers, vec!["City", "Pollutant", "Value"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1]["Value"], "40");
        assert_eq!(table.stats.skipped_rows, 0);

        let mut empty = NamedTempFile::new()?;
        empty.write_all(b"")?;
        assert!(load_csv(empty.path())?.is_empty());
        Ok(())
    }

    #[test]
    fn empty_file_is_an_empty_table() {
        let table = parse_table("empty.csv", "");
        assert!(table.is_empty());
        assert!(table.headers.is_empty());

        let header_only = parse_table("h.csv", "a,b,c\n");
        assert!(header_only.is_empty());
        assert_eq!(header_only.stats.total_rows, 0);
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = load_csv("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, PipelineError::InputFileMissing(_)));
    }

    #[test]
    fn clean_cell_strips_quotes_bom_and_space() {
        assert_eq!(clean_cell("  \"Delhi\" "), "Delhi");
        assert_eq!(clean_cell("'Paris'"), "Paris");
        assert_eq!(clean_cell("\u{feff}dt"), "dt");
        assert_eq!(clean_cell("\""), "\"");
        assert_eq!(clean_cell(" 4.5 "), "4.5");
    }
}
