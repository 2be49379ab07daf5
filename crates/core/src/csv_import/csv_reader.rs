//! Decoding and dialect detection for broker CSV exports.
//!
//! Turns raw upload bytes into header-keyed rows. Header names are trimmed and
//! lower-cased so format matching and column lookup are case-insensitive.

use std::collections::HashMap;

use csv::ReaderBuilder;
use encoding_rs::mem::decode_latin1;
use log::debug;

use crate::errors::{Error, Result};

/// Number of characters inspected when sniffing the delimiter.
const SNIFF_SAMPLE_CHARS: usize = 2048;

/// Candidate delimiters, in tie-break order.
const DELIMITER_CANDIDATES: [char; 4] = [',', ';', '\t', '|'];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// One data row keyed by normalized header name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvRow {
    values: HashMap<String, String>,
}

impl CsvRow {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut values = HashMap::new();
        for (key, value) in pairs {
            let key = normalize_header(key.as_ref());
            if !key.is_empty() {
                values.insert(key, value.into());
            }
        }
        Self { values }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    /// Value of the first alias whose column exists in the file, or `""`.
    ///
    /// A present-but-empty column still wins over later aliases.
    pub fn first_of(&self, aliases: &[&str]) -> &str {
        aliases
            .iter()
            .find_map(|alias| self.get(alias))
            .unwrap_or("")
    }
}

/// Parsed CSV file.
#[derive(Debug, Clone)]
pub struct CsvTable {
    /// Normalized header names in file order.
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
    pub delimiter: char,
}

pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Decodes upload bytes as UTF-8 (BOM tolerated), falling back to Latin-1.
///
/// Latin-1 maps every byte to the code point of the same value, so the
/// fallback always succeeds.
pub fn decode_content(content: &[u8]) -> String {
    let without_bom = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    if let Ok(text) = std::str::from_utf8(without_bom) {
        return text.to_string();
    }

    debug!("CSV upload is not valid UTF-8, retrying as Latin-1");
    decode_latin1(without_bom).into_owned()
}

/// Picks the delimiter that splits the sample into the most consistent columns.
///
/// Falls back to a comma when no candidate occurs in the sample.
pub fn detect_delimiter(content: &str) -> char {
    let sample: String = content.chars().take(SNIFF_SAMPLE_CHARS).collect();
    let mut best_delimiter = ',';
    let mut best_score = 0usize;

    for delimiter in DELIMITER_CANDIDATES {
        let score = score_delimiter(&sample, delimiter);
        if score > best_score {
            best_score = score;
            best_delimiter = delimiter;
        }
    }

    best_delimiter
}

/// Scores a delimiter by counting consistent column counts across lines.
fn score_delimiter(sample: &str, delimiter: char) -> usize {
    let counts: Vec<usize> = sample
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(10)
        .map(|line| line.matches(delimiter).count())
        .collect();

    let Some(&first_count) = counts.first() else {
        return 0;
    };
    let consistent_count = counts.iter().filter(|&&c| c == first_count).count();
    first_count * consistent_count
}

/// Decodes, sniffs and parses a CSV upload into header-keyed rows.
///
/// Fails only on file-level problems: undecodable bytes, a missing header row
/// or structurally broken CSV. Blank rows are skipped.
pub fn read_table(content: &[u8]) -> Result<CsvTable> {
    let text = decode_content(content);
    let delimiter = detect_delimiter(&text);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut headers: Option<Vec<String>> = None;
    let mut raw_headers: Vec<String> = Vec::new();
    let mut rows = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| Error::CsvParsing(format!("malformed CSV at row {}: {e}", index + 1)))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        match headers {
            None => {
                raw_headers = record.iter().map(str::to_string).collect();
                headers = Some(raw_headers.iter().map(|h| normalize_header(h)).collect());
            }
            Some(_) => {
                let row = CsvRow::from_pairs(
                    raw_headers
                        .iter()
                        .zip(record.iter().chain(std::iter::repeat("")))
                        .map(|(key, value)| (key.as_str(), value)),
                );
                rows.push(row);
            }
        }
    }

    let headers = headers
        .filter(|h| h.iter().any(|name| !name.is_empty()))
        .ok_or_else(|| Error::CsvParsing("CSV file has no valid headers".to_string()))?;

    debug!(
        "Read CSV with delimiter {:?}: {} columns, {} rows",
        delimiter,
        headers.len(),
        rows.len()
    );

    Ok(CsvTable {
        headers,
        rows,
        delimiter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_utf8_bom() {
        let content = b"\xEF\xBB\xBFsymbol,side,pnl\nEURUSD,buy,10";
        let table = read_table(content).unwrap();
        assert_eq!(table.headers, vec!["symbol", "side", "pnl"]);
    }

    #[test]
    fn falls_back_to_latin1() {
        // 0xE9 is 'é' in Latin-1 and invalid as a lone UTF-8 byte.
        let content = b"symbol,side,pnl,comment\nEURUSD,buy,10,caf\xE9";
        let table = read_table(content).unwrap();
        assert_eq!(table.rows[0].get("comment"), Some("café"));
    }

    #[test]
    fn latin1_keeps_c1_control_bytes() {
        assert_eq!(decode_content(b"a\x80\x9F"), "a\u{80}\u{9F}");
        assert_eq!(decode_content(b"ok"), "ok");
    }

    #[test]
    fn detects_semicolon_and_tab() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3\n4;5;6"), ';');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn single_column_defaults_to_comma() {
        assert_eq!(detect_delimiter("symbol\nEURUSD"), ',');
    }

    #[test]
    fn headers_are_normalized() {
        let table = read_table(b" Ticket ,Open Time,ITEM\n1,2024.01.01 10:00:00,EURUSD").unwrap();
        assert_eq!(table.headers, vec!["ticket", "open time", "item"]);
        assert_eq!(table.rows[0].get("item"), Some("EURUSD"));
    }

    #[test]
    fn short_rows_are_padded_and_blank_rows_skipped() {
        let table = read_table(b"symbol,side,pnl\n\nEURUSD,buy\n,,\n").unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].get("pnl"), Some(""));
    }

    #[test]
    fn quoted_fields_keep_delimiters() {
        let table = read_table(b"symbol,side,pnl\n\"EURUSD\",buy,\"1,250.50\"").unwrap();
        assert_eq!(table.rows[0].get("pnl"), Some("1,250.50"));
    }

    #[test]
    fn empty_file_has_no_headers() {
        assert!(matches!(read_table(b""), Err(Error::CsvParsing(_))));
        assert!(matches!(read_table(b"\n\n"), Err(Error::CsvParsing(_))));
    }

    #[test]
    fn first_of_prefers_present_columns() {
        let row = CsvRow::from_pairs([("size", ""), ("lots", "2")]);
        assert_eq!(row.first_of(&["size", "lots"]), "");
        assert_eq!(row.first_of(&["volume", "lots"]), "2");
        assert_eq!(row.first_of(&["missing"]), "");
    }
}
