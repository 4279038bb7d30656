// src/table/mod.rs
pub mod cell;

use std::collections::HashMap;
use tracing::{debug, trace};

use crate::error::{DataLoadError, Result};
pub use cell::{clean_str, Cell};

/// One data line of a vector table, keyed by header name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: HashMap<String, Cell>,
}

impl Row {
    pub fn new(cells: HashMap<String, Cell>) -> Self {
        Self { cells }
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells.get(column)
    }

    /// The compound `<topic>_<field>` key.
    pub fn vector(&self) -> Option<&str> {
        self.get("vector").and_then(Cell::as_text)
    }

    pub fn ref_date(&self) -> Option<f64> {
        self.get("ref_date").and_then(Cell::as_number)
    }

    pub fn value(&self) -> Option<f64> {
        self.get("value").and_then(Cell::as_number)
    }
}

/// A fully parsed CSV resource.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Column names from the header line, trimmed and unquoted.
    pub headers: Vec<String>,
    /// Every data line, in source order.
    pub rows: Vec<Row>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Split one line on commas that are not inside double quotes.
///
/// Every `"` toggles the quoted state and is kept in the field; `clean_str`
/// strips the outer pair later. `""` is not treated as an escaped quote.
pub fn split_fields(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(&line[start..]);
    fields
}

/// Parse CSV text into a [`Table`].
///
/// Quoted fields may contain commas. Doubled quotes inside a quoted field are
/// not unescaped. Blank lines are skipped and header-only input yields no rows.
/// Rows shorter than the header lack the trailing keys; extra cells are dropped.
pub fn parse_table(resource: &str, data: &[u8]) -> Result<Table> {
    let text = std::str::from_utf8(data).map_err(|e| DataLoadError::Csv {
        resource: resource.to_string(),
        message: e.to_string(),
    })?;
    let mut lines = text.lines().map(|l| l.trim_end_matches('\r'));

    let headers: Vec<String> = match lines.next() {
        Some(first) => split_fields(first.trim_start_matches('\u{feff}'))
            .into_iter()
            .map(clean_str)
            .collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    for (idx, line) in lines.enumerate() {
        if line.trim().is_empty() {
            trace!(resource, line = idx + 2, "skipping blank line");
            continue;
        }
        let fields = split_fields(line);
        if fields.len() > headers.len() {
            let extra = fields.len() - headers.len();
            trace!(resource, line = idx + 2, extra, "ignoring trailing cells");
        }
        let cells = headers
            .iter()
            .zip(fields)
            .map(|(name, raw)| (name.clone(), Cell::coerce(raw)))
            .collect();
        rows.push(Row::new(cells));
    }

    debug!(resource, rows = rows.len(), columns = headers.len(), "parsed table");
    Ok(Table { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_coerces_cells() {
        let text = "\"vector\",\"ref_date\",\"value\"\ncapex_oil_gas,2020,10\ncapex_total,2020,15.5\n";
        let table = parse_table("data.csv", text.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["vector", "ref_date", "value"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].vector(), Some("capex_oil_gas"));
        assert_eq!(table.rows[0].ref_date(), Some(2020.0));
        assert_eq!(table.rows[1].value(), Some(15.5));
    }

    #[test]
    fn quoted_commas_do_not_split_fields() {
        let text = "vector,ref_date,value,label\nx_a,2020,1,\"1,234\"\n";
        let table = parse_table("data.csv", text.as_bytes()).unwrap();

        assert_eq!(table.rows[0].get("label"), Some(&Cell::Text("1,234".into())));
        assert_eq!(table.rows[0].value(), Some(1.0));
    }

    #[test]
    fn quotes_toggle_anywhere_in_a_line() {
        let text = "vector,ref_date,value,label\nx_a,2020,1, \"1,234\"\nx_b,2020,2,ab\"c,d\"e\n";
        let table = parse_table("data.csv", text.as_bytes()).unwrap();

        assert_eq!(table.rows[0].get("label"), Some(&Cell::Text("1,234".into())));
        assert_eq!(
            table.rows[1].get("label"),
            Some(&Cell::Text("ab\"c,d\"e".into()))
        );
    }

    #[test]
    fn doubled_quotes_are_left_as_is() {
        assert_eq!(split_fields("a,\"x\"\"y\",b"), vec!["a", "\"x\"\"y\"", "b"]);
        let text = "vector,ref_date,value,label\nx_a,2020,1,\"say \"\"hi\"\"\"\n";
        let table = parse_table("data.csv", text.as_bytes()).unwrap();
        assert_eq!(
            table.rows[0].get("label"),
            Some(&Cell::Text("say \"\"hi\"\"".into()))
        );
    }

    #[test]
    fn crlf_and_extra_cells() {
        let text = "vector,ref_date,value\r\ncapex_total,2020,1,surplus\r\n";
        let table = parse_table("data.csv", text.as_bytes()).unwrap();
        assert_eq!(table.rows[0].value(), Some(1.0));
        assert!(table.rows[0].get("surplus").is_none());
    }

    #[test]
    fn header_only_and_empty_input_yield_no_rows() {
        assert!(parse_table("data.csv", "vector,ref_date,value\n".as_bytes()).unwrap().is_empty());
        assert!(parse_table("data.csv", "vector,ref_date,value".as_bytes()).unwrap().is_empty());

        let empty = parse_table("data.csv", "".as_bytes()).unwrap();
        assert!(empty.is_empty());
        assert!(empty.headers.is_empty());
    }

    #[test]
    fn blank_lines_are_skipped() {
        let text = "vector,ref_date,value\n\ncapex_total,2020,1\n\n\n";
        assert_eq!(parse_table("data.csv", text.as_bytes()).unwrap().len(), 1);
    }

    #[test]
    fn short_rows_lack_missing_keys() {
        let text = "vector,ref_date,value\ncapex_total,2020\n";
        let table = parse_table("data.csv", text.as_bytes()).unwrap();

        assert_eq!(table.rows[0].ref_date(), Some(2020.0));
        assert!(table.rows[0].get("value").is_none());
        assert!(table.rows[0].value().is_none());
    }

    #[test]
    fn malformed_numbers_degrade_to_text() {
        let text = "vector,ref_date,value\ncapex_total,2020,n/a\n";
        let table = parse_table("data.csv", text.as_bytes()).unwrap();

        assert_eq!(table.rows[0].get("value"), Some(&Cell::Text("n/a".into())));
        assert!(table.rows[0].value().is_none());
    }

    #[test]
    fn invalid_utf8_is_a_csv_error() {
        let bytes = b"vector,ref_date,value\n\xff\xfe,2020,1\n";
        let err = parse_table("data.csv", bytes);
        assert!(matches!(err, Err(DataLoadError::Csv { .. })));
    }
}
