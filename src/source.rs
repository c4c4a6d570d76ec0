// Row source: reads the spreadsheet lazily, one CSV record at a time,
// and turns each record into a `ParsedRow` using the layout's columns.

use std::fs::File;
use std::path::Path;

use csv::{ByteRecordsIntoIter, ReaderBuilder, StringRecord, Trim};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::layout::{Column, InvalidCounts, Layout};

/// How the term is written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Term {
    /// `YYYYMM`, e.g. `202101`.
    Code(String),
    /// Separate year and semester-name columns.
    Split { year: String, semester: String },
}

/// One input row after count coercion. Counts are never missing: blank
/// cells read as 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedRow {
    pub line: u64,
    pub course: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub term: Term,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crn: Option<String>,
    pub failed: u32,
    pub dropped: u32,
    pub total: u32,
}

/// Forward-only stream of parsed rows. Cannot be rewound.
pub struct RowSource {
    records: ByteRecordsIntoIter<File>,
    layout: Layout,
    to_skip: usize,
}

impl RowSource {
    /// Open `path` for reading. Fails with `InvalidPath` before touching
    /// the file contents if the path does not name a file.
    pub fn open(path: &Path, layout: Layout) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::InvalidPath(path.to_path_buf()));
        }
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_path(path)?;
        log::info!("reading {}", path.display());
        Ok(RowSource {
            records: reader.into_byte_records(),
            to_skip: layout.skip_rows,
            layout,
        })
    }

    fn cell<'r>(&self, record: &'r StringRecord, column: Column) -> Option<&'r str> {
        self.layout
            .index_of(column)
            .map(|i| record.get(i).unwrap_or(""))
    }

    fn text(&self, record: &StringRecord, column: Column) -> String {
        self.cell(record, column).unwrap_or("").to_string()
    }

    /// Coerce one record. `Ok(None)` means the row is dropped.
    fn parse(&self, line: u64, record: &StringRecord) -> Result<Option<ParsedRow>> {
        let course = self.text(record, Column::Course);
        if course.is_empty() {
            log::debug!("line {}: skipping row with blank course", line);
            return Ok(None);
        }

        let mut counts = [0u32; 3];
        for (slot, column) in [Column::Failed, Column::Dropped, Column::Total]
            .into_iter()
            .enumerate()
        {
            let raw = self.cell(record, column).unwrap_or("");
            match parse_count(raw) {
                Some(n) => counts[slot] = n,
                None if self.layout.invalid_counts == InvalidCounts::Skip => {
                    log::warn!(
                        "line {}: dropping row, '{}' is not a count ({})",
                        line,
                        raw,
                        column
                    );
                    return Ok(None);
                }
                None => {
                    return Err(Error::InvalidCount {
                        line,
                        column: column.name(),
                        value: raw.to_string(),
                    })
                }
            }
        }
        let [failed, dropped, total] = counts;

        let term = match self.cell(record, Column::Termcode) {
            Some(code) => Term::Code(code.to_string()),
            None => Term::Split {
                year: self.text(record, Column::Year),
                semester: self.text(record, Column::Semester),
            },
        };

        Ok(Some(ParsedRow {
            line,
            course,
            title: self.cell(record, Column::Title).map(str::to_string),
            term,
            section: self.cell(record, Column::Section).map(str::to_string),
            crn: self.cell(record, Column::Crn).map(str::to_string),
            failed,
            dropped,
            total,
        }))
    }
}

impl Iterator for RowSource {
    type Item = Result<ParsedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e.into())),
            };
            // Skipped rows are never decoded, so a header in another
            // encoding is fine.
            if self.to_skip > 0 {
                self.to_skip -= 1;
                continue;
            }
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let record = match StringRecord::from_byte_record(record) {
                Ok(record) => record,
                Err(e) => {
                    return Some(Err(Error::Encoding {
                        line,
                        field: e.utf8_error().field(),
                    }))
                }
            };
            match self.parse(line, &record) {
                Ok(Some(row)) => return Some(Ok(row)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Blank cells are 0; anything else must be a non-negative integer.
pub fn parse_count(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(0);
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::layout::Preset;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn read_all(contents: &str, layout: Layout) -> Result<Vec<ParsedRow>> {
        let file = csv_file(contents);
        RowSource::open(file.path(), layout)?.collect()
    }

    #[test]
    fn missing_file_is_invalid_path() {
        let layout = Layout::preset(Preset::Termcode);
        let err = RowSource::open(Path::new("/no/such/sheet.csv"), layout)
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidPath(_)));
    }

    #[test]
    fn reads_termcode_rows_after_header() {
        let rows = read_all(
            "Course,Title,Term,Sec,CRN,Total,Failed,Dropped\n\
             CS101,Intro,202101,01,12345,40,3,2\n",
            Layout::preset(Preset::Termcode),
        )
        .unwrap();
        assert_eq!(
            rows,
            vec![ParsedRow {
                line: 2,
                course: "CS101".into(),
                title: Some("Intro".into()),
                term: Term::Code("202101".into()),
                section: Some("01".into()),
                crn: Some("12345".into()),
                failed: 3,
                dropped: 2,
                total: 40,
            }]
        );
    }

    #[test]
    fn blank_counts_coerce_to_zero() {
        let rows = read_all(
            "header\nCS101,Intro,202101,01,12345,,, \n",
            Layout::preset(Preset::Termcode),
        )
        .unwrap();
        assert_eq!((rows[0].failed, rows[0].dropped, rows[0].total), (0, 0, 0));
    }

    #[test]
    fn short_rows_read_missing_cells_as_blank() {
        let rows = read_all(
            "header\nCS101,Intro,202101,01,12345,40\n",
            Layout::preset(Preset::Termcode),
        )
        .unwrap();
        assert_eq!(rows[0].total, 40);
        assert_eq!(rows[0].failed, 0);
    }

    #[test]
    fn skips_configured_header_rows_and_blank_courses() {
        let rows = read_all(
            "Report\nCourse,Title,Year,Semester,Total,Failed,Dropped\n\
             MA200,Calc,2020,Fall,30,1,1\n\
             ,,,,,,\n\
             MA200,Calc,2020,Fall,25,0,2\n",
            Layout::preset(Preset::Counted),
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].term,
            Term::Split {
                year: "2020".into(),
                semester: "Fall".into()
            }
        );
        assert_eq!(rows[0].section, None);
    }

    #[test]
    fn invalid_count_is_fatal_unless_layout_skips() {
        let contents = "header\nCS101,Intro,202101,01,12345,forty,3,2\n";
        let err = read_all(contents, Layout::preset(Preset::Termcode)).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidCount { line: 2, column: "total", .. }
        ));

        let contents = "a\nb\nCS101,Intro,2021,Fall,n/a,3,2\nCS102,Intro,2021,Fall,10,1,0\n";
        let rows = read_all(contents, Layout::preset(Preset::Counted)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].course, "CS102");
    }

    #[test]
    fn skipped_header_rows_may_be_latin1() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"Course,Title,Term,Section,CRN,Total,Failed,Dropped,Ann\xe9e\n")
            .unwrap();
        file.write_all(b"CS101,Intro,202101,01,1,10,1,1\n").unwrap();
        let rows: Vec<ParsedRow> = RowSource::open(file.path(), Layout::preset(Preset::Termcode))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].course, "CS101");
        assert_eq!(rows[0].line, 2);
    }

    #[test]
    fn invalid_utf8_in_data_row_names_line_and_field() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"header\nCS101,Caf\xe9,202101,01,1,10,1,1\n").unwrap();
        let err = RowSource::open(file.path(), Layout::preset(Preset::Termcode))
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap_err();
        assert!(matches!(err, Error::Encoding { line: 2, field: 1 }));
    }

    #[test]
    fn negative_counts_are_not_counts() {
        assert_eq!(parse_count("-1"), None);
        assert_eq!(parse_count(" 7 "), Some(7));
        assert_eq!(parse_count(""), Some(0));
    }
}
