// Record reshaping: turns a parsed spreadsheet row into the record shape
// the API accepts. Section numbering state is owned by the `Reshaper`, so
// each run starts from an empty counter.

use std::collections::HashMap;

use regex::Regex;

use crate::api::{PassFailDrop, Semester};
use crate::error::{Error, Result};
use crate::layout::SectionSource;
use crate::source::{ParsedRow, Term};

/// Semester names as they appear in split year/semester exports.
pub fn semester_from_name(name: &str) -> Option<Semester> {
    match name.trim() {
        "Fall" => Some(Semester::Fall),
        "Winter" | "Spring" => Some(Semester::Spring),
        "Summer" => Some(Semester::Summer),
        _ => None,
    }
}

/// Month suffixes of `YYYYMM` term codes.
pub fn semester_from_month(code: &str) -> Option<Semester> {
    match code.trim() {
        "01" => Some(Semester::Spring),
        _ => None,
    }
}

/// Running section count per course, e.g. `CS101` -> 2 after two rows.
#[derive(Debug, Default)]
pub struct SectionCounter {
    seen: HashMap<String, u32>,
}

impl SectionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more section of `subject`+`crse` and return its label.
    pub fn next_label(&mut self, subject: &str, crse: &str) -> String {
        let count = self.seen.entry(format!("{}{}", subject, crse)).or_insert(0);
        *count += 1;
        format!("{:02}", count)
    }
}

pub struct Reshaper {
    subject_re: Regex,
    crse_re: Regex,
    sections: SectionSource,
    counter: SectionCounter,
}

impl Reshaper {
    pub fn new(sections: SectionSource) -> Self {
        Reshaper {
            subject_re: Regex::new(r"[A-Z]+").expect("static regex"),
            crse_re: Regex::new(r"\d+").expect("static regex"),
            sections,
            counter: SectionCounter::new(),
        }
    }

    pub fn reshape(&mut self, row: &ParsedRow) -> Result<PassFailDrop> {
        let (subject, crse) = match (
            self.subject_re.find(&row.course),
            self.crse_re.find(&row.course),
        ) {
            (Some(subject), Some(crse)) => (subject.as_str(), crse.as_str()),
            _ => return Err(malformed(row, "course has no subject and number")),
        };

        let (year, semester) = match &row.term {
            Term::Code(code) => {
                let (year, month) = split_termcode(code)
                    .ok_or_else(|| malformed(row, format!("bad term code '{}'", code)))?;
                let semester = semester_from_month(month)
                    .ok_or_else(|| malformed(row, format!("unrecognized term month '{}'", month)))?;
                (year, semester)
            }
            Term::Split { year, semester } => {
                let year = parse_year(year)
                    .ok_or_else(|| malformed(row, format!("bad year '{}'", year)))?;
                let semester = semester_from_name(semester).ok_or_else(|| {
                    malformed(row, format!("unrecognized semester '{}'", semester))
                })?;
                (year, semester)
            }
        };

        let section = match self.sections {
            SectionSource::Column => row.section.clone().unwrap_or_default(),
            SectionSource::Counter => self.counter.next_label(subject, crse),
        };

        Ok(PassFailDrop {
            course_subject: subject.to_string(),
            course_crse: crse.to_string(),
            year,
            semester,
            section,
            failed: row.failed,
            dropped: row.dropped,
            total: row.total,
        })
    }
}

fn split_termcode(code: &str) -> Option<(i32, &str)> {
    let code = code.trim();
    let year = parse_year(code.get(..4)?)?;
    Some((year, &code[4..]))
}

fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.len() != 4 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn malformed(row: &ParsedRow, reason: impl Into<String>) -> Error {
    Error::MalformedRecord {
        reason: reason.into(),
        record: serde_json::to_string(row).unwrap_or_else(|_| format!("{:?}", row)),
    }
}
