// Spreadsheet layouts: which column is which, how many leading rows to
// skip, and the batch/preview sizes used for each export format we get.

use std::fmt;

use clap::ValueEnum;

use crate::error::{Error, Result};

/// Meaning of one spreadsheet column, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Column {
    Course,
    Title,
    Termcode,
    Year,
    Semester,
    Section,
    Crn,
    Total,
    Failed,
    Dropped,
    /// Present in the file but not used.
    Ignore,
}

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::Course => "course",
            Column::Title => "title",
            Column::Termcode => "termcode",
            Column::Year => "year",
            Column::Semester => "semester",
            Column::Section => "section",
            Column::Crn => "crn",
            Column::Total => "total",
            Column::Failed => "failed",
            Column::Dropped => "dropped",
            Column::Ignore => "ignore",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Known export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Preset {
    /// `course,title,termcode,section,crn,total,failed,dropped`, one header row.
    #[default]
    Termcode,
    /// `year,semester,course,title,section,total,failed,dropped`, one header row.
    Semester,
    /// `course,title,year,semester,total,failed,dropped`, two header rows,
    /// sections numbered per course in file order.
    Counted,
}

/// Where a record's section label comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionSource {
    /// The `section` column.
    Column,
    /// Numbered `01`, `02`, ... per course in the order rows are read.
    Counter,
}

/// What to do with a row whose count cell is not a non-negative integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidCounts {
    Fail,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub columns: Vec<Column>,
    pub skip_rows: usize,
    pub batch_size: usize,
    pub preview_size: usize,
    pub sections: SectionSource,
    pub invalid_counts: InvalidCounts,
}

/// Per-field overrides applied on top of a preset. `None` keeps the preset.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub columns: Option<Vec<Column>>,
    pub skip_rows: Option<usize>,
    pub batch_size: Option<usize>,
    pub preview_size: Option<usize>,
    pub section_counter: bool,
}

impl Layout {
    pub fn preset(preset: Preset) -> Self {
        use Column::*;
        match preset {
            Preset::Termcode => Layout {
                columns: vec![Course, Title, Termcode, Section, Crn, Total, Failed, Dropped],
                skip_rows: 1,
                batch_size: 100,
                preview_size: 5,
                sections: SectionSource::Column,
                invalid_counts: InvalidCounts::Fail,
            },
            Preset::Semester => Layout {
                columns: vec![Year, Semester, Course, Title, Section, Total, Failed, Dropped],
                skip_rows: 1,
                batch_size: 10,
                preview_size: 10,
                sections: SectionSource::Column,
                invalid_counts: InvalidCounts::Fail,
            },
            Preset::Counted => Layout {
                columns: vec![Course, Title, Year, Semester, Total, Failed, Dropped],
                skip_rows: 2,
                batch_size: 10,
                preview_size: 10,
                sections: SectionSource::Counter,
                invalid_counts: InvalidCounts::Skip,
            },
        }
    }

    /// Start from `preset`, apply `overrides`, and validate the result.
    pub fn resolve(preset: Preset, overrides: Overrides) -> Result<Self> {
        let mut layout = Layout::preset(preset);
        if let Some(columns) = overrides.columns {
            layout.columns = columns;
        }
        if let Some(skip) = overrides.skip_rows {
            layout.skip_rows = skip;
        }
        if let Some(size) = overrides.batch_size {
            layout.batch_size = size;
        }
        if let Some(size) = overrides.preview_size {
            layout.preview_size = size;
        }
        if overrides.section_counter {
            layout.sections = SectionSource::Counter;
        }
        layout.validate()?;
        Ok(layout)
    }

    /// Position of `column` in the file, if the layout has it.
    pub fn index_of(&self, column: Column) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    fn has(&self, column: Column) -> bool {
        self.index_of(column).is_some()
    }

    pub fn validate(&self) -> Result<()> {
        for required in [Column::Course, Column::Total, Column::Failed, Column::Dropped] {
            if !self.has(required) {
                return Err(Error::Layout(format!("missing '{}' column", required)));
            }
        }
        let split_term = self.has(Column::Year) && self.has(Column::Semester);
        if !self.has(Column::Termcode) && !split_term {
            return Err(Error::Layout(
                "need a 'termcode' column or both 'year' and 'semester'".into(),
            ));
        }
        if self.sections == SectionSource::Column && !self.has(Column::Section) {
            return Err(Error::Layout(
                "missing 'section' column (use the section counter instead?)".into(),
            ));
        }
        for (i, column) in self.columns.iter().enumerate() {
            if *column != Column::Ignore && self.columns[..i].contains(column) {
                return Err(Error::Layout(format!("'{}' column listed twice", column)));
            }
        }
        if self.batch_size == 0 {
            return Err(Error::Layout("batch size must be at least 1".into()));
        }
        if self.preview_size == 0 {
            return Err(Error::Layout("preview size must be at least 1".into()));
        }
        Ok(())
    }
}
