use std::io::Write;

use passfaildrop_upload::api::{PassFailDrop, Semester};
use passfaildrop_upload::layout::{Layout, Preset};
use passfaildrop_upload::pipeline::{stage, Confirmation};
use passfaildrop_upload::upload::RecordSink;
use passfaildrop_upload::{ApiError, Error};
use tempfile::NamedTempFile;

#[derive(Default)]
struct MemorySink {
    batches: Vec<Vec<PassFailDrop>>,
    fail: bool,
}

impl RecordSink for MemorySink {
    fn put_many(&mut self, records: &[PassFailDrop]) -> Result<(), ApiError> {
        if self.fail {
            return Err(ApiError::Status {
                status: 401,
                body: "unauthorized".into(),
            });
        }
        self.batches.push(records.to_vec());
        Ok(())
    }
}

fn spreadsheet(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

/// Header plus `n` termcode rows, CS100, CS101, ...
fn termcode_sheet(n: usize) -> NamedTempFile {
    let mut contents = String::from("Course,Title,Term,Section,CRN,Total,Failed,Dropped\n");
    for i in 0..n {
        contents.push_str(&format!(
            "CS{},Course {},202101,0{},{},{},{},\n",
            100 + i,
            i,
            i % 3 + 1,
            20000 + i,
            30 + i,
            i % 4
        ));
    }
    spreadsheet(&contents)
}

fn batch_size(size: usize) -> Layout {
    let mut layout = Layout::preset(Preset::Termcode);
    layout.batch_size = size;
    layout
}

#[test]
fn twelve_rows_upload_in_two_batches_in_file_order() {
    let file = termcode_sheet(12);
    let staged = stage(file.path(), batch_size(10)).unwrap();
    assert_eq!(staged.preview().len(), 5);
    assert_eq!(staged.preview()[0].course_crse, "100");

    let mut sink = MemorySink::default();
    let summary = staged
        .confirm(Confirmation::Approved)
        .unwrap()
        .commit(&mut sink, |_| {})
        .unwrap();

    assert_eq!(summary.batches, 2);
    assert_eq!(summary.records, 12);
    let sizes: Vec<usize> = sink.batches.iter().map(Vec::len).collect();
    assert_eq!(sizes, [10, 2]);

    let crses: Vec<String> = sink
        .batches
        .concat()
        .into_iter()
        .map(|r| r.course_crse)
        .collect();
    let expected: Vec<String> = (100..112).map(|n| n.to_string()).collect();
    assert_eq!(crses, expected);

    let first = &sink.batches[0][0];
    assert_eq!(first.course_subject, "CS");
    assert_eq!(first.year, 2021);
    assert_eq!(first.semester, Semester::Spring);
    assert_eq!(first.section, "01");
    assert_eq!(first.dropped, 0);
}

#[test]
fn declining_preview_uploads_nothing() {
    let file = termcode_sheet(12);
    let staged = stage(file.path(), batch_size(10)).unwrap();
    match staged.confirm(Confirmation::Declined) {
        Err(Error::UserDeclined) => {}
        Err(other) => panic!("expected UserDeclined, got {:?}", other),
        Ok(_) => panic!("declined preview must not be uploadable"),
    }
}

#[test]
fn fewer_rows_than_preview_still_upload() {
    let file = termcode_sheet(3);
    let staged = stage(file.path(), batch_size(10)).unwrap();
    assert_eq!(staged.preview().len(), 3);
    let mut sink = MemorySink::default();
    staged
        .confirm(Confirmation::Approved)
        .unwrap()
        .commit(&mut sink, |_| {})
        .unwrap();
    assert_eq!(sink.batches.len(), 1);
    assert_eq!(sink.batches[0].len(), 3);
}

#[test]
fn missing_spreadsheet_fails_before_parsing() {
    let err = stage(
        std::path::Path::new("/definitely/not/here.csv"),
        Layout::preset(Preset::Termcode),
    )
    .err()
    .unwrap();
    assert!(matches!(err, Error::InvalidPath(_)));
}

#[test]
fn malformed_row_in_preview_fails_staging() {
    let file = spreadsheet(
        "Course,Title,Term,Section,CRN,Total,Failed,Dropped\n\
         CS101,Intro,202101,01,1,10,1,1\n\
         Seminar,Topics,202101,01,2,10,1,1\n",
    );
    match stage(file.path(), Layout::preset(Preset::Termcode)) {
        Err(Error::MalformedRecord { record, .. }) => assert!(record.contains("Seminar")),
        Err(other) => panic!("expected MalformedRecord, got {:?}", other),
        Ok(_) => panic!("expected MalformedRecord"),
    }
}

#[test]
fn failed_upload_surfaces_batch_and_stops() {
    let file = termcode_sheet(12);
    let staged = stage(file.path(), batch_size(10)).unwrap();
    let mut sink = MemorySink {
        fail: true,
        ..Default::default()
    };
    let confirmed = staged.confirm(Confirmation::Approved).unwrap();
    match confirmed.commit(&mut sink, |_| {}) {
        Err(Error::Upload { batch, records, .. }) => {
            assert_eq!(batch, 1);
            assert_eq!(records.len(), 10);
        }
        Err(other) => panic!("expected upload error, got {:?}", other),
        Ok(summary) => panic!("expected upload error, got {:?}", summary),
    }
}

#[test]
fn counted_layout_numbers_sections_across_preview_and_upload() {
    let mut contents = String::from(
        "Pass/Fail/Drop report\n\
         Course,Title,Year,Semester,Total,Failed,Dropped\n",
    );
    for _ in 0..12 {
        contents.push_str("PHYS2210,Physics,2020,Fall,40,2,1\n");
    }
    contents.push_str("PHYS2210,Physics,2020,Fall,N/A,2,1\n");
    contents.push_str("CHEM1210,Chemistry,2021,Winter,35,,3\n");
    let file = spreadsheet(&contents);

    let staged = stage(file.path(), Layout::preset(Preset::Counted)).unwrap();
    assert_eq!(staged.preview().len(), 10);
    let mut sink = MemorySink::default();
    staged
        .confirm(Confirmation::Approved)
        .unwrap()
        .commit(&mut sink, |_| {})
        .unwrap();

    let records = sink.batches.concat();
    assert_eq!(records.len(), 13);
    let sections: Vec<String> = records.iter().map(|r| r.section.clone()).collect();
    let expected: Vec<String> = (1..=12).map(|n| format!("{:02}", n)).collect();
    assert_eq!(sections[..12], expected[..]);

    let chem = &records[12];
    assert_eq!(chem.course_subject, "CHEM");
    assert_eq!(chem.semester, Semester::Spring);
    assert_eq!(chem.section, "01");
    assert_eq!(chem.failed, 0);
}
