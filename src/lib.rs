// Library root
// -----------
// Reads a spreadsheet of per-section pass/fail/drop counts, reshapes each
// row into the API's record shape, and uploads the records in batches.
// The binary (`main.rs`) wires these modules to the terminal.
//
// Module responsibilities:
// - `layout`: column schemas and batch/preview sizes per export format.
// - `source`: lazy CSV row reader with count coercion.
// - `reshape`: row -> `PassFailDrop`, including section numbering.
// - `pipeline`: stage a preview, then commit the upload once confirmed.
// - `upload`: fixed-size batching over any `RecordSink`.
// - `api`: blocking HTTP client for the bulk upsert endpoint.
// - `ui`: preview table, prompts and progress spinner.
pub mod api;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod reshape;
pub mod source;
pub mod ui;
pub mod upload;

pub use error::{ApiError, Error, Result};
