// Batch uploader: collects records into fixed-size batches and sends each
// batch with one call. Batches go out strictly one after another; the
// first failure stops the run.

use crate::api::PassFailDrop;
use crate::error::{ApiError, Error, Result};

/// Anything that can accept a batch of records in one call.
pub trait RecordSink {
    fn put_many(&mut self, records: &[PassFailDrop]) -> std::result::Result<(), ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Accumulating,
    Uploading,
    Done,
    Failed,
}

/// Running totals, handed to the progress callback after each batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub batches: usize,
    pub records: usize,
}

pub struct BatchUploader<'s, S: RecordSink> {
    sink: &'s mut S,
    batch_size: usize,
    buffer: Vec<PassFailDrop>,
    state: UploadState,
    summary: UploadSummary,
}

impl<'s, S: RecordSink> BatchUploader<'s, S> {
    pub fn new(sink: &'s mut S, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        BatchUploader {
            sink,
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            state: UploadState::Accumulating,
            summary: UploadSummary::default(),
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn summary(&self) -> UploadSummary {
        self.summary
    }

    /// Add a record. A full buffer is sent first, so the last batch of a
    /// stream is never empty unless the stream was.
    pub fn push(&mut self, record: PassFailDrop) -> Result<()> {
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
            self.state = UploadState::Accumulating;
        }
        self.buffer.push(record);
        Ok(())
    }

    /// Send whatever is buffered, even nothing, and finish.
    pub fn finish(mut self) -> Result<UploadSummary> {
        self.flush()?;
        self.state = UploadState::Done;
        Ok(self.summary)
    }

    fn flush(&mut self) -> Result<()> {
        self.state = UploadState::Uploading;
        let batch = self.summary.batches + 1;
        log::debug!("uploading batch {} ({} records)", batch, self.buffer.len());
        if let Err(source) = self.sink.put_many(&self.buffer) {
            self.state = UploadState::Failed;
            log::error!("batch {} failed: {}", batch, source);
            return Err(Error::Upload {
                batch,
                records: std::mem::take(&mut self.buffer),
                source,
            });
        }
        self.summary.batches = batch;
        self.summary.records += self.buffer.len();
        self.buffer.clear();
        Ok(())
    }
}

/// Drain `records` into batches of `batch_size`, calling `on_batch` after
/// every successful call. Stops at the first bad record or failed batch.
pub fn upload_all<S, I, F>(
    records: I,
    sink: &mut S,
    batch_size: usize,
    mut on_batch: F,
) -> Result<UploadSummary>
where
    S: RecordSink,
    I: IntoIterator<Item = Result<PassFailDrop>>,
    F: FnMut(UploadSummary),
{
    let mut uploader = BatchUploader::new(sink, batch_size);
    let mut reported = 0;
    for record in records {
        uploader.push(record?)?;
        if uploader.summary().batches != reported {
            reported = uploader.summary().batches;
            on_batch(uploader.summary());
        }
    }
    let summary = uploader.finish()?;
    on_batch(summary);
    Ok(summary)
}
