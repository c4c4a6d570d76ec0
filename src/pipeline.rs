// Pipeline driver. A run has two phases:
//
// - `stage` opens the spreadsheet and reshapes the first few records so
//   someone can look at them. Nothing is sent anywhere.
// - `Staged::confirm` takes an explicit `Confirmation`, and only the
//   `Confirmed` run it returns can `commit`. The preview records are
//   uploaded too, at the head of the first batch, followed by the rest of
//   the same stream.

use std::path::Path;

use crate::api::PassFailDrop;
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::reshape::Reshaper;
use crate::source::RowSource;
use crate::upload::{upload_all, RecordSink, UploadSummary};

/// Answer to "is it being parsed correctly?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Approved,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(approved: bool) -> Self {
        if approved {
            Confirmation::Approved
        } else {
            Confirmation::Declined
        }
    }
}

/// Reshaped records, in file order, pulled lazily from the spreadsheet.
pub struct Records {
    rows: RowSource,
    reshaper: Reshaper,
}

impl Iterator for Records {
    type Item = Result<PassFailDrop>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        Some(self.reshaper.reshape(&row))
    }
}

/// A run that has been previewed but not uploaded.
pub struct Staged {
    preview: Vec<PassFailDrop>,
    rest: Records,
    batch_size: usize,
}

/// Open `path` with `layout` and reshape up to `layout.preview_size`
/// records. Any bad row among them fails the run here.
pub fn stage(path: &Path, layout: Layout) -> Result<Staged> {
    let batch_size = layout.batch_size;
    let preview_size = layout.preview_size;
    let reshaper = Reshaper::new(layout.sections);
    let mut rest = Records {
        rows: RowSource::open(path, layout)?,
        reshaper,
    };

    let preview = rest
        .by_ref()
        .take(preview_size)
        .collect::<Result<Vec<_>>>()?;
    log::info!("staged {} preview records", preview.len());

    Ok(Staged {
        preview,
        rest,
        batch_size,
    })
}

impl Staged {
    pub fn preview(&self) -> &[PassFailDrop] {
        &self.preview
    }

    /// Gate the upload on the operator's answer. `Declined` ends the run
    /// with `UserDeclined` before anything is sent.
    pub fn confirm(self, confirmation: Confirmation) -> Result<Confirmed> {
        match confirmation {
            Confirmation::Approved => Ok(Confirmed { staged: self }),
            Confirmation::Declined => {
                log::info!("preview declined, nothing uploaded");
                Err(Error::UserDeclined)
            }
        }
    }
}

/// A staged run the operator approved. Only this can be uploaded.
pub struct Confirmed {
    staged: Staged,
}

impl Confirmed {
    /// Upload every record, preview first, in batches.
    pub fn commit<S, F>(self, sink: &mut S, on_batch: F) -> Result<UploadSummary>
    where
        S: RecordSink,
        F: FnMut(UploadSummary),
    {
        let Staged {
            preview,
            rest,
            batch_size,
        } = self.staged;
        let records = preview.into_iter().map(Ok).chain(rest);
        let summary = upload_all(records, sink, batch_size, on_batch)?;
        log::info!(
            "uploaded {} records in {} batches",
            summary.records,
            summary.batches
        );
        Ok(summary)
    }
}
