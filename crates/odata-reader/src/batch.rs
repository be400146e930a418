//! Batch sub-reader.
//!
//! A batch body is one ordered stream of operations, optionally grouped in
//! changesets. Each operation's embedded message goes back through the full
//! dispatcher, so an operation can carry a feed, an entry or an error.
//! Changeset markers only delimit; they add nothing to the output.

use odata_protocol::{BatchEvent, BatchReader, ResponseMessage, STATUS_NO_CONTENT, Tokenizer};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::reader::{ReadOptions, ResponseReader};
use crate::response::ODataResponse;

/// Read every operation of a batch. The first fault aborts the whole batch:
/// skipping a broken operation would desynchronise the rest of the stream.
pub(crate) async fn read_batch<T, B>(
    reader: &ResponseReader<T>,
    mut batch: B,
    options: ReadOptions,
) -> Result<ODataResponse>
where
    T: Tokenizer,
    B: BatchReader<Message = T::Message>,
{
    let quotas = reader.quotas();
    let mut responses = Vec::new();
    let mut parts = 0_usize;
    // Operations seen in the open changeset, if any.
    let mut changeset: Option<usize> = None;

    while let Some(event) = batch.read().await? {
        match event {
            BatchEvent::ChangesetStart => {
                parts += 1;
                check_parts(parts, quotas.max_parts_per_batch)?;
                changeset = Some(0);
            }
            BatchEvent::ChangesetEnd => changeset = None,
            BatchEvent::Operation(message) => {
                if let Some(operations) = changeset.as_mut() {
                    *operations += 1;
                    if *operations > quotas.max_operations_per_changeset {
                        return Err(Error::QuotaExceeded(format!(
                            "changeset holds more than {} operations",
                            quotas.max_operations_per_changeset
                        )));
                    }
                } else {
                    parts += 1;
                    check_parts(parts, quotas.max_parts_per_batch)?;
                }

                let status = message.status_code();
                let response = if status == STATUS_NO_CONTENT {
                    ODataResponse::from_status_code(status)
                } else {
                    // Operations take the caller's options, resource type included.
                    reader.read_message(message, options).await?
                };
                trace!(
                    index = responses.len(),
                    status,
                    kind = %response.kind(),
                    "Batch operation read"
                );
                responses.push(response);
            }
        }
    }

    debug!(operations = responses.len(), parts, "Batch read");
    Ok(ODataResponse::from_batch(responses))
}

fn check_parts(parts: usize, max: usize) -> Result<()> {
    if parts > max {
        return Err(Error::QuotaExceeded(format!(
            "batch holds more than {max} parts"
        )));
    }
    Ok(())
}
