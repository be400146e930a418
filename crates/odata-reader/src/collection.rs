//! Top-level collection payloads.

use odata_protocol::{CollectionEvent, CollectionReader};

use crate::error::Result;
use crate::resolve::resolve;
use crate::response::ODataResponse;

/// Resolve every item of a collection body, in order.
pub(crate) async fn read_collection<R: CollectionReader>(mut reader: R) -> Result<ODataResponse> {
    let mut values = Vec::new();
    while let Some(event) = reader.read().await? {
        match event {
            CollectionEvent::Start | CollectionEvent::End => {}
            CollectionEvent::Value(value) => values.push(resolve(value)),
            CollectionEvent::Completed => break,
        }
    }
    Ok(ODataResponse::from_collection(values))
}
