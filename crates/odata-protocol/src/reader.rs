//! Traits implemented by the protocol tokenizer.
//!
//! The tokenizer owns the wire format and the entity model. The reader
//! only drives these traits: it opens a message, asks which kinds the body
//! signals, then pulls events from exactly one specialised reader.
//!
//! Every read is `io::Result`; stream faults and token-level parse faults
//! both surface as `std::io::Error`.

use std::future::Future;
use std::io;

use tokio::io::AsyncRead;

use crate::event::{BatchEvent, CollectionEvent, ReadEvent};
use crate::kind::PayloadKinds;
use crate::quotas::MessageQuotas;
use crate::value::TopLevelProperty;

/// A response as handed over by the transport: status, headers and a body
/// the tokenizer knows how to reach.
pub trait ResponseMessage: Send + 'static {
    fn status_code(&self) -> u16;

    /// Case-insensitive header lookup.
    fn header(&self, name: &str) -> Option<&str>;
}

/// Builds message readers. Implementations hold the entity model.
pub trait Tokenizer: Send + Sync {
    type Message: ResponseMessage;
    type Reader: MessageReader<Message = Self::Message>;

    fn open(&self, message: Self::Message, quotas: &MessageQuotas) -> io::Result<Self::Reader>;
}

/// An opened message. Each `*_reader` call consumes it, so a body is read at
/// most once.
pub trait MessageReader: Send {
    type Message: ResponseMessage;
    type Items: ItemReader;
    type Collection: CollectionReader;
    type Batch: BatchReader<Message = Self::Message>;
    type Body: AsyncRead + Unpin + Send;

    fn detect_payload_kind(&mut self) -> impl Future<Output = io::Result<PayloadKinds>> + Send;

    /// Reader positioned on a single top-level entry.
    fn entry_reader(self) -> io::Result<Self::Items>;

    /// Reader positioned on a top-level feed.
    fn feed_reader(self) -> io::Result<Self::Items>;

    fn collection_reader(self) -> io::Result<Self::Collection>;

    fn batch_reader(self) -> io::Result<Self::Batch>;

    fn read_property(self) -> impl Future<Output = io::Result<TopLevelProperty>> + Send;

    /// The undecoded body, for raw `$value` payloads.
    fn into_body(self) -> Self::Body;
}

/// Linear entry/feed events. `Ok(None)` means the body is exhausted.
pub trait ItemReader: Send {
    fn read(&mut self) -> impl Future<Output = io::Result<Option<ReadEvent>>> + Send;
}

/// Linear collection events. `Ok(None)` means the body is exhausted.
pub trait CollectionReader: Send {
    fn read(&mut self) -> impl Future<Output = io::Result<Option<CollectionEvent>>> + Send;
}

/// Batch part iteration. `Ok(None)` means the batch is complete.
pub trait BatchReader: Send {
    type Message: ResponseMessage;

    fn read(
        &mut self,
    ) -> impl Future<Output = io::Result<Option<BatchEvent<Self::Message>>>> + Send;
}
