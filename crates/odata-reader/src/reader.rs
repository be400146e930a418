//! Payload kind dispatcher.
//!
//! Data flow:
//! ```text
//! message → Tokenizer::open → detect_payload_kind
//!   error       → StatusCode envelope
//!   value       → raw body text, single "result" row
//!   batch       → batch sub-reader → (per operation) back to the top
//!   feed/entry  → node stack builder
//!   collection  → collection reader
//!   property    → value resolver, single row
//! ```

use std::future::Future;
use std::pin::Pin;

use odata_protocol::{
    MessageQuotas, MessageReader, PayloadKind, ResponseMessage, Tokenizer,
};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::batch::read_batch;
use crate::collection::read_collection;
use crate::config::Config;
use crate::error::{Error, Result};
#[cfg(feature = "metrics")]
use crate::metrics::ReaderMetrics;
use crate::node::read_items;
use crate::resolve::resolve;
use crate::response::{ODataResponse, RESULT_FIELD};
use crate::value::Value;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Per-call read options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Add a `resourceType` field holding each entry's unqualified type name.
    pub include_resource_type: bool,
}

/// Reads OData response messages into [`ODataResponse`]s.
///
/// Holds no per-message state: every call owns its own node stack, so one
/// reader can serve independent messages concurrently.
pub struct ResponseReader<T> {
    tokenizer: T,
    options: ReadOptions,
    quotas: MessageQuotas,
    #[cfg(feature = "metrics")]
    metrics: ReaderMetrics,
}

impl<T: Tokenizer> ResponseReader<T> {
    /// Create a reader with default configuration.
    pub fn new(tokenizer: T) -> Self {
        Self::with_config(tokenizer, &Config::default())
    }

    /// Create a reader with options and quotas taken from `config`.
    pub fn with_config(tokenizer: T, config: &Config) -> Self {
        Self {
            tokenizer,
            options: ReadOptions {
                include_resource_type: config.reader.include_resource_type,
            },
            quotas: config.quotas.clone(),
            #[cfg(feature = "metrics")]
            metrics: ReaderMetrics::new(),
        }
    }

    /// The tokenizer messages are opened with.
    pub const fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// Quotas passed to the tokenizer and enforced while reading.
    pub const fn quotas(&self) -> &MessageQuotas {
        &self.quotas
    }

    /// Options used by [`Self::read_response`].
    pub const fn options(&self) -> ReadOptions {
        self.options
    }

    /// Read one message with the configured options.
    pub async fn read_response(&self, message: T::Message) -> Result<ODataResponse> {
        self.read_response_with(message, self.options).await
    }

    /// Read one message with explicit options. Batch operations inherit them.
    pub async fn read_response_with(
        &self,
        message: T::Message,
        options: ReadOptions,
    ) -> Result<ODataResponse> {
        let response = self.read_message(message, options).await?;
        #[cfg(feature = "metrics")]
        self.metrics.record(&response);
        Ok(response)
    }

    /// Dispatch on the detected payload kinds. Boxed because batch
    /// operations re-enter it.
    pub(crate) fn read_message(
        &self,
        message: T::Message,
        options: ReadOptions,
    ) -> BoxFuture<'_, Result<ODataResponse>> {
        Box::pin(async move {
            let status = message.status_code();
            let mut reader = self.tokenizer.open(message, &self.quotas)?;
            let kinds = reader.detect_payload_kind().await?;
            debug!(status, kinds = %kinds, "Detected payload kinds");

            let response = if kinds.contains(PayloadKind::Error) {
                ODataResponse::from_status_code(status)
            } else if kinds.contains(PayloadKind::Value) {
                if kinds.contains(PayloadKind::Collection) {
                    return Err(Error::UnsupportedPayload(format!(
                        "raw value collection ({kinds})"
                    )));
                }
                let text = read_body_text(reader.into_body(), &self.quotas).await?;
                ODataResponse::single_row(RESULT_FIELD, Value::from(text))
            } else if kinds.contains(PayloadKind::Batch) {
                read_batch(self, reader.batch_reader()?, options).await?
            } else if kinds.contains(PayloadKind::Feed) {
                read_items(
                    reader.feed_reader()?,
                    options.include_resource_type,
                    self.quotas.max_nesting_depth,
                )
                .await?
            } else if kinds.contains(PayloadKind::Collection) {
                read_collection(reader.collection_reader()?).await?
            } else if kinds.contains(PayloadKind::Property) {
                let property = reader.read_property().await?;
                let name = property.name.unwrap_or_else(|| RESULT_FIELD.to_string());
                ODataResponse::single_row(name, resolve(property.value))
            } else {
                read_items(
                    reader.entry_reader()?,
                    options.include_resource_type,
                    self.quotas.max_nesting_depth,
                )
                .await?
            };

            debug!(status, kind = %response.kind(), "Response read");
            Ok(response)
        })
    }
}

/// Read a raw body as text, bounded by the message size quota. Invalid
/// UTF-8 is replaced rather than rejected.
async fn read_body_text<B>(body: B, quotas: &MessageQuotas) -> Result<String>
where
    B: AsyncRead + Unpin + Send,
{
    let limit = quotas.max_received_message_size;
    let mut bytes = Vec::new();
    body.take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .await?;
    if u64::try_from(bytes.len()).unwrap_or(u64::MAX) > limit {
        return Err(Error::QuotaExceeded(format!(
            "message body exceeds {limit} bytes"
        )));
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
