//! `OpenTelemetry` instruments for the reader.
//!
//! Only compiled with the `metrics` feature. Instruments come from the
//! global meter provider; the host application owns the exporter.

use opentelemetry::metrics::Counter;
use opentelemetry::{KeyValue, global};

use crate::response::ODataResponse;

/// Counters updated once per top-level response.
pub struct ReaderMetrics {
    responses: Counter<u64>,
    batch_operations: Counter<u64>,
}

impl ReaderMetrics {
    pub fn new() -> Self {
        let meter = global::meter("odata-reader");
        Self {
            responses: meter
                .u64_counter("odata.reader.responses")
                .with_description("Responses read, by envelope kind")
                .build(),
            batch_operations: meter
                .u64_counter("odata.reader.batch_operations")
                .with_description("Operations read from batch responses")
                .build(),
        }
    }

    pub fn record(&self, response: &ODataResponse) {
        self.responses
            .add(1, &[KeyValue::new("kind", response.kind().as_str())]);
        if let ODataResponse::Batch { responses } = response {
            let count = u64::try_from(responses.len()).unwrap_or(u64::MAX);
            self.batch_operations.add(count, &[]);
        }
    }
}

impl Default for ReaderMetrics {
    fn default() -> Self {
        Self::new()
    }
}
