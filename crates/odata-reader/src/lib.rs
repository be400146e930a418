//! OData response reader
//!
//! Turns the typed read events of an OData protocol tokenizer into a plain
//! tree of records:
//! - Payload kind dispatch (entry, feed, collection, property, raw value,
//!   batch, error)
//! - Explicit node stack assembly of entries, feeds and expanded navigation
//! - Batch reading that re-enters dispatch per operation
//! - Value resolution of complex, collection and enum values
//! - Configuration resolution and tracing setup

mod batch;
mod collection;
pub mod config;
pub mod error;
#[cfg(feature = "metrics")]
pub mod metrics;
mod node;
pub mod reader;
pub mod resolve;
pub mod response;
pub mod tracing_init;
pub mod value;

pub use config::{Config, LogConfig, ReaderConfig, load_config};
pub use error::{Error, Result};
pub use reader::{ReadOptions, ResponseReader};
pub use resolve::{resolve, resolve_properties};
pub use response::{
    FeedAnnotations, ODataResponse, RESOURCE_TYPE_FIELD, RESULT_FIELD, ResponseKind,
};
pub use value::{Record, Value};
