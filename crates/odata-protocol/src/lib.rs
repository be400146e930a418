//! OData protocol read model
//!
//! Typed values and read events produced by an OData protocol tokenizer,
//! and the traits a tokenizer implements so `odata-reader` can assemble its
//! output:
//! - **Values**: primitives, complex, collection and enum values
//! - **Events**: entry/feed/navigation-link, collection and batch events
//! - **Payload kinds**: what a response body claims to contain
//! - **Quotas**: limits handed to the tokenizer and enforced by the reader

pub mod event;
pub mod kind;
pub mod quotas;
pub mod reader;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod value;

pub use event::{BatchEvent, CollectionEvent, NavigationLink, ODataEntry, ODataFeed, ReadEvent};
pub use kind::{PayloadKind, PayloadKinds};
pub use quotas::MessageQuotas;
pub use reader::{
    BatchReader, CollectionReader, ItemReader, MessageReader, ResponseMessage, Tokenizer,
};
pub use value::{
    InstanceAnnotation, ODataValue, Primitive, Property, TopLevelProperty,
};

/// HTTP status a batch operation reports when it carries no body.
pub const STATUS_NO_CONTENT: u16 = 204;
