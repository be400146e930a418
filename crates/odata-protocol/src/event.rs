//! Read events emitted while a tokenizer walks a response body.

use crate::value::{InstanceAnnotation, Property};

/// One decoded entity instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ODataEntry {
    /// Fully qualified type name, e.g. `ODataDemo.Product`.
    pub type_name: Option<String>,
    pub id: Option<String>,
    pub properties: Vec<Property>,
}

impl ODataEntry {
    pub fn new(properties: impl IntoIterator<Item = Property>) -> Self {
        Self {
            properties: properties.into_iter().collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }
}

/// Feed-level metadata. Some of it (next link, delta link) is only known
/// once the feed has been read, so it is reported on both start and end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ODataFeed {
    /// Absolute feed id.
    pub id: Option<String>,
    /// `$count` / `@odata.count`.
    pub count: Option<i64>,
    pub delta_link: Option<String>,
    pub next_page_link: Option<String>,
    pub instance_annotations: Vec<InstanceAnnotation>,
}

/// A named relationship from the current entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationLink {
    pub name: String,
    /// Cardinality as declared by metadata, when the tokenizer knows it.
    /// `odata-reader` ignores it and goes by whether a feed opens inside the
    /// link.
    pub is_collection: Option<bool>,
}

impl NavigationLink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_collection: None,
        }
    }
}

/// Entry/feed reader state transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadEvent {
    FeedStart(ODataFeed),
    FeedEnd(ODataFeed),
    EntryStart,
    /// `None` for a null expanded single-valued navigation.
    EntryEnd(Option<ODataEntry>),
    NavigationLinkStart(NavigationLink),
    NavigationLinkEnd(NavigationLink),
    Completed,
}

/// Collection reader state transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionEvent {
    Start,
    Value(crate::value::ODataValue),
    End,
    Completed,
}

/// Batch reader state transitions. `M` is the embedded operation message.
#[derive(Debug)]
pub enum BatchEvent<M> {
    ChangesetStart,
    Operation(M),
    ChangesetEnd,
}
