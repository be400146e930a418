//! The response envelope handed back to callers.

use std::fmt;

use odata_protocol::ODataFeed;
use serde::Serialize;

use crate::error::Result;
use crate::resolve::resolve;
use crate::value::{Record, Value};

/// Field name used when a payload yields a single unnamed value.
pub const RESULT_FIELD: &str = "result";

/// Field injected into entries when resource types are requested.
pub const RESOURCE_TYPE_FIELD: &str = "resourceType";

/// Feed-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedAnnotations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_link: Option<String>,
    #[serde(skip_serializing_if = "Record::is_empty")]
    pub instance_annotations: Record,
}

impl FeedAnnotations {
    /// Fold in metadata reported later in the stream. Values present in
    /// `later` win; instance annotations are unioned.
    pub fn merge(&mut self, later: Self) {
        if later.id.is_some() {
            self.id = later.id;
        }
        if later.count.is_some() {
            self.count = later.count;
        }
        if later.delta_link.is_some() {
            self.delta_link = later.delta_link;
        }
        if later.next_page_link.is_some() {
            self.next_page_link = later.next_page_link;
        }
        self.instance_annotations.extend(later.instance_annotations);
    }
}

impl From<ODataFeed> for FeedAnnotations {
    fn from(feed: ODataFeed) -> Self {
        Self {
            id: feed.id,
            count: feed.count,
            delta_link: feed.delta_link,
            next_page_link: feed.next_page_link,
            instance_annotations: feed
                .instance_annotations
                .into_iter()
                .map(|a| (a.name, resolve(a.value)))
                .collect(),
        }
    }
}

/// Tag of an [`ODataResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    StatusCode,
    Entry,
    Feed,
    Collection,
    Batch,
}

impl ResponseKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StatusCode => "status_code",
            Self::Entry => "entry",
            Self::Feed => "feed",
            Self::Collection => "collection",
            Self::Batch => "batch",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully read response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ODataResponse {
    /// Only a status is known: error payloads and bodiless batch operations.
    StatusCode { status: u16 },
    Entry { entry: Record },
    Feed {
        entries: Vec<Record>,
        annotations: FeedAnnotations,
    },
    Collection { values: Vec<Value> },
    /// One response per batch operation, in encounter order.
    Batch { responses: Vec<ODataResponse> },
}

impl ODataResponse {
    pub const fn from_status_code(status: u16) -> Self {
        Self::StatusCode { status }
    }

    pub const fn from_entry(entry: Record) -> Self {
        Self::Entry { entry }
    }

    pub const fn from_feed(entries: Vec<Record>, annotations: FeedAnnotations) -> Self {
        Self::Feed {
            entries,
            annotations,
        }
    }

    pub const fn from_collection(values: Vec<Value>) -> Self {
        Self::Collection { values }
    }

    pub const fn from_batch(responses: Vec<Self>) -> Self {
        Self::Batch { responses }
    }

    /// A feed holding exactly one row with one field.
    pub fn single_row(name: impl Into<String>, value: Value) -> Self {
        let mut row = Record::new();
        row.insert(name.into(), value);
        Self::from_feed(vec![row], FeedAnnotations::default())
    }

    pub const fn kind(&self) -> ResponseKind {
        match self {
            Self::StatusCode { .. } => ResponseKind::StatusCode,
            Self::Entry { .. } => ResponseKind::Entry,
            Self::Feed { .. } => ResponseKind::Feed,
            Self::Collection { .. } => ResponseKind::Collection,
            Self::Batch { .. } => ResponseKind::Batch,
        }
    }

    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::StatusCode { status } => Some(*status),
            _ => None,
        }
    }

    /// Rows carried by an entry or feed response; empty for other kinds.
    pub fn entries(&self) -> &[Record] {
        match self {
            Self::Entry { entry } => std::slice::from_ref(entry),
            Self::Feed { entries, .. } => entries,
            _ => &[],
        }
    }

    pub const fn annotations(&self) -> Option<&FeedAnnotations> {
        match self {
            Self::Feed { annotations, .. } => Some(annotations),
            _ => None,
        }
    }

    /// The first field of the first row, e.g. a `$count` or `$value` result.
    pub fn scalar(&self) -> Option<&Value> {
        self.entries().first().and_then(|row| row.values().next())
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
