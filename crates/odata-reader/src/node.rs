//! Node stack builder: assembles entries and feeds from linear read events.
//!
//! Each Start event pushes a node, each End event pops it and merges the
//! finished node into the new top of the stack, or promotes it to the root
//! when the stack is empty. Nested content lands in the parent entry under
//! the navigation link that is open on it.
//!
//! ```text
//! FeedStart            push Feed
//!   EntryStart         push Entry
//!     NavLinkStart     top.open_link = "Orders"
//!       FeedStart      push Feed
//!         EntryStart   push Entry
//!         EntryEnd     pop, append to Feed
//!       FeedEnd        pop, top.entry["Orders"] = [..]
//!     NavLinkEnd       top.open_link = None
//!   EntryEnd           pop, append to Feed
//! FeedEnd              pop, root
//! ```

use odata_protocol::{ItemReader, NavigationLink, ODataEntry, ODataFeed, ReadEvent};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::resolve::resolve_properties;
use crate::response::{FeedAnnotations, ODataResponse, RESOURCE_TYPE_FIELD};
use crate::value::{Record, Value};

/// Whether the event loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Completed,
}

#[derive(Debug)]
enum NodeContent {
    Entry(Record),
    Feed {
        entries: Vec<Record>,
        annotations: FeedAnnotations,
    },
}

impl NodeContent {
    const fn label(&self) -> &'static str {
        match self {
            Self::Entry(_) => "entry",
            Self::Feed { .. } => "feed",
        }
    }
}

/// An in-progress entry or feed.
#[derive(Debug)]
struct ResponseNode {
    content: NodeContent,
    /// Navigation link currently being read on this entry.
    open_link: Option<String>,
}

impl ResponseNode {
    const fn new(content: NodeContent) -> Self {
        Self {
            content,
            open_link: None,
        }
    }

    /// Store finished nested content under the open navigation link.
    fn attach(&mut self, value: Value) {
        match (&mut self.content, &self.open_link) {
            (NodeContent::Entry(record), Some(link)) => {
                record.insert(link.clone(), value);
            }
            (content, link) => {
                warn!(
                    parent = content.label(),
                    link = ?link,
                    "Nested content outside a navigation link, dropping it"
                );
            }
        }
    }
}

/// Explicit-stack builder driven one event at a time.
#[derive(Debug)]
pub(crate) struct NodeStackBuilder {
    stack: Vec<ResponseNode>,
    root: Option<NodeContent>,
    include_resource_type: bool,
    max_depth: usize,
}

impl NodeStackBuilder {
    pub(crate) const fn new(include_resource_type: bool, max_depth: usize) -> Self {
        Self {
            stack: Vec::new(),
            root: None,
            include_resource_type,
            max_depth,
        }
    }

    pub(crate) fn apply(&mut self, event: ReadEvent) -> Result<Flow> {
        trace!(depth = self.stack.len(), event = event_name(&event), "Node stack event");
        match event {
            ReadEvent::FeedStart(feed) => self.push(NodeContent::Feed {
                entries: Vec::new(),
                annotations: FeedAnnotations::from(feed),
            })?,
            ReadEvent::FeedEnd(feed) => self.end_feed(feed)?,
            ReadEvent::EntryStart => self.push(NodeContent::Entry(Record::new()))?,
            ReadEvent::EntryEnd(entry) => self.end_entry(entry)?,
            ReadEvent::NavigationLinkStart(link) => self.start_link(link),
            ReadEvent::NavigationLinkEnd(link) => self.end_link(&link),
            ReadEvent::Completed => return Ok(Flow::Completed),
        }
        Ok(Flow::Continue)
    }

    /// The root node as an envelope. A stream that never closed a node
    /// yields an empty entry.
    pub(crate) fn finish(self) -> ODataResponse {
        match self.root {
            Some(NodeContent::Entry(entry)) => ODataResponse::from_entry(entry),
            Some(NodeContent::Feed {
                entries,
                annotations,
            }) => ODataResponse::from_feed(entries, annotations),
            None => {
                debug!(
                    unclosed = self.stack.len(),
                    "No root node assembled, returning empty entry"
                );
                ODataResponse::from_entry(Record::new())
            }
        }
    }

    fn push(&mut self, content: NodeContent) -> Result<()> {
        if self.stack.len() >= self.max_depth {
            return Err(Error::QuotaExceeded(format!(
                "nesting depth exceeds {}",
                self.max_depth
            )));
        }
        self.stack.push(ResponseNode::new(content));
        Ok(())
    }

    fn pop(&mut self, closing: &str) -> Option<ResponseNode> {
        let node = self.stack.pop();
        if node.is_none() {
            warn!(closing, "End event without an open node, ignoring");
        }
        node
    }

    fn end_feed(&mut self, feed: ODataFeed) -> Result<()> {
        let Some(node) = self.pop("feed") else {
            return Ok(());
        };
        let NodeContent::Feed {
            entries,
            mut annotations,
        } = node.content
        else {
            return Err(Error::MalformedPayload(
                "feed end closes an open entry".into(),
            ));
        };
        annotations.merge(FeedAnnotations::from(feed));

        match self.stack.last_mut() {
            None => {
                self.root = Some(NodeContent::Feed {
                    entries,
                    annotations,
                });
            }
            Some(parent) => {
                parent.attach(Value::List(entries.into_iter().map(Value::Record).collect()));
            }
        }
        Ok(())
    }

    fn end_entry(&mut self, entry: Option<ODataEntry>) -> Result<()> {
        let Some(node) = self.pop("entry") else {
            return Ok(());
        };
        // Already holds any expanded navigation content.
        let mut record = match node.content {
            NodeContent::Entry(record) => record,
            NodeContent::Feed { .. } => {
                return Err(Error::MalformedPayload(
                    "entry end closes an open feed".into(),
                ));
            }
        };

        let is_null = entry.is_none();
        if let Some(entry) = entry {
            record.extend(self.convert(entry));
        }

        match self.stack.last_mut() {
            None => self.root = Some(NodeContent::Entry(record)),
            Some(parent) => {
                if let NodeContent::Feed { entries, .. } = &mut parent.content {
                    entries.push(record);
                } else if is_null {
                    parent.attach(Value::null());
                } else {
                    parent.attach(Value::Record(record));
                }
            }
        }
        Ok(())
    }

    fn start_link(&mut self, link: NavigationLink) {
        match self.stack.last_mut() {
            Some(node) => node.open_link = Some(link.name),
            None => warn!(link = %link.name, "Navigation link outside an entry, ignoring"),
        }
    }

    fn end_link(&mut self, link: &NavigationLink) {
        if let Some(node) = self.stack.last_mut() {
            if node.open_link.as_deref() != Some(link.name.as_str()) {
                trace!(link = %link.name, open = ?node.open_link, "Closing a link that was not open");
            }
            node.open_link = None;
        }
    }

    fn convert(&self, entry: ODataEntry) -> Record {
        let mut record = resolve_properties(entry.properties);
        if self.include_resource_type {
            if let Some(type_name) = entry.type_name.as_deref() {
                record.insert(
                    RESOURCE_TYPE_FIELD.to_string(),
                    Value::from(resource_type(type_name)),
                );
            }
        }
        record
    }
}

/// Last segment of a qualified type name: `ODataDemo.Product` → `Product`.
fn resource_type(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}

const fn event_name(event: &ReadEvent) -> &'static str {
    match event {
        ReadEvent::FeedStart(_) => "feed_start",
        ReadEvent::FeedEnd(_) => "feed_end",
        ReadEvent::EntryStart => "entry_start",
        ReadEvent::EntryEnd(_) => "entry_end",
        ReadEvent::NavigationLinkStart(_) => "navigation_link_start",
        ReadEvent::NavigationLinkEnd(_) => "navigation_link_end",
        ReadEvent::Completed => "completed",
    }
}

/// Drain an entry/feed reader into an envelope.
pub(crate) async fn read_items<R: ItemReader>(
    mut reader: R,
    include_resource_type: bool,
    max_depth: usize,
) -> Result<ODataResponse> {
    let mut builder = NodeStackBuilder::new(include_resource_type, max_depth);
    while let Some(event) = reader.read().await? {
        if builder.apply(event)? == Flow::Completed {
            break;
        }
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use odata_protocol::{InstanceAnnotation, Primitive, Property};

    fn product(id: i64, name: &str) -> ODataEntry {
        ODataEntry::new([Property::new("ID", id), Property::new("Name", name)])
            .with_type_name("ODataDemo.Product")
    }

    fn build(events: Vec<ReadEvent>) -> Result<ODataResponse> {
        build_with(events, false)
    }

    fn build_with(events: Vec<ReadEvent>, include_resource_type: bool) -> Result<ODataResponse> {
        let mut builder = NodeStackBuilder::new(include_resource_type, 100);
        for event in events {
            if builder.apply(event)? == Flow::Completed {
                break;
            }
        }
        Ok(builder.finish())
    }

    fn link_start(name: &str) -> ReadEvent {
        ReadEvent::NavigationLinkStart(NavigationLink::new(name))
    }

    fn link_end(name: &str) -> ReadEvent {
        ReadEvent::NavigationLinkEnd(NavigationLink::new(name))
    }

    #[test]
    fn single_entry_becomes_root() {
        let response = build(vec![
            ReadEvent::EntryStart,
            ReadEvent::EntryEnd(Some(product(1, "Bread"))),
            ReadEvent::Completed,
        ])
        .unwrap();

        let ODataResponse::Entry { entry } = response else {
            panic!("expected entry, got {response:?}");
        };
        assert_eq!(entry.len(), 2);
        assert_eq!(entry["ID"].as_i64(), Some(1));
        assert!(!entry.contains_key(RESOURCE_TYPE_FIELD));
    }

    #[test]
    fn feed_keeps_encounter_order() {
        let mut events = vec![ReadEvent::FeedStart(ODataFeed::default())];
        for id in 1..=5 {
            events.push(ReadEvent::EntryStart);
            events.push(ReadEvent::EntryEnd(Some(product(id, "x"))));
        }
        events.push(ReadEvent::FeedEnd(ODataFeed::default()));

        let response = build(events).unwrap();
        let ids: Vec<_> = response
            .entries()
            .iter()
            .filter_map(|e| e["ID"].as_i64())
            .collect();
        assert_eq!(response.kind(), crate::ResponseKind::Feed);
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn feed_annotations_merge_start_and_end() {
        let start = ODataFeed {
            id: Some("http://host/svc/Products".into()),
            count: Some(42),
            instance_annotations: vec![InstanceAnnotation::new("ns.total", 42_i64)],
            ..ODataFeed::default()
        };
        let end = ODataFeed {
            next_page_link: Some("http://host/svc/Products?$skip=2".into()),
            delta_link: Some("http://host/svc/Products?$deltatoken=9".into()),
            ..ODataFeed::default()
        };
        let response = build(vec![
            ReadEvent::FeedStart(start),
            ReadEvent::FeedEnd(end),
        ])
        .unwrap();

        let annotations = response.annotations().unwrap();
        assert_eq!(annotations.count, Some(42));
        assert_eq!(annotations.id.as_deref(), Some("http://host/svc/Products"));
        assert_eq!(
            annotations.next_page_link.as_deref(),
            Some("http://host/svc/Products?$skip=2")
        );
        assert!(annotations.delta_link.is_some());
        assert_eq!(annotations.instance_annotations["ns.total"].as_i64(), Some(42));
    }

    #[test]
    fn expanded_single_navigation_is_a_record() {
        let category = ODataEntry::new([Property::new("Name", "Food")]);
        let response = build(vec![
            ReadEvent::EntryStart,
            link_start("Category"),
            ReadEvent::EntryStart,
            ReadEvent::EntryEnd(Some(category)),
            link_end("Category"),
            ReadEvent::EntryEnd(Some(product(1, "Bread"))),
        ])
        .unwrap();

        let entry = &response.entries()[0];
        assert_eq!(entry.len(), 3);
        let category = entry["Category"].as_record().unwrap();
        assert_eq!(category["Name"].as_str(), Some("Food"));
    }

    #[test]
    fn expanded_collection_navigation_is_a_list() {
        let response = build(vec![
            ReadEvent::EntryStart,
            link_start("Products"),
            ReadEvent::FeedStart(ODataFeed::default()),
            ReadEvent::EntryStart,
            ReadEvent::EntryEnd(Some(product(1, "Bread"))),
            ReadEvent::EntryStart,
            ReadEvent::EntryEnd(Some(product(2, "Milk"))),
            ReadEvent::FeedEnd(ODataFeed::default()),
            link_end("Products"),
            ReadEvent::EntryEnd(Some(ODataEntry::new([Property::new("Name", "Food")]))),
        ])
        .unwrap();

        let entry = &response.entries()[0];
        let products = entry["Products"].as_list().unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[1].as_record().unwrap()["Name"].as_str(), Some("Milk"));
    }

    #[test]
    fn expanded_empty_collection_is_an_empty_list() {
        let response = build(vec![
            ReadEvent::EntryStart,
            link_start("Products"),
            ReadEvent::FeedStart(ODataFeed::default()),
            ReadEvent::FeedEnd(ODataFeed::default()),
            link_end("Products"),
            ReadEvent::EntryEnd(Some(ODataEntry::default())),
        ])
        .unwrap();

        assert_eq!(response.entries()[0]["Products"], Value::List(Vec::new()));
    }

    #[test]
    fn null_single_navigation_is_null() {
        let response = build(vec![
            ReadEvent::EntryStart,
            link_start("Supplier"),
            ReadEvent::EntryStart,
            ReadEvent::EntryEnd(None),
            link_end("Supplier"),
            ReadEvent::EntryEnd(Some(product(1, "Bread"))),
        ])
        .unwrap();

        assert!(response.entries()[0]["Supplier"].is_null());
    }

    #[test]
    fn deferred_navigation_adds_nothing() {
        let response = build(vec![
            ReadEvent::EntryStart,
            link_start("Supplier"),
            link_end("Supplier"),
            ReadEvent::EntryEnd(Some(product(1, "Bread"))),
        ])
        .unwrap();

        assert!(!response.entries()[0].contains_key("Supplier"));
    }

    #[test]
    fn nested_navigation_resolves_by_depth() {
        // Feed → Product → Category → Products (collection) → Product
        let response = build(vec![
            ReadEvent::FeedStart(ODataFeed::default()),
            ReadEvent::EntryStart,
            link_start("Category"),
            ReadEvent::EntryStart,
            link_start("Products"),
            ReadEvent::FeedStart(ODataFeed::default()),
            ReadEvent::EntryStart,
            ReadEvent::EntryEnd(Some(product(7, "Jam"))),
            ReadEvent::FeedEnd(ODataFeed::default()),
            link_end("Products"),
            ReadEvent::EntryEnd(Some(ODataEntry::new([Property::new("Name", "Food")]))),
            link_end("Category"),
            ReadEvent::EntryEnd(Some(product(1, "Bread"))),
            ReadEvent::FeedEnd(ODataFeed::default()),
            ReadEvent::Completed,
        ])
        .unwrap();

        let bread = &response.entries()[0];
        let category = bread["Category"].as_record().unwrap();
        let products = category["Products"].as_list().unwrap();
        assert_eq!(products[0].as_record().unwrap()["ID"].as_i64(), Some(7));
    }

    #[test]
    fn resource_type_uses_last_type_segment() {
        let response = build_with(
            vec![ReadEvent::EntryStart, ReadEvent::EntryEnd(Some(product(1, "Bread")))],
            true,
        )
        .unwrap();

        let entry = &response.entries()[0];
        assert_eq!(entry[RESOURCE_TYPE_FIELD].as_str(), Some("Product"));
        assert_eq!(entry.len(), 3);
    }

    #[test]
    fn resource_type_skipped_without_type_name() {
        let response = build_with(
            vec![
                ReadEvent::EntryStart,
                ReadEvent::EntryEnd(Some(ODataEntry::new([Property::new("ID", 1_i64)]))),
            ],
            true,
        )
        .unwrap();

        assert!(!response.entries()[0].contains_key(RESOURCE_TYPE_FIELD));
    }

    #[test]
    fn degenerate_streams_yield_empty_entry() {
        for events in [
            vec![],
            vec![ReadEvent::Completed],
            vec![ReadEvent::EntryStart, ReadEvent::Completed],
            vec![ReadEvent::EntryEnd(Some(product(1, "Bread")))],
        ] {
            let response = build(events).unwrap();
            assert_eq!(response, ODataResponse::from_entry(Record::new()));
        }
    }

    #[test]
    fn crossed_nesting_is_malformed() {
        let err = build(vec![
            ReadEvent::FeedStart(ODataFeed::default()),
            ReadEvent::EntryEnd(Some(product(1, "Bread"))),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)));

        let err = build(vec![
            ReadEvent::EntryStart,
            ReadEvent::FeedEnd(ODataFeed::default()),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)));
    }

    #[test]
    fn depth_quota_is_enforced() {
        let mut builder = NodeStackBuilder::new(false, 2);
        builder.apply(ReadEvent::EntryStart).unwrap();
        builder.apply(link_start("Parent")).unwrap();
        builder.apply(ReadEvent::EntryStart).unwrap();
        builder.apply(link_start("Parent")).unwrap();
        let err = builder.apply(ReadEvent::EntryStart).unwrap_err();
        assert!(matches!(err, Error::QuotaExceeded(_)));
    }

    #[test]
    fn events_after_completed_are_not_read() {
        let response = build(vec![
            ReadEvent::EntryStart,
            ReadEvent::EntryEnd(Some(product(1, "Bread"))),
            ReadEvent::Completed,
            ReadEvent::EntryStart,
            ReadEvent::EntryEnd(Some(product(2, "Milk"))),
        ])
        .unwrap();
        assert_eq!(response.entries()[0]["ID"].as_i64(), Some(1));
    }

    #[test]
    fn entry_nested_without_link_is_dropped() {
        let response = build(vec![
            ReadEvent::EntryStart,
            ReadEvent::EntryStart,
            ReadEvent::EntryEnd(Some(product(2, "Milk"))),
            ReadEvent::EntryEnd(Some(product(1, "Bread"))),
        ])
        .unwrap();
        let entry = &response.entries()[0];
        assert_eq!(entry["ID"].as_i64(), Some(1));
        assert_eq!(entry.len(), 2);
    }

    #[test]
    fn primitive_values_resolved_in_entries() {
        let entry = ODataEntry::new([Property::new(
            "Color",
            odata_protocol::ODataValue::enumeration("NS.Color", "Blue"),
        )]);
        let response = build(vec![ReadEvent::EntryStart, ReadEvent::EntryEnd(Some(entry))]).unwrap();
        assert_eq!(
            response.entries()[0]["Color"],
            Value::Primitive(Primitive::String("Blue".into()))
        );
    }
}
