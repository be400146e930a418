//! In-memory tokenizer that replays scripted events.
//!
//! Only compiled for tests or with the `test-utils` feature. A
//! [`ScriptedMessage`] carries the status, the payload kinds detection will
//! report and the events each reader hands out, so reader behaviour can be
//! exercised without a wire format.

use std::collections::VecDeque;
use std::io::{self, Cursor};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::event::{BatchEvent, CollectionEvent, ODataEntry, ODataFeed, ReadEvent};
use crate::kind::{PayloadKind, PayloadKinds};
use crate::quotas::MessageQuotas;
use crate::reader::{
    BatchReader, CollectionReader, ItemReader, MessageReader, ResponseMessage, Tokenizer,
};
use crate::value::{ODataValue, TopLevelProperty};

/// What the opened message replays.
#[derive(Debug)]
pub enum Script {
    Items(Vec<ReadEvent>),
    Collection(Vec<CollectionEvent>),
    Batch(Vec<BatchEvent<ScriptedMessage>>),
    Property(TopLevelProperty),
    Body(Vec<u8>),
    Empty,
}

/// A response message with a scripted body.
#[derive(Debug)]
pub struct ScriptedMessage {
    status: u16,
    headers: Vec<(String, String)>,
    kinds: PayloadKinds,
    script: Script,
    fail_after: Option<usize>,
}

impl ScriptedMessage {
    pub fn new(status: u16, kinds: impl Into<PayloadKinds>, script: Script) -> Self {
        Self {
            status,
            headers: Vec::new(),
            kinds: kinds.into(),
            script,
            fail_after: None,
        }
    }

    pub fn entry(events: Vec<ReadEvent>) -> Self {
        Self::new(200, PayloadKind::Entry, Script::Items(events))
    }

    pub fn feed(events: Vec<ReadEvent>) -> Self {
        Self::new(200, PayloadKind::Feed, Script::Items(events))
    }

    pub fn collection(values: impl IntoIterator<Item = ODataValue>) -> Self {
        let mut events = vec![CollectionEvent::Start];
        events.extend(values.into_iter().map(CollectionEvent::Value));
        events.push(CollectionEvent::End);
        events.push(CollectionEvent::Completed);
        Self::new(200, PayloadKind::Collection, Script::Collection(events))
    }

    pub fn property(name: Option<&str>, value: impl Into<ODataValue>) -> Self {
        let property = TopLevelProperty {
            name: name.map(String::from),
            value: value.into(),
        };
        Self::new(200, PayloadKind::Property, Script::Property(property))
    }

    pub fn raw(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, PayloadKind::Value, Script::Body(body.into()))
            .with_header("Content-Type", "text/plain")
    }

    pub fn error(status: u16) -> Self {
        Self::new(status, PayloadKind::Error, Script::Empty)
    }

    pub fn batch(events: Vec<BatchEvent<Self>>) -> Self {
        Self::new(200, PayloadKind::Batch, Script::Batch(events))
    }

    pub fn no_content() -> Self {
        Self::new(crate::STATUS_NO_CONTENT, PayloadKinds::new(), Script::Empty)
    }

    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_kinds(mut self, kinds: impl Into<PayloadKinds>) -> Self {
        self.kinds = kinds.into();
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Make the `n`th read (zero-based) of the opened reader fail.
    #[must_use]
    pub const fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

impl ResponseMessage for ScriptedMessage {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// `[EntryStart, EntryEnd(entry), Completed]`.
pub fn single_entry(entry: ODataEntry) -> Vec<ReadEvent> {
    vec![
        ReadEvent::EntryStart,
        ReadEvent::EntryEnd(Some(entry)),
        ReadEvent::Completed,
    ]
}

/// A top-level feed holding `entries`, terminated by `Completed`.
pub fn feed_of(feed: ODataFeed, entries: impl IntoIterator<Item = ODataEntry>) -> Vec<ReadEvent> {
    let mut events = vec![ReadEvent::FeedStart(feed.clone())];
    for entry in entries {
        events.push(ReadEvent::EntryStart);
        events.push(ReadEvent::EntryEnd(Some(entry)));
    }
    events.push(ReadEvent::FeedEnd(feed));
    events.push(ReadEvent::Completed);
    events
}

/// Tokenizer over [`ScriptedMessage`]s. Counts how many messages were opened.
#[derive(Debug, Default)]
pub struct ScriptedTokenizer {
    opened: AtomicUsize,
}

impl ScriptedTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl Tokenizer for ScriptedTokenizer {
    type Message = ScriptedMessage;
    type Reader = ScriptedReader;

    fn open(&self, message: ScriptedMessage, _quotas: &MessageQuotas) -> io::Result<ScriptedReader> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedReader { message })
    }
}

/// Opened [`ScriptedMessage`].
#[derive(Debug)]
pub struct ScriptedReader {
    message: ScriptedMessage,
}

impl ScriptedReader {
    fn items(self) -> io::Result<Tape<ReadEvent>> {
        let fail_after = self.message.fail_after;
        match self.message.script {
            Script::Items(events) => Ok(Tape::new(events, fail_after)),
            other => Err(mismatch("entry/feed", &other)),
        }
    }
}

impl MessageReader for ScriptedReader {
    type Message = ScriptedMessage;
    type Items = Tape<ReadEvent>;
    type Collection = Tape<CollectionEvent>;
    type Batch = Tape<BatchEvent<ScriptedMessage>>;
    type Body = Cursor<Vec<u8>>;

    async fn detect_payload_kind(&mut self) -> io::Result<PayloadKinds> {
        Ok(self.message.kinds.clone())
    }

    fn entry_reader(self) -> io::Result<Self::Items> {
        self.items()
    }

    fn feed_reader(self) -> io::Result<Self::Items> {
        self.items()
    }

    fn collection_reader(self) -> io::Result<Self::Collection> {
        let fail_after = self.message.fail_after;
        match self.message.script {
            Script::Collection(events) => Ok(Tape::new(events, fail_after)),
            other => Err(mismatch("collection", &other)),
        }
    }

    fn batch_reader(self) -> io::Result<Self::Batch> {
        let fail_after = self.message.fail_after;
        match self.message.script {
            Script::Batch(events) => Ok(Tape::new(events, fail_after)),
            other => Err(mismatch("batch", &other)),
        }
    }

    async fn read_property(self) -> io::Result<TopLevelProperty> {
        if self.message.fail_after == Some(0) {
            return Err(scripted_fault());
        }
        match self.message.script {
            Script::Property(property) => Ok(property),
            other => Err(mismatch("property", &other)),
        }
    }

    fn into_body(self) -> Cursor<Vec<u8>> {
        match self.message.script {
            Script::Body(bytes) => Cursor::new(bytes),
            _ => Cursor::new(Vec::new()),
        }
    }
}

/// Replays a fixed sequence of events, optionally failing part way.
#[derive(Debug)]
pub struct Tape<T> {
    events: VecDeque<T>,
    fail_after: Option<usize>,
    reads: usize,
}

impl<T> Tape<T> {
    fn new(events: Vec<T>, fail_after: Option<usize>) -> Self {
        Self {
            events: events.into(),
            fail_after,
            reads: 0,
        }
    }

    fn next_event(&mut self) -> io::Result<Option<T>> {
        if self.fail_after == Some(self.reads) {
            return Err(scripted_fault());
        }
        self.reads += 1;
        Ok(self.events.pop_front())
    }
}

impl ItemReader for Tape<ReadEvent> {
    async fn read(&mut self) -> io::Result<Option<ReadEvent>> {
        self.next_event()
    }
}

impl CollectionReader for Tape<CollectionEvent> {
    async fn read(&mut self) -> io::Result<Option<CollectionEvent>> {
        self.next_event()
    }
}

impl BatchReader for Tape<BatchEvent<ScriptedMessage>> {
    type Message = ScriptedMessage;

    async fn read(&mut self) -> io::Result<Option<BatchEvent<ScriptedMessage>>> {
        self.next_event()
    }
}

fn scripted_fault() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "scripted read fault")
}

fn mismatch(wanted: &str, script: &Script) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("{wanted} reader requested for {script:?} script"),
    )
}
