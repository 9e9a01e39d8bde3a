//! Messages carried through a pipeline.
//!
//! A [`Message`] is a shared handle to an envelope (priority, header, body).
//! Cloning the handle does not copy the envelope: every fitting that sees a
//! message sees the same allocation, so a filter that rewrites the header is
//! observed by everything downstream and identity can be checked with
//! [`Message::ptr_eq`].
//!
//! [`PipeMessage`] is the unit a fitting actually receives. Control messages
//! are separate variants, so a filter never has to guess whether a message is
//! addressed to it.

use crate::pipeline::error::PipelineResult;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// High priority messages sort to the front of a queue.
pub const PRIORITY_HIGH: i32 = 1;
/// Default priority.
pub const PRIORITY_MED: i32 = 5;
/// Low priority messages sort to the back of a queue.
pub const PRIORITY_LOW: i32 = 10;

/// Namespace all message type URIs live under.
pub const MESSAGE_BASE: &str = "http://puremvc.org/namespaces/pipes/messages/";
const NORMAL_URI: &str = "http://puremvc.org/namespaces/pipes/messages/normal/";
const FILTER_CONTROL_BASE: &str = "http://puremvc.org/namespaces/pipes/messages/filter-control/";
const QUEUE_CONTROL_BASE: &str = "http://puremvc.org/namespaces/pipes/messages/queue/";

/// Function applied by a filter to each normal message.
///
/// `Ok(true)` lets the message through, `Ok(false)` drops it. An `Err` is
/// treated as a rejection by the filter that ran it.
pub type FilterFn = Arc<dyn Fn(&Message, Option<&Value>) -> PipelineResult<bool> + Send + Sync>;

/// Wrap a closure as a [`FilterFn`].
pub fn filter_fn<F>(f: F) -> FilterFn
where
    F: Fn(&Message, Option<&Value>) -> PipelineResult<bool> + Send + Sync + 'static,
{
    Arc::new(f)
}

// ==================== Message Types ====================

/// Filter control subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterControlKind {
    SetParams,
    SetFilter,
    Bypass,
    Filter,
}

impl FilterControlKind {
    pub const ALL: [FilterControlKind; 4] = [
        FilterControlKind::SetParams,
        FilterControlKind::SetFilter,
        FilterControlKind::Bypass,
        FilterControlKind::Filter,
    ];

    fn suffix(self) -> &'static str {
        match self {
            FilterControlKind::SetParams => "setParams",
            FilterControlKind::SetFilter => "setFilter",
            FilterControlKind::Bypass => "bypass",
            FilterControlKind::Filter => "filter",
        }
    }
}

/// Queue control subtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueControlKind {
    Flush,
    Sort,
    Fifo,
}

impl QueueControlKind {
    pub const ALL: [QueueControlKind; 3] = [
        QueueControlKind::Flush,
        QueueControlKind::Sort,
        QueueControlKind::Fifo,
    ];

    fn suffix(self) -> &'static str {
        match self {
            QueueControlKind::Flush => "flush",
            QueueControlKind::Sort => "sort",
            QueueControlKind::Fifo => "FIFO",
        }
    }
}

/// Closed set of message types, with an escape hatch for tags this crate
/// does not know about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    Normal,
    FilterControl(FilterControlKind),
    QueueControl(QueueControlKind),
    Other(String),
}

impl MessageType {
    /// The namespaced URI for this type.
    pub fn uri(&self) -> Cow<'_, str> {
        match self {
            MessageType::Normal => Cow::Borrowed(NORMAL_URI),
            MessageType::FilterControl(kind) => {
                Cow::Owned(format!("{}{}", FILTER_CONTROL_BASE, kind.suffix()))
            }
            MessageType::QueueControl(kind) => {
                Cow::Owned(format!("{}{}", QUEUE_CONTROL_BASE, kind.suffix()))
            }
            MessageType::Other(uri) => Cow::Borrowed(uri.as_str()),
        }
    }

    /// Parse a type URI. Anything unrecognised becomes [`MessageType::Other`].
    pub fn from_uri(uri: &str) -> Self {
        if uri == NORMAL_URI {
            return MessageType::Normal;
        }
        if let Some(suffix) = uri.strip_prefix(FILTER_CONTROL_BASE) {
            if let Some(kind) = FilterControlKind::ALL
                .into_iter()
                .find(|k| k.suffix() == suffix)
            {
                return MessageType::FilterControl(kind);
            }
        }
        if let Some(suffix) = uri.strip_prefix(QUEUE_CONTROL_BASE) {
            if let Some(kind) = QueueControlKind::ALL
                .into_iter()
                .find(|k| k.suffix() == suffix)
            {
                return MessageType::QueueControl(kind);
            }
        }
        MessageType::Other(uri.to_string())
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

// ==================== Message ====================

/// The mutable contents of a message.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Lower value = higher priority.
    pub priority: i32,
    /// Metadata for the recipient. Opaque to the pipeline.
    pub header: Value,
    /// Payload. Opaque to the pipeline.
    pub body: Value,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            priority: PRIORITY_MED,
            header: Value::Null,
            body: Value::Null,
        }
    }
}

/// Shared handle to a message envelope.
#[derive(Clone, Default)]
pub struct Message {
    inner: Arc<RwLock<Envelope>>,
}

impl Message {
    /// Create an empty message with medium priority.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_envelope(envelope: Envelope) -> Self {
        Self {
            inner: Arc::new(RwLock::new(envelope)),
        }
    }

    pub fn with_header(self, header: Value) -> Self {
        self.set_header(header);
        self
    }

    pub fn with_body(self, body: Value) -> Self {
        self.set_body(body);
        self
    }

    pub fn with_priority(self, priority: i32) -> Self {
        self.set_priority(priority);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, Envelope> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Envelope> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn priority(&self) -> i32 {
        self.read().priority
    }

    pub fn set_priority(&self, priority: i32) {
        self.write().priority = priority;
    }

    pub fn header(&self) -> Value {
        self.read().header.clone()
    }

    pub fn set_header(&self, header: Value) {
        self.write().header = header;
    }

    pub fn body(&self) -> Value {
        self.read().body.clone()
    }

    pub fn set_body(&self, body: Value) {
        self.write().body = body;
    }

    /// Copy of the current envelope.
    pub fn snapshot(&self) -> Envelope {
        self.read().clone()
    }

    /// Mutate the envelope in place. Every holder of this message sees the change.
    pub fn update<R>(&self, f: impl FnOnce(&mut Envelope) -> R) -> R {
        f(&mut self.write())
    }

    /// Whether two handles refer to the same message.
    pub fn ptr_eq(&self, other: &Message) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Address-based identity, stable for the lifetime of the message.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let envelope = self.read();
        f.debug_struct("Message")
            .field("id", &format_args!("{:#x}", self.id()))
            .field("priority", &envelope.priority)
            .field("header", &envelope.header)
            .field("body", &envelope.body)
            .finish()
    }
}

// ==================== Control Messages ====================

/// Control message addressed to a named filter.
#[derive(Clone)]
pub struct FilterControl {
    pub kind: FilterControlKind,
    /// Name of the filter that should act on this message.
    pub target: String,
    pub filter: Option<FilterFn>,
    pub params: Option<Value>,
}

impl FilterControl {
    pub fn new(kind: FilterControlKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            filter: None,
            params: None,
        }
    }

    pub fn bypass(target: impl Into<String>) -> Self {
        Self::new(FilterControlKind::Bypass, target)
    }

    /// Return the target filter to filtering mode.
    pub fn enable(target: impl Into<String>) -> Self {
        Self::new(FilterControlKind::Filter, target)
    }

    pub fn set_params(target: impl Into<String>, params: Value) -> Self {
        Self {
            params: Some(params),
            ..Self::new(FilterControlKind::SetParams, target)
        }
    }

    pub fn set_filter(target: impl Into<String>, filter: FilterFn) -> Self {
        Self {
            filter: Some(filter),
            ..Self::new(FilterControlKind::SetFilter, target)
        }
    }
}

impl fmt::Debug for FilterControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterControl")
            .field("kind", &self.kind)
            .field("target", &self.target)
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .field("params", &self.params)
            .finish()
    }
}

/// Control message for the first queue it reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueControl {
    pub kind: QueueControlKind,
}

impl QueueControl {
    pub fn flush() -> Self {
        Self {
            kind: QueueControlKind::Flush,
        }
    }

    pub fn sort() -> Self {
        Self {
            kind: QueueControlKind::Sort,
        }
    }

    pub fn fifo() -> Self {
        Self {
            kind: QueueControlKind::Fifo,
        }
    }
}

// ==================== PipeMessage ====================

/// Everything a fitting can be written.
#[derive(Debug, Clone)]
pub enum PipeMessage {
    /// Application data.
    Normal(Message),
    FilterControl(FilterControl),
    QueueControl(QueueControl),
    /// A type tag this crate has no dispatch for. Passed through by filters.
    Other { type_uri: String, message: Message },
}

impl PipeMessage {
    /// Build a message from a type URI. Control URIs cannot be built this way
    /// since they need their control payload, so only normal and unknown tags
    /// are accepted.
    pub fn from_uri(type_uri: &str, message: Message) -> Option<Self> {
        match MessageType::from_uri(type_uri) {
            MessageType::Normal => Some(PipeMessage::Normal(message)),
            MessageType::Other(type_uri) => Some(PipeMessage::Other { type_uri, message }),
            MessageType::FilterControl(_) | MessageType::QueueControl(_) => None,
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            PipeMessage::Normal(_) => MessageType::Normal,
            PipeMessage::FilterControl(control) => MessageType::FilterControl(control.kind),
            PipeMessage::QueueControl(control) => MessageType::QueueControl(control.kind),
            PipeMessage::Other { type_uri, .. } => MessageType::Other(type_uri.clone()),
        }
    }

    /// The data envelope, for messages that carry one.
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            PipeMessage::Normal(message) | PipeMessage::Other { message, .. } => Some(message),
            PipeMessage::FilterControl(_) | PipeMessage::QueueControl(_) => None,
        }
    }

    pub fn is_control(&self) -> bool {
        matches!(
            self,
            PipeMessage::FilterControl(_) | PipeMessage::QueueControl(_)
        )
    }
}

impl From<Message> for PipeMessage {
    fn from(message: Message) -> Self {
        PipeMessage::Normal(message)
    }
}

impl From<FilterControl> for PipeMessage {
    fn from(control: FilterControl) -> Self {
        PipeMessage::FilterControl(control)
    }
}

impl From<QueueControl> for PipeMessage {
    fn from(control: QueueControl) -> Self {
        PipeMessage::QueueControl(control)
    }
}
