//! Core types for the pipeline system

/// Framework-level state of a graph or stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    /// No state change pending
    VoidPending,
    /// Initial state, all resources released
    Null,
    /// Resources allocated, no data flowing
    Ready,
    /// Data flowing up to the sinks, clock stopped
    Paused,
    /// Clock running, data flowing
    Playing,
}

impl GraphState {
    /// Get the framework name of this state
    pub fn name(&self) -> &'static str {
        match self {
            GraphState::VoidPending => "VOID_PENDING",
            GraphState::Null => "NULL",
            GraphState::Ready => "READY",
            GraphState::Paused => "PAUSED",
            GraphState::Playing => "PLAYING",
        }
    }
}

impl std::fmt::Display for GraphState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where a message on the graph's channel came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// The top-level graph itself
    Graph(String),
    /// A stage (or any other object) inside the graph
    Stage(String),
    /// The message carried no source
    Unknown,
}

impl Origin {
    /// Check if the message was posted by the top-level graph
    pub fn is_graph(&self) -> bool {
        matches!(self, Origin::Graph(_))
    }

    /// Name of the posting object, if any
    pub fn name(&self) -> &str {
        match self {
            Origin::Graph(name) | Origin::Stage(name) => name,
            Origin::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A message observed on the graph's message channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Processing fault inside the graph
    Error {
        origin: Origin,
        reason: String,
        debug: Option<String>,
    },

    /// All sinks have drained
    EndOfStream { origin: Origin },

    /// An object in the graph changed state
    StateChanged {
        origin: Origin,
        old: GraphState,
        new: GraphState,
        pending: GraphState,
    },

    /// Anything the channel filter should have kept out
    Other { origin: Origin, kind: String },
}

impl Message {
    /// Short name of the message kind
    pub fn kind(&self) -> &str {
        match self {
            Message::Error { .. } => "error",
            Message::EndOfStream { .. } => "eos",
            Message::StateChanged { .. } => "state-changed",
            Message::Other { kind, .. } => kind,
        }
    }

    pub fn origin(&self) -> &Origin {
        match self {
            Message::Error { origin, .. }
            | Message::EndOfStream { origin }
            | Message::StateChanged { origin, .. }
            | Message::Other { origin, .. } => origin,
        }
    }
}

/// Kind of media data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Video frame data
    Video,
    /// Audio sample data
    Audio,
}

impl MediaKind {
    /// Classify a negotiated media type such as `video/x-raw`
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let family = media_type.split('/').next()?;
        match family {
            "video" => Some(MediaKind::Video),
            "audio" => Some(MediaKind::Audio),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Video => write!(f, "Video"),
            MediaKind::Audio => write!(f, "Audio"),
        }
    }
}
