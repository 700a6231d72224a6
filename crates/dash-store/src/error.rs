use dash_topic::ResolveError;
use thiserror::Error;

/// Every failure the store reports. Each variant maps to one [`ErrorKind`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot replace the entire tree")]
    CannotReplaceRoot,
    #[error("array index '{index}' is not valid for an array of length {len}")]
    IndexError { index: String, len: usize },
    #[error("level '{segment}' is not traversable: found {found}")]
    NotTraversable { segment: String, found: &'static str },
    #[error("'{topic}' is neither array nor object: found {found}")]
    NotContainer { topic: String, found: &'static str },
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error("cannot delete array element '{topic}'")]
    ArrayDeleteUnsupported { topic: String },
    #[error("cannot delete at array append position '{topic}'")]
    ArrayAppendDeleteUnsupported { topic: String },
    #[error("unknown tab kind '{0}'")]
    UnknownTabKind(String),
    #[error("nothing to undo")]
    EmptyUndoBuffer,
    #[error("dashboard config is already initialized")]
    AlreadyInitialized,
    #[error("invalid payload for '{topic}': {reason}")]
    InvalidPayload { topic: String, reason: String },
    #[error("no free id left for prefix '{prefix}'")]
    IdSpaceExhausted { prefix: String },
    #[error("malformed message: {0}")]
    Wire(serde_json::Error),
    #[error("invalid store config: {0}")]
    Config(serde_json::Error),
}

/// Kind tag of a [`StoreError`], for callers that branch on the condition
/// rather than the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CannotReplaceRoot,
    IndexError,
    NotTraversable,
    NotContainer,
    NotFound,
    ArrayDeleteUnsupported,
    ArrayAppendDeleteUnsupported,
    UnknownKind,
    EmptyUndoBuffer,
    AlreadyInitialized,
    InvalidPayload,
    IdSpaceExhausted,
    Config,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::CannotReplaceRoot => ErrorKind::CannotReplaceRoot,
            StoreError::IndexError { .. } => ErrorKind::IndexError,
            StoreError::NotTraversable { .. } => ErrorKind::NotTraversable,
            StoreError::NotContainer { .. } => ErrorKind::NotContainer,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::ArrayDeleteUnsupported { .. } => ErrorKind::ArrayDeleteUnsupported,
            StoreError::ArrayAppendDeleteUnsupported { .. } => {
                ErrorKind::ArrayAppendDeleteUnsupported
            }
            StoreError::UnknownTabKind(_) => ErrorKind::UnknownKind,
            StoreError::EmptyUndoBuffer => ErrorKind::EmptyUndoBuffer,
            StoreError::AlreadyInitialized => ErrorKind::AlreadyInitialized,
            StoreError::InvalidPayload { .. } | StoreError::Wire(_) => ErrorKind::InvalidPayload,
            StoreError::IdSpaceExhausted { .. } => ErrorKind::IdSpaceExhausted,
            StoreError::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub(crate) fn invalid(topic: impl Into<String>, reason: impl ToString) -> Self {
        StoreError::InvalidPayload {
            topic: topic.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn bad_index(index: usize, len: usize) -> Self {
        StoreError::IndexError {
            index: index.to_string(),
            len,
        }
    }
}

impl From<ResolveError> for StoreError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Index { index, len } => StoreError::IndexError { index, len },
            ResolveError::NotTraversable { segment, found } => {
                StoreError::NotTraversable { segment, found }
            }
        }
    }
}
