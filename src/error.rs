use hickory_proto::ProtoError;

/// Error type for record store operations.
///
/// Wraps whatever the storage backend produces. A store "not found" is not an
/// error, it is modeled in [`RecordLookup`][crate::handler::RecordLookup], so
/// anything surfacing here is a real storage failure.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct StoreError(Box<dyn std::error::Error + Send + Sync>);

impl StoreError {
    /// Create a new store error from any error type
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        StoreError(error.into())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::new(err)
    }
}

/// Errors surfaced by query resolution.
///
/// Server-facing impls translate every variant into a SERVFAIL response;
/// the enum exists so embedding code can tell storage trouble apart from
/// malformed requests.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("dns protocol error: {0}")]
    Protocol(#[from] ProtoError),

    #[error("record store failed: {0}")]
    Store(#[from] StoreError),

    #[error("no answer and no next handler in the chain")]
    NoNextHandler,
}
