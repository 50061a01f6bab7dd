use thiserror::Error;

/// Error type accepted from caller-supplied mapping and post-process
/// functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while building a query object.
///
/// The value codec never fails: malformed input degrades to its literal
/// text instead. Only the builder reports errors, and those come from
/// functions the caller registered. The caller's error is kept untouched
/// as the [`source`](std::error::Error::source) and can be recovered with
/// `downcast_ref`.
#[derive(Debug, Error)]
pub enum Error {
    /// A per-key mapping function returned an error.
    #[error("mapping for `{key}` failed: {source}")]
    Mapping {
        key: String,
        #[source]
        source: BoxError,
    },

    /// The post-process function returned an error.
    #[error("post-process failed: {0}")]
    PostProcess(#[source] BoxError),

    /// The built query could not be deserialized into the requested type.
    #[error("failed to deserialize query: {0}")]
    Typed(#[from] serde_json::Error),
}

impl Error {
    /// The error returned by the caller's mapping or post-process
    /// function, if this error came from one.
    pub fn caller_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Error::Mapping { source, .. } | Error::PostProcess(source) => Some(source.as_ref()),
            Error::Typed(_) => None,
        }
    }
}
