/// Every failure the match feed can surface.
///
/// Fetch errors stop at the poller boundary and become a console line plus a
/// retry hint. Storage, notification and clipboard errors never leave the
/// collaborator that raised them.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Transport failure (`status` is `None`) or a non-success HTTP status.
    #[error("network failure: {reason}")]
    NetworkFailure { status: Option<u16>, reason: String },

    /// The body was not JSON, or the JSON did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The API answered with `status: "failure"`.
    #[error("{reason}")]
    Rejected { reason: String },

    /// Reading or writing the preference store failed.
    #[error("storage failure for {key}: {reason}")]
    StorageFailure { key: String, reason: String },

    #[error("notifications unavailable: {0}")]
    NotificationUnavailable(String),

    #[error("clipboard unavailable: {0}")]
    ClipboardUnavailable(String),
}

impl FeedError {
    /// True when the failure came from the transport rather than the payload.
    pub fn is_offline(&self) -> bool {
        matches!(self, FeedError::NetworkFailure { status: None, .. })
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
