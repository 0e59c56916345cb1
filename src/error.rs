use thiserror::Error;

/// Unified error type for releaseflow operations
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version parsing error: {0}")]
    Format(String),

    #[error("Branch error: {0}")]
    Branch(String),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Invalid ancestor: {0}")]
    InvalidAncestor(String),

    #[error("Branch '{branch}' is behind '{remote}/{branch}' - pull first")]
    Behind { branch: String, remote: String },

    #[error("Branch '{branch}' has diverged from '{remote}/{branch}' - rebase first")]
    Diverged { branch: String, remote: String },

    #[error("No remotes configured")]
    NoRemotesConfigured,

    #[error("Tracker version '{0}' is already released")]
    VersionAlreadyReleased(String),

    #[error("Cannot squash: version(s) already released: {}", .0.join(", "))]
    SquashBlockedReleased(Vec<String>),

    #[error("Cannot squash: closed issue(s) would be lost: {}", .0.join(", "))]
    SquashBlockedClosedIssues(Vec<String>),

    #[error("Tracker request failed with status {status}: {message}")]
    Tracker { status: u16, message: String },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Build step failed: {0}")]
    Build(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in releaseflow
pub type Result<T> = std::result::Result<T, FlowError>;

impl FlowError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        FlowError::Config(msg.into())
    }

    /// Create a version format error with context
    pub fn format(msg: impl Into<String>) -> Self {
        FlowError::Format(msg.into())
    }

    /// Create a branch error with context
    pub fn branch(msg: impl Into<String>) -> Self {
        FlowError::Branch(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        FlowError::Tag(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        FlowError::Remote(msg.into())
    }

    /// Create a build error with context
    pub fn build(msg: impl Into<String>) -> Self {
        FlowError::Build(msg.into())
    }

    /// Create a tracker error from an HTTP status and body
    pub fn tracker(status: u16, message: impl Into<String>) -> Self {
        FlowError::Tracker {
            status,
            message: message.into(),
        }
    }
}
