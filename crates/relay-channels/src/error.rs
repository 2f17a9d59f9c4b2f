use thiserror::Error;

/// Errors that can occur while delivering a message through a channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The request never produced a response (DNS, TLS, connect, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The platform answered with a non-success status.
    #[error("Rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The channel rejected the supplied credentials or token.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),
}
