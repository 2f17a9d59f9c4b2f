use async_trait::async_trait;
use relay_core::OutboundMessage;

use crate::error::ChannelError;

/// Outbound side of the relay: something that can deliver one message to a
/// chat platform.
///
/// Implementations must be `Send + Sync` so a single instance can be shared
/// by every in-flight webhook request.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Stable lowercase identifier for this channel (e.g. `"telegram"`).
    fn name(&self) -> &str;

    /// Make exactly one delivery attempt for `msg`.
    ///
    /// Non-success responses from the platform must be reported as errors.
    /// Retrying is not the channel's job.
    async fn send(&self, msg: &OutboundMessage) -> Result<(), ChannelError>;
}
