use std::sync::Arc;

use relay_core::OutboundMessage;
use tracing::{debug, error, info};

use crate::channel::Channel;

/// Tally of one dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Relays formatted messages to a [`Channel`], one call per message.
///
/// Messages are sent sequentially in the order given. A failed send is logged
/// and counted; it never stops the remaining messages and is never returned
/// to the caller. There is no retry.
#[derive(Clone)]
pub struct Dispatcher {
    channel: Arc<dyn Channel>,
}

impl Dispatcher {
    pub fn new(channel: Arc<dyn Channel>) -> Self {
        Self { channel }
    }

    pub fn channel_name(&self) -> &str {
        self.channel.name()
    }

    pub async fn dispatch(&self, messages: Vec<OutboundMessage>) -> DispatchReport {
        let channel = self.channel.name();
        let total = messages.len();
        let mut report = DispatchReport::default();

        for (index, msg) in messages.iter().enumerate() {
            debug!(channel = %channel, index, chars = msg.text.chars().count(), "sending message");
            match self.channel.send(msg).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    error!(channel = %channel, index, total, error = %e, "message delivery failed");
                    report.failed += 1;
                }
            }
        }

        if total > 0 {
            info!(
                channel = %channel,
                delivered = report.delivered,
                failed = report.failed,
                "dispatch complete"
            );
        }
        report
    }
}
