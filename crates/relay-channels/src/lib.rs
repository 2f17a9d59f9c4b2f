pub mod channel;
pub mod dispatch;
pub mod error;

pub use channel::Channel;
pub use dispatch::{DispatchReport, Dispatcher};
pub use error::ChannelError;
