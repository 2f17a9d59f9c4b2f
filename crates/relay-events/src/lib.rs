//! Harbor event model, enable/disable policy, markup escaping and the
//! classify-and-format pipeline that turns one webhook into chat messages.

pub mod escape;
pub mod format;
pub mod kind;
pub mod payload;
pub mod policy;

pub use escape::Escaper;
pub use format::{Classification, Decision, Formatter, PLACEHOLDER};
pub use kind::EventKind;
pub use payload::{EventPayload, Resource, ScanDetail};
pub use policy::EventPolicy;
