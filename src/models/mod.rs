//! Data model module
//!
//! Error classification payloads and persistent-channel events

pub mod error_info;
pub mod events;

pub use error_info::{Classification, ErrorKind, ErrorPayload, Solution, SolutionAction};
pub use events::{ApiErrorEvent, GenericErrorEvent, RunId, SystemMessageEvent};
