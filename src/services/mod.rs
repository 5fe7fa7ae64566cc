//! Service layer module
//!
//! Contains the error classifier and presenter, the buffered and streaming
//! forwarders, and persistent-channel error delivery

pub mod classifier;
pub mod delivery;
pub mod forwarder;
pub mod outbound;
pub mod presenter;
pub mod stream;

pub use classifier::classify;
pub use delivery::{ErrorDeliveryMiddleware, MessageSink, StreamErrorHandler};
pub use forwarder::{RequestForwarder, UpstreamHealth};
pub use presenter::present;
pub use stream::StreamForwarder;
