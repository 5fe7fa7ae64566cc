//! Upstream error delivery over persistent channels
//!
//! `ErrorDeliveryMiddleware` decorates a run's stream-error handler. Upstream
//! failures are turned into a structured `api_error` event followed by a
//! human-readable system message; anything else goes to the wrapped default
//! handler unchanged. Delivery never fails: if either message cannot be sent a
//! generic fallback is attempted, and if that fails too the error is dropped
//! so the original failure is not masked by a secondary one.

use crate::models::events::{
    ApiErrorEvent, GenericErrorEvent, RunId, SystemMessageEvent,
};
use crate::services::presenter::present;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Keywords marking an error as coming from the upstream model provider
pub const UPSTREAM_ERROR_KEYWORDS: &[&str] = &[
    "credits",
    "api key",
    "rate limit",
    "quota",
    "model not found",
    "unauthorized",
    "authentication failed",
    "connection error",
    "timeout",
    "openai",
    "openrouter",
    "anthropic",
];

/// Whether an error text belongs to the upstream error taxonomy
pub fn is_upstream_error(error_text: &str) -> bool {
    let lower = error_text.to_lowercase();
    UPSTREAM_ERROR_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// "Send message for a run" primitive of a persistent channel
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send_message(&self, run_id: RunId, message: Value) -> Result<()>;
}

/// Handler invoked when a run's stream fails
#[async_trait]
pub trait StreamErrorHandler: Send + Sync {
    async fn handle_stream_error(&self, run_id: RunId, error: &anyhow::Error);
}

#[async_trait]
impl<T: MessageSink + ?Sized> MessageSink for Arc<T> {
    async fn send_message(&self, run_id: RunId, message: Value) -> Result<()> {
        (**self).send_message(run_id, message).await
    }
}

#[async_trait]
impl<T: StreamErrorHandler + ?Sized> StreamErrorHandler for Arc<T> {
    async fn handle_stream_error(&self, run_id: RunId, error: &anyhow::Error) {
        (**self).handle_stream_error(run_id, error).await
    }
}

/// Sink that hands messages to a channel consumer, e.g. a websocket writer
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<(RunId, Value)>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<(RunId, Value)>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl MessageSink for ChannelSink {
    async fn send_message(&self, run_id: RunId, message: Value) -> Result<()> {
        self.tx
            .send((run_id, message))
            .await
            .map_err(|_| anyhow::anyhow!("Channel for run {} is closed", run_id))
    }
}

/// Plain handler: report the raw error text as a generic error event
#[derive(Debug, Clone)]
pub struct SinkErrorHandler<S> {
    sink: S,
}

impl<S> SinkErrorHandler<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl<S: MessageSink> StreamErrorHandler for SinkErrorHandler<S> {
    async fn handle_stream_error(&self, run_id: RunId, error: &anyhow::Error) {
        let event = GenericErrorEvent::new(error.to_string());
        match serde_json::to_value(&event) {
            Ok(message) => {
                if let Err(e) = self.sink.send_message(run_id, message).await {
                    warn!("Failed to report error for run {}: {}", run_id, e);
                }
            }
            Err(e) => warn!("Failed to serialize error event for run {}: {}", run_id, e),
        }
    }
}

/// Decorator routing upstream errors to structured delivery
pub struct ErrorDeliveryMiddleware<S, H> {
    sink: S,
    default_handler: H,
}

impl<S, H> ErrorDeliveryMiddleware<S, H>
where
    S: MessageSink,
    H: StreamErrorHandler,
{
    /// Wrap `default_handler`; upstream errors are sent through `sink`
    pub fn new(sink: S, default_handler: H) -> Self {
        Self {
            sink,
            default_handler,
        }
    }

    /// Emit the structured event and the system message for an upstream error
    pub async fn on_stream_error(&self, run_id: RunId, error: &anyhow::Error) {
        let error_text = error.to_string();
        error!("API error for run {}: {}", run_id, error_text);

        if let Err(e) = self.emit(run_id, &error_text).await {
            error!("Error delivery failed for run {}: {}", run_id, e);
            self.emit_fallback(run_id).await;
        }
    }

    async fn emit(&self, run_id: RunId, error_text: &str) -> Result<()> {
        let payload = present(error_text, None);

        let system_message = serde_json::to_value(SystemMessageEvent::from_payload(&payload))?;
        let api_error = serde_json::to_value(ApiErrorEvent::new(run_id, payload))?;

        self.sink.send_message(run_id, api_error).await?;
        self.sink.send_message(run_id, system_message).await?;

        debug!("Delivered structured error for run {}", run_id);
        Ok(())
    }

    async fn emit_fallback(&self, run_id: RunId) {
        let fallback = match serde_json::to_value(GenericErrorEvent::fallback()) {
            Ok(value) => value,
            Err(_) => return,
        };

        if let Err(e) = self.sink.send_message(run_id, fallback).await {
            // Last resort; nothing left to report to
            debug!("Fallback error message for run {} dropped: {}", run_id, e);
        }
    }
}

#[async_trait]
impl<S, H> StreamErrorHandler for ErrorDeliveryMiddleware<S, H>
where
    S: MessageSink,
    H: StreamErrorHandler,
{
    async fn handle_stream_error(&self, run_id: RunId, error: &anyhow::Error) {
        if is_upstream_error(&error.to_string()) {
            self.on_stream_error(run_id, error).await;
        } else {
            self.default_handler.handle_stream_error(run_id, error).await;
        }
    }
}
