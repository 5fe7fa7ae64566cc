//! Streaming request forwarder
//!
//! Same URL, header and `Authorization` handling as the buffered forwarder,
//! but the upstream body is relayed chunk by chunk as the client reads it.
//! The request body is sent unmodified.
//!
//! Chunks are pulled from the upstream only when the response body is polled,
//! so a client disconnect (which drops the body) drops the upstream stream and
//! aborts the connection without reading further. A mid-stream failure ends
//! the relay with one SSE `error` event carrying the classified payload;
//! chunks already sent stay sent.

use crate::config::{ProxyTarget, Settings};
use crate::services::forwarder::{transport_failure, USER_AGENT};
use crate::services::outbound::{read_body, relay_response, ForwardTarget, OutboundRequest};
use crate::services::presenter::present;
use crate::utils::error::{describe_transport_error, AppResult};
use crate::utils::logging::create_header_log_summary;
use anyhow::{Context, Result};
use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::Response;
use futures::Stream;
use pin_project_lite::pin_project;
use reqwest::Client;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context as TaskContext, Poll};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Streaming forwarder
#[derive(Debug, Clone)]
pub struct StreamForwarder {
    client: Client,
    target: Arc<ProxyTarget>,
    max_body_size: usize,
}

impl StreamForwarder {
    pub fn new(settings: &Settings, target: Arc<ProxyTarget>) -> Result<Self> {
        let timeout = Duration::from_secs(settings.upstream.stream_timeout);
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create streaming HTTP client")?;

        Ok(Self {
            client,
            target,
            max_body_size: settings.request.max_request_size,
        })
    }

    /// Open a streaming call to `target_path` and relay its body
    pub async fn forward(
        &self,
        request: Request,
        target_path: &str,
        credential: Option<&str>,
    ) -> AppResult<Response<Body>> {
        let target = ForwardTarget::new(self.target.current(), target_path);
        let (parts, body) = request.into_parts();

        let body = read_body(body, self.max_body_size).await?;

        let mut outbound =
            OutboundRequest::new(parts.method, &target, parts.uri.query(), &parts.headers, body);
        if let Some(secret) = credential {
            outbound.inject_authorization(secret)?;
        }

        debug!(
            "Opening stream {} {} headers={}",
            outbound.method,
            outbound.url,
            create_header_log_summary(&outbound.headers)
        );

        let url = outbound.url.clone();
        let response = self
            .client
            .request(outbound.method, &outbound.url)
            .headers(outbound.headers)
            .body(outbound.body)
            .send()
            .await
            .map_err(|e| transport_failure(&url, &e))?;

        let status = response.status();
        let headers = response.headers().clone();
        debug!("Upstream stream opened with status {} for {}", status, url);

        let relay = RelayStream::new(response.bytes_stream(), url);
        Ok(relay_response(status, &headers, Body::from_stream(relay)))
    }
}

pin_project! {
    /// Pull-through relay of an upstream byte stream
    pub struct RelayStream<S> {
        #[pin]
        inner: S,
        url: String,
        chunks: u64,
        finished: bool,
    }

    impl<S> PinnedDrop for RelayStream<S> {
        fn drop(this: Pin<&mut Self>) {
            let this = this.project();
            if !*this.finished {
                info!(
                    "Client disconnected from {} after {} chunks, aborting upstream stream",
                    this.url, this.chunks
                );
            }
        }
    }
}

impl<S> RelayStream<S> {
    pub fn new(inner: S, url: impl Into<String>) -> Self {
        Self {
            inner,
            url: url.into(),
            chunks: 0,
            finished: false,
        }
    }

    /// Chunks relayed so far
    pub fn chunks(&self) -> u64 {
        self.chunks
    }
}

impl<S> Stream for RelayStream<S>
where
    S: Stream<Item = reqwest::Result<Bytes>>,
{
    type Item = Result<Bytes, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.finished {
            return Poll::Ready(None);
        }

        match ready!(this.inner.poll_next(cx)) {
            Some(Ok(chunk)) => {
                *this.chunks += 1;
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(e)) => {
                *this.finished = true;
                let description = describe_transport_error(&e);
                warn!(
                    "Upstream stream {} failed after {} chunks: {}",
                    this.url, this.chunks, description
                );
                Poll::Ready(Some(Ok(error_event(&description))))
            }
            None => {
                *this.finished = true;
                debug!("Upstream stream {} completed after {} chunks", this.url, this.chunks);
                Poll::Ready(None)
            }
        }
    }
}

/// SSE `error` event carrying the classified payload
pub fn error_event(error_text: &str) -> Bytes {
    let payload = present(error_text, None);
    let data = serde_json::to_string(&payload).unwrap_or_else(|_| {
        serde_json::json!({ "error_type": payload.error_type, "title": payload.title }).to_string()
    });
    Bytes::from(format!("event: error\ndata: {}\n\n", data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_upstream(pulled: Arc<AtomicUsize>) -> impl Stream<Item = reqwest::Result<Bytes>> {
        futures::stream::iter(0..100).map(move |i| {
            pulled.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from(format!("data: {}\n\n", i)))
        })
    }

    #[tokio::test]
    async fn test_relay_pulls_only_what_consumer_reads() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let mut relay = Box::pin(RelayStream::new(counting_upstream(pulled.clone()), "http://ui/chat"));

        for _ in 0..3 {
            assert!(relay.next().await.is_some());
        }
        assert_eq!(RelayStream::chunks(&relay), 3);
        drop(relay);

        assert_eq!(pulled.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_relay_ends_after_upstream_ends() {
        let upstream = futures::stream::iter(vec![
            Ok::<_, reqwest::Error>(Bytes::from_static(b"a")),
            Ok(Bytes::from_static(b"b")),
        ]);
        let relay = RelayStream::new(upstream, "http://ui/chat");

        let chunks: Vec<_> = relay.collect().await;
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_error_event_is_sse_framed() {
        let event = error_event("read timeout while streaming");
        let text = std::str::from_utf8(&event).unwrap();

        assert!(text.starts_with("event: error\ndata: "));
        assert!(text.ends_with("\n\n"));

        let data = text
            .trim_start_matches("event: error\ndata: ")
            .trim_end();
        let payload: serde_json::Value = serde_json::from_str(data).unwrap();
        assert_eq!(payload["error_type"], "timeout");
    }
}
