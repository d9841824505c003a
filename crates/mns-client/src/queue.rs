//! Message-level operations on a single queue.
//!
//! [`QueueClient`] wraps a shared [`MnsClient`] with the queue's resource paths,
//! a soft QPS ceiling and a stop signal for its polling loops.
//!
//! # Polling loops
//!
//! The receive and peek operations run until stopped. Each iteration issues one
//! request, hands the response (or error) to the caller's channel, applies the
//! QPS throttle and then checks the stop signal. Errors do not end the loop and
//! there is no backoff; the long-poll wait and the throttle bound the request
//! rate.
//!
//! Delivery awaits channel capacity, so a slow consumer slows the loop down. A
//! loop also ends when the receiving side of a channel it delivers to has been
//! dropped.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use mns_client::{ClientConfig, HttpMnsClient, QueueClient};
//! # async fn example() -> Result<(), mns_client::MnsError> {
//! let config = ClientConfig::new("https://123456.mns.example.test", "key-id", "key-secret");
//! let queue = Arc::new(QueueClient::new("orders", Arc::new(HttpMnsClient::new(&config)?))?);
//!
//! let (tx, mut rx) = tokio::sync::mpsc::channel(16);
//! let (err_tx, _err_rx) = tokio::sync::mpsc::channel(16);
//! let poller = queue.clone();
//! let handle = tokio::spawn(async move { poller.receive_message(tx, err_tx, Some(30)).await });
//!
//! if let Some(message) = rx.recv().await {
//!     queue.delete_message(&message.receipt_handle).await?;
//! }
//! queue.stop();
//! let _ = handle.await;
//! # Ok(())
//! # }
//! ```

use crate::client::{MnsClient, Request};
use crate::config::{non_zero_or, QueueOptions, DEFAULT_NUM_OF_MESSAGES, DEFAULT_QPS_LIMIT};
use crate::error::{MnsError, ValidationError};
use crate::message::{
    BatchMessageReceiveResponse, BatchMessageSendRequest, BatchMessageSendResponse,
    MessageReceiveResponse, MessageSendRequest, MessageSendResponse,
    MessageVisibilityChangeResponse, ReceiptHandles,
};
use crate::qps_monitor::QpsMonitor;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

pub const PROXY_ENV_PREFIX: &str = "MNS_PROXY_";
pub const GLOBAL_PROXY_ENV: &str = "MNS_GLOBAL_PROXY";

/// Sleep between rate checks while over the QPS ceiling
const THROTTLE_STEP: Duration = Duration::from_millis(10);

pub struct QueueClient {
    name: String,
    client: Arc<dyn MnsClient>,
    qps_limit: u64,
    default_num_of_messages: u32,
    monitor: QpsMonitor,
    stop: watch::Sender<bool>,
}

impl QueueClient {
    /// Create a client for `name` with default options
    pub fn new(name: impl Into<String>, client: Arc<dyn MnsClient>) -> Result<Self, MnsError> {
        Self::with_options(name, client, QueueOptions::default())
    }

    /// Create a client for `name`.
    ///
    /// When `options.proxy_from_env` is set, `MNS_PROXY_<NAME>` (queue name
    /// uppercased, `-` replaced by `_`) or else `MNS_GLOBAL_PROXY` is applied
    /// to the underlying client. The proxy belongs to that client, so every
    /// queue sharing it uses the proxy set last.
    ///
    /// A zero `qps_limit` or `default_num_of_messages` uses the default.
    ///
    /// # Errors
    ///
    /// Returns `MnsError::Validation` for an empty queue name and
    /// `MnsError::Configuration` if the proxy cannot be applied.
    pub fn with_options(
        name: impl Into<String>,
        client: Arc<dyn MnsClient>,
        options: QueueOptions,
    ) -> Result<Self, MnsError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::Required {
                field: "queue_name".to_string(),
            }
            .into());
        }

        if options.proxy_from_env {
            if let Some(proxy_url) = resolve_proxy(&name, |key| std::env::var(key).ok()) {
                if let Some(previous) = client.proxy_url().filter(|p| *p != proxy_url) {
                    warn!(
                        queue = %name,
                        previous = %previous,
                        proxy = %proxy_url,
                        "Replacing proxy shared with other queues on this client"
                    );
                }
                client.set_proxy(&proxy_url)?;
                info!(queue = %name, proxy = %proxy_url, "Using proxy from environment");
            }
        }

        let (stop, _) = watch::channel(false);

        Ok(Self {
            name,
            client,
            qps_limit: non_zero_or(options.qps_limit, DEFAULT_QPS_LIMIT),
            default_num_of_messages: match options.default_num_of_messages {
                0 => DEFAULT_NUM_OF_MESSAGES,
                count => count,
            },
            monitor: QpsMonitor::new(options.qps_window_secs),
            stop,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qps_limit(&self) -> u64 {
        self.qps_limit
    }

    /// Observed requests per second over the monitor window
    pub fn current_qps(&self) -> u64 {
        self.monitor.rate()
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    // ========================================================================
    // Single-shot operations
    // ========================================================================

    pub async fn send_message(
        &self,
        message: MessageSendRequest,
    ) -> Result<MessageSendResponse, MnsError> {
        let request = Request::post(self.messages_resource()).with_document(message);
        let result = self.fetch(request).await;
        self.throttle().await;
        result
    }

    /// Send several messages in one request. An empty batch makes no call.
    pub async fn batch_send_message(
        &self,
        messages: Vec<MessageSendRequest>,
    ) -> Result<BatchMessageSendResponse, MnsError> {
        if messages.is_empty() {
            return Ok(BatchMessageSendResponse::default());
        }

        let request = Request::post(self.messages_resource())
            .with_document(BatchMessageSendRequest { messages });
        let result = self.fetch(request).await;
        self.throttle().await;
        result
    }

    pub async fn delete_message(&self, receipt_handle: &str) -> Result<(), MnsError> {
        let request = Request::delete(format!(
            "{}?ReceiptHandle={}",
            self.messages_resource(),
            receipt_handle
        ));
        let result = self.client.send(request).await.map(|_| ());
        self.throttle().await;
        result
    }

    /// Delete several messages in one request. An empty batch makes no call.
    pub async fn batch_delete_message(&self, receipt_handles: Vec<String>) -> Result<(), MnsError> {
        if receipt_handles.is_empty() {
            return Ok(());
        }

        let request = Request::delete(self.messages_resource())
            .with_document(ReceiptHandles { receipt_handles });
        let result = self.client.send(request).await.map(|_| ());
        self.throttle().await;
        result
    }

    /// Hide an in-flight message for `visibility_timeout` more seconds.
    ///
    /// The response carries the receipt handle to use from now on.
    pub async fn change_message_visibility(
        &self,
        receipt_handle: &str,
        visibility_timeout: u32,
    ) -> Result<MessageVisibilityChangeResponse, MnsError> {
        let request = Request::put(format!(
            "{}?ReceiptHandle={}&VisibilityTimeout={}",
            self.messages_resource(),
            receipt_handle,
            visibility_timeout
        ));
        let result = self.fetch(request).await;
        self.throttle().await;
        result
    }

    // ========================================================================
    // Polling loops
    // ========================================================================

    /// Receive messages one at a time until stopped.
    ///
    /// `wait_seconds` asks the service to long-poll; `None` uses the queue's
    /// own setting.
    pub async fn receive_message(
        &self,
        results: mpsc::Sender<MessageReceiveResponse>,
        errors: mpsc::Sender<MnsError>,
        wait_seconds: Option<u32>,
    ) {
        let mut resource = self.messages_resource();
        if let Some(wait_seconds) = wait_seconds {
            resource.push_str(&format!("?waitseconds={}", wait_seconds));
        }
        self.poll(resource, results, errors).await
    }

    /// Receive up to `num_of_messages` per request until stopped.
    ///
    /// Zero requests the configured default batch size.
    pub async fn batch_receive_message(
        &self,
        results: mpsc::Sender<BatchMessageReceiveResponse>,
        errors: mpsc::Sender<MnsError>,
        num_of_messages: u32,
        wait_seconds: Option<u32>,
    ) {
        let mut resource = format!(
            "{}?numOfMessages={}",
            self.messages_resource(),
            self.batch_size(num_of_messages)
        );
        if let Some(wait_seconds) = wait_seconds {
            resource.push_str(&format!("&waitseconds={}", wait_seconds));
        }
        self.poll(resource, results, errors).await
    }

    /// Peek at the next message without changing its visibility, until stopped
    pub async fn peek_message(
        &self,
        results: mpsc::Sender<MessageReceiveResponse>,
        errors: mpsc::Sender<MnsError>,
    ) {
        let resource = format!("{}?peekonly=true", self.messages_resource());
        self.poll(resource, results, errors).await
    }

    /// Peek at up to `num_of_messages` messages per request, until stopped
    pub async fn batch_peek_message(
        &self,
        results: mpsc::Sender<BatchMessageReceiveResponse>,
        errors: mpsc::Sender<MnsError>,
        num_of_messages: u32,
    ) {
        let resource = format!(
            "{}?numOfMessages={}&peekonly=true",
            self.messages_resource(),
            self.batch_size(num_of_messages)
        );
        self.poll(resource, results, errors).await
    }

    /// Signal every polling loop of this client to finish.
    ///
    /// Returns immediately and may be called any number of times. A loop that
    /// is waiting on a request or on channel capacity gives up that step; a
    /// response that was not yet handed over is dropped. A stopped client
    /// cannot be restarted, and loops started afterwards return at once.
    pub fn stop(&self) {
        if !self.stop.send_replace(true) {
            info!(queue = %self.name, "Stopping queue polling");
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn messages_resource(&self) -> String {
        format!("queues/{}/messages", self.name)
    }

    fn batch_size(&self, num_of_messages: u32) -> u32 {
        if num_of_messages == 0 {
            self.default_num_of_messages
        } else {
            num_of_messages
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: Request) -> Result<T, MnsError> {
        self.client.send(request).await?.decode()
    }

    /// Record one request and wait while the observed rate is over the ceiling
    async fn throttle(&self) {
        self.monitor.pulse();
        while self.monitor.rate() > self.qps_limit {
            tokio::time::sleep(THROTTLE_STEP).await;
        }
    }

    async fn poll<T>(&self, resource: String, results: mpsc::Sender<T>, errors: mpsc::Sender<MnsError>)
    where
        T: DeserializeOwned + Send,
    {
        let mut stop = self.stop.subscribe();
        debug!(queue = %self.name, resource = %resource, "Polling loop started");

        loop {
            let outcome = tokio::select! {
                biased;
                _ = stop_requested(&mut stop) => break,
                outcome = self.fetch::<T>(Request::get(resource.as_str())) => outcome,
            };

            let delivered = match outcome {
                Ok(response) => tokio::select! {
                    biased;
                    _ = stop_requested(&mut stop) => break,
                    sent = results.send(response) => sent.is_ok(),
                },
                Err(error) => {
                    debug!(queue = %self.name, resource = %resource, error = %error, "Polling request failed");
                    tokio::select! {
                        biased;
                        _ = stop_requested(&mut stop) => break,
                        sent = errors.send(error) => sent.is_ok(),
                    }
                }
            };
            if !delivered {
                debug!(queue = %self.name, resource = %resource, "Receiver dropped, ending polling loop");
                break;
            }

            tokio::select! {
                biased;
                _ = stop_requested(&mut stop) => break,
                _ = self.throttle() => {}
            }

            if *stop.borrow() {
                break;
            }
        }

        debug!(queue = %self.name, resource = %resource, "Polling loop finished");
    }
}

impl std::fmt::Debug for QueueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueClient")
            .field("name", &self.name)
            .field("qps_limit", &self.qps_limit)
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

/// Resolves once the stop flag is set (or its sender is gone)
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

/// Environment variable holding the proxy for one queue
pub fn proxy_env_key(queue_name: &str) -> String {
    format!(
        "{}{}",
        PROXY_ENV_PREFIX,
        queue_name.to_uppercase().replace('-', "_")
    )
}

/// Pick the proxy for a queue: the per-queue variable, else the global one.
///
/// Empty values count as unset.
pub fn resolve_proxy<F>(queue_name: &str, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    non_empty(lookup(&proxy_env_key(queue_name))).or_else(|| non_empty(lookup(GLOBAL_PROXY_ENV)))
}
