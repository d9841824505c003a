//! # MNS Client
//!
//! Client library for a hosted message-queue service that speaks signed XML
//! over HTTP.
//!
//! This library provides:
//! - HMAC-SHA1 request signing and a shared request dispatcher
//! - Typed request and response documents with base64 message bodies
//! - Mapping of service error codes to typed errors
//! - Per-queue send, receive, peek, delete and visibility operations
//! - Long-running receive and peek loops that deliver over channels
//! - A sliding-window QPS monitor that softly throttles each queue client
//! - Queue administration (create, attributes, delete, list)
//!
//! ## Module Organization
//!
//! - [`client`] - Request model, the [`MnsClient`] trait and its HTTP implementation
//! - [`config`] - Client configuration, queue options and settings loading
//! - [`credential`] - Request signing
//! - [`decoder`] - XML response decoding
//! - [`error`] - Error types and the service error-code table
//! - [`message`] - Wire documents
//! - [`qps_monitor`] - Request-rate tracking
//! - [`queue`] - Message operations on a single queue
//! - [`queue_manager`] - Queue administration
//!
//! ## Example
//!
//! ```rust,no_run
//! use mns_client::{ClientConfig, HttpMnsClient, MessageSendRequest, QueueClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), mns_client::MnsError> {
//! let config = ClientConfig::new("https://123456.mns.example.test", "key-id", "key-secret");
//! let client = Arc::new(HttpMnsClient::new(&config)?);
//!
//! let queue = QueueClient::new("orders", client)?;
//! let sent = queue
//!     .send_message(MessageSendRequest::new("hello").with_delay_seconds(5))
//!     .await?;
//! println!("sent {}", sent.message_id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod credential;
pub mod decoder;
pub mod error;
pub mod message;
pub mod qps_monitor;
pub mod queue;
pub mod queue_manager;

// Re-export commonly used types at crate root for convenience
pub use client::{HttpMnsClient, Method, MnsClient, Payload, Reply, Request, XmlDocument};
pub use config::{ClientConfig, MnsSettings, QueueOptions};
pub use credential::Credential;
pub use decoder::{DecodeError, XmlDecoder};
pub use error::{ConfigurationError, MnsError, RemoteError, RemoteErrorKind, ValidationError};
pub use message::{
    Base64Bytes, BatchMessageReceiveResponse, BatchMessageSendRequest, BatchMessageSendResponse,
    ErrorEnvelope, MessageReceiveResponse, MessageSendRequest, MessageSendResponse,
    MessageVisibilityChangeResponse, QueueAttributes, QueueDetails, QueueEntry, QueueList,
    ReceiptHandles, DEFAULT_PRIORITY,
};
pub use qps_monitor::QpsMonitor;
pub use queue::QueueClient;
pub use queue_manager::QueueManager;
