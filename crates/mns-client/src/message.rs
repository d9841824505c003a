//! XML documents exchanged with the service.
//!
//! Element names follow the service's wire format. Message bodies travel as
//! base64 text, see [`Base64Bytes`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

/// Default priority assigned by the service to new messages
pub const DEFAULT_PRIORITY: i64 = 8;

// ============================================================================
// Base64 body
// ============================================================================

/// Opaque message body, transported as standard base64 text.
///
/// A body that is not valid base64 is a hard decode error.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Base64Bytes(Vec<u8>);

impl Base64Bytes {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Base64Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Base64Bytes({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for Base64Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Base64Bytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for Base64Bytes {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

impl AsRef<[u8]> for Base64Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Base64Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Base64Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.trim())
            .map(Self)
            .map_err(|e| serde::de::Error::custom(format!("invalid base64 message body: {}", e)))
    }
}

// ============================================================================
// Requests
// ============================================================================

/// A single message to enqueue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename = "Message")]
pub struct MessageSendRequest {
    #[serde(rename = "MessageBody")]
    pub message_body: Base64Bytes,
    #[serde(rename = "DelaySeconds")]
    pub delay_seconds: i64,
    #[serde(rename = "Priority")]
    pub priority: i64,
}

impl MessageSendRequest {
    /// Create a message that is visible immediately with the default priority
    pub fn new(body: impl Into<Base64Bytes>) -> Self {
        Self {
            message_body: body.into(),
            delay_seconds: 0,
            priority: DEFAULT_PRIORITY,
        }
    }

    pub fn with_delay_seconds(mut self, delay_seconds: i64) -> Self {
        self.delay_seconds = delay_seconds;
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename = "Messages")]
pub struct BatchMessageSendRequest {
    #[serde(rename = "Message")]
    pub messages: Vec<MessageSendRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename = "ReceiptHandles")]
pub struct ReceiptHandles {
    #[serde(rename = "ReceiptHandle")]
    pub receipt_handles: Vec<String>,
}

// ============================================================================
// Responses
// ============================================================================

/// Result of enqueuing one message.
///
/// In batch responses a failed entry carries `code` and `message` instead of
/// an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MessageSendResponse {
    #[serde(rename = "MessageId")]
    pub message_id: String,
    #[serde(rename = "MessageBodyMD5")]
    pub message_body_md5: String,
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "RequestId")]
    pub request_id: String,
    #[serde(rename = "HostId")]
    pub host_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BatchMessageSendResponse {
    #[serde(rename = "Message")]
    pub messages: Vec<MessageSendResponse>,
}

/// A delivered (or peeked) message
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MessageReceiveResponse {
    #[serde(rename = "MessageId")]
    pub message_id: String,
    #[serde(rename = "ReceiptHandle")]
    pub receipt_handle: String,
    #[serde(rename = "MessageBodyMD5")]
    pub message_body_md5: String,
    #[serde(rename = "MessageBody")]
    pub message_body: Base64Bytes,
    /// Milliseconds since the Unix epoch
    #[serde(rename = "EnqueueTime")]
    pub enqueue_time: i64,
    /// Milliseconds since the Unix epoch
    #[serde(rename = "NextVisibleTime")]
    pub next_visible_time: i64,
    /// Milliseconds since the Unix epoch
    #[serde(rename = "FirstDequeueTime")]
    pub first_dequeue_time: i64,
    #[serde(rename = "DequeueCount")]
    pub dequeue_count: i64,
    #[serde(rename = "Priority")]
    pub priority: i64,
}

impl MessageReceiveResponse {
    pub fn enqueued_at(&self) -> Option<DateTime<Utc>> {
        from_epoch_millis(self.enqueue_time)
    }

    pub fn next_visible_at(&self) -> Option<DateTime<Utc>> {
        from_epoch_millis(self.next_visible_time)
    }

    pub fn first_dequeued_at(&self) -> Option<DateTime<Utc>> {
        from_epoch_millis(self.first_dequeue_time)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BatchMessageReceiveResponse {
    #[serde(rename = "Message")]
    pub messages: Vec<MessageReceiveResponse>,
}

/// Result of extending a message's visibility; the receipt handle is replaced
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MessageVisibilityChangeResponse {
    #[serde(rename = "ReceiptHandle")]
    pub receipt_handle: String,
    #[serde(rename = "NextVisibleTime")]
    pub next_visible_time: i64,
}

impl MessageVisibilityChangeResponse {
    pub fn next_visible_at(&self) -> Option<DateTime<Utc>> {
        from_epoch_millis(self.next_visible_time)
    }
}

/// Error document returned with every non-success status
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ErrorEnvelope {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "RequestId")]
    pub request_id: String,
    #[serde(rename = "HostId")]
    pub host_id: String,
}

// ============================================================================
// Queue administration documents
// ============================================================================

/// Settable queue attributes, sent on create and on attribute override
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename = "Queue")]
pub struct QueueAttributes {
    #[serde(rename = "DelaySeconds")]
    pub delay_seconds: u32,
    #[serde(rename = "MaximumMessageSize")]
    pub maximum_message_size: u32,
    #[serde(rename = "MessageRetentionPeriod")]
    pub message_retention_period: u32,
    #[serde(rename = "VisibilityTimeout")]
    pub visibility_timeout: u32,
    #[serde(rename = "PollingWaitSeconds")]
    pub polling_wait_seconds: u32,
}

impl Default for QueueAttributes {
    fn default() -> Self {
        Self {
            delay_seconds: 0,
            maximum_message_size: 65536,
            message_retention_period: 345600,
            visibility_timeout: 30,
            polling_wait_seconds: 0,
        }
    }
}

impl QueueAttributes {
    pub fn with_delay_seconds(mut self, seconds: u32) -> Self {
        self.delay_seconds = seconds;
        self
    }

    pub fn with_maximum_message_size(mut self, bytes: u32) -> Self {
        self.maximum_message_size = bytes;
        self
    }

    pub fn with_message_retention_period(mut self, seconds: u32) -> Self {
        self.message_retention_period = seconds;
        self
    }

    pub fn with_visibility_timeout(mut self, seconds: u32) -> Self {
        self.visibility_timeout = seconds;
        self
    }

    pub fn with_polling_wait_seconds(mut self, seconds: u32) -> Self {
        self.polling_wait_seconds = seconds;
        self
    }
}

/// Queue attributes and statistics as reported by the service
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueueDetails {
    #[serde(rename = "QueueName")]
    pub queue_name: String,
    #[serde(rename = "DelaySeconds")]
    pub delay_seconds: u32,
    #[serde(rename = "MaximumMessageSize")]
    pub maximum_message_size: u32,
    #[serde(rename = "MessageRetentionPeriod")]
    pub message_retention_period: u32,
    #[serde(rename = "VisibilityTimeout")]
    pub visibility_timeout: u32,
    #[serde(rename = "PollingWaitSeconds")]
    pub polling_wait_seconds: u32,
    #[serde(rename = "ActiveMessages")]
    pub active_messages: i64,
    #[serde(rename = "InactiveMessages")]
    pub inactive_messages: i64,
    #[serde(rename = "DelayMessages")]
    pub delay_messages: i64,
    /// Seconds since the Unix epoch
    #[serde(rename = "CreateTime")]
    pub create_time: i64,
    /// Seconds since the Unix epoch
    #[serde(rename = "LastModifyTime")]
    pub last_modify_time: i64,
}

impl QueueDetails {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.create_time, 0)
    }

    pub fn last_modified_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.last_modify_time, 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueueEntry {
    #[serde(rename = "QueueURL")]
    pub queue_url: String,
}

/// One page of a queue listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueueList {
    #[serde(rename = "Queue")]
    pub queues: Vec<QueueEntry>,
    /// Empty when this is the last page
    #[serde(rename = "NextMarker")]
    pub next_marker: String,
}

fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    if millis <= 0 {
        return None;
    }
    DateTime::from_timestamp_millis(millis)
}
