//! Queue administration: create, configure, inspect, delete and list queues.
//!
//! Parameters are checked locally before any request is made; violations are
//! reported as [`ValidationError`]s.

use crate::client::{MnsClient, Request};
use crate::error::{MnsError, ValidationError};
use crate::message::{QueueAttributes, QueueDetails, QueueList};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::info;

#[cfg(test)]
#[path = "queue_manager_tests.rs"]
mod tests;

pub const MAX_QUEUE_NAME_LEN: usize = 256;
pub const DELAY_SECONDS_RANGE: RangeInclusive<u32> = 0..=604_800;
pub const MAXIMUM_MESSAGE_SIZE_RANGE: RangeInclusive<u32> = 1024..=65_536;
pub const MESSAGE_RETENTION_PERIOD_RANGE: RangeInclusive<u32> = 60..=1_296_000;
pub const VISIBILITY_TIMEOUT_RANGE: RangeInclusive<u32> = 1..=43_200;
pub const POLLING_WAIT_SECONDS_RANGE: RangeInclusive<u32> = 0..=30;
pub const LIST_RET_NUMBER_RANGE: RangeInclusive<u32> = 1..=1000;

const MARKER_HEADER: &str = "x-mns-marker";
const RET_NUMBER_HEADER: &str = "x-mns-ret-number";
const PREFIX_HEADER: &str = "x-mns-prefix";

/// Administrative operations for the queues of one account
#[derive(Clone)]
pub struct QueueManager {
    client: Arc<dyn MnsClient>,
}

impl QueueManager {
    pub fn new(client: Arc<dyn MnsClient>) -> Self {
        Self { client }
    }

    /// Create a queue.
    ///
    /// # Errors
    ///
    /// - `MnsError::QueueAlreadyExistsSameAttributes` if the queue exists with
    ///   identical attributes (the service answers `204`).
    /// - `MnsError::QueueAlreadyExists` if it exists with other attributes
    ///   (the service answers `409`).
    pub async fn create_queue(
        &self,
        queue_name: &str,
        attributes: QueueAttributes,
    ) -> Result<(), MnsError> {
        let queue_name = validate_queue_name(queue_name)?;
        validate_attributes(&attributes)?;

        let request = Request::put(format!("queues/{}", queue_name)).with_document(attributes);
        match self.client.send(request).await {
            Ok(reply) if reply.status == 204 => Err(MnsError::QueueAlreadyExistsSameAttributes {
                queue_name: queue_name.to_string(),
            }),
            Ok(_) => {
                info!(queue = %queue_name, "Queue created");
                Ok(())
            }
            Err(MnsError::Remote(remote)) if remote.status == 409 => {
                Err(MnsError::QueueAlreadyExists {
                    queue_name: queue_name.to_string(),
                })
            }
            Err(MnsError::ErrorBodyUnmarshalFailed { status: 409, .. }) => {
                Err(MnsError::QueueAlreadyExists {
                    queue_name: queue_name.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the attributes of an existing queue
    pub async fn set_queue_attributes(
        &self,
        queue_name: &str,
        attributes: QueueAttributes,
    ) -> Result<(), MnsError> {
        let queue_name = validate_queue_name(queue_name)?;
        validate_attributes(&attributes)?;

        let request = Request::put(format!("queues/{}?metaoverride=true", queue_name))
            .with_document(attributes);
        self.client.send(request).await.map(|_| ())
    }

    pub async fn get_queue_attributes(&self, queue_name: &str) -> Result<QueueDetails, MnsError> {
        let queue_name = validate_queue_name(queue_name)?;

        self.client
            .send(Request::get(format!("queues/{}", queue_name)))
            .await?
            .decode()
    }

    pub async fn delete_queue(&self, queue_name: &str) -> Result<(), MnsError> {
        let queue_name = validate_queue_name(queue_name)?;

        self.client
            .send(Request::delete(format!("queues/{}", queue_name)))
            .await?;
        info!(queue = %queue_name, "Queue deleted");
        Ok(())
    }

    /// List one page of queues.
    ///
    /// An empty `marker` starts from the beginning, `ret_number` zero uses the
    /// service's page size and an empty `prefix` matches every queue. Pass the
    /// returned `next_marker` to fetch the next page.
    pub async fn list_queues(
        &self,
        marker: &str,
        ret_number: u32,
        prefix: &str,
    ) -> Result<QueueList, MnsError> {
        let mut request = Request::get("queues");

        let marker = marker.trim();
        if !marker.is_empty() {
            request = request.with_header(MARKER_HEADER, marker);
        }

        if ret_number > 0 {
            check_range("ret_number", ret_number, LIST_RET_NUMBER_RANGE)?;
            request = request.with_header(RET_NUMBER_HEADER, ret_number.to_string());
        }

        let prefix = prefix.trim();
        if !prefix.is_empty() {
            request = request.with_header(PREFIX_HEADER, prefix);
        }

        self.client.send(request).await?.decode()
    }
}

impl std::fmt::Debug for QueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueManager").finish_non_exhaustive()
    }
}

/// Trim a queue name and check its length
pub fn validate_queue_name(queue_name: &str) -> Result<&str, ValidationError> {
    let queue_name = queue_name.trim();

    if queue_name.is_empty() {
        return Err(ValidationError::Required {
            field: "queue_name".to_string(),
        });
    }
    if queue_name.len() > MAX_QUEUE_NAME_LEN {
        return Err(ValidationError::OutOfRange {
            field: "queue_name".to_string(),
            message: format!(
                "length {} exceeds {} bytes",
                queue_name.len(),
                MAX_QUEUE_NAME_LEN
            ),
        });
    }

    Ok(queue_name)
}

pub fn validate_attributes(attributes: &QueueAttributes) -> Result<(), ValidationError> {
    check_range("delay_seconds", attributes.delay_seconds, DELAY_SECONDS_RANGE)?;
    check_range(
        "maximum_message_size",
        attributes.maximum_message_size,
        MAXIMUM_MESSAGE_SIZE_RANGE,
    )?;
    check_range(
        "message_retention_period",
        attributes.message_retention_period,
        MESSAGE_RETENTION_PERIOD_RANGE,
    )?;
    check_range(
        "visibility_timeout",
        attributes.visibility_timeout,
        VISIBILITY_TIMEOUT_RANGE,
    )?;
    check_range(
        "polling_wait_seconds",
        attributes.polling_wait_seconds,
        POLLING_WAIT_SECONDS_RANGE,
    )
}

fn check_range(field: &str, value: u32, range: RangeInclusive<u32>) -> Result<(), ValidationError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: field.to_string(),
            message: format!(
                "{} is outside {}..={}",
                value,
                range.start(),
                range.end()
            ),
        })
    }
}
