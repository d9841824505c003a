//! Error types for MNS operations.
//!
//! Every failure surfaced by the crate is an [`MnsError`]. Failures reported by
//! the remote service arrive as an XML error envelope and are classified into a
//! [`RemoteErrorKind`] by [`RemoteErrorKind::from_code`].

use thiserror::Error;

/// Comprehensive error type for all MNS operations
#[derive(Debug, Error)]
pub enum MnsError {
    #[error("Failed to sign request: {message}")]
    SignatureFailed { message: String },

    #[error("Failed to encode request payload: {message}")]
    EncodeFailed { message: String },

    #[error("Request failed: {message}")]
    RequestFailed { message: String },

    #[error("Failed to read response body: {message}")]
    ReadResponseBodyFailed { message: String },

    #[error("Failed to decode response body: {message}")]
    UnmarshalFailed { message: String },

    #[error("Failed to decode error response (status {status}): {message}")]
    ErrorBodyUnmarshalFailed { status: u16, message: String },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Queue '{queue_name}' already exists with the same attributes")]
    QueueAlreadyExistsSameAttributes { queue_name: String },

    #[error("Queue '{queue_name}' already exists")]
    QueueAlreadyExists { queue_name: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl MnsError {
    /// Check if error is transient and the operation could be retried by the caller
    pub fn is_transient(&self) -> bool {
        match self {
            Self::SignatureFailed { .. } => false,
            Self::EncodeFailed { .. } => false,
            Self::RequestFailed { .. } => true,
            Self::ReadResponseBodyFailed { .. } => true,
            Self::UnmarshalFailed { .. } => false,
            Self::ErrorBodyUnmarshalFailed { status, .. } => *status >= 500,
            Self::Remote(remote) => remote.kind.is_transient(),
            Self::QueueAlreadyExistsSameAttributes { .. } => false,
            Self::QueueAlreadyExists { .. } => false,
            Self::Configuration(_) => false,
            Self::Validation(_) => false,
        }
    }

    /// Kind of the remote failure, if the service returned an error envelope
    pub fn remote_kind(&self) -> Option<RemoteErrorKind> {
        match self {
            Self::Remote(remote) => Some(remote.kind),
            _ => None,
        }
    }
}

// ============================================================================
// Remote errors
// ============================================================================

/// An error envelope returned by the service, classified by its code.
///
/// Unrecognized codes are kept as [`RemoteErrorKind::Unknown`] with the original
/// code so nothing is lost for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?} ({code}) on '{resource}': {message} [status={status}, request_id={request_id}, host_id={host_id}]")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub status: u16,
    pub code: String,
    pub message: String,
    pub request_id: String,
    pub host_id: String,
    pub resource: String,
}

/// Error kinds the service is known to report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    AccessDenied,
    InvalidAccessKeyId,
    InternalError,
    InvalidAuthorizationHeader,
    InvalidDateHeader,
    InvalidArgument,
    InvalidDigest,
    InvalidRequestUrl,
    InvalidQueryString,
    MalformedXml,
    MissingAuthorizationHeader,
    MissingDateHeader,
    MissingVersionHeader,
    MissingReceiptHandle,
    MissingVisibilityTimeout,
    MessageNotExist,
    QueueAlreadyExist,
    QueueDeletedRecently,
    InvalidQueueName,
    QueueNameLengthError,
    QueueNotExist,
    ReceiptHandleError,
    SignatureDoesNotMatch,
    TimeExpired,
    QpsLimitExceeded,
    Unknown,
}

impl RemoteErrorKind {
    /// Classify a service error code
    pub fn from_code(code: &str) -> Self {
        match code {
            "AccessDenied" => Self::AccessDenied,
            "InvalidAccessKeyId" => Self::InvalidAccessKeyId,
            "InternalError" => Self::InternalError,
            "InvalidAuthorizationHeader" => Self::InvalidAuthorizationHeader,
            "InvalidDateHeader" => Self::InvalidDateHeader,
            "InvalidArgument" => Self::InvalidArgument,
            // The service spells this code with a typo.
            "InvalidDegist" => Self::InvalidDigest,
            "InvalidRequestURL" => Self::InvalidRequestUrl,
            "InvalidQueryString" => Self::InvalidQueryString,
            "MalformedXML" => Self::MalformedXml,
            "MissingAuthorizationHeader" => Self::MissingAuthorizationHeader,
            "MissingDateHeader" => Self::MissingDateHeader,
            "MissingVersionHeader" => Self::MissingVersionHeader,
            "MissingReceiptHandle" => Self::MissingReceiptHandle,
            "MissingVisibilityTimeout" => Self::MissingVisibilityTimeout,
            "MessageNotExist" => Self::MessageNotExist,
            "QueueAlreadyExist" => Self::QueueAlreadyExist,
            "QueueDeletedRecently" => Self::QueueDeletedRecently,
            "InvalidQueueName" => Self::InvalidQueueName,
            "QueueNameLengthError" => Self::QueueNameLengthError,
            "QueueNotExist" => Self::QueueNotExist,
            "ReceiptHandleError" => Self::ReceiptHandleError,
            "SignatureDoesNotMatch" => Self::SignatureDoesNotMatch,
            "TimeExpired" => Self::TimeExpired,
            "QpsLimitExceeded" => Self::QpsLimitExceeded,
            _ => Self::Unknown,
        }
    }

    /// Wire code for a known kind; `None` for [`RemoteErrorKind::Unknown`]
    pub fn as_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::AccessDenied => "AccessDenied",
            Self::InvalidAccessKeyId => "InvalidAccessKeyId",
            Self::InternalError => "InternalError",
            Self::InvalidAuthorizationHeader => "InvalidAuthorizationHeader",
            Self::InvalidDateHeader => "InvalidDateHeader",
            Self::InvalidArgument => "InvalidArgument",
            Self::InvalidDigest => "InvalidDegist",
            Self::InvalidRequestUrl => "InvalidRequestURL",
            Self::InvalidQueryString => "InvalidQueryString",
            Self::MalformedXml => "MalformedXML",
            Self::MissingAuthorizationHeader => "MissingAuthorizationHeader",
            Self::MissingDateHeader => "MissingDateHeader",
            Self::MissingVersionHeader => "MissingVersionHeader",
            Self::MissingReceiptHandle => "MissingReceiptHandle",
            Self::MissingVisibilityTimeout => "MissingVisibilityTimeout",
            Self::MessageNotExist => "MessageNotExist",
            Self::QueueAlreadyExist => "QueueAlreadyExist",
            Self::QueueDeletedRecently => "QueueDeletedRecently",
            Self::InvalidQueueName => "InvalidQueueName",
            Self::QueueNameLengthError => "QueueNameLengthError",
            Self::QueueNotExist => "QueueNotExist",
            Self::ReceiptHandleError => "ReceiptHandleError",
            Self::SignatureDoesNotMatch => "SignatureDoesNotMatch",
            Self::TimeExpired => "TimeExpired",
            Self::QpsLimitExceeded => "QpsLimitExceeded",
            Self::Unknown => return None,
        };
        Some(code)
    }

    /// Check if the condition is likely to clear on its own
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::InternalError | Self::QpsLimitExceeded | Self::TimeExpired
        )
    }
}

impl RemoteError {
    /// Build a remote error from the fields of an error envelope
    pub fn new(
        status: u16,
        code: impl Into<String>,
        message: impl Into<String>,
        request_id: impl Into<String>,
        host_id: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        let code = code.into();
        Self {
            kind: RemoteErrorKind::from_code(&code),
            status,
            code,
            message: message.into(),
            request_id: request_id.into(),
            host_id: host_id.into(),
            resource: resource.into(),
        }
    }
}

// ============================================================================
// Local errors
// ============================================================================

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration parsing failed: {message}")]
    Parsing { message: String },
}

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Value out of range for {field}: {message}")]
    OutOfRange { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
