//! Tests for error types.

use super::*;

#[test]
fn test_error_transience() {
    assert!(MnsError::RequestFailed {
        message: "connection reset".to_string(),
    }
    .is_transient());

    assert!(!MnsError::UnmarshalFailed {
        message: "unexpected EOF".to_string(),
    }
    .is_transient());

    assert!(!MnsError::QueueAlreadyExists {
        queue_name: "orders".to_string(),
    }
    .is_transient());

    let throttled = RemoteError::new(503, "QpsLimitExceeded", "slow down", "req", "host", "queues/q");
    assert!(MnsError::Remote(throttled).is_transient());

    let missing = RemoteError::new(404, "QueueNotExist", "gone", "req", "host", "queues/q");
    assert!(!MnsError::Remote(missing).is_transient());
}

#[test]
fn test_known_codes_round_trip() {
    let codes = [
        "AccessDenied",
        "InvalidAccessKeyId",
        "InternalError",
        "InvalidAuthorizationHeader",
        "InvalidDateHeader",
        "InvalidArgument",
        "InvalidDegist",
        "InvalidRequestURL",
        "InvalidQueryString",
        "MalformedXML",
        "MissingAuthorizationHeader",
        "MissingDateHeader",
        "MissingVersionHeader",
        "MissingReceiptHandle",
        "MissingVisibilityTimeout",
        "MessageNotExist",
        "QueueAlreadyExist",
        "QueueDeletedRecently",
        "InvalidQueueName",
        "QueueNameLengthError",
        "QueueNotExist",
        "ReceiptHandleError",
        "SignatureDoesNotMatch",
        "TimeExpired",
        "QpsLimitExceeded",
    ];

    for code in codes {
        let kind = RemoteErrorKind::from_code(code);
        assert_ne!(kind, RemoteErrorKind::Unknown, "code {} should be known", code);
        assert_eq!(kind.as_code(), Some(code));
    }
}

#[test]
fn test_unknown_code_keeps_context() {
    let err = RemoteError::new(
        400,
        "BrandNewCode",
        "something new",
        "req-1",
        "host-1",
        "queues/orders/messages",
    );

    assert_eq!(err.kind, RemoteErrorKind::Unknown);
    assert_eq!(err.kind.as_code(), None);
    assert_eq!(err.code, "BrandNewCode");
    assert_eq!(err.message, "something new");
    assert_eq!(err.request_id, "req-1");
    assert_eq!(err.host_id, "host-1");
    assert_eq!(err.resource, "queues/orders/messages");

    let rendered = err.to_string();
    assert!(rendered.contains("BrandNewCode"));
    assert!(rendered.contains("queues/orders/messages"));
}

/// Verify QPS-exceeded envelopes keep the resource for diagnostics.
#[test]
fn test_qps_limit_exceeded_mapping() {
    let err: MnsError =
        RemoteError::new(503, "QpsLimitExceeded", "too many", "r", "h", "queues/q/messages").into();

    assert_eq!(err.remote_kind(), Some(RemoteErrorKind::QpsLimitExceeded));
    match err {
        MnsError::Remote(remote) => assert_eq!(remote.resource, "queues/q/messages"),
        other => panic!("expected remote error, got {:?}", other),
    }
}

#[test]
fn test_local_errors_have_no_remote_kind() {
    let err: MnsError = ValidationError::Required {
        field: "queue_name".to_string(),
    }
    .into();

    assert_eq!(err.remote_kind(), None);
    assert!(err.to_string().contains("queue_name"));
}
