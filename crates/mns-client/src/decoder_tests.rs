//! Tests for the XML decoder.

use super::*;
use crate::message::{BatchMessageReceiveResponse, MessageReceiveResponse, QueueList};

const ERROR_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error xmlns="http://mns.aliyuncs.com/doc/v1/">
  <Code>QueueNotExist</Code>
  <Message>The queue name you provided is not exist.</Message>
  <RequestId>5B4A4F1E2D3C</RequestId>
  <HostId>http://example.mns.test</HostId>
</Error>"#;

#[test]
fn test_decode_error_envelope() {
    let envelope = XmlDecoder::new()
        .decode_error_envelope(ERROR_BODY.as_bytes())
        .unwrap();

    assert_eq!(envelope.code, "QueueNotExist");
    assert_eq!(envelope.message, "The queue name you provided is not exist.");
    assert_eq!(envelope.request_id, "5B4A4F1E2D3C");
    assert_eq!(envelope.host_id, "http://example.mns.test");
}

#[test]
fn test_decode_receive_response() {
    let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<Message xmlns="http://mns.aliyuncs.com/doc/v1/">
  <MessageId>5F290C926D472878-2-14D9529A8FA-200000001</MessageId>
  <ReceiptHandle>1-ODU4OTkzNDU5My0xNDMyNzI3ODI3LTItOA==</ReceiptHandle>
  <MessageBodyMD5>C5DD56A39F5F7BB8B3337C6D11B6D8C7</MessageBodyMD5>
  <MessageBody>aGVsbG8=</MessageBody>
  <EnqueueTime>1250700979248</EnqueueTime>
  <NextVisibleTime>1250700799348</NextVisibleTime>
  <FirstDequeueTime>1250700779318</FirstDequeueTime>
  <DequeueCount>1</DequeueCount>
  <Priority>8</Priority>
</Message>"#;

    let message: MessageReceiveResponse = XmlDecoder::new().decode(body.as_bytes()).unwrap();

    assert_eq!(message.message_id, "5F290C926D472878-2-14D9529A8FA-200000001");
    assert_eq!(message.receipt_handle, "1-ODU4OTkzNDU5My0xNDMyNzI3ODI3LTItOA==");
    assert_eq!(message.message_body.as_bytes(), b"hello");
    assert_eq!(message.enqueue_time, 1250700979248);
    assert_eq!(message.dequeue_count, 1);
    assert_eq!(message.priority, 8);
}

#[test]
fn test_decode_batch_receive_response() {
    let body = r#"<Messages>
  <Message><MessageId>a</MessageId><ReceiptHandle>h-a</ReceiptHandle><MessageBody>YQ==</MessageBody></Message>
  <Message><MessageId>b</MessageId><ReceiptHandle>h-b</ReceiptHandle><MessageBody>Yg==</MessageBody></Message>
</Messages>"#;

    let batch: BatchMessageReceiveResponse = XmlDecoder::new().decode(body.as_bytes()).unwrap();

    assert_eq!(batch.messages.len(), 2);
    assert_eq!(batch.messages[0].receipt_handle, "h-a");
    assert_eq!(batch.messages[1].message_body.as_bytes(), b"b");
}

#[test]
fn test_decode_queue_list() {
    let body = r#"<Queues>
  <Queue><QueueURL>http://example.mns.test/queues/a</QueueURL></Queue>
  <Queue><QueueURL>http://example.mns.test/queues/b</QueueURL></Queue>
  <NextMarker>marker-2</NextMarker>
</Queues>"#;

    let list: QueueList = XmlDecoder::new().decode(body.as_bytes()).unwrap();

    assert_eq!(list.queues.len(), 2);
    assert_eq!(list.queues[1].queue_url, "http://example.mns.test/queues/b");
    assert_eq!(list.next_marker, "marker-2");
}

#[test]
fn test_decode_malformed_document_fails() {
    let result: Result<MessageReceiveResponse, _> =
        XmlDecoder::new().decode("<Message><MessageId>x</Mess".as_bytes());

    assert!(result.is_err());
}

#[test]
fn test_decode_invalid_base64_body_fails() {
    let body = "<Message><MessageId>x</MessageId><MessageBody>!!not base64!!</MessageBody></Message>";

    let result: Result<MessageReceiveResponse, _> = XmlDecoder::new().decode(body.as_bytes());

    let err = result.unwrap_err();
    assert!(err.message.contains("base64"), "unexpected error: {}", err);
}
