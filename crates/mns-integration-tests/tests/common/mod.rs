//! Common test utilities for mns-client integration tests
//!
//! This module provides:
//! - Tracing setup for test diagnostics
//! - A mock service endpoint with a configured client
//! - Builders for service response documents

use mns_client::{ClientConfig, HttpMnsClient, QueueClient, QueueManager, QueueOptions};
use std::sync::{Arc, Once};
use wiremock::MockServer;

pub const ACCESS_KEY_ID: &str = "integration-key-id";
pub const ACCESS_KEY_SECRET: &str = "integration-key-secret";

static TRACING: Once = Once::new();

/// Route client logs to the test output, filtered by `RUST_LOG`
#[allow(dead_code)]
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    TRACING.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "mns_client=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

// ============================================================================
// Mock service
// ============================================================================

/// A mock endpoint and a client signed for it
#[allow(dead_code)]
pub struct TestService {
    pub server: MockServer,
    pub client: Arc<HttpMnsClient>,
}

impl TestService {
    #[allow(dead_code)]
    pub async fn start() -> Self {
        init_tracing();

        let server = MockServer::start().await;
        let config = ClientConfig::new(server.uri(), ACCESS_KEY_ID, ACCESS_KEY_SECRET);
        let client = Arc::new(HttpMnsClient::new(&config).expect("client for mock server"));

        Self { server, client }
    }

    /// Queue client that ignores proxy variables in the test environment
    #[allow(dead_code)]
    pub fn queue(&self, name: &str, options: QueueOptions) -> Arc<QueueClient> {
        let options = options.with_proxy_from_env(false);
        Arc::new(
            QueueClient::with_options(name, self.client.clone(), options)
                .expect("queue client"),
        )
    }

    #[allow(dead_code)]
    pub fn manager(&self) -> QueueManager {
        QueueManager::new(self.client.clone())
    }
}

// ============================================================================
// Response documents
// ============================================================================

#[allow(dead_code)]
pub fn error_xml(code: &str, message: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Error xmlns="http://mns.aliyuncs.com/doc/v1/">
  <Code>{}</Code>
  <Message>{}</Message>
  <RequestId>5F2A9C1B00000001</RequestId>
  <HostId>http://123456.mns.example.test</HostId>
</Error>"#,
        code, message
    )
}

#[allow(dead_code)]
pub fn sent_xml(message_id: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Message xmlns="http://mns.aliyuncs.com/doc/v1/">
  <MessageId>{}</MessageId>
  <MessageBodyMD5>5D41402ABC4B2A76B9719D911017C592</MessageBodyMD5>
</Message>"#,
        message_id
    )
}

/// A received message; `body_base64` is the encoded message body
#[allow(dead_code)]
pub fn received_xml(message_id: &str, receipt_handle: &str, body_base64: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Message xmlns="http://mns.aliyuncs.com/doc/v1/">
  <MessageId>{}</MessageId>
  <ReceiptHandle>{}</ReceiptHandle>
  <MessageBodyMD5>5D41402ABC4B2A76B9719D911017C592</MessageBodyMD5>
  <MessageBody>{}</MessageBody>
  <EnqueueTime>1420070400000</EnqueueTime>
  <NextVisibleTime>1420070430000</NextVisibleTime>
  <FirstDequeueTime>1420070400500</FirstDequeueTime>
  <DequeueCount>1</DequeueCount>
  <Priority>8</Priority>
</Message>"#,
        message_id, receipt_handle, body_base64
    )
}

#[allow(dead_code)]
pub fn batch_received_xml(messages: &[(&str, &str, &str)]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><Messages xmlns="http://mns.aliyuncs.com/doc/v1/">"#);
    for (message_id, receipt_handle, body_base64) in messages {
        xml.push_str(&format!(
            "<Message><MessageId>{}</MessageId><ReceiptHandle>{}</ReceiptHandle><MessageBody>{}</MessageBody><DequeueCount>1</DequeueCount><Priority>8</Priority></Message>",
            message_id, receipt_handle, body_base64
        ));
    }
    xml.push_str("</Messages>");
    xml
}

#[allow(dead_code)]
pub fn visibility_xml(receipt_handle: &str, next_visible_time: i64) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ChangeVisibility xmlns="http://mns.aliyuncs.com/doc/v1/">
  <ReceiptHandle>{}</ReceiptHandle>
  <NextVisibleTime>{}</NextVisibleTime>
</ChangeVisibility>"#,
        receipt_handle, next_visible_time
    )
}
