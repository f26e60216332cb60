use tracing::{debug, warn};

use crate::device::DeviceInfo;
use crate::session::{Exchange, SessionClient};

use super::report::Evidence;
use super::suite::TestCase;

/// Key the task value follows in a packed `sendTask` envelope.
pub const TASK_KEY: &str = "\"task\":";

/// Evidence from sending one test case's task.
#[derive(Debug, Clone, Default)]
pub struct CapturedExchange {
    pub request_body: String,
    /// Where the task value starts inside `request_body`.
    pub task_byte_offset: Option<usize>,
    pub response_body: String,
    pub http_status: u16,
    pub request_headers: Vec<String>,
    pub response_headers: Vec<String>,
    pub transport_error: Option<String>,
}

impl From<Exchange> for CapturedExchange {
    fn from(exchange: Exchange) -> Self {
        Self {
            task_byte_offset: task_offset(&exchange.request_body),
            request_body: exchange.request_body,
            response_body: exchange.response_body,
            http_status: exchange.status,
            request_headers: exchange.request_headers,
            response_headers: exchange.response_headers,
            transport_error: exchange.error,
        }
    }
}

impl CapturedExchange {
    pub fn into_evidence(self, test: String) -> Evidence {
        Evidence {
            test,
            http_status: self.http_status,
            request_headers: self.request_headers,
            request_body: self.request_body,
            task_byte_offset: self.task_byte_offset,
            response_headers: self.response_headers,
            response_body: self.response_body,
            transport_error: self.transport_error,
        }
    }
}

/// Offset just past the first `"task":` in the request body.
///
/// This is a plain substring search and assumes the envelope is packed and
/// nothing ahead of the task contains the literal key.
pub fn task_offset(request_body: &str) -> Option<usize> {
    request_body
        .find(TASK_KEY)
        .map(|index| index + TASK_KEY.len())
}

/// Send the case's task through a fresh exchange and capture the result.
/// Transport failures come back as a partial capture, never as an error.
pub async fn execute<C: SessionClient>(
    case: &TestCase,
    client: &mut C,
    device: Option<&DeviceInfo>,
) -> CapturedExchange {
    let mut exchange = Exchange::new(device);
    client.send_task(&case.task, &mut exchange).await;
    if !exchange.succeeded() {
        warn!(
            test = %case.id(),
            "sendTask failed: {}",
            exchange.error.as_deref().unwrap_or("no reply")
        );
    }

    for line in exchange.transcript() {
        debug!(test = %case.id(), "{line}");
    }

    exchange.into()
}
