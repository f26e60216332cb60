use std::collections::VecDeque;

use crate::device::DeviceInfo;
use crate::http::method::HttpMethod;
use crate::http::request::ApiRequest;
use crate::http::response::ApiResponse;

use super::twainlocal::{release_params, session_envelope, session_params, SESSION_URI};
use super::{Exchange, SessionClient, SessionState};

const BASE_URL: &str = "https://10.0.0.5:55555";

/// Session client that answers `sendTask` with canned replies, in order.
/// `Err` entries simulate a transport failure.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    pub session_id: String,
    pub replies: VecDeque<Result<String, String>>,
    pub sent_tasks: Vec<String>,
}

impl ScriptedClient {
    pub fn new(replies: impl IntoIterator<Item = Result<String, String>>) -> Self {
        Self {
            session_id: "certification-session".into(),
            replies: replies.into_iter().collect(),
            sent_tasks: Vec::new(),
        }
    }

    pub fn replying(bodies: &[&str]) -> Self {
        Self::new(bodies.iter().map(|body| Ok(body.to_string())))
    }

    fn answer(&mut self, method: &str, params: Option<String>, exchange: &mut Exchange) -> bool {
        let command_id = format!("cmd-{}", self.sent_tasks.len());
        exchange.record_request(
            BASE_URL,
            &ApiRequest {
                method: HttpMethod::Post,
                uri: SESSION_URI.to_string(),
                headers: vec!["X-Privet-Token: token".to_string()],
                body: Some(session_envelope(&command_id, method, params.as_deref())),
            },
        );

        match self.replies.pop_front() {
            Some(Ok(body)) => {
                exchange.record_response(ApiResponse {
                    status: 200,
                    headers: vec!["content-type: application/json".to_string()],
                    body,
                });
                true
            }
            Some(Err(err)) => {
                exchange.record_error(err);
                false
            }
            None => {
                exchange.record_error("no scripted reply left");
                false
            }
        }
    }
}

impl SessionClient for ScriptedClient {
    async fn info(&mut self, _device: &DeviceInfo, exchange: &mut Exchange) -> bool {
        self.answer("infoex", None, exchange)
    }

    async fn create_session(&mut self, _device: &DeviceInfo, exchange: &mut Exchange) -> bool {
        self.answer("createSession", None, exchange)
    }

    async fn get_session(&mut self, exchange: &mut Exchange) -> bool {
        let params = session_params(&self.session_id, None);
        self.answer("getSession", Some(params), exchange)
    }

    async fn send_task(&mut self, task: &str, exchange: &mut Exchange) -> bool {
        let params = session_params(&self.session_id, Some(task));
        let sent = self.answer("sendTask", Some(params), exchange);
        self.sent_tasks.push(task.to_string());
        sent
    }

    async fn start_capturing(&mut self, exchange: &mut Exchange) -> bool {
        let params = session_params(&self.session_id, None);
        self.answer("startCapturing", Some(params), exchange)
    }

    async fn stop_capturing(&mut self, exchange: &mut Exchange) -> bool {
        let params = session_params(&self.session_id, None);
        self.answer("stopCapturing", Some(params), exchange)
    }

    async fn release_image_blocks(&mut self, first: u64, last: u64, exchange: &mut Exchange) -> bool {
        let params = release_params(&self.session_id, first, last);
        self.answer("releaseImageBlocks", Some(params), exchange)
    }

    async fn close_session(&mut self, exchange: &mut Exchange) -> bool {
        let params = session_params(&self.session_id, None);
        self.answer("closeSession", Some(params), exchange)
    }

    fn state(&self) -> SessionState {
        SessionState::Ready
    }
}
