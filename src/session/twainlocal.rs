use tracing::{debug, warn};

use crate::device::DeviceInfo;
use crate::http::client::{ClientOptions, HttpClient};
use crate::http::method::HttpMethod;
use crate::http::request::ApiRequest;
use crate::json::{JsonLookup, JsonPath};

use super::exchange::Exchange;
use super::state::SessionState;
use super::SessionClient;

pub const SESSION_URI: &str = "/privet/twaindirect/session";
const JSON_CONTENT_TYPE: &str = "Content-Type: application/json; charset=UTF-8";

/// Render a packed session command envelope. `params` is spliced in as-is,
/// which lets deliberately malformed tasks reach the scanner untouched.
pub fn session_envelope(command_id: &str, method: &str, params: Option<&str>) -> String {
    let mut body = String::from("{");
    body.push_str("\"kind\":\"twainlocalscanner\",");
    body.push_str(&format!("\"commandId\":\"{command_id}\","));
    body.push_str(&format!("\"method\":\"{method}\""));
    if let Some(params) = params {
        body.push_str(&format!(",\"params\":{params}"));
    }
    body.push('}');
    body
}

pub fn session_params(session_id: &str, task: Option<&str>) -> String {
    match task {
        Some(task) => format!("{{\"sessionId\":\"{session_id}\",\"task\":{task}}}"),
        None => format!("{{\"sessionId\":\"{session_id}\"}}"),
    }
}

pub fn release_params(session_id: &str, first: u64, last: u64) -> String {
    format!("{{\"sessionId\":\"{session_id}\",\"imageBlockNum\":{first},\"lastImageBlockNum\":{last}}}")
}

#[derive(Debug, Clone)]
pub struct TwainLocalOptions {
    pub use_https: bool,
    pub use_infoex: bool,
    pub http: ClientOptions,
}

/// HTTP client for one TWAIN Local scanner.
pub struct TwainLocalClient {
    http: HttpClient,
    use_https: bool,
    use_infoex: bool,
    device: Option<DeviceInfo>,
    privet_token: String,
    session_id: Option<String>,
    state: SessionState,
}

impl TwainLocalClient {
    pub fn new(options: &TwainLocalOptions) -> Result<Self, String> {
        Ok(Self {
            http: HttpClient::new(&options.http)?,
            use_https: options.use_https,
            use_infoex: options.use_infoex,
            device: None,
            privet_token: String::new(),
            session_id: None,
            state: SessionState::NoSession,
        })
    }

    fn base_url(&self, device: &DeviceInfo) -> Result<String, String> {
        let scheme = if self.use_https { "https" } else { "http" };
        let host = match (&device.ipv4, &device.ipv6) {
            (Some(ipv4), _) if !ipv4.is_empty() => ipv4.clone(),
            (_, Some(ipv6)) if !ipv6.is_empty() => format!("[{ipv6}]"),
            _ => return Err(format!("Device `{}` has no address", device.name)),
        };
        Ok(format!("{scheme}://{host}:{}", device.port))
    }

    async fn execute(&self, device: &DeviceInfo, request: ApiRequest, exchange: &mut Exchange) -> bool {
        let base_url = match self.base_url(device) {
            Ok(base_url) => base_url,
            Err(err) => {
                exchange.record_error(err);
                return false;
            }
        };

        exchange.record_request(&base_url, &request);
        match self.http.send(&base_url, &request).await {
            Ok(response) => {
                debug!(status = response.status, uri = %request.uri, "reply received");
                exchange.record_response(response);
                true
            }
            Err(err) => {
                warn!(uri = %request.uri, "{err}");
                exchange.record_error(err);
                false
            }
        }
    }

    async fn session_command(&mut self, method: &str, params: Option<String>, exchange: &mut Exchange) -> bool {
        let Some(device) = self.device.clone() else {
            exchange.record_error("no device, create a session first");
            return false;
        };

        let command_id = uuid::Uuid::new_v4().to_string();
        let request = ApiRequest {
            method: HttpMethod::Post,
            uri: SESSION_URI.to_string(),
            headers: vec![
                JSON_CONTENT_TYPE.to_string(),
                format!("X-Privet-Token: {}", self.privet_token),
            ],
            body: Some(session_envelope(&command_id, method, params.as_deref())),
        };

        let sent = self.execute(&device, request, exchange).await;
        if sent {
            self.absorb_session(&exchange.response_body);
        }
        sent
    }

    /// Track session id and state from a session reply.
    fn absorb_session(&mut self, body: &str) {
        let Ok(reply) = JsonLookup::load(body) else {
            return;
        };
        if let Some(session_id) = reply.text(&JsonPath::parse("results.session.sessionId")) {
            self.session_id = Some(session_id);
        }
        if let Some(state) = reply.text(&JsonPath::parse("results.session.state")) {
            self.state = SessionState::parse(&state);
        }
        if self.state == SessionState::NoSession {
            self.session_id = None;
        }
    }

    fn require_session(&self, exchange: &mut Exchange, function: &str) -> Option<String> {
        let session_id = self.session_id.clone();
        if session_id.is_none() {
            exchange.record_error(format!("{function}: no open session"));
        }
        session_id
    }
}

impl SessionClient for TwainLocalClient {
    async fn info(&mut self, device: &DeviceInfo, exchange: &mut Exchange) -> bool {
        self.device = Some(device.clone());
        let uri = if self.use_infoex { "/privet/infoex" } else { "/privet/info" };
        let request = ApiRequest {
            method: HttpMethod::Get,
            uri: uri.to_string(),
            headers: vec!["X-Privet-Token: \"\"".to_string()],
            body: None,
        };

        let sent = self.execute(device, request, exchange).await;
        if sent {
            if let Ok(reply) = JsonLookup::load(&exchange.response_body) {
                if let Some(token) = reply.text(&JsonPath::parse("x-privet-token")) {
                    self.privet_token = token;
                }
            }
        }
        sent
    }

    async fn create_session(&mut self, device: &DeviceInfo, exchange: &mut Exchange) -> bool {
        self.device = Some(device.clone());
        let sent = self.session_command("createSession", None, exchange).await;
        if sent && self.session_id.is_some() && self.state == SessionState::NoSession {
            self.state = SessionState::Ready;
        }
        sent
    }

    async fn get_session(&mut self, exchange: &mut Exchange) -> bool {
        let Some(session_id) = self.require_session(exchange, "getSession") else {
            return false;
        };
        let params = session_params(&session_id, None);
        self.session_command("getSession", Some(params), exchange).await
    }

    async fn send_task(&mut self, task: &str, exchange: &mut Exchange) -> bool {
        let Some(session_id) = self.require_session(exchange, "sendTask") else {
            return false;
        };
        let params = session_params(&session_id, Some(task));
        self.session_command("sendTask", Some(params), exchange).await
    }

    async fn start_capturing(&mut self, exchange: &mut Exchange) -> bool {
        let Some(session_id) = self.require_session(exchange, "startCapturing") else {
            return false;
        };
        let params = session_params(&session_id, None);
        self.session_command("startCapturing", Some(params), exchange).await
    }

    async fn stop_capturing(&mut self, exchange: &mut Exchange) -> bool {
        let Some(session_id) = self.require_session(exchange, "stopCapturing") else {
            return false;
        };
        let params = session_params(&session_id, None);
        self.session_command("stopCapturing", Some(params), exchange).await
    }

    async fn release_image_blocks(&mut self, first: u64, last: u64, exchange: &mut Exchange) -> bool {
        let Some(session_id) = self.require_session(exchange, "releaseImageBlocks") else {
            return false;
        };
        let params = release_params(&session_id, first, last);
        self.session_command("releaseImageBlocks", Some(params), exchange).await
    }

    async fn close_session(&mut self, exchange: &mut Exchange) -> bool {
        let Some(session_id) = self.require_session(exchange, "closeSession") else {
            return false;
        };
        let params = session_params(&session_id, None);
        let sent = self.session_command("closeSession", Some(params), exchange).await;
        if sent && self.state == SessionState::Ready {
            self.state = SessionState::NoSession;
            self.session_id = None;
        }
        sent
    }

    fn state(&self) -> SessionState {
        self.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> TwainLocalOptions {
        TwainLocalOptions {
            use_https: true,
            use_infoex: true,
            http: ClientOptions::default(),
        }
    }

    fn device() -> DeviceInfo {
        DeviceInfo::from_spec("scanner@10.0.0.5:55555").unwrap()
    }

    #[test]
    fn envelope_is_packed() {
        let body = session_envelope("42", "sendTask", Some(&session_params("s1", Some("{\"actions\":[]}"))));
        assert_eq!(
            body,
            r#"{"kind":"twainlocalscanner","commandId":"42","method":"sendTask","params":{"sessionId":"s1","task":{"actions":[]}}}"#
        );
    }

    #[test]
    fn envelope_keeps_malformed_task_verbatim() {
        let task = "{\"actions\":[}";
        let body = session_envelope("1", "sendTask", Some(&session_params("s", Some(task))));
        let start = body.find("\"task\":").unwrap() + "\"task\":".len();
        assert!(body[start..].starts_with(task));
    }

    #[test]
    fn envelope_without_params() {
        assert_eq!(
            session_envelope("7", "createSession", None),
            r#"{"kind":"twainlocalscanner","commandId":"7","method":"createSession"}"#
        );
    }

    #[test]
    fn base_url_prefers_ipv4_and_brackets_ipv6() {
        let client = TwainLocalClient::new(&options()).unwrap();
        assert_eq!(client.base_url(&device()).unwrap(), "https://10.0.0.5:55555");

        let v6 = DeviceInfo::from_spec("v6@[fe80::1]:9000").unwrap();
        assert_eq!(client.base_url(&v6).unwrap(), "https://[fe80::1]:9000");

        let nowhere = DeviceInfo {
            ipv4: None,
            ..device()
        };
        assert!(client.base_url(&nowhere).is_err());
    }

    #[test]
    fn absorb_session_tracks_id_and_state() {
        let mut client = TwainLocalClient::new(&options()).unwrap();
        client.absorb_session(r#"{"results":{"success":true,"session":{"sessionId":"abc","state":"ready"}}}"#);
        assert_eq!(client.session_id.as_deref(), Some("abc"));
        assert_eq!(client.state(), SessionState::Ready);

        client.absorb_session(r#"{"results":{"success":true,"session":{"sessionId":"abc","state":"noSession"}}}"#);
        assert!(client.session_id.is_none());
    }

    #[test]
    fn release_envelope_carries_block_range() {
        let body = session_envelope("9", "releaseImageBlocks", Some(&release_params("s1", 1, 4)));
        assert_eq!(
            body,
            r#"{"kind":"twainlocalscanner","commandId":"9","method":"releaseImageBlocks","params":{"sessionId":"s1","imageBlockNum":1,"lastImageBlockNum":4}}"#
        );
    }

    #[test]
    fn capture_states_follow_replies() {
        let mut client = TwainLocalClient::new(&options()).unwrap();
        client.absorb_session(r#"{"results":{"success":true,"session":{"sessionId":"abc","state":"capturing"}}}"#);
        assert_eq!(client.state(), SessionState::Capturing);

        client.absorb_session(r#"{"results":{"success":true,"session":{"sessionId":"abc","state":"draining"}}}"#);
        assert_eq!(client.state(), SessionState::Draining);
        assert_eq!(client.session_id.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn capture_commands_without_session_fail_locally() {
        let mut client = TwainLocalClient::new(&options()).unwrap();

        let mut exchange = Exchange::new(Some(&device()));
        assert!(!client.start_capturing(&mut exchange).await);
        assert!(exchange.error.as_deref().unwrap().starts_with("startCapturing"));

        let mut exchange = Exchange::new(Some(&device()));
        assert!(!client.release_image_blocks(1, 2, &mut exchange).await);
        assert!(exchange.error.as_deref().unwrap().starts_with("releaseImageBlocks"));
        assert!(exchange.request_body.is_empty());
    }

    #[tokio::test]
    async fn send_task_without_session_fails_locally() {
        let mut client = TwainLocalClient::new(&options()).unwrap();
        let mut exchange = Exchange::new(Some(&device()));

        assert!(!client.send_task("{}", &mut exchange).await);
        assert_eq!(exchange.status, 0);
        assert!(exchange.error.as_deref().unwrap().contains("no open session"));
    }
}
